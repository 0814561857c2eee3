//! Aggregation of raw amortization rows into the pivoted expense view.
//!
//! Rows are filtered to the target entity set, grouped by the fixed
//! (Entity, Dept, Location, Class) tuple and summed per measure. Group order
//! is deterministic: lexicographic over the key tuple.

use crate::model::{Amount, HeaderMap, SheetTable};
use crate::Result;
use anyhow::Context;
use std::collections::BTreeMap;

/// The synthetic entity name of the grand-total row on the pivot sheet.
pub const GRAND_TOTAL: &str = "Grand Total";

/// Resolved column indices for the amortization sheet. All eight columns are
/// required; resolution failure aborts the run.
#[derive(Debug, Clone, Copy)]
pub struct SourceColumns {
    pub entity: usize,
    pub dept: usize,
    pub location: usize,
    pub class: usize,
    pub expense: usize,
    pub proceeds: usize,
    pub vested: usize,
    pub early: usize,
}

impl SourceColumns {
    pub fn resolve(headers: &HeaderMap) -> Result<Self> {
        let find = |key: &str| {
            headers
                .resolve(key)
                .with_context(|| format!("Required column '{key}' not found in the amortization sheet"))
        };
        Ok(Self {
            entity: find("entity")?,
            dept: find("dept")?,
            location: find("location")?,
            class: find("class")?,
            expense: find("expense to amortize for period")?,
            proceeds: find("company proceeds")?,
            vested: find("expense fair value of vested awards exercised")?,
            early: find("expense fair value of early exercised awards vested")?,
        })
    }
}

/// One amortization-schedule record. Immutable once read.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct SourceRow {
    pub key: GroupKey,
    pub measures: Measures,
}

impl SourceRow {
    /// Reads every data row of the amortization sheet. Unparseable or missing
    /// numeric cells coerce to zero; that can silently distort totals, which
    /// is why the cross-validation step exists.
    pub fn read_all(table: &SheetTable) -> Result<Vec<SourceRow>> {
        let cols = SourceColumns::resolve(table.headers())?;
        Ok(table
            .rows()
            .iter()
            .map(|row| SourceRow {
                key: GroupKey {
                    entity: table.cell(row, cols.entity).to_string(),
                    dept: table.cell(row, cols.dept).to_string(),
                    location: table.cell(row, cols.location).to_string(),
                    class: table.cell(row, cols.class).to_string(),
                },
                measures: Measures {
                    expense: Amount::clean(table.cell(row, cols.expense)),
                    proceeds: Amount::clean(table.cell(row, cols.proceeds)),
                    vested: Amount::clean(table.cell(row, cols.vested)),
                    early: Amount::clean(table.cell(row, cols.early)),
                },
            })
            .collect())
    }
}

/// The fixed grouping dimension tuple. Ordering is the group sort order.
#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct GroupKey {
    pub entity: String,
    pub dept: String,
    pub location: String,
    pub class: String,
}

/// The four summed expense measures.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct Measures {
    /// Expense to amortize for the period.
    pub expense: Amount,
    /// Company proceeds.
    pub proceeds: Amount,
    /// Fair value of vested awards exercised.
    pub vested: Amount,
    /// Fair value of early-exercised awards vested. Informational only in
    /// the reconciliation; the journal sheet has no counterpart.
    pub early: Amount,
}

impl Measures {
    fn accumulate(&mut self, other: &Measures) {
        self.expense += other.expense;
        self.proceeds += other.proceeds;
        self.vested += other.vested;
        self.early += other.early;
    }
}

/// One grouped row of the pivot.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct AggregatedRow {
    pub key: GroupKey,
    pub measures: Measures,
}

/// The pivoted expense view: grouped rows plus grand totals over the
/// filtered set. The synthetic grand-total row is only materialized when the
/// pivot is rendered to a sheet, so it can never leak into downstream
/// grouping.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct PivotTable {
    pub rows: Vec<AggregatedRow>,
    pub totals: Measures,
}

impl PivotTable {
    /// The pivot sheet's fixed header row.
    pub fn sheet_headers() -> Vec<String> {
        [
            "Entity",
            "Dept",
            "Location",
            "Class",
            "Expense to Amortize for Period",
            "Company Proceeds",
            "Expense (Fair Value) of Vested Awards Exercised",
            "Expense (Fair Value) of Early Exercised Awards Vested",
        ]
        .map(String::from)
        .to_vec()
    }

    /// Renders the pivot as sheet rows, appending exactly one synthetic row
    /// with blank key fields except Entity = "Grand Total".
    pub fn sheet_rows(&self) -> Vec<Vec<String>> {
        let mut out: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| {
                vec![
                    r.key.entity.clone(),
                    r.key.dept.clone(),
                    r.key.location.clone(),
                    r.key.class.clone(),
                    r.measures.expense.value().to_string(),
                    r.measures.proceeds.value().to_string(),
                    r.measures.vested.value().to_string(),
                    r.measures.early.value().to_string(),
                ]
            })
            .collect();
        out.push(vec![
            GRAND_TOTAL.to_string(),
            String::new(),
            String::new(),
            String::new(),
            self.totals.expense.value().to_string(),
            self.totals.proceeds.value().to_string(),
            self.totals.vested.value().to_string(),
            self.totals.early.value().to_string(),
        ]);
        out
    }
}

/// Filters `rows` to `entity ∈ allowed` (trimmed exact match), groups by the
/// key tuple and sums each measure. Grand totals are computed over the
/// filtered pre-group set; by construction they equal the sum of the grouped
/// sums.
pub fn aggregate(rows: &[SourceRow], allowed: &[String]) -> PivotTable {
    let mut groups: BTreeMap<GroupKey, Measures> = BTreeMap::new();
    let mut totals = Measures::default();

    for row in rows {
        if !allowed.iter().any(|e| e.trim() == row.key.entity) {
            continue;
        }
        totals.accumulate(&row.measures);
        groups
            .entry(row.key.clone())
            .or_default()
            .accumulate(&row.measures);
    }

    PivotTable {
        rows: groups
            .into_iter()
            .map(|(key, measures)| AggregatedRow { key, measures })
            .collect(),
        totals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn row(entity: &str, dept: &str, expense: &str) -> SourceRow {
        SourceRow {
            key: GroupKey {
                entity: entity.to_string(),
                dept: dept.to_string(),
                location: "1 San Francisco".to_string(),
                class: "601 Horizontal".to_string(),
            },
            measures: Measures {
                expense: Amount::clean(expense),
                proceeds: Amount::ZERO,
                vested: Amount::ZERO,
                early: Amount::ZERO,
            },
        }
    }

    const US: &str = "Gusto Inc Global : Gusto Inc US";
    const CA: &str = "Gusto Inc Global : Gusto Canada ULC";

    fn allowed() -> Vec<String> {
        vec![US.to_string(), CA.to_string()]
    }

    #[test]
    fn test_aggregate_groups_and_sums() {
        let rows = vec![
            row(US, "0000 Corporate", "100.00"),
            row(US, "0000 Corporate", "-40.00"),
            row(US, "0000 Corporate", "-0.003"),
            row(CA, "0000 Corporate", "25.00"),
        ];
        let pivot = aggregate(&rows, &allowed());
        assert_eq!(pivot.rows.len(), 2);

        // BTreeMap order: Canada sorts before US.
        assert_eq!(pivot.rows[0].key.entity, CA);
        assert_eq!(pivot.rows[1].key.entity, US);
        assert_eq!(pivot.rows[1].measures.expense.value(), dec("59.997"));
    }

    #[test]
    fn test_aggregate_conservation() {
        let rows = vec![
            row(US, "0000 Corporate", "10.50"),
            row(US, "2000 Engineering", "20.25"),
            row(CA, "0000 Corporate", "-5.00"),
            row("Unrelated Entity", "0000 Corporate", "999.00"),
        ];
        let pivot = aggregate(&rows, &allowed());

        let grouped_sum: Amount = pivot.rows.iter().map(|r| r.measures.expense).sum();
        assert_eq!(grouped_sum.value(), dec("25.75"));
        assert_eq!(pivot.totals.expense.value(), dec("25.75"));
    }

    #[test]
    fn test_aggregate_excludes_filtered_entities() {
        let rows = vec![row("Somebody Else", "0000 Corporate", "999.00")];
        let pivot = aggregate(&rows, &allowed());
        assert!(pivot.rows.is_empty());
        assert!(pivot.totals.expense.is_zero());
    }

    #[test]
    fn test_sheet_rows_append_one_grand_total() {
        let rows = vec![row(US, "0000 Corporate", "100.00")];
        let pivot = aggregate(&rows, &allowed());
        let sheet = pivot.sheet_rows();
        assert_eq!(sheet.len(), 2);

        let grand = sheet.last().unwrap();
        assert_eq!(grand[0], GRAND_TOTAL);
        assert_eq!(grand[1], "");
        assert_eq!(grand[4], "100.00");
    }

    #[test]
    fn test_read_all_resolves_fuzzy_columns() {
        let grid = vec![
            vec!["SBC Expense FY25", "", "", "", "", "", "", ""],
            vec![
                "Entity",
                "Dept",
                "Location",
                "Class",
                "Expense to Amortize for Period ($USD)",
                "Company Proceeds",
                "Expense (Fair Value) of Vested Awards Exercised",
                "Expense (Fair Value) of Early Exercised Awards Vested",
            ],
            vec![
                US,
                "0000 Corporate",
                "1 San Francisco",
                "601 Horizontal",
                "$1,234.50",
                "-",
                "(500)",
                "abc",
            ],
        ];
        let table = SheetTable::parse(grid, crate::model::HEADER_OFFSET).unwrap();
        let rows = SourceRow::read_all(&table).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].measures.expense.value(), dec("1234.50"));
        assert_eq!(rows[0].measures.proceeds, Amount::ZERO);
        assert_eq!(rows[0].measures.vested.value(), dec("-500"));
        assert_eq!(rows[0].measures.early, Amount::ZERO);
    }

    #[test]
    fn test_read_all_missing_required_column_fails() {
        let grid = vec![
            vec!["title"],
            vec!["Entity", "Dept", "Location", "Class"],
            vec![US, "0000 Corporate", "1 San Francisco", "601 Horizontal"],
        ];
        let table = SheetTable::parse(grid, crate::model::HEADER_OFFSET).unwrap();
        let err = SourceRow::read_all(&table).unwrap_err();
        assert!(err.to_string().contains("expense to amortize for period"));
    }
}
