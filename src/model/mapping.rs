//! Lookup tables that resolve dimension values to external NetSuite ids.
//!
//! The mapping workbook has one sheet per dimension (Account, Department,
//! Class, Location), each with a name column and an internal-id column found
//! by fuzzy header match. A missing workbook or sheet degrades to an empty
//! table, which resolves everything to 0.

use crate::model::{HeaderMap, SheetTable};
use tracing::warn;

/// An ordered name → external-id table for one dimension.
///
/// Row order is preserved from the source sheet because the loose lookup is
/// order-sensitive: the first qualifying candidate in table order wins.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct MappingTable {
    entries: Vec<(String, i64)>,
}

impl MappingTable {
    pub fn new(entries: Vec<(String, i64)>) -> Self {
        Self { entries }
    }

    /// Parses a mapping sheet. The name column is the first header containing
    /// "name" or "account"; the id column is the first containing
    /// "internalid" or "id". If either cannot be resolved the table is empty.
    pub fn parse(table: &SheetTable) -> Self {
        let headers: &HeaderMap = table.headers();
        let col_name = headers.resolve("name").or_else(|| headers.resolve("account"));
        let col_id = headers
            .resolve("internalid")
            .or_else(|| headers.resolve("id"));

        let (col_name, col_id) = match (col_name, col_id) {
            (Some(n), Some(i)) => (n, i),
            _ => {
                warn!("Mapping sheet is missing a name or internal id column; ids will be 0");
                return Self::default();
            }
        };

        let entries = table
            .rows()
            .iter()
            .filter_map(|row| {
                let name = table.cell(row, col_name);
                let id = parse_id(table.cell(row, col_id))?;
                (!name.is_empty()).then(|| (name.to_string(), id))
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves a dimension value to its external id. Matching policy, in
    /// order: exact match on the trimmed string; else a loose bidirectional
    /// substring scan (value contains name, or name contains value) where the
    /// first hit in table order wins; else 0 for unresolved.
    ///
    /// The loose pass is deliberately permissive, preserved for compatibility
    /// with hierarchical values like "60175 Personnel : Stock Option
    /// Compensation" matching a table entry named "60175 Personnel".
    pub fn lookup(&self, value: &str) -> i64 {
        let value = value.trim();
        if value.is_empty() {
            return 0;
        }
        if let Some((_, id)) = self.entries.iter().find(|(name, _)| name == value) {
            return *id;
        }
        self.entries
            .iter()
            .find(|(name, _)| value.contains(name.as_str()) || name.contains(value))
            .map(|(_, id)| *id)
            .unwrap_or(0)
    }
}

/// Internal ids arrive as "42", "42.0" or blank depending on how the sheet
/// was exported.
fn parse_id(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().map(|f| f as i64))
}

/// The four dimension tables used by the payload generator.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct Mappings {
    pub account: MappingTable,
    pub dept: MappingTable,
    pub class: MappingTable,
    pub location: MappingTable,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::table::SheetTable;

    fn table(rows: Vec<Vec<&str>>) -> SheetTable {
        SheetTable::parse(rows, 0).unwrap()
    }

    #[test]
    fn test_parse_resolves_fuzzy_columns() {
        let t = table(vec![
            vec!["Account Name", "Internal ID"],
            vec!["60175 Personnel", "42"],
            vec!["30245 Equity", "7"],
        ]);
        let mapping = MappingTable::parse(&t);
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.lookup("60175 Personnel"), 42);
    }

    #[test]
    fn test_parse_float_formatted_ids() {
        let t = table(vec![vec!["Name", "ID"], vec!["0000 Corporate", "12.0"]]);
        assert_eq!(MappingTable::parse(&t).lookup("0000 Corporate"), 12);
    }

    #[test]
    fn test_parse_missing_id_column_is_empty() {
        let t = table(vec![vec!["Name", "Notes"], vec!["Cash", "n/a"]]);
        assert!(MappingTable::parse(&t).is_empty());
    }

    #[test]
    fn test_lookup_exact_wins_over_loose() {
        let mapping = MappingTable::new(vec![
            ("60175 Personnel".into(), 42),
            ("60175 Personnel : Stock Option Compensation".into(), 99),
        ]);
        assert_eq!(
            mapping.lookup("60175 Personnel : Stock Option Compensation"),
            99
        );
    }

    #[test]
    fn test_lookup_substring_containment_fallback() {
        let mapping = MappingTable::new(vec![("60175 Personnel".into(), 42)]);
        assert_eq!(
            mapping.lookup("60175 Personnel : Stock Option Compensation"),
            42
        );
    }

    #[test]
    fn test_lookup_reverse_containment() {
        let mapping =
            MappingTable::new(vec![("1 San Francisco Headquarters".into(), 3)]);
        assert_eq!(mapping.lookup("1 San Francisco"), 3);
    }

    #[test]
    fn test_lookup_first_hit_in_table_order() {
        let mapping = MappingTable::new(vec![
            ("601 Horizontal".into(), 1),
            ("601 Horizontal East".into(), 2),
        ]);
        assert_eq!(mapping.lookup("601 Horizontal East and West"), 1);
    }

    #[test]
    fn test_lookup_unresolved_is_zero() {
        let mapping = MappingTable::new(vec![("Cash".into(), 5)]);
        assert_eq!(mapping.lookup("Prepaid Rent"), 0);
        assert_eq!(mapping.lookup(""), 0);
        assert_eq!(MappingTable::default().lookup("Cash"), 0);
    }
}
