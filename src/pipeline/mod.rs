//! The close pipeline: aggregation, cross-validation, entry building and
//! payload generation, in that order.

pub mod entries;
pub mod payload;
pub mod pivot;
pub mod recon;

pub use entries::ChartOfAccounts;
pub use pivot::PivotTable;
pub use recon::{JournalLine, JournalTotals, ReconReport};

use crate::config::{ConfigFile, EntityGroup};
use crate::model::{EntryLine, Mappings, Payload, SheetTable, HEADER_OFFSET};
use crate::Result;
use anyhow::Context;
use chrono::NaiveDate;
use tracing::info;

/// The entry lines and payload for one legal-entity group.
#[derive(Debug, Clone)]
pub struct GroupEntries {
    pub group: EntityGroup,
    pub lines: Vec<EntryLine>,
    pub payload: Payload,
}

/// Everything one close run produces, before any of it is written to disk.
#[derive(Debug, Clone)]
pub struct CloseRun {
    pub pivot: PivotTable,
    /// The parsed journal-entry extract, embedded in the review workbook so
    /// the reviewer can see what the totals were summed from.
    pub journal_lines: Vec<JournalLine>,
    pub journal: JournalTotals,
    pub report: ReconReport,
    pub groups: Vec<GroupEntries>,
}

/// Runs the whole pipeline over the two source grids.
///
/// The transaction date on every payload is the last calendar day of the
/// month preceding `run_date`, independent of the `period` label. `period`
/// only feeds the entry memos.
pub fn run(
    source_grid: Vec<Vec<String>>,
    journal_grid: Vec<Vec<String>>,
    mappings: &Mappings,
    config: &ConfigFile,
    period: &str,
    run_date: NaiveDate,
) -> Result<CloseRun> {
    let source = SheetTable::parse(source_grid, HEADER_OFFSET)
        .context("Failed to parse the amortization sheet")?;
    let rows = pivot::SourceRow::read_all(&source)?;
    let pivot = pivot::aggregate(&rows, &config.target_entities());
    info!(
        "Aggregated {} source rows into {} groups",
        rows.len(),
        pivot.rows.len()
    );

    let journal_table = SheetTable::parse(journal_grid, HEADER_OFFSET)
        .context("Failed to parse the journal-entry sheet")?;
    let journal_lines = recon::JournalLine::read_all(&journal_table)?;
    let journal = recon::journal_totals(&journal_lines);
    let report = ReconReport::build(&pivot.totals, &journal);
    for row in &report.rows {
        info!("{}: {}", row.label, row.verdict);
    }

    let tran_date = payload::last_day_of_previous_month(run_date);
    let groups = config
        .entity_groups()
        .iter()
        .map(|group| {
            let lines = entries::build(&pivot, group.entities(), group.label(), config.chart());
            let memo = format!("{period}_SBC_{}", group.label());
            let mut payload = payload::generate(
                &lines,
                mappings,
                group.subsidiary(),
                tran_date,
                &memo,
            );
            payload::balance(&mut payload);
            GroupEntries {
                group: group.clone(),
                lines,
                payload,
            }
        })
        .collect();

    Ok(CloseRun {
        pivot,
        journal_lines,
        journal,
        report,
        groups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Amount;
    use recon::Verdict;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const US: &str = "Gusto Inc Global : Gusto Inc US";
    const CA: &str = "Gusto Inc Global : Gusto Canada ULC";

    fn grid(rows: Vec<Vec<&str>>) -> Vec<Vec<String>> {
        rows.into_iter()
            .map(|r| r.into_iter().map(String::from).collect())
            .collect()
    }

    fn source_grid() -> Vec<Vec<String>> {
        grid(vec![
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
                "100.00",
                "30.00",
                "40.00",
                "7.00",
            ],
            vec![
                US,
                "0000 Corporate",
                "1 San Francisco",
                "601 Horizontal",
                "(40.00)",
                "-",
                "-",
                "-",
            ],
            vec![
                CA,
                "0000 Corporate",
                "1 San Francisco",
                "601 Horizontal",
                "$25.00",
                "-",
                "-",
                "-",
            ],
        ])
    }

    fn journal_grid() -> Vec<Vec<String>> {
        grid(vec![
            vec!["Journal Entries", "", ""],
            vec!["Account", "Debit", "Credit"],
            vec!["60175 Compensation Expense", "85.30", "-"],
            vec!["10010 Cash", "30.00", "-"],
            vec!["30245 Additional Paid-in Capital", "40.00", "-"],
        ])
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_run_end_to_end() {
        let result = run(
            source_grid(),
            journal_grid(),
            &Mappings::default(),
            &ConfigFile::default(),
            "Oct 2025",
            chrono::NaiveDate::from_ymd_opt(2025, 11, 3).unwrap(),
        )
        .unwrap();

        // 100 - 40 nets inside the US group, 25 in Canada.
        assert_eq!(result.pivot.totals.expense.value(), dec("85.00"));

        // 85.00 vs 85.30 is within tolerance; the other two match exactly.
        assert_eq!(result.report.rows[0].verdict, Verdict::Match);
        assert!(result.report.all_matched());

        // The parsed extract is carried through for the review workbook.
        assert_eq!(result.journal_lines.len(), 3);
        assert_eq!(result.journal_lines[0].account, "60175 Compensation Expense");

        assert_eq!(result.groups.len(), 2);
        let us = &result.groups[0];
        assert_eq!(us.group.label(), "US");
        assert_eq!(us.payload.memo, "Oct 2025_SBC_US");
        assert_eq!(us.payload.subsidiary, 1);
        assert_eq!(
            us.payload.tran_date,
            chrono::NaiveDate::from_ymd_opt(2025, 10, 31).unwrap()
        );
        // Summary credit + one netted allocation, then their mirrors.
        assert_eq!(us.payload.lines.len(), 4);
        assert_eq!(us.payload.total_debit(), us.payload.total_credit());

        let ca = &result.groups[1];
        assert_eq!(ca.payload.subsidiary, 5);
        assert_eq!(ca.lines[0].credit.value(), dec("25.00"));
    }

    #[test]
    fn test_run_mismatch_is_reported_not_fatal() {
        let mut journal = journal_grid();
        journal[2][1] = "200.00".to_string();
        let result = run(
            source_grid(),
            journal,
            &Mappings::default(),
            &ConfigFile::default(),
            "Oct 2025",
            chrono::NaiveDate::from_ymd_opt(2025, 11, 3).unwrap(),
        )
        .unwrap();
        assert_eq!(result.report.rows[0].verdict, Verdict::Check);
        assert!(!result.report.all_matched());
        // Entries are still generated; the verdict is advisory.
        assert_eq!(result.groups.len(), 2);
    }

    #[test]
    fn test_run_missing_required_column_fails() {
        let bad = grid(vec![
            vec!["title"],
            vec!["Entity", "Dept"],
            vec![US, "0000 Corporate"],
        ]);
        assert!(run(
            bad,
            journal_grid(),
            &Mappings::default(),
            &ConfigFile::default(),
            "Oct 2025",
            chrono::NaiveDate::from_ymd_opt(2025, 11, 3).unwrap(),
        )
        .is_err());
    }

    #[test]
    fn test_unresolved_ids_default_to_zero() {
        let result = run(
            source_grid(),
            journal_grid(),
            &Mappings::default(),
            &ConfigFile::default(),
            "Oct 2025",
            chrono::NaiveDate::from_ymd_opt(2025, 11, 3).unwrap(),
        )
        .unwrap();
        let line = &result.groups[0].payload.lines[0];
        assert_eq!(line.account, 0);
        assert_eq!(line.department, 0);
        assert_eq!(line.memo, "SBC Expense Accrual - US");
        assert_eq!(line.credit, Amount::clean("60.00"));
    }
}
