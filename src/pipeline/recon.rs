//! Cross-validation of pivot totals against the journal-entry extract.
//!
//! The journal-entry sheet is an independently prepared, ledger-style view of
//! the same activity. It is never joined row-by-row with the pivot; only
//! keyword-matched debit sums are compared, with a deliberately loose
//! absolute tolerance to absorb rounding.

use crate::model::{Amount, SheetTable};
use crate::pipeline::pivot::Measures;
use crate::Result;
use anyhow::Context;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Differences strictly under one currency unit (after rounding to cents)
/// count as a match. Absolute, not a percentage.
const TOLERANCE: &str = "1";

/// One line from the journal-entry sheet. Debit and credit are mutually
/// exclusive in well-formed input, but nothing here enforces that; the line
/// is only ever used for keyword-matched sums.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct JournalLine {
    pub account: String,
    pub debit: Amount,
    pub credit: Amount,
}

impl JournalLine {
    /// Reads every data row of the journal-entry sheet. The account column is
    /// resolved as "expense to amortize", then "account", then falls back to
    /// the first column; debit and credit columns are required.
    pub fn read_all(table: &SheetTable) -> Result<Vec<JournalLine>> {
        let headers = table.headers();
        let col_account = headers
            .resolve("expense to amortize")
            .or_else(|| headers.resolve("account"))
            .unwrap_or(0);
        let col_debit = headers
            .resolve("debit")
            .context("Required column 'debit' not found in the journal-entry sheet")?;
        let col_credit = headers
            .resolve("credit")
            .context("Required column 'credit' not found in the journal-entry sheet")?;

        Ok(table
            .rows()
            .iter()
            .map(|row| JournalLine {
                account: table.cell(row, col_account).to_string(),
                debit: Amount::clean(table.cell(row, col_debit)),
                credit: Amount::clean(table.cell(row, col_credit)),
            })
            .collect())
    }
}

/// The three journal-side figures that have pivot counterparts.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct JournalTotals {
    /// Debits on accounts containing "Compensation Expense".
    pub compensation: Amount,
    /// Debits on accounts containing "Cash".
    pub cash: Amount,
    /// Debits on accounts matching the Paid-in-Capital pattern.
    pub paid_in_capital: Amount,
}

fn paid_in_capital_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // The word separator varies between exports: hyphen or space.
    RE.get_or_init(|| Regex::new(r"(?i)Paid[- ]in[- ]Capital").expect("static regex"))
}

/// Sums debit amounts by case-insensitive containment over the account text.
pub fn journal_totals(lines: &[JournalLine]) -> JournalTotals {
    let contains = |account: &str, keyword: &str| {
        account.to_lowercase().contains(&keyword.to_lowercase())
    };
    let sum_debit = |pred: &dyn Fn(&str) -> bool| -> Amount {
        lines
            .iter()
            .filter(|l| pred(&l.account))
            .map(|l| l.debit)
            .sum()
    };
    JournalTotals {
        compensation: sum_debit(&|a| contains(a, "Compensation Expense")),
        cash: sum_debit(&|a| contains(a, "Cash")),
        paid_in_capital: sum_debit(&|a| paid_in_capital_pattern().is_match(a)),
    }
}

/// The verdict on one reconciliation concept.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Match,
    Check,
    /// No journal counterpart exists; the figure is reported without a
    /// match/check decision.
    #[serde(rename = "INFO ONLY")]
    InfoOnly,
}

serde_plain::derive_display_from_serialize!(Verdict);

/// `abs(round(pivot − journal, 2)) < 1` is a match, otherwise a check.
pub fn verdict(pivot: Amount, journal: Amount) -> Verdict {
    if (pivot - journal).round_cents().abs() < Amount::clean(TOLERANCE) {
        Verdict::Match
    } else {
        Verdict::Check
    }
}

/// One row of the reconciliation report.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ReconRow {
    pub label: &'static str,
    pub pivot: Amount,
    pub journal: Option<Amount>,
    pub verdict: Verdict,
}

/// The match/check table shown to the reviewer, one row per concept plus the
/// info-only early-exercise figure.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ReconReport {
    pub rows: Vec<ReconRow>,
}

impl ReconReport {
    pub fn build(pivot: &Measures, journal: &JournalTotals) -> Self {
        let compare = |label, p: Amount, j: Amount| ReconRow {
            label,
            pivot: p,
            journal: Some(j),
            verdict: verdict(p, j),
        };
        Self {
            rows: vec![
                compare("Expense", pivot.expense, journal.compensation),
                compare("Company Proceeds", pivot.proceeds, journal.cash),
                compare("FV of Vested Option", pivot.vested, journal.paid_in_capital),
                ReconRow {
                    label: "FV of Early Exercised Awards Vested",
                    pivot: pivot.early,
                    journal: None,
                    verdict: Verdict::InfoOnly,
                },
            ],
        }
    }

    /// True when every concept with a journal counterpart matched.
    pub fn all_matched(&self) -> bool {
        self.rows
            .iter()
            .filter(|r| r.journal.is_some())
            .all(|r| r.verdict == Verdict::Match)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn line(account: &str, debit: &str) -> JournalLine {
        JournalLine {
            account: account.to_string(),
            debit: Amount::clean(debit),
            credit: Amount::ZERO,
        }
    }

    #[test]
    fn test_journal_totals_keyword_sums() {
        let lines = vec![
            line("60175 Compensation Expense - Stock Options", "100.00"),
            line("compensation expense (restricted)", "25.00"),
            line("10010 Cash and Equivalents", "30.00"),
            line("30245 Additional Paid-in Capital", "40.00"),
            line("Additional Paid in Capital - APIC", "2.00"),
            line("Something Else", "999.00"),
        ];
        let totals = journal_totals(&lines);
        assert_eq!(totals.compensation.value(), Decimal::from_str("125.00").unwrap());
        assert_eq!(totals.cash.value(), Decimal::from_str("30.00").unwrap());
        assert_eq!(
            totals.paid_in_capital.value(),
            Decimal::from_str("42.00").unwrap()
        );
    }

    #[test]
    fn test_verdict_inside_tolerance() {
        assert_eq!(
            verdict(Amount::clean("1000.00"), Amount::clean("999.50")),
            Verdict::Match
        );
    }

    #[test]
    fn test_verdict_outside_tolerance() {
        assert_eq!(
            verdict(Amount::clean("1000.00"), Amount::clean("998.00")),
            Verdict::Check
        );
    }

    #[test]
    fn test_verdict_boundary_is_check() {
        // Exactly one currency unit of difference is not a match.
        assert_eq!(
            verdict(Amount::clean("1000.00"), Amount::clean("999.00")),
            Verdict::Check
        );
    }

    #[test]
    fn test_verdict_rounds_before_comparing() {
        // 0.996 rounds to 1.00, which is not strictly under the tolerance.
        assert_eq!(
            verdict(Amount::clean("1000.996"), Amount::clean("1000.00")),
            Verdict::Check
        );
        // 0.994 rounds to 0.99.
        assert_eq!(
            verdict(Amount::clean("1000.994"), Amount::clean("1000.00")),
            Verdict::Match
        );
    }

    #[test]
    fn test_report_has_info_only_early_exercise_row() {
        let pivot = Measures {
            expense: Amount::clean("100"),
            proceeds: Amount::clean("30"),
            vested: Amount::clean("40"),
            early: Amount::clean("7"),
        };
        let journal = JournalTotals {
            compensation: Amount::clean("100.20"),
            cash: Amount::clean("30"),
            paid_in_capital: Amount::clean("45"),
        };
        let report = ReconReport::build(&pivot, &journal);
        assert_eq!(report.rows.len(), 4);
        assert_eq!(report.rows[0].verdict, Verdict::Match);
        assert_eq!(report.rows[2].verdict, Verdict::Check);
        assert_eq!(report.rows[3].verdict, Verdict::InfoOnly);
        assert_eq!(report.rows[3].journal, None);
        assert!(!report.all_matched());
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::Match.to_string(), "MATCH");
        assert_eq!(Verdict::Check.to_string(), "CHECK");
        assert_eq!(Verdict::InfoOnly.to_string(), "INFO ONLY");
    }

    #[test]
    fn test_read_all_falls_back_to_first_column_for_account() {
        let grid = vec![
            vec!["title", "", ""],
            vec!["Memo Text", "Debit", "Credit"],
            vec!["Cash", "$10.00", "-"],
        ];
        let table = SheetTable::parse(grid, crate::model::HEADER_OFFSET).unwrap();
        let lines = JournalLine::read_all(&table).unwrap();
        assert_eq!(lines[0].account, "Cash");
        assert_eq!(lines[0].debit.value(), Decimal::from_str("10.00").unwrap());
    }

    #[test]
    fn test_read_all_missing_debit_fails() {
        let grid = vec![
            vec!["title", ""],
            vec!["Account", "Credit"],
            vec!["Cash", "1.00"],
        ];
        let table = SheetTable::parse(grid, crate::model::HEADER_OFFSET).unwrap();
        assert!(JournalLine::read_all(&table).is_err());
    }
}
