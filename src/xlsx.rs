//! Reading and writing of close workbooks.
//!
//! Source workbooks are read with `calamine` into plain string grids so the
//! pipeline never deals with cell types. The review workbook is written with
//! `rust_xlsxwriter`, numbers as numbers so reviewers can sum them in place.

use crate::model::{Amount, EntryLine, ENTRY_COLUMNS};
use crate::pipeline::pivot::GRAND_TOTAL;
use crate::pipeline::{JournalLine, JournalTotals, PivotTable, ReconReport};
use crate::Result;
use anyhow::Context;
use calamine::{open_workbook_auto, Data, Reader, Sheets};
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::Workbook;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A source workbook opened for reading.
pub(crate) struct SourceWorkbook {
    sheets: Sheets<BufReader<File>>,
}

impl SourceWorkbook {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let sheets = open_workbook_auto(path)
            .with_context(|| format!("Failed to open workbook at {}", path.display()))?;
        Ok(Self { sheets })
    }

    pub(crate) fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names().to_vec()
    }

    /// Reads one sheet as a grid of trimmed cell text.
    pub(crate) fn grid(&mut self, sheet_name: &str) -> Result<Vec<Vec<String>>> {
        let range = self
            .sheets
            .worksheet_range(sheet_name)
            .with_context(|| format!("Failed to read sheet '{sheet_name}'"))?;
        Ok(range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }

    /// Reads `primary` if present, otherwise `fallback`. Source workbooks from
    /// different equity vendors name the amortization sheet differently.
    pub(crate) fn grid_with_fallback(
        &mut self,
        primary: &str,
        fallback: &str,
    ) -> Result<Vec<Vec<String>>> {
        let name = if self.sheet_names().iter().any(|n| n == primary) {
            primary
        } else {
            fallback
        };
        self.grid(name)
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // Whole floats lose the trailing ".0" so id columns read as integers.
        Data::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        Data::Float(n) => n.to_string(),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(e) => format!("#{e:?}"),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

/// Builder for the generated review workbook.
pub(crate) struct ReviewWorkbook {
    workbook: Workbook,
}

impl ReviewWorkbook {
    pub(crate) fn new() -> Self {
        Self {
            workbook: Workbook::new(),
        }
    }

    /// Writes the "Pivot Data" sheet: the fixed header row, one row per
    /// aggregated group and the trailing grand-total row.
    pub(crate) fn add_pivot_sheet(&mut self, pivot: &PivotTable) -> Result<()> {
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name("Pivot Data")?;
        write_row(worksheet, 0, &PivotTable::sheet_headers())?;
        for (i, row) in pivot.sheet_rows().iter().enumerate() {
            write_row(worksheet, (i + 1) as u32, row)?;
        }
        Ok(())
    }

    /// Writes the "Reconciliation" sheet: the match/check table, the
    /// keyword-matched journal debit totals it was compared against, and the
    /// journal-entry extract itself with a grand-total debit/credit row, so
    /// the reviewer can audit the totals without opening the source workbook.
    pub(crate) fn add_recon_sheet(
        &mut self,
        report: &ReconReport,
        journal: &JournalTotals,
        lines: &[JournalLine],
    ) -> Result<()> {
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name("Reconciliation")?;
        worksheet.write_string(0, 0, "Reconciliation")?;
        worksheet.write_string(0, 1, "Pivot Total")?;
        worksheet.write_string(0, 2, "Journal Total")?;
        worksheet.write_string(0, 3, "Status")?;

        let mut row = 1u32;
        for concept in &report.rows {
            worksheet.write_string(row, 0, concept.label)?;
            worksheet.write_number(row, 1, to_f64(concept.pivot.value()))?;
            if let Some(journal_amount) = concept.journal {
                worksheet.write_number(row, 2, to_f64(journal_amount.value()))?;
            }
            worksheet.write_string(row, 3, concept.verdict.to_string())?;
            row += 1;
        }

        row += 1;
        worksheet.write_string(row, 0, "Journal Debit Totals")?;
        let totals = [
            ("Compensation Expense", journal.compensation),
            ("Cash", journal.cash),
            ("Paid-in Capital", journal.paid_in_capital),
        ];
        for (label, amount) in totals {
            row += 1;
            worksheet.write_string(row, 0, label)?;
            worksheet.write_number(row, 1, to_f64(amount.value()))?;
        }

        row += 2;
        worksheet.write_string(row, 0, "Journal Entry Detail")?;
        row += 1;
        worksheet.write_string(row, 0, "Account")?;
        worksheet.write_string(row, 1, "Debit")?;
        worksheet.write_string(row, 2, "Credit")?;
        let mut total_debit = Amount::ZERO;
        let mut total_credit = Amount::ZERO;
        for line in lines {
            row += 1;
            worksheet.write_string(row, 0, &line.account)?;
            worksheet.write_number(row, 1, to_f64(line.debit.value()))?;
            worksheet.write_number(row, 2, to_f64(line.credit.value()))?;
            total_debit += line.debit;
            total_credit += line.credit;
        }
        row += 1;
        worksheet.write_string(row, 0, GRAND_TOTAL)?;
        worksheet.write_number(row, 1, to_f64(total_debit.value()))?;
        worksheet.write_number(row, 2, to_f64(total_credit.value()))?;
        Ok(())
    }

    /// Writes one entity-group entry sheet in the fixed column order.
    pub(crate) fn add_entry_sheet(&mut self, name: &str, lines: &[EntryLine]) -> Result<()> {
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(name)?;
        for (col, header) in ENTRY_COLUMNS.iter().enumerate() {
            worksheet.write_string(0, col as u16, *header)?;
        }
        for (i, line) in lines.iter().enumerate() {
            let row = (i + 1) as u32;
            worksheet.write_string(row, 0, &line.account)?;
            worksheet.write_number(row, 1, to_f64(line.debit.value()))?;
            worksheet.write_number(row, 2, to_f64(line.credit.value()))?;
            worksheet.write_string(row, 3, &line.entity)?;
            worksheet.write_string(row, 4, &line.dept)?;
            worksheet.write_string(row, 5, &line.location)?;
            worksheet.write_string(row, 6, &line.class)?;
            worksheet.write_string(row, 7, &line.description)?;
        }
        Ok(())
    }

    pub(crate) fn save(mut self, path: &Path) -> Result<()> {
        self.workbook
            .save(path)
            .with_context(|| format!("Failed to save workbook at {}", path.display()))
    }
}

/// Writes a row of cell text, sniffing numeric cells so amounts land as
/// numbers rather than text.
fn write_row(
    worksheet: &mut rust_xlsxwriter::Worksheet,
    row: u32,
    cells: &[String],
) -> Result<()> {
    for (col, cell) in cells.iter().enumerate() {
        let col = col as u16;
        match cell.parse::<f64>() {
            Ok(n) => worksheet.write_number(row, col, n)?,
            Err(_) => worksheet.write_string(row, col, cell)?,
        };
    }
    Ok(())
}

fn to_f64(value: rust_decimal::Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Amount;
    use crate::pipeline::pivot::{aggregate, GroupKey, Measures, SourceRow};
    use tempfile::TempDir;

    const US: &str = "Gusto Inc Global : Gusto Inc US";

    fn pivot() -> PivotTable {
        aggregate(
            &[SourceRow {
                key: GroupKey {
                    entity: US.to_string(),
                    dept: "0000 Corporate".to_string(),
                    location: "1 San Francisco".to_string(),
                    class: "601 Horizontal".to_string(),
                },
                measures: Measures {
                    expense: Amount::clean("1234.5"),
                    ..Default::default()
                },
            }],
            &[US.to_string()],
        )
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("close.xlsx");

        let mut writer = ReviewWorkbook::new();
        writer.add_pivot_sheet(&pivot()).unwrap();
        writer
            .add_entry_sheet(
                "Entry - Gusto Inc US",
                &[EntryLine {
                    account: "60175 Personnel : Stock Option Compensation".into(),
                    debit: Amount::clean("1234.5"),
                    credit: Amount::ZERO,
                    entity: US.into(),
                    dept: "0000 Corporate".into(),
                    location: "1 San Francisco".into(),
                    class: "601 Horizontal".into(),
                    description: "SBC Expense Allocation".into(),
                }],
            )
            .unwrap();
        writer.save(&path).unwrap();

        let mut source = SourceWorkbook::open(&path).unwrap();
        assert_eq!(
            source.sheet_names(),
            vec!["Pivot Data".to_string(), "Entry - Gusto Inc US".to_string()]
        );

        let grid = source.grid("Pivot Data").unwrap();
        assert_eq!(grid[0][0], "Entity");
        assert_eq!(grid[1][0], US);
        assert_eq!(grid[1][4], "1234.5");
        // Last row is the grand total.
        assert_eq!(grid.last().unwrap()[0], "Grand Total");

        let entry = source.grid("Entry - Gusto Inc US").unwrap();
        assert_eq!(entry[0], ENTRY_COLUMNS.map(String::from).to_vec());
        assert_eq!(entry[1][1], "1234.5");
    }

    #[test]
    fn test_recon_sheet_embeds_journal_detail() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("close.xlsx");

        let lines = vec![
            JournalLine {
                account: "60175 Compensation Expense".into(),
                debit: Amount::clean("85.30"),
                credit: Amount::ZERO,
            },
            JournalLine {
                account: "30245 Additional Paid-in Capital".into(),
                debit: Amount::ZERO,
                credit: Amount::clean("85.30"),
            },
        ];
        let totals = crate::pipeline::recon::journal_totals(&lines);
        let report = ReconReport::build(
            &crate::pipeline::pivot::Measures {
                expense: Amount::clean("85.00"),
                ..Default::default()
            },
            &totals,
        );

        let mut writer = ReviewWorkbook::new();
        writer.add_recon_sheet(&report, &totals, &lines).unwrap();
        writer.save(&path).unwrap();

        let mut source = SourceWorkbook::open(&path).unwrap();
        let grid = source.grid("Reconciliation").unwrap();
        assert_eq!(grid[0][0], "Reconciliation");

        // The extract rows sit under the match table and the debit totals,
        // below a header of their own.
        let header = grid
            .iter()
            .position(|r| r.first().map(String::as_str) == Some("Journal Entry Detail"))
            .expect("detail section");
        assert_eq!(grid[header + 1][0], "Account");
        assert_eq!(grid[header + 2][0], "60175 Compensation Expense");
        assert_eq!(grid[header + 2][1], "85.3");
        assert_eq!(grid[header + 3][2], "85.3");

        // The trailing row sums both sides of the extract.
        let grand = grid.last().unwrap();
        assert_eq!(grand[0], GRAND_TOTAL);
        assert_eq!(grand[1], "85.3");
        assert_eq!(grand[2], "85.3");
    }

    #[test]
    fn test_grid_with_fallback() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("source.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Raw").unwrap();
        sheet.write_string(0, 0, "Entity").unwrap();
        workbook.save(&path).unwrap();

        let mut source = SourceWorkbook::open(&path).unwrap();
        let grid = source
            .grid_with_fallback("Expense (Amortization)", "Raw")
            .unwrap();
        assert_eq!(grid[0][0], "Entity");
    }

    #[test]
    fn test_missing_sheet_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("source.xlsx");

        let mut workbook = Workbook::new();
        workbook.add_worksheet().set_name("Raw").unwrap();
        workbook.save(&path).unwrap();

        let mut source = SourceWorkbook::open(&path).unwrap();
        assert!(source.grid("Nope").is_err());
    }
}
