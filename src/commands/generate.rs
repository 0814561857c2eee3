//! The `generate` command: runs the close pipeline over a source workbook,
//! writes the review workbook and the payload files, and records a new
//! Pending batch in the approval ledger.

use crate::args::GenerateArgs;
use crate::commands::Out;
use crate::model::{LedgerEntry, MappingTable, Mappings, SheetTable};
use crate::xlsx::{ReviewWorkbook, SourceWorkbook};
use crate::{pipeline, utils, Config, ConfigFile, Result};
use anyhow::bail;
use serde::Serialize;
use tracing::{info, warn};

/// Structured output of one generate run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateSummary {
    pub batch_id: i64,
    pub workbook: String,
    pub payloads: Vec<String>,
    pub verdicts: Vec<String>,
    pub all_matched: bool,
}

pub async fn generate(config: Config, args: GenerateArgs) -> Result<Out<GenerateSummary>> {
    let file = config.file();

    let mut source = SourceWorkbook::open(args.source())?;
    let source_grid = source.grid_with_fallback(
        file.amortization_sheet(),
        file.amortization_fallback_sheet(),
    )?;
    let journal_grid = source.grid(file.journal_sheet())?;
    let mappings = load_mappings(args.mapping(), file)?;

    let run_date = chrono::Local::now().date_naive();
    let run = pipeline::run(
        source_grid,
        journal_grid,
        &mappings,
        file,
        args.period(),
        run_date,
    )?;

    // The ledger schema records exactly one US and one Canada payload.
    if run.groups.len() != 2 {
        bail!(
            "Expected exactly two entity groups in the config, found {}",
            run.groups.len()
        );
    }

    let file_name = format!("SBC_Close_{}.xlsx", args.period());
    let workbook_path = config.review().join(&file_name);
    let mut review = ReviewWorkbook::new();
    review.add_pivot_sheet(&run.pivot)?;
    review.add_recon_sheet(&run.report, &run.journal, &run.journal_lines)?;
    for group in &run.groups {
        review.add_entry_sheet(group.group.sheet_name(), &group.lines)?;
    }
    review.save(&workbook_path)?;
    info!("Wrote review workbook to '{}'", workbook_path.display());

    let mut payload_paths = Vec::new();
    for group in &run.groups {
        let path = config.payloads().join(group.group.payload_file());
        utils::write(&path, serde_json::to_string_pretty(&group.payload)?).await?;
        payload_paths.push(path.to_string_lossy().to_string());
    }

    let entry = LedgerEntry {
        id: 0,
        date: run_date.to_string(),
        file_name,
        file_link: workbook_path.to_string_lossy().to_string(),
        payload_us: payload_paths[0].clone(),
        payload_ca: payload_paths[1].clone(),
        ..Default::default()
    };
    let batch_id = config.db().append_entry(&entry).await?;

    let verdicts: Vec<String> = run
        .report
        .rows
        .iter()
        .map(|row| format!("{}: {}", row.label, row.verdict))
        .collect();
    let all_matched = run.report.all_matched();
    let message = if all_matched {
        format!(
            "Generated batch {batch_id} for {}; all reconciliations MATCH",
            args.period()
        )
    } else {
        format!(
            "Generated batch {batch_id} for {}; reconciliation needs review: {}",
            args.period(),
            verdicts.join(", ")
        )
    };
    Ok(Out::new(
        message,
        GenerateSummary {
            batch_id,
            workbook: entry.file_link,
            payloads: payload_paths,
            verdicts,
            all_matched,
        },
    ))
}

/// Loads the four dimension mapping tables. A missing workbook or sheet
/// degrades to an empty table, which resolves every id to 0.
fn load_mappings(path: Option<&std::path::Path>, file: &ConfigFile) -> Result<Mappings> {
    let Some(path) = path else {
        warn!("No mapping workbook given; payload ids will be 0");
        return Ok(Mappings::default());
    };
    if !path.is_file() {
        warn!(
            "The mapping workbook is missing at '{}'; payload ids will be 0",
            path.display()
        );
        return Ok(Mappings::default());
    }

    let mut workbook = SourceWorkbook::open(path)?;
    let mut load = |sheet_name: &str| -> MappingTable {
        let grid = match workbook.grid(sheet_name) {
            Ok(grid) => grid,
            Err(_) => {
                warn!("Mapping sheet '{sheet_name}' is missing; its ids will be 0");
                return MappingTable::default();
            }
        };
        match SheetTable::parse(grid, 0) {
            Ok(table) => MappingTable::parse(&table),
            Err(e) => {
                warn!("Mapping sheet '{sheet_name}' is unreadable ({e}); its ids will be 0");
                MappingTable::default()
            }
        }
    };
    Ok(Mappings {
        account: load(file.account_sheet()),
        dept: load(file.department_sheet()),
        class: load(file.class_sheet()),
        location: load(file.location_sheet()),
    })
}
