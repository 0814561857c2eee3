//! Builds the accounting entry lines for one legal-entity group.
//!
//! Each group gets a summary line crediting the equity account for the
//! group's total expense, then one allocation line per aggregated row
//! debiting (or crediting, for negative amounts) the personnel expense
//! account. The book balances within the group by construction.

use crate::model::{Amount, EntryLine};
use crate::pipeline::pivot::PivotTable;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregated amounts under one cent are treated as rounding noise and do
/// not produce an allocation line.
fn minimum_allocation() -> Amount {
    Amount::new(Decimal::new(1, 2))
}

/// The fixed chart-of-accounts strings used on generated entries. These were
/// constants in the workbook process they replace; they are configuration so
/// a run can be parameterized and tests can isolate them.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChartOfAccounts {
    /// Equity account credited by the summary line.
    pub summary_account: String,
    /// Expense account used by every allocation line.
    pub allocation_account: String,
    pub summary_dept: String,
    pub summary_location: String,
    pub summary_class: String,
}

impl Default for ChartOfAccounts {
    fn default() -> Self {
        Self {
            summary_account:
                "30245 Equity : Additional Paid In Capital : APIC - Stock Option Compensation"
                    .to_string(),
            allocation_account: "60175 Personnel : Stock Option Compensation".to_string(),
            summary_dept: "0000 Corporate".to_string(),
            summary_location: "1 San Francisco".to_string(),
            summary_class: "601 Horizontal".to_string(),
        }
    }
}

/// Builds the entry lines for the subset of `pivot` rows whose entity is in
/// `entities`. The summary line comes first; allocation lines follow in
/// pivot order. Rows with `|expense| < 0.01` are silently dropped.
pub fn build(
    pivot: &PivotTable,
    entities: &[String],
    suffix: &str,
    chart: &ChartOfAccounts,
) -> Vec<EntryLine> {
    let subset: Vec<_> = pivot
        .rows
        .iter()
        .filter(|r| entities.iter().any(|e| e == &r.key.entity))
        .collect();

    let total: Amount = subset.iter().map(|r| r.measures.expense).sum();

    let mut lines = vec![EntryLine {
        account: chart.summary_account.clone(),
        debit: Amount::ZERO,
        credit: total,
        entity: entities.first().cloned().unwrap_or_default(),
        dept: chart.summary_dept.clone(),
        location: chart.summary_location.clone(),
        class: chart.summary_class.clone(),
        description: format!("SBC Expense Accrual - {suffix}"),
    }];

    for row in subset {
        let amount = row.measures.expense;
        if amount.abs() < minimum_allocation() {
            continue;
        }
        let (debit, credit) = if amount.is_positive() {
            (amount, Amount::ZERO)
        } else {
            (Amount::ZERO, amount.abs())
        };
        lines.push(EntryLine {
            account: chart.allocation_account.clone(),
            debit,
            credit,
            entity: row.key.entity.clone(),
            dept: row.key.dept.clone(),
            location: row.key.location.clone(),
            class: row.key.class.clone(),
            description: "SBC Expense Allocation".to_string(),
        });
    }

    lines
}
