//! Turns entry lines into the JSON payloads the accounting system accepts.
//!
//! Every dimension string on an entry line is resolved to an external id
//! through the mapping tables; unresolved dimensions go through as 0 and are
//! expected to be caught during review. Amounts are rounded to cents and
//! near-zero lines are dropped.

use crate::model::{Amount, EntryLine, Mappings, Payload, PayloadLine};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

/// Lines whose rounded debit and credit are both at or below this threshold
/// carry no accounting information and are omitted from the payload.
fn negligible() -> Amount {
    Amount::new(Decimal::new(1, 3))
}

/// The transaction date for a close run: the last calendar day of the month
/// preceding `today`.
pub fn last_day_of_previous_month(today: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
        .unwrap_or(today)
        .pred_opt()
        .unwrap_or(today)
}

/// Builds the payload for one subsidiary from its entry lines.
pub fn generate(
    lines: &[EntryLine],
    mappings: &Mappings,
    subsidiary: i64,
    tran_date: NaiveDate,
    memo: &str,
) -> Payload {
    let mut payload = Payload::new(subsidiary, tran_date, memo);
    for line in lines {
        let debit = line.debit.round_cents();
        // Exactly one side per line; when an input carries both, the debit
        // side wins and the credit is forced to zero.
        let credit = if debit.is_positive() {
            Amount::ZERO
        } else {
            line.credit.round_cents()
        };
        if debit.abs() <= negligible() && credit.abs() <= negligible() {
            continue;
        }
        payload.lines.push(PayloadLine {
            account: mappings.account.lookup(&line.account),
            debit,
            credit,
            department: mappings.dept.lookup(&line.dept),
            class: mappings.class.lookup(&line.class),
            location: mappings.location.lookup(&line.location),
            memo: line.description.clone(),
            entity: 0,
        });
    }
    payload
}

/// Appends, for every line carrying an amount, a mirrored line with debit and
/// credit swapped and the memo suffixed. Afterward total debit equals total
/// credit, which is the invariant the external system enforces on posting.
/// This doubles the line count; the mirrored lines are the period carry of
/// the accrual.
pub fn balance(payload: &mut Payload) {
    let mirrored: Vec<PayloadLine> = payload
        .lines
        .iter()
        .filter(|line| line.debit.is_positive() || line.credit.is_positive())
        .map(|line| PayloadLine {
            account: line.account,
            debit: line.credit,
            credit: line.debit,
            department: line.department,
            class: line.class,
            location: line.location,
            memo: format!("{} (balance)", line.memo),
            entity: line.entity,
        })
        .collect();
    payload.lines.extend(mirrored);
}
