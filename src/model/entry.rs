//! Journal-entry line records produced by the entry builder.

use crate::model::Amount;

/// The fixed, ordered columns of an entry sheet. Any line field that is
/// missing is written as an empty cell.
pub const ENTRY_COLUMNS: [&str; 8] = [
    "Account",
    "Debit",
    "Credit",
    "Entity",
    "Dept",
    "Location",
    "Class",
    "Description",
];

/// One accounting line in an entity-group entry sheet. Exactly one of
/// `debit`/`credit` is nonzero for well-formed lines.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct EntryLine {
    pub account: String,
    pub debit: Amount,
    pub credit: Amount,
    pub entity: String,
    pub dept: String,
    pub location: String,
    pub class: String,
    pub description: String,
}

impl EntryLine {
    /// Converts the line to a row of cell text in [`ENTRY_COLUMNS`] order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.account.clone(),
            self.debit.value().to_string(),
            self.credit.value().to_string(),
            self.entity.clone(),
            self.dept.clone(),
            self.location.clone(),
            self.class.clone(),
            self.description.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_row_order_matches_columns() {
        let line = EntryLine {
            account: "60175 Personnel : Stock Option Compensation".into(),
            debit: Amount::clean("59.997"),
            credit: Amount::ZERO,
            entity: "Gusto Inc Global : Gusto Inc US".into(),
            dept: "0000 Corporate".into(),
            location: "1 San Francisco".into(),
            class: "601 Horizontal".into(),
            description: "SBC Expense Allocation".into(),
        };
        let row = line.to_row();
        assert_eq!(row.len(), ENTRY_COLUMNS.len());
        assert_eq!(row[0], "60175 Personnel : Stock Option Compensation");
        assert_eq!(row[1], "59.997");
        assert_eq!(row[2], "0");
        assert_eq!(row[7], "SBC Expense Allocation");
    }
}
