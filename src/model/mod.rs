//! Types that represent the core data model, such as `Amount`, `EntryLine`
//! and the journal-entry `Payload`.

mod amount;
mod entry;
mod header;
mod ledger;
mod mapping;
mod payload;
pub(crate) mod table;

pub use amount::Amount;
pub use entry::{EntryLine, ENTRY_COLUMNS};
pub use header::{normalize_header, HeaderMap};
pub use ledger::{ApprovalStatus, LedgerEntry, PushStatus};
pub use mapping::{MappingTable, Mappings};
pub use payload::{Payload, PayloadLine, PENDING_APPROVAL};
pub use table::{SheetTable, HEADER_OFFSET};
