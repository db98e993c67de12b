pub mod datatype;
pub mod display;
pub mod error;
pub mod ledger;
pub mod sample_data;
pub mod store;

pub use datatype::*;
pub use display::{ColorKey, display_date, format_display_date};
pub use error::{ErrorKind, LedgerError};
pub use ledger::{Closet, MILES_TOLERANCE, ShoeSummary, check_entry, reindex_selection};
pub use sample_data::sample_closet;
pub use store::{MemoryStore, ShoeStore, StoreError};
