pub mod sync;

pub use sync::{HttpStore, Session, login, register};
