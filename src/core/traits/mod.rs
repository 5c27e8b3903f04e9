pub mod store;

pub use store::{LedgerStore, WriteOp};
