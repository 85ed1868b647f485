//! Call log: the ordered list of known recordings and the file operations
//! over it (delete, import, export, search).

mod recording;
mod store;

pub use recording::Recording;
pub use store::{CallLogStore, DeleteOutcome};
