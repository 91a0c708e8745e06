//! Vocabulary domain: word models, the memory-state machine, and the
//! persistent word store.

pub mod memory;
mod models;
mod store;

pub use memory::{transition, MemoryState, ReviewOutcome};
pub use models::{CapturedWord, Definition, ReviewLogEntry, WordContext, WordItem, WordPatch};
pub use store::{StoreError, WordStore};
