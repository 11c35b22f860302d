//! Ingestion of station readings into the measurement store.
//!
//! A run fetches every configured station, flattens the reports into
//! per-quantity records, drops records whose key is already stored, and
//! appends the rest in one batch.

mod dedup;
mod normalize;
mod pipeline;
mod window;

pub use dedup::*;
pub use normalize::*;
pub use pipeline::*;
pub use window::*;
