//! Defines the data structures and models used throughout the application.
//!
//! Includes the raw station payload fetched from the upstream API (`tecdottir`)
//! and the flattened records stored and queried by the service (`measurement`).

mod measurement;
mod tecdottir;

pub use measurement::*;
pub use tecdottir::*;
