//! Filter composition and the read-side measurement service.

mod filter;
mod service;

pub use filter::*;
pub use service::*;
