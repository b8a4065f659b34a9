//! Input/output helpers.
//!
//! - upload decoding (transport string -> table) (`decode`)
//! - interchange JSON + points CSV exports (`export`)

pub mod decode;
pub mod export;

pub use decode::*;
pub use export::*;
