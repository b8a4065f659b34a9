//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the generic row-oriented [`Table`] and its [`Cell`] values
//! - the normalized price observation ([`PricePoint`])
//! - the dashboard filter state ([`Selection`]) and its fixed domains

pub mod table;
pub mod types;

pub use table::*;
pub use types::*;
