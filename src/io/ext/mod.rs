//! Extension traits and future adapters for byte sources.
//!
//! # Cancel safety
//!
//! - [`ReadSome`] is cancel-safe: a dropped future leaves the source and the
//!   destination untouched beyond what the source itself already wrote.

mod source_ext;

pub use source_ext::{ByteSourceExt, ReadSome};
