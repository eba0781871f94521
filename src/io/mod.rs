//! Async byte sources and buffered reading.
//!
//! This module provides the [`ByteSource`] trait, the [`BufferedReader`] built
//! on top of it, and a [`Lines`] adapter. Sources follow the same poll-based
//! shape as `AsyncRead` but report end-of-stream as `Ok(None)`, so a zero-byte
//! read is an ordinary short read.
//!
//! # Cancel Safety
//!
//! - `read`, `read_byte`, `read_slice`, `read_line`, `read_string` and `peek`
//!   are cancel-safe: bytes pulled from the source stay buffered.
//! - `read_full` is **not** cancel-safe (the destination may be partially
//!   written).
//! - `read_until` is **not** cancel-safe (bytes from a consumed overflow are
//!   only held by the output vector).
//! - `Lines::next_line` is **not** cancel-safe (joined fragments are held by
//!   the adapter and cleared on the next call).

mod buf_reader;
pub mod ext;
mod lines;
mod source;

pub use buf_reader::{BufferedReader, IntoBufferedReader, LineFragment};
pub use ext::{ByteSourceExt, ReadSome};
pub use lines::Lines;
pub use source::ByteSource;
