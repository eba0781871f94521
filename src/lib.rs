//! Asupersync bufio: buffered async reading over byte sources.
//!
//! # Overview
//!
//! [`BufferedReader`] sits in front of any [`ByteSource`] and turns its short,
//! irregular reads into the operations protocol parsers want: exact reads,
//! single bytes, delimiter scans, line reads and look-ahead.
//!
//! # Core Guarantees
//!
//! - **Bounded retries**: a source that keeps returning zero bytes fails with
//!   [`Error::NoProgress`] instead of spinning forever
//! - **No silent drops**: every error that interrupts a partially read value
//!   carries the bytes consumed so far
//! - **Zero-copy scanning**: delimiter and line reads return views into the
//!   internal buffer; the borrow checker keeps them from outliving a refill
//! - **Explicit end-of-stream**: sources report EOF as `Ok(None)`, never as a
//!   zero count
//!
//! # Module Structure
//!
//! - [`io`]: The `ByteSource` trait, the buffered reader and the line adapter
//! - [`config`]: Buffer sizing and retry configuration
//! - [`error`]: Error types
//! - [`tracing_compat`]: Optional structured logging
//!
//! # Example
//!
//! ```
//! use asupersync_bufio::BufferedReader;
//!
//! # futures_lite::future::block_on(async {
//! let mut reader = BufferedReader::new(&b"GET / HTTP/1.1\r\nHost: a\r\n"[..]);
//! let method = reader.read_string(' ').await?;
//! assert_eq!(method.as_deref(), Some("GET "));
//! # Ok::<(), asupersync_bufio::Error>(())
//! # }).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]

pub mod config;
pub mod error;
pub mod io;
pub mod tracing_compat;

#[cfg(test)]
mod test_utils;

// Re-exports for convenient access to core types
pub use config::{ReaderConfig, DEFAULT_BUF_SIZE, MAX_CONSECUTIVE_EMPTY_READS, MIN_BUF_SIZE};
pub use error::{Error, Recoverability, Result};
pub use io::{BufferedReader, ByteSource, ByteSourceExt, IntoBufferedReader, LineFragment, Lines};
