//! Tracing compatibility layer for structured logging.
//!
//! - **With `tracing-integration`**: re-exports from the `tracing` crate.
//! - **Without it**: no-op macros that compile to nothing.
//!
//! Reader internals log through this module so that the default build carries
//! no logging dependency at all.
//!
//! ```toml
//! asupersync-bufio = { version = "0.1", features = ["tracing-integration"] }
//! ```

#[cfg(feature = "tracing-integration")]
pub use tracing::{debug, trace, warn};

#[cfg(not(feature = "tracing-integration"))]
mod noop {
    //! No-op implementations when tracing is disabled.

    /// No-op trace-level logging macro.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// No-op debug-level logging macro.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// No-op warn-level logging macro.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }

    pub use crate::{debug, trace, warn};
}

#[cfg(not(feature = "tracing-integration"))]
pub use noop::*;
