#![allow(dead_code)]
#![allow(unused_imports)]
//! Shared integration test utilities.
//!
//! Import with:
//! ```
//! mod common;
//! use common::*;
//! ```

use asupersync_bufio::ByteSource;
use proptest::prelude::ProptestConfig;
use proptest::test_runner::RngSeed;
use std::collections::VecDeque;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Once;
use std::task::{Context, Poll};
use tracing_subscriber::fmt::format::FmtSpan;

static INIT_LOGGING: Once = Once::new();

/// Default seed for property tests when running under CI.
pub const DEFAULT_PROPTEST_SEED: u64 = 0x5EED_5EED;

const PROPTEST_SEED_ENV: &str = "ASUPERSYNC_PROPTEST_SEED";
const PROPTEST_MAX_SHRINK_ITERS_ENV: &str = "ASUPERSYNC_PROPTEST_MAX_SHRINK_ITERS";

/// Configuration for property tests with optional deterministic seed support.
#[derive(Debug, Clone)]
pub struct PropertyTestConfig {
    /// Fixed seed for reproducibility (overrides CI default when set).
    pub seed: Option<u64>,
    /// Number of successful cases required.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl PropertyTestConfig {
    /// Build a config with defaults for property tests.
    #[must_use]
    pub fn new(cases: u32) -> Self {
        Self {
            seed: read_proptest_seed(),
            cases,
            max_shrink_iters: read_max_shrink_iters()
                .unwrap_or(ProptestConfig::default().max_shrink_iters),
        }
    }

    /// Convert into a ProptestConfig, applying deterministic seed rules.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        let mut config = ProptestConfig::with_cases(self.cases);

        // Honor existing PROPTEST_RNG_SEED, otherwise apply our own.
        if matches!(config.rng_seed, RngSeed::Random) {
            if let Some(seed) = self.seed {
                config.rng_seed = RngSeed::Fixed(seed);
            }
        }

        config.max_shrink_iters = self.max_shrink_iters;
        config
    }
}

/// Build a ProptestConfig with deterministic seed support for CI.
#[must_use]
pub fn test_proptest_config(cases: u32) -> ProptestConfig {
    PropertyTestConfig::new(cases).to_proptest_config()
}

fn read_proptest_seed() -> Option<u64> {
    if let Ok(value) = std::env::var(PROPTEST_SEED_ENV) {
        return value.parse::<u64>().ok();
    }

    if std::env::var("CI").is_ok() {
        return Some(DEFAULT_PROPTEST_SEED);
    }

    None
}

fn read_max_shrink_iters() -> Option<u32> {
    std::env::var(PROPTEST_MAX_SHRINK_ITERS_ENV)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
}

/// Initialize test logging with trace-level output.
pub fn init_test_logging() {
    init_test_logging_with_level(tracing::Level::TRACE);
}

/// Initialize test logging with a custom level.
pub fn init_test_logging_with_level(level: tracing::Level) {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .try_init();
    });
}

/// Run async test code to completion on the current thread.
pub fn run_test<F, Fut>(f: F) -> Fut::Output
where
    F: FnOnce() -> Fut,
    Fut: Future,
{
    init_test_logging();
    futures_lite::future::block_on(f())
}

/// Log a test phase transition with a visual separator.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(phase = %$name, "========================================");
        tracing::info!(phase = %$name, "TEST PHASE: {}", $name);
        tracing::info!(phase = %$name, "========================================");
    };
}

/// Log a section within a test phase.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        tracing::debug!(section = %$name, "--- {} ---", $name);
    };
}

/// Log test completion with summary.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully: {}", $name);
    };
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            test = %$name,
            $($key = %$value,)*
            "test completed successfully: {}",
            $name
        );
    };
}

/// Log before assertions for context.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        tracing::debug!(
            expected = ?$expected,
            actual = ?$actual,
            "Asserting: {}",
            $msg
        );
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}

/// A byte source that delivers its data in a fixed pattern of chunk sizes.
///
/// A chunk size of zero produces an empty read; the pattern repeats until the
/// data is exhausted, after which the source reports end-of-stream. Optionally
/// every read is preceded by one `Poll::Pending`.
#[derive(Debug)]
pub struct ChunkedSource {
    data: VecDeque<u8>,
    pattern: Vec<usize>,
    next: usize,
    pending_between: bool,
    pending_now: bool,
    reads: usize,
}

impl ChunkedSource {
    /// Creates a source that delivers `data` following `pattern`.
    ///
    /// An empty pattern delivers everything the caller asks for.
    #[must_use]
    pub fn new(data: &[u8], pattern: &[usize]) -> Self {
        Self {
            data: data.iter().copied().collect(),
            pattern: pattern.to_vec(),
            next: 0,
            pending_between: false,
            pending_now: false,
            reads: 0,
        }
    }

    /// Interleaves a `Poll::Pending` before every read.
    #[must_use]
    pub fn with_pending(mut self) -> Self {
        self.pending_between = true;
        self.pending_now = true;
        self
    }

    /// Number of completed reads, including empty ones.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads
    }

    fn next_chunk(&mut self, region: usize) -> usize {
        if self.pattern.is_empty() {
            return region;
        }
        let size = self.pattern[self.next % self.pattern.len()];
        self.next += 1;
        size.min(region)
    }
}

impl ByteSource for ChunkedSource {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<Option<usize>>> {
        let this = self.get_mut();
        if this.pending_now {
            this.pending_now = false;
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }
        this.pending_now = this.pending_between;

        if this.data.is_empty() {
            return Poll::Ready(Ok(None));
        }

        let n = this.next_chunk(buf.len()).min(this.data.len());
        for (slot, byte) in buf.iter_mut().zip(this.data.drain(..n)) {
            *slot = byte;
        }
        this.reads += 1;
        Poll::Ready(Ok(Some(n)))
    }
}

/// A byte source that fails with the given error kind after delivering `data`.
#[derive(Debug)]
pub struct FailingSource {
    data: Vec<u8>,
    kind: io::ErrorKind,
}

impl FailingSource {
    /// Creates a source that yields `data` in one read, then fails.
    #[must_use]
    pub fn new(data: &[u8], kind: io::ErrorKind) -> Self {
        Self {
            data: data.to_vec(),
            kind,
        }
    }
}

impl ByteSource for FailingSource {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<Option<usize>>> {
        let this = self.get_mut();
        if this.data.is_empty() {
            return Poll::Ready(Err(io::Error::new(this.kind, "injected failure")));
        }
        let n = this.data.len().min(buf.len());
        buf[..n].copy_from_slice(&this.data[..n]);
        this.data.drain(..n);
        Poll::Ready(Ok(Some(n)))
    }
}
