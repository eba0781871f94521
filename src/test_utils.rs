//! Test utilities for buffered readers.
//!
//! This module provides shared helpers for unit tests:
//! - Consistent tracing-based logging initialization
//! - Phase macros for readable test output
//! - A scripted [`ByteSource`] for driving short reads, empty reads, pending
//!   polls, errors, and contract violations deterministically

use crate::io::ByteSource;
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Once};
use std::task::{Context, Poll, Wake, Waker};
use tracing_subscriber::fmt::format::FmtSpan;

static INIT_LOGGING: Once = Once::new();

/// Initialize test logging with trace-level output.
///
/// Safe to call multiple times; only initializes once.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .try_init();
    });
}

struct NoopWaker;

impl Wake for NoopWaker {
    fn wake(self: Arc<Self>) {}
}

/// Returns a waker that does nothing.
pub fn noop_waker() -> Waker {
    Waker::from(Arc::new(NoopWaker))
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

/// Log test completion.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully: {}", $name);
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

/// One scripted response from a [`ScriptedSource`].
#[derive(Debug)]
pub enum Step {
    /// Deliver these bytes, split across reads if the region is smaller.
    Data(Vec<u8>),
    /// Report a zero-byte read.
    Empty,
    /// Wake the task and return `Poll::Pending` once.
    Pending,
    /// Report end-of-stream.
    Eof,
    /// Fail with an I/O error of this kind.
    Fail(io::ErrorKind),
    /// Report this many bytes regardless of the region size.
    Overcount(usize),
}

/// A byte source that replays a fixed script of responses.
///
/// Once the script is exhausted every read reports end-of-stream.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    steps: VecDeque<Step>,
    requests: Vec<usize>,
}

impl ScriptedSource {
    /// Creates a source from an explicit script.
    #[must_use]
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
            requests: Vec::new(),
        }
    }

    /// Creates a source that delivers `data` in chunks of at most `chunk` bytes.
    #[must_use]
    pub fn chunked(data: &[u8], chunk: usize) -> Self {
        let chunk = chunk.max(1);
        Self::new(data.chunks(chunk).map(|c| Step::Data(c.to_vec())).collect())
    }

    /// Number of `poll_read` calls that reached the script.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.requests.len()
    }

    /// Region lengths passed to each `poll_read` call.
    #[must_use]
    pub fn requests(&self) -> &[usize] {
        &self.requests
    }
}

impl ByteSource for ScriptedSource {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<Option<usize>>> {
        let this = self.get_mut();
        this.requests.push(buf.len());
        let Some(step) = this.steps.pop_front() else {
            return Poll::Ready(Ok(None));
        };
        match step {
            Step::Data(mut data) => {
                let n = std::cmp::min(data.len(), buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    this.steps.push_front(Step::Data(data.split_off(n)));
                }
                Poll::Ready(Ok(Some(n)))
            }
            Step::Empty => Poll::Ready(Ok(Some(0))),
            Step::Pending => {
                this.requests.pop();
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Step::Eof => Poll::Ready(Ok(None)),
            Step::Fail(kind) => Poll::Ready(Err(io::Error::new(kind, "scripted failure"))),
            Step::Overcount(n) => Poll::Ready(Ok(Some(n))),
        }
    }
}
