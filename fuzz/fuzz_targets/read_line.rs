//! Fuzz target for buffered line reading.
//!
//! The first bytes of the input choose the buffer capacity and a chunking
//! pattern; the rest is the stream. Line fragments are joined and compared
//! against a plain split on LF, looking for panics, lost bytes, or hangs.
//!
//! # Running
//! ```bash
//! cargo +nightly fuzz run fuzz_read_line
//! ```

#![no_main]

use asupersync_bufio::{BufferedReader, ByteSource};
use futures_lite::future::block_on;
use libfuzzer_sys::fuzz_target;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Delivers `data` in chunks cycling through `pattern` (zero means an empty read).
struct Chunked<'a> {
    data: &'a [u8],
    pattern: &'a [u8],
    next: usize,
}

impl ByteSource for Chunked<'_> {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<Option<usize>>> {
        let this = self.get_mut();
        if this.data.is_empty() {
            return Poll::Ready(Ok(None));
        }
        let size = usize::from(this.pattern[this.next % this.pattern.len()] % 32);
        this.next += 1;
        let n = size.min(buf.len()).min(this.data.len());
        buf[..n].copy_from_slice(&this.data[..n]);
        this.data = &this.data[n..];
        Poll::Ready(Ok(Some(n)))
    }
}

fuzz_target!(|input: &[u8]| {
    if input.len() < 3 {
        return;
    }
    let capacity = usize::from(input[0]);
    let pattern_len = usize::from(input[1] % 8) + 1;
    if input.len() < 2 + pattern_len {
        return;
    }
    let mut pattern = input[2..2 + pattern_len].to_vec();
    // Guarantee progress within the retry bound.
    pattern.push(1);
    let data = &input[2 + pattern_len..];

    let source = Chunked {
        data,
        pattern: &pattern,
        next: 0,
    };
    let mut reader = BufferedReader::with_capacity(capacity, source);

    let mut lines: Vec<Vec<u8>> = Vec::new();
    let mut current = Vec::new();
    block_on(async {
        while let Some(fragment) = reader.read_line().await.expect("in-memory source") {
            current.extend_from_slice(&fragment.line);
            if !fragment.more {
                lines.push(std::mem::take(&mut current));
            }
        }
    });
    if !current.is_empty() {
        lines.push(current);
    }

    let expected: Vec<Vec<u8>> = data
        .split_inclusive(|&b| b == b'\n')
        .map(|line| match line {
            [rest @ .., b'\r', b'\n'] | [rest @ .., b'\n'] => rest.to_vec(),
            _ => line.to_vec(),
        })
        .collect();
    assert_eq!(lines, expected);
});
