//! Transport adapter boundary.
//!
//! A [`ReadingSource`] yields raw message payloads in arrival order. How the
//! payloads are obtained (broker subscription, file replay, a pipe) is the
//! adapter's business; the engine only sees bytes or a transport error.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Split};
use tokio::sync::mpsc;

#[async_trait]
pub trait ReadingSource: Send {
    /// Next payload, a transport error, or `None` once the source is exhausted.
    async fn next_message(&mut self) -> Option<Result<Vec<u8>>>;
}

/// Newline-delimited payloads from a file or stdin. Blank lines are skipped.
///
/// Lines are yielded as raw bytes, so a line that is not UTF-8 reaches the
/// validator and is rejected there like any other undecodable payload.
pub struct LinesSource<R> {
    lines: Split<BufReader<R>>,
    failed: bool,
}

impl<R: AsyncRead + Unpin + Send> LinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).split(b'\n'),
            failed: false,
        }
    }
}

impl LinesSource<tokio::fs::File> {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;
        Ok(Self::new(file))
    }
}

impl LinesSource<tokio::io::Stdin> {
    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin())
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> ReadingSource for LinesSource<R> {
    async fn next_message(&mut self) -> Option<Result<Vec<u8>>> {
        if self.failed {
            return None;
        }
        loop {
            match self.lines.next_segment().await {
                Ok(Some(line)) if line.trim_ascii().is_empty() => continue,
                Ok(Some(mut line)) => {
                    if line.last() == Some(&b'\r') {
                        line.pop();
                    }
                    return Some(Ok(line));
                }
                Ok(None) => return None,
                // A read error ends the stream.
                Err(e) => {
                    self.failed = true;
                    return Some(Err(anyhow::Error::new(e).context("Read failed")));
                }
            }
        }
    }
}

/// Payloads pushed by a callback-driven transport client.
#[async_trait]
impl ReadingSource for mpsc::Receiver<Result<Vec<u8>>> {
    async fn next_message(&mut self) -> Option<Result<Vec<u8>>> {
        self.recv().await
    }
}
