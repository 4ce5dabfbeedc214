// src/exec/streams.rs

//! Line forwarding from the child's pipes to the run coordinator.
//!
//! Each pipe gets its own reader task and its own channel, so each channel has
//! exactly one producer and one consumer. The coordinator owns both receivers
//! through [`StreamMux`].

use std::fmt;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

const LINE_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Stdout => f.write_str("stdout"),
            Stream::Stderr => f.write_str("STDERR"),
        }
    }
}

/// Spawn a task forwarding complete lines of `reader` over a channel.
///
/// Invalid UTF-8 is replaced rather than ending the stream. The channel
/// closes when the pipe reaches EOF; a missing pipe yields a closed channel.
pub fn spawn_line_reader<R>(reader: Option<R>, stream: Stream) -> mpsc::Receiver<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<String>(LINE_CHANNEL_CAPACITY);

    let Some(reader) = reader else {
        warn!(%stream, "no pipe available for stream");
        return rx;
    };

    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf)
                        .trim_end_matches(['\n', '\r'])
                        .to_string();
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(%stream, error = %e, "error reading host output");
                    break;
                }
            }
        }

        debug!(%stream, "line reader finished");
    });

    rx
}

/// Both line channels of one child process.
pub struct StreamMux {
    stdout: mpsc::Receiver<String>,
    stderr: mpsc::Receiver<String>,
    stdout_open: bool,
    stderr_open: bool,
}

impl StreamMux {
    pub fn new(stdout: mpsc::Receiver<String>, stderr: mpsc::Receiver<String>) -> Self {
        Self {
            stdout,
            stderr,
            stdout_open: true,
            stderr_open: true,
        }
    }

    /// True once both pipes reached EOF.
    pub fn is_closed(&self) -> bool {
        !self.stdout_open && !self.stderr_open
    }

    /// Next line from whichever stream has one; `None` once both are closed.
    ///
    /// Cancel safe: dropping the future loses no line.
    pub async fn next(&mut self) -> Option<(Stream, String)> {
        loop {
            tokio::select! {
                line = self.stdout.recv(), if self.stdout_open => match line {
                    Some(line) => return Some((Stream::Stdout, line)),
                    None => self.stdout_open = false,
                },
                line = self.stderr.recv(), if self.stderr_open => match line {
                    Some(line) => return Some((Stream::Stderr, line)),
                    None => self.stderr_open = false,
                },
                else => return None,
            }
        }
    }
}
