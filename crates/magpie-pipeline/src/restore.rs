//! The restore pipeline: replay a dump into a target database.
//!
//! The dump stream is fed line by line into the replay client's stdin,
//! passing through the same statement fixups the extraction side applies
//! (they are idempotent). The client's stderr is captured so a failure
//! surfaces its own diagnostic text rather than a bare exit code.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::transform::fix_line;

/// Name of the replay client binary.
pub const RESTORE_CLIENT_BINARY: &str = "psql";

/// The replay client used to write dumps into a target database.
#[derive(Clone, Debug)]
pub struct RestoreClient {
    binary: PathBuf,
}

impl Default for RestoreClient {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(RESTORE_CLIENT_BINARY),
        }
    }
}

impl RestoreClient {
    /// The default client, resolved through `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific client binary.
    pub fn with_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary = path.into();
        self
    }

    /// Write a dump stream into the target database.
    ///
    /// The client's input channel is closed on every exit path. A non-zero
    /// exit surfaces as [`PipelineError::Writer`] carrying the client's
    /// stderr text; it takes precedence over a feed-side I/O failure (the
    /// client dying early breaks the pipe, and its own diagnostic is the
    /// more specific failure).
    pub fn write_dump(&self, target_uri: &str, stream: &mut dyn Read) -> PipelineResult<()> {
        debug!(client = %self.binary.display(), "launching replay client");
        let mut child = Command::new(&self.binary)
            .args(["-f", "-"])
            .arg(target_uri)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => PipelineError::Config(format!(
                    "replay client ({}) was not found",
                    self.binary.display()
                )),
                _ => PipelineError::Io(e),
            })?;

        let mut stdin = child.stdin.take().expect("stdin was piped");
        let mut reader = BufReader::new(stream);
        let mut fed: io::Result<()> = Ok(());
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) => break,
                Ok(_) => {
                    if let Err(e) = stdin.write_all(&fix_line(&line)) {
                        fed = Err(e);
                        break;
                    }
                }
                Err(e) => {
                    fed = Err(e);
                    break;
                }
            }
        }
        // Closes the input channel; reached on every exit path above.
        drop(stdin);

        let output = child.wait_with_output()?;
        debug!(status = %output.status, "replay client exited");
        if !output.status.success() {
            let text = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(PipelineError::Writer(text));
        }
        fed.map_err(PipelineError::Io)?;
        Ok(())
    }
}
