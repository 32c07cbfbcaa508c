//! The extraction pipeline: launch the export tool and expose its
//! sanitized output as one byte stream.
//!
//! The exporter is a separate binary that connects to the source database,
//! anonymizes the data, and writes SQL to stdout while reporting progress
//! and errors on stderr. Both channels are drained concurrently through a
//! [`StreamMultiplexer`]; accepted data lines pass through [`fix_line`] and
//! reach the consumer as a single `std::io::Read` stream.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use tracing::{debug, trace};

use crate::adapter::ChunkReader;
use crate::error::{PipelineError, PipelineResult};
use crate::multiplex::StreamMultiplexer;
use crate::transform::fix_line;

/// Name of the export tool binary.
pub const EXPORTER_BINARY: &str = "klepto";

/// Default path of the export tool's configuration file.
pub const DEFAULT_EXPORTER_CONFIG: &str = "klepto.toml";

/// Marker identifying a diagnostic line as an error.
const ERROR_SENTINEL: &str = "error:";

/// The sentinel is only honored within this many leading bytes of a
/// diagnostic line. Matches the exporter's actual message format; widening
/// it would misclassify progress lines that mention errors further in.
const SENTINEL_WINDOW: usize = 15;

/// How long the control loop parks between polls of the reader queues.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Configuration for launching the export tool.
#[derive(Clone, Debug)]
pub struct ExporterConfig {
    /// Path to the exporter binary.
    pub binary: PathBuf,
    /// Path to the exporter's own configuration file.
    pub config_path: PathBuf,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            binary: locate_exporter(),
            config_path: PathBuf::from(DEFAULT_EXPORTER_CONFIG),
        }
    }
}

impl ExporterConfig {
    /// Use a specific exporter configuration file.
    pub fn with_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }

    /// Use a specific exporter binary.
    pub fn with_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary = path.into();
        self
    }

    /// Pre-flight validation of the exporter configuration file. Runs
    /// before any subprocess is started.
    fn validate(&self) -> PipelineResult<()> {
        let path = &self.config_path;
        if !path.exists() {
            return Err(PipelineError::Config(format!(
                "exporter config ({}) was not found",
                path.display()
            )));
        }
        if !path.is_file() {
            return Err(PipelineError::Config(format!(
                "exporter config ({}) needs to be a file",
                path.display()
            )));
        }
        Ok(())
    }
}

/// Find the exporter binary in the usual locations, falling back to a bare
/// name resolved through `PATH` at spawn time.
fn locate_exporter() -> PathBuf {
    let candidates = [
        format!("/usr/local/bin/{EXPORTER_BINARY}"),
        format!("/usr/bin/{EXPORTER_BINARY}"),
    ];
    for candidate in candidates {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return path;
        }
    }
    PathBuf::from(EXPORTER_BINARY)
}

/// The fixed exporter argument template.
fn exporter_args(source_uri: &str, config: &Path) -> Vec<std::ffi::OsString> {
    [
        "steal",
        "--from",
        source_uri,
        "--to",
        "os://stdout/",
        "--read-max-conns",
        "10",
        "--concurrency",
        "4",
        "--read-timeout",
        "20m",
        "--config",
    ]
    .into_iter()
    .map(Into::into)
    .chain(std::iter::once(config.as_os_str().to_os_string()))
    .collect()
}

/// Returns `true` if the diagnostic line carries the error sentinel within
/// its leading window.
fn has_error_sentinel(line: &[u8]) -> bool {
    let window = &line[..line.len().min(SENTINEL_WINDOW)];
    String::from_utf8_lossy(window)
        .to_lowercase()
        .contains(ERROR_SENTINEL)
}

/// One in-flight extraction: the exporter process plus its two readers.
struct ExtractionRun {
    child: Child,
    mux: StreamMultiplexer,
    failure: Option<String>,
}

impl ExtractionRun {
    /// Produce the next chunk of transformed data, or `None` once both
    /// channels reached eof. Diagnostic lines are scanned as they arrive;
    /// after a sentinel match no data is emitted, even lines already
    /// queued.
    fn next_chunk(&mut self) -> Option<io::Result<Vec<u8>>> {
        loop {
            for line in self.mux.diag.drain_available() {
                if self.failure.is_none() && has_error_sentinel(&line) {
                    let text = String::from_utf8_lossy(&line).trim_end().to_string();
                    debug!(diagnostic = %text, "exporter reported an error, stopping readers");
                    self.mux.stop_all();
                    self.failure = Some(text);
                } else {
                    trace!(diagnostic = %String::from_utf8_lossy(&line).trim_end());
                }
            }

            let lines = self.mux.data.drain_available();
            if self.failure.is_none() && !lines.is_empty() {
                let mut chunk = Vec::with_capacity(lines.iter().map(Vec::len).sum());
                for line in lines {
                    chunk.extend_from_slice(&fix_line(&line));
                }
                return Some(Ok(chunk));
            }

            if self.mux.both_eof() {
                return None;
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    /// Tear the run down on every exit path: stop and join both readers
    /// (closing the subprocess output handles), reap the child, and report
    /// any captured diagnostic.
    fn finish(mut self) -> Option<String> {
        self.mux.stop_all();
        if !self.mux.both_eof() {
            // A reader parked in a blocking read only wakes when its pipe
            // closes; reaping the exporter guarantees the joins below
            // terminate.
            let _ = self.child.kill();
        }
        self.mux.join_all();
        match self.child.wait() {
            Ok(status) => debug!(%status, "exporter exited"),
            Err(e) => debug!(error = %e, "failed to reap exporter"),
        }
        self.failure
    }
}

/// Chunk iterator over an extraction run, feeding the [`ChunkReader`].
struct RunChunks<'a>(&'a mut ExtractionRun);

impl Iterator for RunChunks<'_> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next_chunk()
    }
}

/// Extract a sanitized dump from the source database and hand the byte
/// stream to `consume`.
///
/// The exporter's configuration file is validated before anything else; a
/// missing binary or config is a configuration error and no subprocess is
/// started. On every exit path (normal completion, consumer-side failure,
/// diagnostic sentinel) both output handles are closed, both readers are
/// joined, and the exporter is reaped. A captured diagnostic produces
/// [`PipelineError::Extraction`] carrying the text verbatim and takes
/// precedence over the consumer's result.
pub fn extract<T, F>(config: &ExporterConfig, source_uri: &str, consume: F) -> PipelineResult<T>
where
    F: FnOnce(&mut dyn Read) -> io::Result<T>,
{
    config.validate()?;

    debug!(exporter = %config.binary.display(), "launching exporter");
    let mut child = Command::new(&config.binary)
        .args(exporter_args(source_uri, &config.config_path))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => PipelineError::Config(format!(
                "exporter binary ({}) was not found",
                config.binary.display()
            )),
            _ => PipelineError::Io(e),
        })?;

    let stdout = child.stdout.take().expect("stdout was piped");
    let stderr = child.stderr.take().expect("stderr was piped");
    let mux = StreamMultiplexer::start(stdout, stderr);
    let mut run = ExtractionRun {
        child,
        mux,
        failure: None,
    };

    let result = {
        let mut stream = ChunkReader::new(RunChunks(&mut run));
        consume(&mut stream)
    };

    if let Some(text) = run.finish() {
        return Err(PipelineError::Extraction(text));
    }
    result.map_err(PipelineError::Io)
}
