//! Extraction and restore pipelines for magpie.
//!
//! The extraction side launches the external export tool, drains its two
//! output channels concurrently so neither can stall the other, passes data
//! lines through the statement fixups, and exposes the result as one
//! `std::io::Read` stream:
//!
//! ```text
//! exporter stdout ─ LineReader ─┐
//!                               ├─ control loop ─ fix_line ─ ChunkReader
//! exporter stderr ─ LineReader ─┘      │
//!                                      └─ error-sentinel scan
//! ```
//!
//! The restore side feeds a dump stream, fixed line by line, into the
//! replay client's stdin and surfaces its stderr on failure.

pub mod adapter;
pub mod error;
pub mod extract;
pub mod multiplex;
pub mod restore;
pub mod transform;

pub use adapter::ChunkReader;
pub use error::{PipelineError, PipelineResult};
pub use extract::{extract, ExporterConfig, DEFAULT_EXPORTER_CONFIG};
pub use multiplex::{LineReader, StreamMultiplexer};
pub use restore::RestoreClient;
pub use transform::fix_line;
