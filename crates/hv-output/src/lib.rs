//! `hv-output` — simulation output writers.
//!
//! Two backends are provided:
//!
//! | Feature   | Backend | Files created                                             |
//! |-----------|---------|-----------------------------------------------------------|
//! | *(none)*  | CSV     | `agent_snapshots.csv`, `hub_scores.csv`, `tick_summaries.csv` |
//! | `sqlite`  | SQLite  | `output.db`                                               |
//!
//! Both implement [`OutputWriter`] and are driven by [`SimOutputObserver`],
//! which implements `hv_sim::SimObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hv_output::{CsvWriter, SimOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = SimOutputObserver::new(writer);
//! sim.run(&mut obs)?;
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SimOutputObserver;
pub use row::{AgentSnapshotRow, HubScoreRow, TickSummaryRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;
