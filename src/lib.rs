// Clippy allows for the whole crate
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

//! gatools: signal and interval tools for genome analysis
//!
//! Records are partitioned by chromosome and sorted by start. Query windows
//! walk a partition with a marker-advancing cursor, so a sorted batch of
//! queries costs one forward pass over the signal blocks.
//!
//! # Features
//!
//! - **Chromosome partitions**: keyed by shared chromosome names
//! - **Sweep aggregation**: length-weighted signal sums over windows
//! - **Overlap classification**: peaks of one set against another
//! - **Tools**: RPKM, region signal, summit profiles, summit distances
//!
//! # Example
//!
//! ```rust
//! use gatools::{PartitionSet, SignalRecord, SweepAggregator, Window};
//!
//! let mut signal = PartitionSet::new();
//! signal.add_signal(SignalRecord::new("chr1", 0, 100, 2.0)).unwrap();
//! signal.add_signal(SignalRecord::new("chr1", 100, 200, 4.0)).unwrap();
//! signal.sort();
//!
//! let mut sweep = SweepAggregator::new("chr1", signal.signals("chr1").unwrap());
//! sweep.begin_query(true);
//! let sum = sweep.sum(&Window::new(50, 150).unwrap()).unwrap();
//! assert_eq!(sum, 50.0 * 2.0 + 50.0 * 4.0);
//! ```

pub mod aggregate;
pub mod classify;
pub mod commands;
pub mod config;
pub mod error;
pub mod genome;
pub mod input;
pub mod interval;
pub mod output;
pub mod partition;
pub mod scan;
pub mod sort;
pub mod stats;
pub mod windows;

// Re-export commonly used types
pub use aggregate::{Ratio, SweepAggregator};
pub use classify::OverlapClassifier;
pub use error::{GaError, Result, ScanError};
pub use interval::{IntervalRecord, SignalRecord, Strand, Window};
pub use partition::{ChromosomePartition, PartitionSet};
pub use scan::{MarkerPolicy, OverlapScanner, ScanCursor};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::aggregate::{Ratio, SweepAggregator};
    pub use crate::classify::OverlapClassifier;
    pub use crate::commands::{
        DistCommand, OverlapCommand, ProfileCommand, RegionCommand, RpkmCommand,
    };
    pub use crate::input::{load_signal, load_table, ColumnSpec, SignalFormat, TabularReader};
    pub use crate::interval::{IntervalRecord, SignalRecord, Strand, Window};
    pub use crate::partition::PartitionSet;
    pub use crate::windows::{RegionMode, WindowWalk};
}
