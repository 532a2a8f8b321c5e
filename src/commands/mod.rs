//! Command implementations for the `ga` tools.

pub mod dist;
pub mod overlap;
pub mod profile;
pub mod region;
pub mod rpkm;

pub use dist::{Closest, DistCommand};
pub use overlap::{OverlapCommand, OverlapOutputs};
pub use profile::{ProfileCommand, ProfileMatrix, ProfileRow, ProfileTracks};
pub use region::RegionCommand;
pub use rpkm::RpkmCommand;
