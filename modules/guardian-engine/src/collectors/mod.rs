// Signal collectors. Each one's public `collect` never fails: every upstream
// error, timeout or missing credential degrades to a named neutral signal.

pub mod community;
pub mod model;
pub mod platform;

pub use community::{aggregate_votes, CommunityCollector};
pub use model::{media_kind, ModelCollector};
pub use platform::PlatformCollector;
