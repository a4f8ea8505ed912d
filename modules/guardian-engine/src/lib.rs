pub mod collectors;
pub mod fusion;
pub mod identity;
pub mod reputation;
pub mod scanner;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use fusion::{FusionEngine, FusionWeights, ReputationPolicy, ScoringPolicy, Thresholds};
pub use identity::{CreatorRef, IdentityResolver};
pub use scanner::{vote_weight, Scanner};
pub use store::MemoryStore;
