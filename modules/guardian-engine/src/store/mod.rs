// Storage behind the ScanStore trait.
//
// MemoryStore keeps everything in process and can round-trip through a JSON
// snapshot file, which is what the CLI uses between invocations.

mod memory;

pub use memory::{MemoryStore, DEFAULT_HISTORY_CAP};
