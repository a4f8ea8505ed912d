pub mod config;
pub mod error;
pub mod types;
pub mod validation;

pub use config::Config;
pub use error::GuardianError;
pub use types::*;
pub use validation::{validate_fingerprint, validate_url, MIN_FINGERPRINT_LEN, MIN_URL_LEN};
