pub mod error;
pub mod protocol;
pub mod types;

pub use error::HsError;
pub use types::{DescriptorId, Fingerprint, FingerprintError, DESC_ID_LEN, FINGERPRINT_LEN};
