use std::time::Duration;

/// Hidden-service descriptor constants
pub mod descriptor {
    /// Decoded length of an onion address (bytes)
    pub const SERVICE_ID_LEN: usize = 10;

    /// Number of descriptor replicas spread over the directory ring
    pub const REPLICA_COUNT: u8 = 2;

    /// Directories responsible per replica (ring successors)
    pub const RING_SPREAD: usize = 3;

    /// Descriptor identifiers rotate once per period, staggered per service
    pub const ROTATION_PERIOD_SECS: u64 = 86400;
}

/// Introduction handshake constants
pub mod handshake {
    /// Protocol version byte of the INTRODUCE1 inner handshake
    pub const VERSION: u8 = 2;

    /// Rendezvous cookie length (bytes)
    pub const REND_COOKIE_LEN: usize = 20;

    /// Diffie-Hellman public value length (bytes)
    pub const DH_LEN: usize = 128;

    /// Relay command carrying the introduction request
    pub const RELAY_COMMAND_INTRODUCE1: u8 = 34;
}

/// Hybrid public-key encryption constants (RSA-1024 / OAEP-SHA1 / AES-128-CTR)
pub mod hybrid {
    /// RSA ciphertext block length (bytes)
    pub const PK_ENC_LEN: usize = 128;

    /// OAEP-SHA1 padding overhead (bytes)
    pub const PK_PAD_LEN: usize = 42;

    /// Symmetric session key length (bytes)
    pub const KEY_LEN: usize = 16;
}

/// Fixed wait for a directory stream to deliver its response and close.
/// Deliberately short: a directory either answers promptly or the candidate
/// is skipped.
pub const DIR_RESPONSE_TIMEOUT: Duration = Duration::from_secs(1);
