//! Hybrid public-key encryption: RSA-1024/OAEP-SHA1 plus AES-128-CTR.
//!
//! A payload short enough for one OAEP block is RSA-encrypted directly.
//! Anything longer is split: a fresh 16-byte session key and the head of the
//! payload fill the RSA block, and the tail is encrypted with AES-128-CTR
//! under that session key with a zero IV. The output layout must match the
//! wire protocol byte-for-byte, so the split point is fixed by the RSA block
//! and padding sizes.

use aes::cipher::{KeyIvInit, StreamCipher};
use aes::Aes128;
use ctr::Ctr128BE;
use rand::RngCore;
use rendnet_common::protocol::hybrid::{KEY_LEN, PK_ENC_LEN, PK_PAD_LEN};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use thiserror::Error;

type Aes128Ctr = Ctr128BE<Aes128>;

/// Plaintext bytes that fit in a single OAEP block
const PK_DATA_LEN: usize = PK_ENC_LEN - PK_PAD_LEN;

/// Payload head carried inside the RSA block alongside the session key
const PK_HEAD_LEN: usize = PK_DATA_LEN - KEY_LEN;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("malformed service key: {0}")]
    BadKey(String),

    #[error("public-key encryption failed: {0}")]
    Encrypt(String),

    #[error("public-key decryption failed: {0}")]
    Decrypt(String),

    #[error("ciphertext too short")]
    Truncated,
}

/// Parse a DER-encoded PKCS#1 RSA public key, as found in a descriptor's
/// `service-key` block.
pub fn parse_service_key(der: &[u8]) -> Result<RsaPublicKey, CryptoError> {
    RsaPublicKey::from_pkcs1_der(der).map_err(|err| CryptoError::BadKey(err.to_string()))
}

/// Encrypt `msg` under the service's public key
pub fn hybrid_encrypt(key: &RsaPublicKey, msg: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut rng = rand::thread_rng();

    if msg.len() <= PK_DATA_LEN {
        return key
            .encrypt(&mut rng, Oaep::new::<Sha1>(), msg)
            .map_err(|err| CryptoError::Encrypt(err.to_string()));
    }

    let mut session_key = [0u8; KEY_LEN];
    rng.fill_bytes(&mut session_key);

    let mut block = Vec::with_capacity(PK_DATA_LEN);
    block.extend_from_slice(&session_key);
    block.extend_from_slice(&msg[..PK_HEAD_LEN]);

    let mut out = key
        .encrypt(&mut rng, Oaep::new::<Sha1>(), &block)
        .map_err(|err| CryptoError::Encrypt(err.to_string()))?;

    let mut tail = msg[PK_HEAD_LEN..].to_vec();
    let mut cipher = Aes128Ctr::new(&session_key.into(), &[0u8; 16].into());
    cipher.apply_keystream(&mut tail);
    out.extend_from_slice(&tail);

    Ok(out)
}

/// Inverse of [`hybrid_encrypt`], given the service's private key
pub fn hybrid_decrypt(key: &RsaPrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.len() <= PK_ENC_LEN {
        return key
            .decrypt(Oaep::new::<Sha1>(), ciphertext)
            .map_err(|err| CryptoError::Decrypt(err.to_string()));
    }

    let block = key
        .decrypt(Oaep::new::<Sha1>(), &ciphertext[..PK_ENC_LEN])
        .map_err(|err| CryptoError::Decrypt(err.to_string()))?;
    if block.len() < KEY_LEN {
        return Err(CryptoError::Truncated);
    }

    let mut session_key = [0u8; KEY_LEN];
    session_key.copy_from_slice(&block[..KEY_LEN]);

    let mut out = block[KEY_LEN..].to_vec();
    let mut tail = ciphertext[PK_ENC_LEN..].to_vec();
    let mut cipher = Aes128Ctr::new(&session_key.into(), &[0u8; 16].into());
    cipher.apply_keystream(&mut tail);
    out.extend_from_slice(&tail);

    Ok(out)
}
