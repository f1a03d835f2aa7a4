//! Base64 normalisation and AES-GCM payload decryption.
//!
//! Map payloads arrive as base64 text, sometimes wrapped in a `data:` URL and
//! sometimes line-wrapped. Encrypted payloads use AES-GCM with the 16-byte
//! authentication tag appended to the ciphertext (the WebCrypto layout).

#[cfg(test)]
#[path = "crypto_test.rs"]
mod crypto_test;

use aes_gcm::aead::Aead;
use aes_gcm::aead::consts::U12;
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm, KeyInit, Nonce};
use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::error::{DecryptionError, LoadError};

type Aes192Gcm = AesGcm<Aes192, U12>;

/// Length of the AES-GCM IV accepted by [`decrypt`].
pub const NONCE_LEN: usize = 12;

/// Standard alphabet; trailing `=` padding is optional.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Strip an optional `data:...;base64,` prefix and all whitespace, and map
/// the URL-safe characters `-` and `_` onto `+` and `/`.
#[must_use]
pub fn normalize_base64(input: &str) -> String {
    let trimmed = input.trim();
    let body = match trimmed.strip_prefix("data:") {
        Some(rest) => rest.rfind(";base64,").map_or(trimmed, |at| &rest[at + ";base64,".len()..]),
        None => trimmed,
    };
    body.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect()
}

/// Decode base64 after [`normalize_base64`]. Padding may be omitted.
///
/// # Errors
///
/// Returns [`LoadError::EmptyPayload`] when nothing is left after
/// normalisation, or [`LoadError::Base64`] for invalid input.
pub fn decode_base64(input: &str) -> Result<Vec<u8>, LoadError> {
    let normalized = normalize_base64(input);
    if normalized.is_empty() {
        return Err(LoadError::EmptyPayload);
    }
    Ok(LENIENT.decode(normalized)?)
}

/// Authenticated AES-GCM decryption with a raw 128/192/256-bit key.
///
/// Never returns partial plaintext: any tag mismatch fails the whole call.
///
/// # Errors
///
/// Returns [`DecryptionError::InvalidKeyLength`] or
/// [`DecryptionError::InvalidNonceLength`] for malformed parameters and
/// [`DecryptionError::Authentication`] when the tag does not verify.
pub fn decrypt(ciphertext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, DecryptionError> {
    if iv.len() != NONCE_LEN {
        return Err(DecryptionError::InvalidNonceLength(iv.len()));
    }
    let nonce = Nonce::<U12>::from_slice(iv);
    let invalid_key = |_| DecryptionError::InvalidKeyLength(key.len());

    let plain = match key.len() {
        16 => Aes128Gcm::new_from_slice(key).map_err(invalid_key)?.decrypt(nonce, ciphertext),
        24 => Aes192Gcm::new_from_slice(key).map_err(invalid_key)?.decrypt(nonce, ciphertext),
        32 => Aes256Gcm::new_from_slice(key).map_err(invalid_key)?.decrypt(nonce, ciphertext),
        other => return Err(DecryptionError::InvalidKeyLength(other)),
    };
    plain.map_err(|_| DecryptionError::Authentication)
}
