//! Error types for map loading, publishing, and configuration.
//!
//! Load errors never escape the engine: [`crate::engine::EngineCore::finish_load`]
//! converts them into a status message and keeps the previous map. The other
//! error types are returned to the host as-is.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

// =============================================================================
// DECODING
// =============================================================================

/// The PGM byte stream is malformed or unsupported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// The first token is not `P2` or `P5`.
    #[error("unsupported PGM magic: {0:?}")]
    UnsupportedMagic(String),
    /// The header ended before the named field.
    #[error("missing PGM header field: {0}")]
    MissingHeaderField(&'static str),
    /// A header field is not a positive integer in range.
    #[error("invalid PGM header field {field}: {value:?}")]
    InvalidHeaderField { field: &'static str, value: String },
    /// Fewer pixel bytes or tokens than `width * height` samples require.
    #[error("truncated PGM pixel data: expected {expected}, found {available}")]
    Truncated { expected: usize, available: usize },
    /// An ASCII sample is not an integer.
    #[error("invalid PGM sample {index}: {token:?}")]
    InvalidSample { index: usize, token: String },
    /// `width * height` does not fit in memory addressing.
    #[error("PGM dimensions overflow")]
    DimensionsOverflow,
}

/// Authenticated decryption of a map payload failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecryptionError {
    /// The payload is flagged encrypted but carries no key/IV.
    #[error("encrypted payload is missing key or iv")]
    MissingParameters,
    /// The key is not 16, 24, or 32 bytes.
    #[error("invalid AES key length: {0} bytes")]
    InvalidKeyLength(usize),
    /// The IV is not 12 bytes.
    #[error("invalid AES-GCM iv length: {0} bytes")]
    InvalidNonceLength(usize),
    /// The authentication tag did not verify (wrong key, wrong IV, or tampered data).
    #[error("AES-GCM authentication failed")]
    Authentication,
}

/// Map metadata violates its invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetadataError {
    /// Resolution must be finite and strictly positive.
    #[error("invalid map resolution: {0}")]
    InvalidResolution(f64),
    /// Origin components must be finite.
    #[error("map origin is not finite")]
    NonFiniteOrigin,
    /// The descriptor's `origin` does not have two or three components.
    #[error("map origin must have 2 or 3 components, found {0}")]
    OriginArity(usize),
}

/// Any failure between receiving a map payload and producing a raster.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The payload carried no map data.
    #[error("empty map payload")]
    EmptyPayload,
    /// A base64 field could not be decoded.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The decoded bytes are not a valid PGM.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// The ciphertext could not be decrypted.
    #[error(transparent)]
    Decryption(#[from] DecryptionError),
    /// The map metadata is invalid.
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    /// The embedded YAML descriptor could not be parsed.
    #[error("invalid map descriptor: {0}")]
    Descriptor(#[from] serde_yaml::Error),
    /// The decoded raster could not be staged for drawing.
    #[error("map bitmap upload failed: {0}")]
    Upload(String),
}

// =============================================================================
// PUBLISHING
// =============================================================================

/// Annotations could not be sent to the robot.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The command channel reports no connection.
    #[error("not connected to the command channel")]
    NotConnected,
    /// No map metadata is loaded, so no world coordinates exist.
    #[error("no map loaded")]
    NoMap,
    /// There are no waypoints or zones with world coordinates.
    #[error("no annotations to publish")]
    NothingToPublish,
    /// The export payload could not be serialized.
    #[error("failed to serialize annotations: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The channel rejected the message.
    #[error("publish failed: {0}")]
    Channel(String),
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// An engine configuration value is malformed or out of range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A value could not be parsed or is out of its allowed range.
    #[error("invalid {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
    /// The zoom limits are not `0 < min < max`.
    #[error("invalid zoom range: min {min}, max {max}")]
    ZoomRange { min: f64, max: f64 },
}
