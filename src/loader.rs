//! Map payloads and the decode pipeline.
//!
//! A payload travels base64 → (AES-GCM) → PGM → RGBA. Metadata comes from
//! the embedded YAML descriptor when present, otherwise one meter per pixel
//! with the origin at zero. The pipeline is all-or-nothing: it either
//! yields a complete [`LoadedMap`] or an error, never a partial raster.
//!
//! Loads are sequenced with [`LoadGate`]: every new request takes a fresh
//! [`LoadTicket`] and only the newest ticket may install its result.

#[cfg(test)]
#[path = "loader_test.rs"]
mod loader_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crypto;
use crate::descriptor::MapDescriptor;
use crate::error::{DecryptionError, LoadError};
use crate::pgm;
use crate::raster::RasterImage;
use crate::transform::MapMetadata;

/// Inbound map payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapPayload {
    /// PGM bytes or AES-GCM ciphertext, base64 encoded.
    pub pgm_base64: String,
    #[serde(default)]
    pub encrypted: bool,
    #[serde(default)]
    pub encryption: Option<EncryptionParams>,
    /// Optional map-server YAML descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_yaml: Option<String>,
}

/// Key material for an encrypted payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionParams {
    pub key_base64: String,
    pub iv_base64: String,
}

impl MapPayload {
    /// An unencrypted payload with no descriptor.
    #[must_use]
    pub fn plain(pgm_base64: impl Into<String>) -> Self {
        Self { pgm_base64: pgm_base64.into(), encrypted: false, encryption: None, map_yaml: None }
    }

    /// Extract the map from a robot-state telemetry snapshot.
    ///
    /// Reads `map_data.map_pgm_base64`, `map_data.encrypted`,
    /// `map_data.encryption.{keyBase64,ivBase64}` and `map_data.map_yaml`.
    /// Returns `None` when the snapshot carries no map.
    #[must_use]
    pub fn from_robot_state(state: &Value) -> Option<Self> {
        let map_data = state.get("map_data")?;
        let pgm_base64 = map_data.get("map_pgm_base64")?.as_str()?;
        if pgm_base64.trim().is_empty() {
            return None;
        }
        let encryption = map_data.get("encryption").and_then(|e| {
            Some(EncryptionParams {
                key_base64: e.get("keyBase64")?.as_str()?.to_owned(),
                iv_base64: e.get("ivBase64")?.as_str()?.to_owned(),
            })
        });
        Some(Self {
            pgm_base64: pgm_base64.to_owned(),
            encrypted: map_data.get("encrypted").and_then(Value::as_bool).unwrap_or(false),
            encryption,
            map_yaml: map_data.get("map_yaml").and_then(Value::as_str).map(str::to_owned),
        })
    }
}

/// A fully decoded map, ready to install.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedMap {
    pub meta: MapMetadata,
    pub raster: RasterImage,
}

/// Run the full decode pipeline.
///
/// # Errors
///
/// Returns a [`LoadError`] for bad base64, missing or wrong key material,
/// a failed authentication tag, a malformed PGM, or an invalid descriptor.
pub fn decode_payload(payload: &MapPayload) -> Result<LoadedMap, LoadError> {
    let mut bytes = crypto::decode_base64(&payload.pgm_base64)?;

    if payload.encrypted {
        let params = payload.encryption.as_ref().ok_or(DecryptionError::MissingParameters)?;
        let key = decode_param(&params.key_base64)?;
        let iv = decode_param(&params.iv_base64)?;
        bytes = crypto::decrypt(&bytes, &key, &iv)?;
    }

    let gray = pgm::decode(&bytes)?;
    let meta = match payload.map_yaml.as_deref() {
        Some(yaml) => MapDescriptor::from_yaml(yaml)?.metadata(gray.width, gray.height)?,
        None => MapMetadata::unit(gray.width, gray.height),
    };
    let raster = RasterImage::from_gray(&gray, meta.negate());
    Ok(LoadedMap { meta, raster })
}

fn decode_param(value: &str) -> Result<Vec<u8>, LoadError> {
    if crypto::normalize_base64(value).is_empty() {
        return Err(DecryptionError::MissingParameters.into());
    }
    crypto::decode_base64(value)
}

/// Proof that a load was requested; only the newest ticket is honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    #[must_use]
    pub fn generation(self) -> u64 {
        self.generation
    }
}

/// Generation counter that lets newer loads supersede in-flight ones.
#[derive(Debug, Clone, Default)]
pub struct LoadGate {
    generation: u64,
}

impl LoadGate {
    /// Start a new load, invalidating every earlier ticket.
    pub fn issue(&mut self) -> LoadTicket {
        self.generation += 1;
        LoadTicket { generation: self.generation }
    }

    /// Whether `ticket` belongs to the most recent load request.
    #[must_use]
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.generation == self.generation
    }
}
