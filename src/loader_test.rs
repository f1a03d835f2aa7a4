#![allow(clippy::float_cmp)]

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::Engine as _;
use serde_json::json;

use super::*;
use crate::error::FormatError;
use crate::transform::Pose;

const KEY: [u8; 32] = [9; 32];
const IV: [u8; 12] = [4; 12];

/// `P5` 2x2 map with samples `[0, 85, 170, 255]`.
fn tiny_pgm() -> Vec<u8> {
    let mut bytes = b"P5\n2 2\n255\n".to_vec();
    bytes.extend_from_slice(&[0, 85, 170, 255]);
    bytes
}

fn b64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn sealed_payload(plain: &[u8]) -> MapPayload {
    let ciphertext = Aes256Gcm::new_from_slice(&KEY)
        .unwrap()
        .encrypt(Nonce::<U12>::from_slice(&IV), plain)
        .unwrap();
    MapPayload {
        pgm_base64: b64(&ciphertext),
        encrypted: true,
        encryption: Some(EncryptionParams { key_base64: b64(&KEY), iv_base64: b64(&IV) }),
        map_yaml: None,
    }
}

// =============================================================
// Payload model
// =============================================================

#[test]
fn payload_deserializes_camel_case() {
    let payload: MapPayload = serde_json::from_value(json!({
        "pgmBase64": "UDI=",
        "encrypted": true,
        "encryption": { "keyBase64": "a2V5", "ivBase64": "aXY=" }
    }))
    .unwrap();
    assert_eq!(payload.pgm_base64, "UDI=");
    assert!(payload.encrypted);
    assert_eq!(payload.encryption.unwrap().iv_base64, "aXY=");
    assert_eq!(payload.map_yaml, None);
}

#[test]
fn payload_encrypted_defaults_to_false() {
    let payload: MapPayload = serde_json::from_value(json!({ "pgmBase64": "UDI=" })).unwrap();
    assert_eq!(payload, MapPayload::plain("UDI="));
}

#[test]
fn from_robot_state_extracts_map_data() {
    let state = json!({
        "id": "sr1",
        "battery": 81,
        "map_data": {
            "map_pgm_base64": "UDUK",
            "encrypted": true,
            "encryption": { "keyBase64": "k", "ivBase64": "i" },
            "map_yaml": "resolution: 0.05\norigin: [0, 0, 0]\n"
        }
    });
    let payload = MapPayload::from_robot_state(&state).unwrap();
    assert_eq!(payload.pgm_base64, "UDUK");
    assert!(payload.encrypted);
    assert_eq!(
        payload.encryption,
        Some(EncryptionParams { key_base64: "k".into(), iv_base64: "i".into() })
    );
    assert!(payload.map_yaml.is_some());
}

#[test]
fn from_robot_state_without_map_is_none() {
    assert_eq!(MapPayload::from_robot_state(&json!({ "id": "sr1" })), None);
    assert_eq!(MapPayload::from_robot_state(&json!({ "map_data": {} })), None);
    assert_eq!(MapPayload::from_robot_state(&json!({ "map_data": { "map_pgm_base64": "  " } })), None);
}

#[test]
fn from_robot_state_defaults_to_plain() {
    let payload = MapPayload::from_robot_state(&json!({ "map_data": { "map_pgm_base64": "UDUK" } })).unwrap();
    assert_eq!(payload, MapPayload::plain("UDUK"));
}

// =============================================================
// decode_payload
// =============================================================

#[test]
fn decodes_plain_payload_with_unit_metadata() {
    let loaded = decode_payload(&MapPayload::plain(b64(&tiny_pgm()))).unwrap();
    assert_eq!(loaded.meta, MapMetadata::unit(2, 2));
    assert_eq!((loaded.raster.width, loaded.raster.height), (2, 2));
    assert_eq!(loaded.raster.intensity(1, 0), Some(85));
}

#[test]
fn decodes_data_url_payload() {
    let text = format!("data:image/x-portable-graymap;base64,{}", b64(&tiny_pgm()));
    assert!(decode_payload(&MapPayload::plain(text)).is_ok());
}

#[test]
fn decodes_encrypted_payload() {
    let loaded = decode_payload(&sealed_payload(&tiny_pgm())).unwrap();
    assert_eq!(loaded.raster.intensity(1, 1), Some(255));
}

#[test]
fn tampered_ciphertext_fails_authentication() {
    let mut payload = sealed_payload(&tiny_pgm());
    let mut raw = base64::engine::general_purpose::STANDARD.decode(&payload.pgm_base64).unwrap();
    raw[3] ^= 0x40;
    payload.pgm_base64 = b64(&raw);
    assert!(matches!(
        decode_payload(&payload),
        Err(LoadError::Decryption(DecryptionError::Authentication))
    ));
}

#[test]
fn encrypted_without_params_is_an_error() {
    let mut payload = sealed_payload(&tiny_pgm());
    payload.encryption = None;
    assert!(matches!(
        decode_payload(&payload),
        Err(LoadError::Decryption(DecryptionError::MissingParameters))
    ));
}

#[test]
fn encrypted_with_blank_key_is_missing_parameters() {
    let mut payload = sealed_payload(&tiny_pgm());
    if let Some(params) = payload.encryption.as_mut() {
        params.key_base64 = "  ".into();
    }
    assert!(matches!(
        decode_payload(&payload),
        Err(LoadError::Decryption(DecryptionError::MissingParameters))
    ));
}

#[test]
fn unencrypted_payload_ignores_encryption_params() {
    let mut payload = MapPayload::plain(b64(&tiny_pgm()));
    payload.encryption = Some(EncryptionParams { key_base64: "bogus".into(), iv_base64: "bogus".into() });
    assert!(decode_payload(&payload).is_ok());
}

#[test]
fn bad_magic_is_a_format_error() {
    let err = decode_payload(&MapPayload::plain(b64(b"P6\n1 1\n255\n\0\0\0"))).unwrap_err();
    assert!(matches!(err, LoadError::Format(FormatError::UnsupportedMagic(_))));
}

#[test]
fn empty_payload_is_an_error() {
    assert!(matches!(decode_payload(&MapPayload::plain("")), Err(LoadError::EmptyPayload)));
}

#[test]
fn descriptor_supplies_metadata_and_negate() {
    let mut payload = MapPayload::plain(b64(&tiny_pgm()));
    payload.map_yaml = Some("resolution: 0.05\norigin: [-1.0, 2.0, 0.0]\nnegate: 1\n".into());
    let loaded = decode_payload(&payload).unwrap();
    assert_eq!(loaded.meta.resolution(), 0.05);
    assert_eq!(loaded.meta.origin(), Pose::new(-1.0, 2.0, 0.0));
    assert!(loaded.meta.negate());
    assert_eq!(loaded.raster.intensity(0, 0), Some(255));
}

#[test]
fn invalid_descriptor_fails_whole_load() {
    let mut payload = MapPayload::plain(b64(&tiny_pgm()));
    payload.map_yaml = Some("resolution: -1\norigin: [0, 0, 0]\n".into());
    assert!(matches!(decode_payload(&payload), Err(LoadError::Metadata(_))));
    payload.map_yaml = Some("origin: [0, 0".into());
    assert!(matches!(decode_payload(&payload), Err(LoadError::Descriptor(_))));
}

// =============================================================
// LoadGate
// =============================================================

#[test]
fn newest_ticket_is_current() {
    let mut gate = LoadGate::default();
    let first = gate.issue();
    assert!(gate.is_current(first));
    let second = gate.issue();
    assert!(!gate.is_current(first));
    assert!(gate.is_current(second));
    assert!(second.generation() > first.generation());
}
