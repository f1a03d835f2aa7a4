#![allow(clippy::float_cmp)]

use super::*;

const OFFICE: &str = "\
image: office.pgm
resolution: 0.05
origin: [-12.4, -8.2, 0.0]
negate: 0
occupied_thresh: 0.65
free_thresh: 0.196
";

#[test]
fn parses_full_descriptor() {
    let d = MapDescriptor::from_yaml(OFFICE).unwrap();
    assert_eq!(d.image.as_deref(), Some("office.pgm"));
    assert_eq!(d.resolution, 0.05);
    assert_eq!(d.origin, vec![-12.4, -8.2, 0.0]);
    assert!(!d.negate);
    assert_eq!(d.occupied_thresh, 0.65);
    assert_eq!(d.free_thresh, 0.196);
}

#[test]
fn thresholds_and_image_default() {
    let d = MapDescriptor::from_yaml("resolution: 0.1\norigin: [0, 0, 0]\n").unwrap();
    assert_eq!(d.image, None);
    assert_eq!(d.occupied_thresh, 0.65);
    assert_eq!(d.free_thresh, 0.196);
    assert!(!d.negate);
}

#[test]
fn negate_accepts_int_and_bool() {
    let d = MapDescriptor::from_yaml("resolution: 1\norigin: [0, 0, 0]\nnegate: 1\n").unwrap();
    assert!(d.negate);
    let d = MapDescriptor::from_yaml("resolution: 1\norigin: [0, 0, 0]\nnegate: true\n").unwrap();
    assert!(d.negate);
}

#[test]
fn missing_resolution_is_an_error() {
    assert!(MapDescriptor::from_yaml("origin: [0, 0, 0]\n").is_err());
}

#[test]
fn metadata_uses_raster_dimensions() {
    let d = MapDescriptor::from_yaml(OFFICE).unwrap();
    let m = d.metadata(384, 256).unwrap();
    assert_eq!(m.width(), 384);
    assert_eq!(m.height(), 256);
    assert_eq!(m.resolution(), 0.05);
    assert_eq!(m.origin(), Pose::new(-12.4, -8.2, 0.0));
}

#[test]
fn two_component_origin_has_zero_heading() {
    let d = MapDescriptor::from_yaml("resolution: 0.5\norigin: [1.5, 2.5]\n").unwrap();
    assert_eq!(d.origin_pose().unwrap(), Pose::new(1.5, 2.5, 0.0));
}

#[test]
fn wrong_origin_arity_is_rejected() {
    let d = MapDescriptor::from_yaml("resolution: 0.5\norigin: [1.5]\n").unwrap();
    assert_eq!(d.metadata(1, 1).unwrap_err(), MetadataError::OriginArity(1));
}

#[test]
fn invalid_resolution_is_rejected_at_metadata_time() {
    let d = MapDescriptor::from_yaml("resolution: 0\norigin: [0, 0, 0]\n").unwrap();
    assert_eq!(d.metadata(1, 1).unwrap_err(), MetadataError::InvalidResolution(0.0));
}
