#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn meta(resolution: f64, origin: Pose, width: u32, height: u32) -> MapMetadata {
    MapMetadata::new(resolution, origin, width, height, false).unwrap()
}

// =============================================================
// Construction
// =============================================================

#[test]
fn new_rejects_non_positive_resolution() {
    assert_eq!(
        MapMetadata::new(0.0, Pose::default(), 10, 10, false).unwrap_err(),
        MetadataError::InvalidResolution(0.0)
    );
    assert!(MapMetadata::new(-0.05, Pose::default(), 10, 10, false).is_err());
    assert!(MapMetadata::new(f64::NAN, Pose::default(), 10, 10, false).is_err());
}

#[test]
fn new_rejects_non_finite_origin() {
    let err = MapMetadata::new(0.05, Pose::new(f64::INFINITY, 0.0, 0.0), 10, 10, false).unwrap_err();
    assert_eq!(err, MetadataError::NonFiniteOrigin);
}

#[test]
fn unit_metadata_defaults() {
    let m = MapMetadata::unit(4, 3);
    assert_eq!(m.resolution(), 1.0);
    assert_eq!(m.origin(), Pose::default());
    assert_eq!((m.width(), m.height()), (4, 3));
    assert!(!m.negate());
}

// =============================================================
// pixel_to_world
// =============================================================

#[test]
fn pixel_to_world_reference_scenario() {
    let m = meta(0.05, Pose::default(), 100, 100);
    let w = m.pixel_to_world(50, 50);
    assert!(approx_eq(w.x, 2.525));
    assert!(approx_eq(w.y, 2.475));
}

#[test]
fn bottom_left_pixel_is_half_a_cell_from_origin() {
    let m = meta(0.1, Pose::new(-1.0, 2.0, 0.0), 10, 20);
    let w = m.pixel_to_world(0, 19);
    assert!(approx_eq(w.x, -0.95));
    assert!(approx_eq(w.y, 2.05));
}

#[test]
fn top_row_maps_to_largest_world_y() {
    let m = meta(1.0, Pose::default(), 5, 5);
    assert!(m.pixel_to_world(0, 0).y > m.pixel_to_world(0, 4).y);
    assert_eq!(m.pixel_to_world(0, 0).y, 4.5);
}

#[test]
fn zero_theta_has_no_rotation_error() {
    let m = meta(0.5, Pose::new(3.0, -2.0, 0.0), 8, 8);
    let w = m.pixel_to_world(3, 4);
    assert_eq!(w.x, 3.0 + 3.5 * 0.5);
    assert_eq!(w.y, -2.0 + 3.5 * 0.5);
}

#[test]
fn quarter_turn_rotates_local_axes() {
    let m = meta(1.0, Pose::new(0.0, 0.0, std::f64::consts::FRAC_PI_2), 10, 10);
    // bottom-left pixel: local (0.5, 0.5) -> world (-0.5, 0.5)
    let w = m.pixel_to_world(0, 9);
    assert!(approx_eq(w.x, -0.5));
    assert!(approx_eq(w.y, 0.5));
}

// =============================================================
// world_to_pixel
// =============================================================

#[test]
fn world_to_pixel_reference_scenario() {
    let m = meta(0.05, Pose::default(), 100, 100);
    assert_eq!(m.world_to_pixel(2.525, 2.475), PixelCoord { px: 50, py: 50 });
}

#[test]
fn world_to_pixel_uses_containing_cell() {
    let m = meta(1.0, Pose::default(), 10, 10);
    // Anywhere inside the cell spanning x in [3, 4), y in [2, 3) -> column 3, row 7 from top.
    assert_eq!(m.world_to_pixel(3.1, 2.9), PixelCoord { px: 3, py: 7 });
    assert_eq!(m.world_to_pixel(3.9, 2.1), PixelCoord { px: 3, py: 7 });
}

#[test]
fn world_to_pixel_outside_map_is_out_of_bounds() {
    let m = meta(1.0, Pose::default(), 10, 10);
    let p = m.world_to_pixel(-0.5, 20.0);
    assert_eq!(p.px, -1);
    assert!(p.py < 0);
    assert!(!m.contains(p));
}

// =============================================================
// Round trips
// =============================================================

fn assert_round_trips(m: &MapMetadata) {
    for py in 0..i64::from(m.height()) {
        for px in 0..i64::from(m.width()) {
            let w = m.pixel_to_world(px, py);
            assert_eq!(m.world_to_pixel(w.x, w.y), PixelCoord { px, py }, "pixel ({px}, {py}) with {m:?}");
        }
    }
}

#[test]
fn round_trip_axis_aligned() {
    assert_round_trips(&meta(0.05, Pose::default(), 100, 100));
}

#[test]
fn round_trip_with_offset_origin() {
    assert_round_trips(&meta(0.025, Pose::new(-12.4, 7.85, 0.0), 64, 48));
}

#[test]
fn round_trip_with_rotation() {
    assert_round_trips(&meta(0.05, Pose::new(-3.2, 5.1, 0.7), 40, 30));
}

#[test]
fn round_trip_with_negative_rotation_and_coarse_resolution() {
    assert_round_trips(&meta(0.3, Pose::new(100.0, -50.0, -2.9), 25, 35));
}

// =============================================================
// world_at / contains
// =============================================================

#[test]
fn world_at_rounds_fractional_map_points() {
    let m = meta(0.05, Pose::default(), 100, 100);
    let snapped = m.world_at(Point::new(49.6, 50.4));
    assert_eq!(snapped, m.pixel_to_world(50, 50));
}

#[test]
fn contains_checks_both_axes() {
    let m = MapMetadata::unit(3, 2);
    assert!(m.contains(PixelCoord { px: 0, py: 0 }));
    assert!(m.contains(PixelCoord { px: 2, py: 1 }));
    assert!(!m.contains(PixelCoord { px: 3, py: 1 }));
    assert!(!m.contains(PixelCoord { px: 0, py: -1 }));
}

#[test]
fn extreme_points_saturate_instead_of_overflowing() {
    let m = meta(0.05, Pose::default(), 100, 100);
    let w = m.world_at(Point::new(f64::INFINITY, f64::NEG_INFINITY));
    assert!(w.x.is_finite() && w.y.is_finite());
    assert!(m.pixel_to_world(i64::MAX, i64::MIN).y.is_finite());

    let p = m.world_to_pixel(f64::MAX, -f64::MAX);
    assert_eq!(p, PixelCoord { px: i64::MAX, py: i64::MAX });
    assert!(!m.contains(p));
}
