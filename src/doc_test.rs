#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use serde_json::json;

use super::*;
use crate::transform::Pose;

fn meta() -> MapMetadata {
    MapMetadata::new(0.05, Pose::default(), 100, 100, false).unwrap()
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn store_with_triangle(meta: Option<&MapMetadata>) -> (AnnotationStore, AnnotationId) {
    let mut store = AnnotationStore::new();
    store.begin_polygon(pt(10.0, 10.0));
    store.add_vertex(pt(20.0, 10.0));
    store.add_vertex(pt(15.0, 20.0));
    let id = store.finish_polygon(meta).unwrap();
    (store, id)
}

// =============================================================
// Markers
// =============================================================

#[test]
fn add_marker_without_metadata_is_noop() {
    let mut store = AnnotationStore::new();
    assert_eq!(store.add_marker(pt(5.0, 5.0), None), None);
    assert!(store.markers().is_empty());
    assert!(store.is_empty());
}

#[test]
fn add_marker_computes_world_from_rounded_pixel() {
    let m = meta();
    let mut store = AnnotationStore::new();
    let id = store.add_marker(pt(49.7, 50.2), Some(&m)).unwrap();
    let marker = store.marker(id).unwrap();
    assert_eq!(store.markers().len(), 1);
    assert_eq!(marker.map, pt(49.7, 50.2));
    assert_eq!(marker.world, Some(m.pixel_to_world(50, 50)));
}

#[test]
fn markers_are_numbered_in_creation_order() {
    let m = meta();
    let mut store = AnnotationStore::new();
    let a = store.add_marker(pt(1.0, 1.0), Some(&m)).unwrap();
    let b = store.add_marker(pt(2.0, 2.0), Some(&m)).unwrap();
    assert_eq!(store.marker(a).unwrap().name, "WP-1");
    assert_eq!(store.marker(b).unwrap().name, "WP-2");
}

#[test]
fn numbering_does_not_reuse_names_after_removal() {
    let m = meta();
    let mut store = AnnotationStore::new();
    let a = store.add_marker(pt(1.0, 1.0), Some(&m)).unwrap();
    store.add_marker(pt(2.0, 2.0), Some(&m));
    store.remove_marker(a);
    let c = store.add_marker(pt(3.0, 3.0), Some(&m)).unwrap();
    assert_eq!(store.marker(c).unwrap().name, "WP-3");
}

#[test]
fn move_marker_keeps_fractional_position_and_updates_world() {
    let m = meta();
    let mut store = AnnotationStore::new();
    let id = store.add_marker(pt(10.0, 10.0), Some(&m)).unwrap();
    assert!(store.move_marker(id, pt(30.4, 60.6), Some(&m)));
    let marker = store.marker(id).unwrap();
    assert_eq!(marker.map, pt(30.4, 60.6));
    assert_eq!(marker.world, Some(m.pixel_to_world(30, 61)));
}

#[test]
fn move_unknown_marker_returns_false() {
    let mut store = AnnotationStore::new();
    assert!(!store.move_marker(Uuid::new_v4(), pt(0.0, 0.0), None));
}

#[test]
fn rename_and_remove_marker() {
    let m = meta();
    let mut store = AnnotationStore::new();
    let id = store.add_marker(pt(1.0, 1.0), Some(&m)).unwrap();
    assert!(store.rename_marker(id, "Dock"));
    assert_eq!(store.marker(id).unwrap().name, "Dock");
    assert_eq!(store.remove_marker(id).map(|m| m.name), Some("Dock".to_owned()));
    assert!(store.remove_marker(id).is_none());
    assert!(!store.rename_marker(id, "Gone"));
}

// =============================================================
// Polygons
// =============================================================

#[test]
fn finish_with_two_vertices_is_guarded() {
    let mut store = AnnotationStore::new();
    store.begin_polygon(pt(0.0, 0.0));
    store.add_vertex(pt(5.0, 0.0));
    assert_eq!(store.finish_polygon(Some(&meta())), None);
    assert!(store.zones().is_empty());
    assert_eq!(store.drawing().map(<[Vertex]>::len), Some(2));
}

#[test]
fn finish_with_three_vertices_commits_zone() {
    let m = meta();
    let (store, id) = store_with_triangle(Some(&m));
    assert!(store.drawing().is_none());
    let zone = store.zone(id).unwrap();
    assert_eq!(zone.vertices.len(), 3);
    assert_eq!(zone.vertices[0].map, pt(10.0, 10.0));
    assert_eq!(zone.vertices[2].world, Some(m.pixel_to_world(15, 20)));
}

#[test]
fn finish_without_polygon_returns_none() {
    let mut store = AnnotationStore::new();
    assert_eq!(store.finish_polygon(None), None);
}

#[test]
fn zone_without_metadata_has_no_world_points() {
    let (store, id) = store_with_triangle(None);
    assert_eq!(store.zone(id).unwrap().world_points(), None);
}

#[test]
fn add_vertex_starts_polygon_when_none() {
    let mut store = AnnotationStore::new();
    store.add_vertex(pt(1.0, 2.0));
    assert_eq!(store.drawing().map(<[Vertex]>::len), Some(1));
}

#[test]
fn begin_polygon_discards_previous_drawing() {
    let mut store = AnnotationStore::new();
    store.add_vertex(pt(1.0, 2.0));
    store.add_vertex(pt(3.0, 4.0));
    store.begin_polygon(pt(9.0, 9.0));
    assert_eq!(store.drawing().unwrap(), &[Vertex { map: pt(9.0, 9.0), world: None }]);
}

#[test]
fn cancel_polygon() {
    let mut store = AnnotationStore::new();
    assert!(!store.cancel_polygon());
    store.add_vertex(pt(1.0, 2.0));
    assert!(store.cancel_polygon());
    assert!(store.drawing().is_none());
}

#[test]
fn move_committed_vertex_updates_world() {
    let m = meta();
    let (mut store, id) = store_with_triangle(Some(&m));
    let vref = VertexRef { zone: ZoneRef::Committed(id), index: 1 };
    assert!(store.move_vertex(vref, pt(70.2, 40.9), Some(&m)));
    let v = store.vertex(vref).unwrap();
    assert_eq!(v.map, pt(70.2, 40.9));
    assert_eq!(v.world, Some(m.pixel_to_world(70, 41)));
}

#[test]
fn move_drawing_vertex() {
    let mut store = AnnotationStore::new();
    store.add_vertex(pt(1.0, 1.0));
    let vref = VertexRef { zone: ZoneRef::Drawing, index: 0 };
    assert!(store.move_vertex(vref, pt(4.0, 4.0), Some(&meta())));
    assert_eq!(store.vertex(vref), Some(&Vertex { map: pt(4.0, 4.0), world: None }));
}

#[test]
fn move_vertex_out_of_range_returns_false() {
    let (mut store, id) = store_with_triangle(None);
    assert!(!store.move_vertex(VertexRef { zone: ZoneRef::Committed(id), index: 3 }, pt(0.0, 0.0), None));
    assert!(!store.move_vertex(VertexRef { zone: ZoneRef::Committed(Uuid::new_v4()), index: 0 }, pt(0.0, 0.0), None));
    assert!(!store.move_vertex(VertexRef { zone: ZoneRef::Drawing, index: 0 }, pt(0.0, 0.0), None));
}

#[test]
fn remove_zone() {
    let (mut store, id) = store_with_triangle(None);
    assert!(store.remove_zone(id).is_some());
    assert!(store.zones().is_empty());
    assert!(store.remove_zone(id).is_none());
}

// =============================================================
// Whole store
// =============================================================

#[test]
fn clear_discards_everything_and_restarts_numbering() {
    let m = meta();
    let (mut store, _) = store_with_triangle(Some(&m));
    store.add_marker(pt(1.0, 1.0), Some(&m));
    store.add_vertex(pt(3.0, 3.0));
    store.clear();
    assert!(store.is_empty());
    assert_eq!(store.len(), 0);
    let id = store.add_marker(pt(1.0, 1.0), Some(&m)).unwrap();
    assert_eq!(store.marker(id).unwrap().name, "WP-1");
}

#[test]
fn rebind_recomputes_world_positions() {
    let m = meta();
    let (mut store, zone_id) = store_with_triangle(None);
    let marker_id = store.add_marker(pt(50.0, 50.0), Some(&m)).unwrap();

    let shifted = MapMetadata::new(0.1, Pose::new(1.0, 2.0, 0.0), 100, 100, false).unwrap();
    store.rebind(&shifted);

    assert_eq!(store.marker(marker_id).unwrap().world, Some(shifted.pixel_to_world(50, 50)));
    let zone = store.zone(zone_id).unwrap();
    assert_eq!(zone.vertices[0].world, Some(shifted.pixel_to_world(10, 10)));
}

// =============================================================
// Export
// =============================================================

#[test]
fn export_uses_world_coordinates() {
    let m = meta();
    let (mut store, zone_id) = store_with_triangle(Some(&m));
    store.add_marker(pt(50.0, 50.0), Some(&m));
    let export = store.export(1_700_000_000_000);

    assert_eq!(export.waypoints.len(), 1);
    assert_eq!(export.waypoints[0].name, "WP-1");
    assert!((export.waypoints[0].x - 2.525).abs() < 1e-9);
    assert!((export.waypoints[0].y - 2.475).abs() < 1e-9);
    assert_eq!(export.zones.len(), 1);
    assert_eq!(export.zones[0].id, zone_id);
    assert_eq!(export.zones[0].points.len(), 3);
}

#[test]
fn export_omits_entities_without_world() {
    let (store, _) = store_with_triangle(None);
    let export = store.export(0);
    assert!(export.zones.is_empty());
    assert!(export.is_empty());
}

#[test]
fn export_ignores_polygon_in_progress() {
    let mut store = AnnotationStore::new();
    store.add_vertex(pt(1.0, 1.0));
    assert!(store.export(0).is_empty());
}

#[test]
fn export_serializes_with_type_tag() {
    let export = AnnotationExport {
        waypoints: vec![Waypoint { name: "WP-1".into(), x: 1.5, y: -2.0 }],
        zones: vec![],
        timestamp: 42,
    };
    let value = serde_json::to_value(&export).unwrap();
    assert_eq!(
        value,
        json!({
            "type": "annotations",
            "waypoints": [{ "name": "WP-1", "x": 1.5, "y": -2.0 }],
            "zones": [],
            "timestamp": 42
        })
    );
    let back: AnnotationExport = serde_json::from_value(value).unwrap();
    assert_eq!(back, export);
}
