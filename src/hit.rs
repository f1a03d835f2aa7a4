//! Zoom-invariant hit-testing against markers and polygon vertices.
//!
//! The pick radius is fixed in screen pixels and converted to map space
//! through the current viewport, so tolerance looks the same at every zoom
//! level. Among candidates within the radius the nearest wins; on an exact
//! tie the most recently added annotation wins.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Point, Viewport};
use crate::doc::{AnnotationId, AnnotationStore, VertexRef, ZoneRef};

/// What a pointer landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Marker(AnnotationId),
    Vertex(VertexRef),
}

/// Test markers first, then vertices.
#[must_use]
pub fn hit_test(map_pt: Point, store: &AnnotationStore, viewport: &Viewport, radius_px: f64) -> Option<Hit> {
    hit_test_marker(map_pt, store, viewport, radius_px)
        .map(Hit::Marker)
        .or_else(|| hit_test_vertex(map_pt, store, viewport, radius_px).map(Hit::Vertex))
}

/// Nearest marker within `radius_px` screen pixels of `map_pt`.
#[must_use]
pub fn hit_test_marker(map_pt: Point, store: &AnnotationStore, viewport: &Viewport, radius_px: f64) -> Option<AnnotationId> {
    let r = viewport.screen_dist_to_map(radius_px);
    nearest(
        store.markers().iter().rev().map(|m| (m.id, m.map)),
        map_pt,
        r * r,
    )
}

/// Nearest vertex within `radius_px` screen pixels of `map_pt`.
///
/// Committed zones are searched newest first, then the polygon in progress.
#[must_use]
pub fn hit_test_vertex(map_pt: Point, store: &AnnotationStore, viewport: &Viewport, radius_px: f64) -> Option<VertexRef> {
    let r = viewport.screen_dist_to_map(radius_px);
    let committed = store.zones().iter().rev().flat_map(|z| {
        z.vertices
            .iter()
            .enumerate()
            .rev()
            .map(move |(index, v)| (VertexRef { zone: ZoneRef::Committed(z.id), index }, v.map))
    });
    let drawing = store
        .drawing()
        .unwrap_or_default()
        .iter()
        .enumerate()
        .rev()
        .map(|(index, v)| (VertexRef { zone: ZoneRef::Drawing, index }, v.map));
    nearest(committed.chain(drawing), map_pt, r * r)
}

/// First candidate with the strictly smallest distance within `max_dist_sq`.
fn nearest<T>(candidates: impl Iterator<Item = (T, Point)>, target: Point, max_dist_sq: f64) -> Option<T> {
    let mut best: Option<(T, f64)> = None;
    for (item, pos) in candidates {
        let d = pos.dist_sq(target);
        if d > max_dist_sq {
            continue;
        }
        if best.as_ref().is_none_or(|(_, best_d)| d < *best_d) {
            best = Some((item, d));
        }
    }
    best.map(|(item, _)| item)
}
