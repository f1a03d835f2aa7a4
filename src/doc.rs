//! Annotation model: markers, polygon zones, and the in-memory store.
//!
//! Annotations live in map (raster pixel) space. Positions keep their
//! fractional precision so repeated drags never drift; `world` is derived
//! from the rounded pixel through [`MapMetadata`] whenever a position is
//! committed. Without metadata, markers cannot be placed and zone vertices
//! carry no world position.
//!
//! The polygon under construction is held apart from the committed zones
//! until it is finished with at least three vertices.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::Point;
use crate::transform::{MapMetadata, WorldPoint};

/// Unique identifier for a marker or zone.
pub type AnnotationId = Uuid;

/// Fewest vertices a committed zone may have.
pub const MIN_ZONE_VERTICES: usize = 3;

/// A single polygon vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Fractional map-space position.
    pub map: Point,
    /// World position of the rounded pixel, when metadata was available.
    pub world: Option<WorldPoint>,
}

/// A named point annotation (waypoint).
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: AnnotationId,
    /// Display label, `WP-<n>` unless renamed.
    pub name: String,
    pub map: Point,
    pub world: Option<WorldPoint>,
}

/// A committed polygon annotation. Vertex order defines the boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: AnnotationId,
    pub vertices: Vec<Vertex>,
}

impl Zone {
    /// World positions of every vertex, or `None` if any vertex lacks one.
    #[must_use]
    pub fn world_points(&self) -> Option<Vec<WorldPoint>> {
        self.vertices.iter().map(|v| v.world).collect()
    }
}

/// Which polygon a vertex belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneRef {
    /// A committed zone.
    Committed(AnnotationId),
    /// The polygon currently being drawn.
    Drawing,
}

/// Address of one vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexRef {
    pub zone: ZoneRef,
    pub index: usize,
}

/// Exported waypoint in world coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

/// Exported zone in world coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneExport {
    pub id: AnnotationId,
    pub points: Vec<WorldPoint>,
}

/// Snapshot published to the command channel.
///
/// Serializes as `{"type":"annotations","waypoints":[..],"zones":[..],"timestamp":..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "annotations")]
pub struct AnnotationExport {
    pub waypoints: Vec<Waypoint>,
    pub zones: Vec<ZoneExport>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl AnnotationExport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty() && self.zones.is_empty()
    }
}

/// In-memory store of markers, committed zones, and the polygon in progress.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    markers: Vec<Marker>,
    zones: Vec<Zone>,
    drawing: Option<Vec<Vertex>>,
    markers_created: u32,
}

impl AnnotationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Markers ─────────────────────────────────────────────────

    /// Place a marker at `map`. Returns `None` and does nothing without metadata.
    pub fn add_marker(&mut self, map: Point, meta: Option<&MapMetadata>) -> Option<AnnotationId> {
        let meta = meta?;
        self.markers_created += 1;
        let marker = Marker {
            id: Uuid::new_v4(),
            name: format!("WP-{}", self.markers_created),
            map,
            world: Some(meta.world_at(map)),
        };
        let id = marker.id;
        self.markers.push(marker);
        Some(id)
    }

    /// Move a marker and recompute its world position. Returns false if it doesn't exist.
    pub fn move_marker(&mut self, id: AnnotationId, map: Point, meta: Option<&MapMetadata>) -> bool {
        let Some(marker) = self.markers.iter_mut().find(|m| m.id == id) else {
            return false;
        };
        marker.map = map;
        marker.world = meta.map(|m| m.world_at(map));
        true
    }

    /// Change a marker's display label. Returns false if it doesn't exist.
    pub fn rename_marker(&mut self, id: AnnotationId, name: impl Into<String>) -> bool {
        let Some(marker) = self.markers.iter_mut().find(|m| m.id == id) else {
            return false;
        };
        marker.name = name.into();
        true
    }

    /// Remove a marker by id, returning it if it was present.
    pub fn remove_marker(&mut self, id: AnnotationId) -> Option<Marker> {
        let idx = self.markers.iter().position(|m| m.id == id)?;
        Some(self.markers.remove(idx))
    }

    #[must_use]
    pub fn marker(&self, id: AnnotationId) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    /// Markers in creation order.
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    // ── Polygons ────────────────────────────────────────────────

    /// Start a fresh polygon at `map`, discarding any polygon in progress.
    pub fn begin_polygon(&mut self, map: Point) {
        self.drawing = Some(vec![Vertex { map, world: None }]);
    }

    /// Append a vertex to the polygon in progress, starting one if needed.
    pub fn add_vertex(&mut self, map: Point) {
        self.drawing.get_or_insert_with(Vec::new).push(Vertex { map, world: None });
    }

    /// Commit the polygon in progress as a zone.
    ///
    /// Does nothing and returns `None` when fewer than three vertices are
    /// staged; the staged vertices are kept. World positions are computed
    /// for every vertex when metadata is present.
    pub fn finish_polygon(&mut self, meta: Option<&MapMetadata>) -> Option<AnnotationId> {
        if self.drawing.as_ref().map_or(0, Vec::len) < MIN_ZONE_VERTICES {
            return None;
        }
        let mut vertices = self.drawing.take()?;
        for v in &mut vertices {
            v.world = meta.map(|m| m.world_at(v.map));
        }
        let zone = Zone { id: Uuid::new_v4(), vertices };
        let id = zone.id;
        self.zones.push(zone);
        Some(id)
    }

    /// Drop the polygon in progress. Returns false if none was being drawn.
    pub fn cancel_polygon(&mut self) -> bool {
        self.drawing.take().is_some()
    }

    /// Vertices of the polygon in progress.
    #[must_use]
    pub fn drawing(&self) -> Option<&[Vertex]> {
        self.drawing.as_deref()
    }

    /// Move one vertex and recompute its world position.
    ///
    /// Vertices of the polygon in progress keep no world position until it
    /// is finished. Returns false if the vertex doesn't exist.
    pub fn move_vertex(&mut self, vertex: VertexRef, map: Point, meta: Option<&MapMetadata>) -> bool {
        let (slot, world) = match vertex.zone {
            ZoneRef::Committed(id) => {
                let Some(zone) = self.zones.iter_mut().find(|z| z.id == id) else {
                    return false;
                };
                (zone.vertices.get_mut(vertex.index), meta.map(|m| m.world_at(map)))
            }
            ZoneRef::Drawing => (self.drawing.as_mut().and_then(|d| d.get_mut(vertex.index)), None),
        };
        let Some(v) = slot else {
            return false;
        };
        v.map = map;
        v.world = world;
        true
    }

    #[must_use]
    pub fn vertex(&self, vertex: VertexRef) -> Option<&Vertex> {
        match vertex.zone {
            ZoneRef::Committed(id) => self.zone(id)?.vertices.get(vertex.index),
            ZoneRef::Drawing => self.drawing.as_ref()?.get(vertex.index),
        }
    }

    /// Remove a zone by id, returning it if it was present.
    pub fn remove_zone(&mut self, id: AnnotationId) -> Option<Zone> {
        let idx = self.zones.iter().position(|z| z.id == id)?;
        Some(self.zones.remove(idx))
    }

    #[must_use]
    pub fn zone(&self, id: AnnotationId) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == id)
    }

    /// Committed zones in creation order.
    #[must_use]
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    // ── Whole store ─────────────────────────────────────────────

    /// Discard all markers, zones, and the polygon in progress. Marker numbering restarts.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Recompute every committed world position against new metadata.
    pub fn rebind(&mut self, meta: &MapMetadata) {
        for marker in &mut self.markers {
            marker.world = Some(meta.world_at(marker.map));
        }
        for v in self.zones.iter_mut().flat_map(|z| z.vertices.iter_mut()) {
            v.world = Some(meta.world_at(v.map));
        }
    }

    /// Number of markers plus committed zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len() + self.zones.len()
    }

    /// Returns `true` if there are no markers, zones, or polygon in progress.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.drawing.is_none()
    }

    /// Serializable snapshot in world coordinates.
    ///
    /// Entities without a world position are omitted.
    #[must_use]
    pub fn export(&self, timestamp: u64) -> AnnotationExport {
        let waypoints = self
            .markers
            .iter()
            .filter_map(|m| {
                let w = m.world?;
                Some(Waypoint { name: m.name.clone(), x: w.x, y: w.y })
            })
            .collect();
        let zones = self
            .zones
            .iter()
            .filter_map(|z| Some(ZoneExport { id: z.id, points: z.world_points()? }))
            .collect();
        AnnotationExport { waypoints, zones, timestamp }
    }
}
