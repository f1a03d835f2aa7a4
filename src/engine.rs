//! The map engine: state machine plus browser host.
//!
//! [`EngineCore`] owns the loaded map, viewport, annotations, and gesture
//! state. It has no browser dependencies, so every interaction can be
//! driven from tests. [`Engine`] wraps it with the canvas element and the
//! off-screen map bitmap.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::camera::{Point, Viewport};
use crate::channel::CommandChannel;
use crate::config::EngineConfig;
use crate::doc::{AnnotationExport, AnnotationId, AnnotationStore, ZoneRef};
use crate::error::{LoadError, PublishError};
use crate::hit::{self, Hit};
use crate::input::{Button, DragState, InteractionMode, Key, UiState, WheelDelta};
use crate::loader::{self, LoadGate, LoadTicket, LoadedMap, MapPayload};
use crate::paint;
use crate::raster::RasterImage;
use crate::render::{self, DrawCmd, Scene};
use crate::status::StatusLog;
use crate::transform::{MapMetadata, PixelCoord, WorldPoint};

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// A new map was installed.
    MapLoaded { width: u32, height: u32 },
    MarkerCreated(AnnotationId),
    ZoneCreated(AnnotationId),
    /// Markers or zones were moved, renamed, removed, or cleared.
    AnnotationsChanged,
    RenderNeeded,
}

/// Pixel and world position under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorReadout {
    pub pixel: PixelCoord,
    /// `None` while no map is loaded.
    pub world: Option<WorldPoint>,
}

/// Core engine state, all logic that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
#[derive(Debug)]
pub struct EngineCore {
    pub config: EngineConfig,
    pub viewport: Viewport,
    pub store: AnnotationStore,
    pub ui: UiState,
    pub drag: DragState,
    pub status: StatusLog,
    map: Option<LoadedMap>,
    last_payload: Option<MapPayload>,
    loads: LoadGate,
    cursor: Option<CursorReadout>,
    container_width: f64,
    container_height: f64,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            viewport: Viewport::with_limits(config.zoom),
            store: AnnotationStore::new(),
            ui: UiState::default(),
            drag: DragState::default(),
            status: StatusLog::new(config.status_capacity),
            map: None,
            last_payload: None,
            loads: LoadGate::default(),
            cursor: None,
            container_width: 0.0,
            container_height: 0.0,
            config,
        }
    }

    // --- Map loading ---

    /// Start a load. Any ticket issued earlier becomes stale.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.loads.issue()
    }

    /// Install the outcome of a load started with [`Self::begin_load`].
    ///
    /// Stale tickets are dropped. Failures become a status message and
    /// leave the current map untouched. On success the map and raster are
    /// replaced together, annotation world positions are recomputed, and
    /// the view is refitted.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<LoadedMap, LoadError>) -> Vec<Action> {
        if !self.loads.is_current(ticket) {
            tracing::warn!(generation = ticket.generation(), "dropping stale map load");
            return Vec::new();
        }
        match result {
            Ok(map) => {
                let (width, height) = (map.meta.width(), map.meta.height());
                self.store.rebind(&map.meta);
                self.map = Some(map);
                self.drag = DragState::Idle;
                self.refit();
                tracing::info!(width, height, "map loaded");
                self.status.info(format!("Loaded map: {width}x{height}"));
                vec![Action::MapLoaded { width, height }, Action::RenderNeeded]
            }
            Err(e) => {
                tracing::warn!(error = %e, "map load failed");
                self.status.warn(format!("Failed to load map: {e}"));
                Vec::new()
            }
        }
    }

    /// Decode and install a payload in one step.
    pub fn load_payload(&mut self, payload: &MapPayload) -> Vec<Action> {
        self.load_payload_staged(payload, |_| Ok(())).0
    }

    /// Decode a payload, run `stage` on the decoded map, and install the map
    /// only if staging succeeds.
    ///
    /// A staging failure is a failed load: the current map, raster, and
    /// annotations stay as they were. The staged value is returned when the
    /// map was installed.
    pub fn load_payload_staged<T>(
        &mut self,
        payload: &MapPayload,
        stage: impl FnOnce(&LoadedMap) -> Result<T, LoadError>,
    ) -> (Vec<Action>, Option<T>) {
        let ticket = self.begin_load();
        let staged = loader::decode_payload(payload).and_then(|map| {
            let value = stage(&map)?;
            Ok((map, value))
        });
        match staged {
            Ok((map, value)) => {
                let actions = self.finish_load(ticket, Ok(map));
                let installed = actions.iter().any(|a| matches!(a, Action::MapLoaded { .. }));
                (actions, installed.then_some(value))
            }
            Err(e) => (self.finish_load(ticket, Err(e)), None),
        }
    }

    /// Load the map carried by a robot-state telemetry snapshot.
    ///
    /// Snapshots without a map, or repeating the last applied map, do nothing.
    pub fn apply_robot_state(&mut self, state: &serde_json::Value) -> Vec<Action> {
        self.apply_robot_state_staged(state, |_| Ok(())).0
    }

    /// [`Self::apply_robot_state`] with a staging step, as in [`Self::load_payload_staged`].
    pub fn apply_robot_state_staged<T>(
        &mut self,
        state: &serde_json::Value,
        stage: impl FnOnce(&LoadedMap) -> Result<T, LoadError>,
    ) -> (Vec<Action>, Option<T>) {
        let Some(payload) = MapPayload::from_robot_state(state) else {
            return (Vec::new(), None);
        };
        if self.last_payload.as_ref() == Some(&payload) {
            return (Vec::new(), None);
        }
        let outcome = self.load_payload_staged(&payload, stage);
        self.last_payload = Some(payload);
        outcome
    }

    // --- Viewport ---

    /// Record the container size; refits when it changed.
    ///
    /// Non-finite or negative sizes are ignored.
    #[allow(clippy::float_cmp)]
    pub fn set_container_size(&mut self, width: f64, height: f64) -> Vec<Action> {
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if !valid(width) || !valid(height) {
            tracing::warn!(width, height, "ignoring invalid container size");
            return Vec::new();
        }
        if width == self.container_width && height == self.container_height {
            return Vec::new();
        }
        self.container_width = width;
        self.container_height = height;
        if self.refit() {
            vec![Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    /// Fit the map to the container again.
    pub fn reset_view(&mut self) -> Vec<Action> {
        if !self.refit() {
            return Vec::new();
        }
        self.status.info("Reset view");
        vec![Action::RenderNeeded]
    }

    fn refit(&mut self) -> bool {
        let Some(meta) = self.meta() else {
            return false;
        };
        let (w, h) = (f64::from(meta.width()), f64::from(meta.height()));
        let fitted = self.viewport.fit_with_margin(
            w,
            h,
            self.container_width,
            self.container_height,
            self.config.fit_margin,
        );
        if fitted {
            tracing::debug!(scale = self.viewport.scale, "viewport refit");
        }
        fitted
    }

    // --- Mode / editing ---

    pub fn set_mode(&mut self, mode: InteractionMode) {
        self.ui.mode = mode;
        self.drag = DragState::Idle;
    }

    /// Commit the polygon in progress if it has at least three vertices.
    pub fn finish_polygon(&mut self) -> Vec<Action> {
        let meta = self.map.as_ref().map(|m| m.meta);
        let Some(id) = self.store.finish_polygon(meta.as_ref()) else {
            return Vec::new();
        };
        self.drag = DragState::Idle;
        tracing::info!(%id, "zone finished");
        self.status.info(format!("Finished polygon {id}"));
        vec![Action::ZoneCreated(id), Action::RenderNeeded]
    }

    pub fn cancel_polygon(&mut self) -> Vec<Action> {
        if !self.store.cancel_polygon() {
            return Vec::new();
        }
        if matches!(self.drag, DragState::DraggingVertex { vertex } if vertex.zone == ZoneRef::Drawing) {
            self.drag = DragState::Idle;
        }
        self.status.info("Cancelled polygon");
        vec![Action::RenderNeeded]
    }

    pub fn rename_marker(&mut self, id: AnnotationId, name: &str) -> Vec<Action> {
        if self.store.rename_marker(id, name) {
            vec![Action::AnnotationsChanged, Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    pub fn remove_marker(&mut self, id: AnnotationId) -> Vec<Action> {
        let Some(marker) = self.store.remove_marker(id) else {
            return Vec::new();
        };
        self.forget(|hit| hit == Hit::Marker(id));
        self.status.info(format!("Removed marker {}", marker.name));
        vec![Action::AnnotationsChanged, Action::RenderNeeded]
    }

    pub fn remove_zone(&mut self, id: AnnotationId) -> Vec<Action> {
        if self.store.remove_zone(id).is_none() {
            return Vec::new();
        }
        self.forget(|hit| matches!(hit, Hit::Vertex(v) if v.zone == ZoneRef::Committed(id)));
        self.status.info(format!("Removed polygon {id}"));
        vec![Action::AnnotationsChanged, Action::RenderNeeded]
    }

    /// Discard every annotation.
    pub fn clear_annotations(&mut self) -> Vec<Action> {
        self.store.clear();
        self.ui.selected = None;
        self.drag = DragState::Idle;
        tracing::info!("annotations cleared");
        self.status.info("Cleared annotations");
        vec![Action::AnnotationsChanged, Action::RenderNeeded]
    }

    /// Drop selection and drag state that refer to a removed annotation.
    fn forget(&mut self, refers: impl Fn(Hit) -> bool) {
        if self.ui.selected.is_some_and(&refers) {
            self.ui.selected = None;
        }
        let dragged = match self.drag {
            DragState::DraggingMarker { id } => Some(Hit::Marker(id)),
            DragState::DraggingVertex { vertex } => Some(Hit::Vertex(vertex)),
            DragState::Idle | DragState::Panning { .. } => None,
        };
        if dragged.is_some_and(&refers) {
            self.drag = DragState::Idle;
        }
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button) -> Vec<Action> {
        if !screen_pt.is_finite() {
            return Vec::new();
        }
        match button {
            Button::Secondary => Vec::new(),
            Button::Middle => {
                self.start_pan(screen_pt);
                Vec::new()
            }
            Button::Primary => self.primary_down(screen_pt),
        }
    }

    fn primary_down(&mut self, screen_pt: Point) -> Vec<Action> {
        let map_pt = self.viewport.screen_to_map(screen_pt);

        if let Some(hit) = hit::hit_test(map_pt, &self.store, &self.viewport, self.config.hit_radius_px) {
            self.ui.selected = Some(hit);
            self.drag = match hit {
                Hit::Marker(id) => DragState::DraggingMarker { id },
                Hit::Vertex(vertex) => DragState::DraggingVertex { vertex },
            };
            return Vec::new();
        }

        self.ui.selected = None;
        match self.ui.mode {
            InteractionMode::Pan => {
                self.start_pan(screen_pt);
                Vec::new()
            }
            InteractionMode::PlaceMarker => self.place_marker(map_pt),
            InteractionMode::DrawPolygon => {
                self.store.add_vertex(map_pt);
                vec![Action::RenderNeeded]
            }
        }
    }

    fn start_pan(&mut self, screen_pt: Point) {
        self.drag = DragState::Panning { start_screen: screen_pt, start_offset: self.viewport.offset };
    }

    fn place_marker(&mut self, map_pt: Point) -> Vec<Action> {
        let meta = self.map.as_ref().map(|m| m.meta);
        let Some(id) = self.store.add_marker(map_pt, meta.as_ref()) else {
            return Vec::new();
        };
        if let Some(marker) = self.store.marker(id) {
            tracing::info!(%id, name = %marker.name, "marker added");
            self.status.info(format!("Added marker {} @ mx={:.2}, my={:.2}", marker.name, map_pt.x, map_pt.y));
        }
        vec![Action::MarkerCreated(id), Action::RenderNeeded]
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point) -> Vec<Action> {
        if !screen_pt.is_finite() {
            return Vec::new();
        }
        let map_pt = self.viewport.screen_to_map(screen_pt);
        self.update_cursor(map_pt);
        let meta = self.map.as_ref().map(|m| m.meta);

        let moved = match self.drag {
            DragState::Idle => false,
            DragState::DraggingMarker { id } => self.store.move_marker(id, map_pt, meta.as_ref()),
            DragState::DraggingVertex { vertex } => self.store.move_vertex(vertex, map_pt, meta.as_ref()),
            DragState::Panning { start_screen, start_offset } => {
                self.viewport.pan_from(start_offset, start_screen, screen_pt);
                true
            }
        };
        if moved { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn update_cursor(&mut self, map_pt: Point) {
        let pixel = PixelCoord { px: map_pt.x.round() as i64, py: map_pt.y.round() as i64 };
        let world = self.meta().map(|m| m.pixel_to_world(pixel.px, pixel.py));
        self.cursor = Some(CursorReadout { pixel, world });
    }

    pub fn on_pointer_up(&mut self) -> Vec<Action> {
        let ended = std::mem::take(&mut self.drag);
        match ended {
            DragState::DraggingMarker { .. } | DragState::DraggingVertex { .. } => vec![Action::AnnotationsChanged],
            DragState::Idle | DragState::Panning { .. } => Vec::new(),
        }
    }

    /// The pointer left the canvas; ends any gesture like a pointer-up.
    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        self.cursor = None;
        self.on_pointer_up()
    }

    /// Zoom one notch around the cursor. `dy < 0` zooms in.
    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta) -> Vec<Action> {
        if !screen_pt.is_finite() {
            return Vec::new();
        }
        let factor = if delta.dy < 0.0 {
            self.config.wheel_zoom_in
        } else if delta.dy > 0.0 {
            self.config.wheel_zoom_out
        } else {
            return Vec::new();
        };
        self.viewport.zoom_at(screen_pt, factor);
        vec![Action::RenderNeeded]
    }

    pub fn on_double_click(&mut self, _screen_pt: Point) -> Vec<Action> {
        if self.ui.mode == InteractionMode::DrawPolygon {
            self.finish_polygon()
        } else {
            Vec::new()
        }
    }

    pub fn on_key_down(&mut self, key: &Key) -> Vec<Action> {
        match key.0.as_str() {
            "Escape" => self.cancel_polygon(),
            "Enter" => self.finish_polygon(),
            "Delete" | "Backspace" => self.delete_selection(),
            _ => Vec::new(),
        }
    }

    fn delete_selection(&mut self) -> Vec<Action> {
        match self.ui.selected {
            Some(Hit::Marker(id)) => self.remove_marker(id),
            Some(Hit::Vertex(vertex)) => match vertex.zone {
                ZoneRef::Committed(id) => self.remove_zone(id),
                ZoneRef::Drawing => {
                    self.ui.selected = None;
                    self.cancel_polygon()
                }
            },
            None => Vec::new(),
        }
    }

    // --- Export / publish ---

    /// Snapshot of all annotations that have world coordinates.
    #[must_use]
    pub fn export_annotations(&self, timestamp_ms: u64) -> AnnotationExport {
        self.store.export(timestamp_ms)
    }

    /// Publish the export snapshot on the configured command topic.
    ///
    /// The outcome is also recorded in the status log.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::NotConnected`], [`PublishError::NoMap`], or
    /// [`PublishError::NothingToPublish`] when publishing is refused, and
    /// serialization or channel errors otherwise.
    pub fn publish_annotations(
        &mut self,
        channel: &mut impl CommandChannel,
        timestamp_ms: u64,
    ) -> Result<(), PublishError> {
        match self.try_publish(channel, timestamp_ms) {
            Ok((waypoints, zones)) => {
                let topic = &self.config.command_topic;
                tracing::info!(%topic, waypoints, zones, "annotations published");
                self.status.info(format!("Published {waypoints} waypoints and {zones} zones to {topic}"));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "publish refused");
                self.status.warn(format!("Publish failed: {e}"));
                Err(e)
            }
        }
    }

    fn try_publish(&self, channel: &mut impl CommandChannel, timestamp_ms: u64) -> Result<(usize, usize), PublishError> {
        if !channel.is_connected() {
            return Err(PublishError::NotConnected);
        }
        if self.map.is_none() {
            return Err(PublishError::NoMap);
        }
        let export = self.export_annotations(timestamp_ms);
        if export.is_empty() {
            return Err(PublishError::NothingToPublish);
        }
        let payload = serde_json::to_string(&export)?;
        channel.publish(&self.config.command_topic, &payload)?;
        Ok((export.waypoints.len(), export.zones.len()))
    }

    // --- Render ---

    /// Draw commands for the current state.
    #[must_use]
    pub fn render_commands(&self) -> Vec<DrawCmd> {
        render::compose(&Scene {
            raster: self.raster(),
            viewport: &self.viewport,
            store: &self.store,
            config: &self.config,
            width: self.container_width,
            height: self.container_height,
        })
    }

    // --- Queries ---

    #[must_use]
    pub fn meta(&self) -> Option<&MapMetadata> {
        self.map.as_ref().map(|m| &m.meta)
    }

    #[must_use]
    pub fn raster(&self) -> Option<&RasterImage> {
        self.map.as_ref().map(|m| &m.raster)
    }

    #[must_use]
    pub fn cursor(&self) -> Option<CursorReadout> {
        self.cursor
    }

    #[must_use]
    pub fn selection(&self) -> Option<Hit> {
        self.ui.selected
    }

    #[must_use]
    pub fn container_size(&self) -> (f64, f64) {
        (self.container_width, self.container_height)
    }
}

/// The full map engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    bitmap: Option<HtmlCanvasElement>,
    dpr: f64,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement, config: EngineConfig) -> Self {
        Self { canvas, bitmap: None, dpr: 1.0, core: EngineCore::new(config) }
    }

    // --- Viewport ---

    /// Update canvas dimensions (CSS pixels) and device pixel ratio.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) -> Vec<Action> {
        self.dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        self.canvas.set_width((width_css * self.dpr).round().max(0.0) as u32);
        self.canvas.set_height((height_css * self.dpr).round().max(0.0) as u32);
        let mut actions = self.core.set_container_size(width_css, height_css);
        if !actions.contains(&Action::RenderNeeded) {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    // --- Map loading ---

    /// Decode a payload and upload its bitmap before the map is installed.
    ///
    /// Decode and upload failures land in the status log and leave the
    /// current map and bitmap in place.
    pub fn load_payload(&mut self, payload: &MapPayload) -> Vec<Action> {
        let (actions, bitmap) = self.core.load_payload_staged(payload, upload);
        self.swap_bitmap(bitmap);
        actions
    }

    /// Load the map from a robot-state snapshot, if it carries a new one.
    pub fn apply_robot_state(&mut self, state: &serde_json::Value) -> Vec<Action> {
        let (actions, bitmap) = self.core.apply_robot_state_staged(state, upload);
        self.swap_bitmap(bitmap);
        actions
    }

    fn swap_bitmap(&mut self, bitmap: Option<HtmlCanvasElement>) {
        if bitmap.is_some() {
            self.bitmap = bitmap;
        }
    }

    // --- Delegated input ---

    pub fn set_mode(&mut self, mode: InteractionMode) {
        self.core.set_mode(mode);
    }

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button) -> Vec<Action> {
        self.core.on_pointer_down(screen_pt, button)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point) -> Vec<Action> {
        self.core.on_pointer_move(screen_pt)
    }

    pub fn on_pointer_up(&mut self) -> Vec<Action> {
        self.core.on_pointer_up()
    }

    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        self.core.on_pointer_leave()
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta) -> Vec<Action> {
        self.core.on_wheel(screen_pt, delta)
    }

    pub fn on_double_click(&mut self, screen_pt: Point) -> Vec<Action> {
        self.core.on_double_click(screen_pt)
    }

    pub fn on_key_down(&mut self, key: &Key) -> Vec<Action> {
        self.core.on_key_down(key)
    }

    pub fn reset_view(&mut self) -> Vec<Action> {
        self.core.reset_view()
    }

    pub fn clear_annotations(&mut self) -> Vec<Action> {
        self.core.clear_annotations()
    }

    // --- Publish ---

    /// Publish annotations stamped with the browser clock.
    ///
    /// # Errors
    ///
    /// See [`EngineCore::publish_annotations`].
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn publish_annotations(&mut self, channel: &mut impl CommandChannel) -> Result<(), PublishError> {
        let now = js_sys::Date::now() as u64;
        self.core.publish_annotations(channel, now)
    }

    // --- Render ---

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the 2D context is unavailable or a `Canvas2D` call fails.
    pub fn render(&self) -> Result<(), JsValue> {
        let ctx: CanvasRenderingContext2d = self
            .canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into()?;
        paint::paint(&ctx, &self.core.render_commands(), self.bitmap.as_ref(), self.dpr)
    }
}

fn upload(map: &LoadedMap) -> Result<HtmlCanvasElement, LoadError> {
    paint::upload_raster(&map.raster).map_err(|e| LoadError::Upload(format!("{e:?}")))
}
