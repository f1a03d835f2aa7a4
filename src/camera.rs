#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use crate::consts::{FIT_MARGIN, MAX_SCALE, MIN_SCALE};

/// A point in either screen or map (raster pixel) space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to `other`.
    #[must_use]
    pub fn dist_sq(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Whether both coordinates are finite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Allowed range for [`Viewport::scale`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self { min: MIN_SCALE, max: MAX_SCALE }
    }
}

/// Pan/zoom state for the map view.
///
/// `screen = map * scale + offset`. `offset` is in CSS pixels and `scale` is
/// screen pixels per raster pixel, always inside `limits`.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub scale: f64,
    pub offset: Point,
    pub limits: ZoomLimits,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { scale: 1.0, offset: Point::new(0.0, 0.0), limits: ZoomLimits::default() }
    }
}

impl Viewport {
    /// A viewport at identity with custom zoom limits.
    #[must_use]
    pub fn with_limits(limits: ZoomLimits) -> Self {
        Self { scale: 1.0f64.clamp(limits.min, limits.max), limits, ..Self::default() }
    }

    /// Convert a screen-space point (CSS pixels) to map coordinates.
    #[must_use]
    pub fn screen_to_map(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.offset.x) / self.scale,
            y: (screen.y - self.offset.y) / self.scale,
        }
    }

    /// Convert a map-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn map_to_screen(&self, map: Point) -> Point {
        Point {
            x: map.x * self.scale + self.offset.x,
            y: map.y * self.scale + self.offset.y,
        }
    }

    /// Convert a screen-space distance (pixels) to map-space distance.
    #[must_use]
    pub fn screen_dist_to_map(&self, screen_dist: f64) -> f64 {
        screen_dist / self.scale
    }

    /// Multiply the scale by `factor`, keeping the map point under `screen` fixed.
    ///
    /// The resulting scale is clamped to the limits. Non-finite or
    /// non-positive factors are ignored.
    pub fn zoom_at(&mut self, screen: Point, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let anchor = self.screen_to_map(screen);
        self.scale = (self.scale * factor).clamp(self.limits.min, self.limits.max);
        self.offset = Point {
            x: screen.x - anchor.x * self.scale,
            y: screen.y - anchor.y * self.scale,
        };
    }

    /// Translate the view by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.offset.x += dx;
        self.offset.y += dy;
    }

    /// Set the offset to `start_offset` moved by the pointer travel since the drag began.
    ///
    /// Computing from the drag origin rather than accumulating per-event
    /// deltas keeps a fast drag from drifting.
    pub fn pan_from(&mut self, start_offset: Point, start_screen: Point, current_screen: Point) {
        self.offset = Point {
            x: start_offset.x + (current_screen.x - start_screen.x),
            y: start_offset.y + (current_screen.y - start_screen.y),
        };
    }

    /// Scale the raster to fit the container with a 5% margin and center it.
    ///
    /// Returns `false` and leaves the view unchanged when any dimension is not
    /// a positive finite number.
    pub fn fit_to_container(&mut self, raster_w: f64, raster_h: f64, container_w: f64, container_h: f64) -> bool {
        self.fit_with_margin(raster_w, raster_h, container_w, container_h, FIT_MARGIN)
    }

    /// [`Self::fit_to_container`] with an explicit margin factor.
    pub fn fit_with_margin(
        &mut self,
        raster_w: f64,
        raster_h: f64,
        container_w: f64,
        container_h: f64,
        margin: f64,
    ) -> bool {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !(usable(raster_w) && usable(raster_h) && usable(container_w) && usable(container_h)) {
            return false;
        }
        let scale = (container_w / raster_w).min(container_h / raster_h) * margin;
        self.scale = scale.clamp(self.limits.min, self.limits.max);
        self.offset = Point {
            x: (container_w - raster_w * self.scale) / 2.0,
            y: (container_h - raster_h * self.scale) / 2.0,
        };
        true
    }
}
