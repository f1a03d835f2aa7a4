//! Map metadata and the pixel/world coordinate transform.
//!
//! Follows the occupancy-grid convention: raster row 0 is the top of the
//! image, world Y grows upward from the bottom row, each pixel covers
//! `resolution` meters, and `origin` is the world pose of the bottom-left
//! corner of the raster. World coordinates refer to pixel centers.

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

use serde::{Deserialize, Serialize};

use crate::camera::Point;
use crate::error::MetadataError;

/// A planar pose: position plus heading in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

impl Pose {
    #[must_use]
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self { x, y, theta }
    }
}

/// A point in the robot's world frame, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

/// Integer raster coordinates; `py` counts rows from the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelCoord {
    pub px: i64,
    pub py: i64,
}

/// How raster pixels map to world space. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapMetadata {
    resolution: f64,
    origin: Pose,
    width: u32,
    height: u32,
    negate: bool,
}

impl MapMetadata {
    /// Build validated metadata.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::InvalidResolution`] unless `resolution` is
    /// finite and positive, and [`MetadataError::NonFiniteOrigin`] when any
    /// origin component is NaN or infinite.
    pub fn new(resolution: f64, origin: Pose, width: u32, height: u32, negate: bool) -> Result<Self, MetadataError> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(MetadataError::InvalidResolution(resolution));
        }
        if !(origin.x.is_finite() && origin.y.is_finite() && origin.theta.is_finite()) {
            return Err(MetadataError::NonFiniteOrigin);
        }
        Ok(Self { resolution, origin, width, height, negate })
    }

    /// Metadata for a map with no descriptor: one meter per pixel, origin at zero.
    #[must_use]
    pub fn unit(width: u32, height: u32) -> Self {
        Self { resolution: 1.0, origin: Pose::default(), width, height, negate: false }
    }

    #[must_use]
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    #[must_use]
    pub fn origin(&self) -> Pose {
        self.origin
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn negate(&self) -> bool {
        self.negate
    }

    /// World position of the center of pixel `(px, py)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn pixel_to_world(&self, px: i64, py: i64) -> WorldPoint {
        let row_from_bottom = i64::from(self.height).saturating_sub(1).saturating_sub(py);
        let local_x = (px as f64 + 0.5) * self.resolution;
        let local_y = (row_from_bottom as f64 + 0.5) * self.resolution;

        let (sin, cos) = self.origin.theta.sin_cos();
        WorldPoint {
            x: self.origin.x + local_x * cos - local_y * sin,
            y: self.origin.y + local_x * sin + local_y * cos,
        }
    }

    /// Pixel containing the world point `(wx, wy)`. Inverse of [`Self::pixel_to_world`].
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn world_to_pixel(&self, wx: f64, wy: f64) -> PixelCoord {
        let dx = wx - self.origin.x;
        let dy = wy - self.origin.y;

        let (sin, cos) = self.origin.theta.sin_cos();
        let local_x = dx * cos + dy * sin;
        let local_y = -dx * sin + dy * cos;

        // Pixel centers sit half a cell inside their pixel, so flooring the
        // cell index is stable against rounding noise on the way back.
        let px = (local_x / self.resolution).floor() as i64;
        let row_from_bottom = (local_y / self.resolution).floor() as i64;
        PixelCoord { px, py: i64::from(self.height).saturating_sub(1).saturating_sub(row_from_bottom) }
    }

    /// World position for a fractional map point, snapped to the nearest pixel.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn world_at(&self, map: Point) -> WorldPoint {
        self.pixel_to_world(map.x.round() as i64, map.y.round() as i64)
    }

    /// Whether `pixel` lies inside the raster.
    #[must_use]
    pub fn contains(&self, pixel: PixelCoord) -> bool {
        (0..i64::from(self.width)).contains(&pixel.px) && (0..i64::from(self.height)).contains(&pixel.py)
    }
}
