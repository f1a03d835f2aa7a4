//! YAML map-server descriptor parsing.
//!
//! Maps saved by the robot's mapping stack ship with a sidecar such as:
//!
//! ```yaml
//! image: office.pgm
//! resolution: 0.05
//! origin: [-12.4, -8.2, 0.0]
//! negate: 0
//! occupied_thresh: 0.65
//! free_thresh: 0.196
//! ```
//!
//! Only `resolution` and `origin` are required. The raster dimensions come
//! from the decoded image, so metadata is built with [`MapDescriptor::metadata`]
//! once the PGM has been parsed.

#[cfg(test)]
#[path = "descriptor_test.rs"]
mod descriptor_test;

use serde::{Deserialize, Deserializer};

use crate::error::MetadataError;
use crate::transform::{MapMetadata, Pose};

const DEFAULT_OCCUPIED_THRESH: f64 = 0.65;
const DEFAULT_FREE_THRESH: f64 = 0.196;

/// Parsed map-server sidecar.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapDescriptor {
    /// Image file the descriptor refers to; informational only.
    #[serde(default)]
    pub image: Option<String>,
    /// Meters per pixel.
    pub resolution: f64,
    /// `[x, y]` or `[x, y, theta]` of the bottom-left pixel corner.
    pub origin: Vec<f64>,
    /// Whether intensities are inverted before display. Accepts `0`/`1` or booleans.
    #[serde(default, deserialize_with = "flag")]
    pub negate: bool,
    #[serde(default = "default_occupied_thresh")]
    pub occupied_thresh: f64,
    #[serde(default = "default_free_thresh")]
    pub free_thresh: f64,
}

impl MapDescriptor {
    /// Parse a YAML descriptor.
    ///
    /// # Errors
    ///
    /// Returns the YAML error when the document is malformed or lacks
    /// `resolution` / `origin`.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Origin as a pose; a two-component origin has zero heading.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::OriginArity`] unless the origin has 2 or 3 components.
    pub fn origin_pose(&self) -> Result<Pose, MetadataError> {
        match self.origin.as_slice() {
            [x, y] => Ok(Pose::new(*x, *y, 0.0)),
            [x, y, theta] => Ok(Pose::new(*x, *y, *theta)),
            other => Err(MetadataError::OriginArity(other.len())),
        }
    }

    /// Combine the descriptor with decoded raster dimensions.
    ///
    /// # Errors
    ///
    /// Propagates origin arity and [`MapMetadata::new`] validation errors.
    pub fn metadata(&self, width: u32, height: u32) -> Result<MapMetadata, MetadataError> {
        MapMetadata::new(self.resolution, self.origin_pose()?, width, height, self.negate)
    }
}

fn default_occupied_thresh() -> f64 {
    DEFAULT_OCCUPIED_THRESH
}

fn default_free_thresh() -> f64 {
    DEFAULT_FREE_THRESH
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}
