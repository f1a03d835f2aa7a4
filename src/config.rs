//! Engine configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::collections::HashMap;
use std::str::FromStr;

use crate::camera::ZoomLimits;
use crate::consts::{
    DEFAULT_THING_NAME, FIT_MARGIN, HANDLE_RADIUS_PX, HIT_RADIUS_PX, LABEL_FONT_PX, LINE_WIDTH_PX, MAX_SCALE,
    MIN_SCALE, STATUS_CAPACITY, WHEEL_ZOOM_IN, WHEEL_ZOOM_OUT,
};
use crate::error::ConfigError;

const ENV_PREFIX: &str = "MAPVIEW_";

/// Tunables for interaction, rendering, and publishing.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub zoom: ZoomLimits,
    /// Screen-space pick radius.
    pub hit_radius_px: f64,
    /// Screen-space radius of marker and vertex handles.
    pub handle_radius_px: f64,
    /// Screen-space zone outline width.
    pub line_width_px: f64,
    pub label_font_px: f64,
    /// Fraction of the container a fitted raster occupies.
    pub fit_margin: f64,
    pub wheel_zoom_in: f64,
    pub wheel_zoom_out: f64,
    /// Status messages kept before the oldest are dropped.
    pub status_capacity: usize,
    /// Topic annotations are published on.
    pub command_topic: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            zoom: ZoomLimits { min: MIN_SCALE, max: MAX_SCALE },
            hit_radius_px: HIT_RADIUS_PX,
            handle_radius_px: HANDLE_RADIUS_PX,
            line_width_px: LINE_WIDTH_PX,
            label_font_px: LABEL_FONT_PX,
            fit_margin: FIT_MARGIN,
            wheel_zoom_in: WHEEL_ZOOM_IN,
            wheel_zoom_out: WHEEL_ZOOM_OUT,
            status_capacity: STATUS_CAPACITY,
            command_topic: command_topic(DEFAULT_THING_NAME),
        }
    }
}

impl EngineConfig {
    /// Build config from `MAPVIEW_*` environment variables.
    ///
    /// Optional:
    /// - `MAPVIEW_MIN_SCALE`: default 0.1
    /// - `MAPVIEW_MAX_SCALE`: default 10
    /// - `MAPVIEW_HIT_RADIUS_PX`: default 6
    /// - `MAPVIEW_HANDLE_RADIUS_PX`: default 5
    /// - `MAPVIEW_LINE_WIDTH_PX`: default 1.5
    /// - `MAPVIEW_FIT_MARGIN`: default 0.95
    /// - `MAPVIEW_STATUS_CAPACITY`: default 200
    /// - `MAPVIEW_THING_NAME`: default `sr1_anvi`; topic is `<thing>/commands/movement`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a value does not parse or is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.to_str()?.to_owned(), v.to_str()?.to_owned())))
            .filter(|(k, _)| k.starts_with(ENV_PREFIX))
            .collect();
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let thing = lookup("MAPVIEW_THING_NAME").unwrap_or_else(|| DEFAULT_THING_NAME.to_owned());
        if thing.trim().is_empty() {
            return Err(ConfigError::Invalid { key: "MAPVIEW_THING_NAME", value: thing });
        }

        let config = Self {
            zoom: ZoomLimits {
                min: parse_or(&lookup, "MAPVIEW_MIN_SCALE", defaults.zoom.min)?,
                max: parse_or(&lookup, "MAPVIEW_MAX_SCALE", defaults.zoom.max)?,
            },
            hit_radius_px: parse_or(&lookup, "MAPVIEW_HIT_RADIUS_PX", defaults.hit_radius_px)?,
            handle_radius_px: parse_or(&lookup, "MAPVIEW_HANDLE_RADIUS_PX", defaults.handle_radius_px)?,
            line_width_px: parse_or(&lookup, "MAPVIEW_LINE_WIDTH_PX", defaults.line_width_px)?,
            fit_margin: parse_or(&lookup, "MAPVIEW_FIT_MARGIN", defaults.fit_margin)?,
            status_capacity: parse_or(&lookup, "MAPVIEW_STATUS_CAPACITY", defaults.status_capacity)?,
            command_topic: command_topic(thing.trim()),
            ..defaults
        };
        config.validate()?;
        Ok(config)
    }

    /// Check ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZoomRange`] unless `0 < min < max`, and
    /// [`ConfigError::Invalid`] for non-positive sizes, a margin outside
    /// `(0, 1]`, or a zero status capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ZoomLimits { min, max } = self.zoom;
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min < max) {
            return Err(ConfigError::ZoomRange { min, max });
        }
        check_positive("MAPVIEW_HIT_RADIUS_PX", self.hit_radius_px)?;
        check_positive("MAPVIEW_HANDLE_RADIUS_PX", self.handle_radius_px)?;
        check_positive("MAPVIEW_LINE_WIDTH_PX", self.line_width_px)?;
        if !(self.fit_margin > 0.0 && self.fit_margin <= 1.0) {
            return Err(ConfigError::Invalid { key: "MAPVIEW_FIT_MARGIN", value: self.fit_margin.to_string() });
        }
        if self.status_capacity == 0 {
            return Err(ConfigError::Invalid { key: "MAPVIEW_STATUS_CAPACITY", value: "0".into() });
        }
        Ok(())
    }
}

/// Movement command topic for a robot thing name.
#[must_use]
pub fn command_topic(thing: &str) -> String {
    format!("{thing}/commands/movement")
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

fn check_positive(key: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid { key, value: value.to_string() })
    }
}
