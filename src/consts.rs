//! Shared numeric constants for the map engine.

// ── Viewport ────────────────────────────────────────────────────

/// Smallest allowed viewport scale.
pub const MIN_SCALE: f64 = 0.1;

/// Largest allowed viewport scale.
pub const MAX_SCALE: f64 = 10.0;

/// Fraction of the container a freshly fitted raster occupies.
pub const FIT_MARGIN: f64 = 0.95;

/// Scale multiplier for one wheel notch towards the user (zoom in).
pub const WHEEL_ZOOM_IN: f64 = 1.08;

/// Scale multiplier for one wheel notch away from the user (zoom out).
pub const WHEEL_ZOOM_OUT: f64 = 0.92;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space pick radius in pixels for markers and zone vertices.
pub const HIT_RADIUS_PX: f64 = 6.0;

// ── Rendering ───────────────────────────────────────────────────

/// Screen-space radius of marker and vertex handles.
pub const HANDLE_RADIUS_PX: f64 = 5.0;

/// Screen-space stroke width for zone outlines.
pub const LINE_WIDTH_PX: f64 = 1.5;

/// Screen-space font size for marker labels.
pub const LABEL_FONT_PX: f64 = 12.0;

// ── Status ──────────────────────────────────────────────────────

/// Number of status messages retained before the oldest are dropped.
pub const STATUS_CAPACITY: usize = 200;

// ── Maps ────────────────────────────────────────────────────────

/// Largest sample value a PGM header may declare.
pub const PGM_MAX_MAXVAL: u32 = 65_535;

/// Default robot thing name used to build the command topic.
pub const DEFAULT_THING_NAME: &str = "sr1_anvi";
