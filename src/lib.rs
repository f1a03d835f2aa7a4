//! Occupancy-map viewing and annotation engine for the robot dashboard.
//!
//! This crate is compiled to WebAssembly and runs in the browser, but every
//! piece of logic except the final paint step is plain Rust and runs natively.
//! It owns the full lifecycle of the map view: decoding an (optionally
//! encrypted) PGM payload into a displayable raster, maintaining the pan/zoom
//! viewport, routing pointer input into waypoint and zone edits, converting
//! between image pixels and robot world coordinates, and producing the draw
//! list for each frame. Transport to and from the robot is left to a host
//! supplied [`channel::CommandChannel`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`loader`] | Map payloads, the decode pipeline, and generation-guarded loads |
//! | [`pgm`] | Portable Gray Map decoder (`P2` / `P5`) |
//! | [`crypto`] | Base64 normalisation and AES-GCM payload decryption |
//! | [`raster`] | Grayscale to RGBA conversion |
//! | [`transform`] | Map metadata and pixel/world conversion |
//! | [`descriptor`] | YAML map-server descriptor parsing |
//! | [`camera`] | Pan/zoom viewport and screen/map conversion |
//! | [`doc`] | Waypoint and zone store, plus the export snapshot |
//! | [`hit`] | Hit-testing against markers and zone vertices |
//! | [`input`] | Interaction modes, input event types, and drag state |
//! | [`render`] | Scene composition into draw commands |
//! | [`paint`] | Replays draw commands onto a `Canvas2D` context |
//! | [`channel`] | Command channel seam for publishing annotations |
//! | [`status`] | Bounded user-visible status log |
//! | [`config`] | Engine tunables, optionally read from the environment |
//! | [`error`] | Error types |
//! | [`consts`] | Shared numeric constants (zoom limits, handle sizes, etc.) |

pub mod camera;
pub mod channel;
pub mod config;
pub mod consts;
pub mod crypto;
pub mod descriptor;
pub mod doc;
pub mod engine;
pub mod error;
pub mod hit;
pub mod input;
pub mod loader;
pub mod paint;
pub mod pgm;
pub mod raster;
pub mod render;
pub mod status;
pub mod transform;
