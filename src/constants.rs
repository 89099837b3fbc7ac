//! Global constants for the annotation engine

/// Smallest accepted offset component, in pixels
pub const OFFSET_MIN: i32 = -100;

/// Largest accepted offset component, in pixels
pub const OFFSET_MAX: i32 = 100;

/// Default horizontal shift from RGB to depth coordinates
pub const DEFAULT_OFFSET_DX: i32 = 36;

/// Default vertical shift from RGB to depth coordinates
pub const DEFAULT_OFFSET_DY: i32 = -8;

/// Default weight of the depth colormap when blending overlays
pub const DEFAULT_OVERLAY_ALPHA: f32 = 0.4;

/// Default annotation store filename
pub const DEFAULT_STORE_FILENAME: &str = "annotations.json";
