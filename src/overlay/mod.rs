//! Overlay of the depth map on top of the RGB image.
//!
//! [`OverlayRequest`] resolves the parameters the blending step needs;
//! [`render_overlay`] executes a resolved plan with the `image` crate.

mod blend;
mod request;

pub use blend::render_overlay;
pub use request::{OverlayPlan, OverlayRequest, clamp_alpha};
