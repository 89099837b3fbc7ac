//! Parameters for blending a shifted depth map over an RGB image.

use crate::model::OffsetVector;

/// Clamp a blending weight to `[0, 1]`. NaN counts as 0.
pub fn clamp_alpha(alpha: f32) -> f32 {
    if alpha.is_nan() {
        return 0.0;
    }
    alpha.clamp(0.0, 1.0)
}

/// Inputs for one overlay render.
#[derive(Debug, Clone, Copy)]
pub struct OverlayRequest<'a, I> {
    base: &'a I,
    secondary: Option<&'a I>,
    offset: OffsetVector,
    alpha: f32,
}

/// What the blending step has to do.
#[derive(Debug, Clone, Copy)]
pub enum OverlayPlan<'a, I> {
    /// No secondary image; show the base as is
    Passthrough { base: &'a I },
    /// Shift `secondary` by `shift`, then blend it over `base` with weight `alpha`
    Blend {
        base: &'a I,
        secondary: &'a I,
        shift: OffsetVector,
        alpha: f32,
    },
}

impl<'a, I> OverlayRequest<'a, I> {
    pub fn new(base: &'a I, secondary: Option<&'a I>, offset: OffsetVector, alpha: f32) -> Self {
        Self {
            base,
            secondary,
            offset,
            alpha,
        }
    }

    /// Resolve into a plan, clamping alpha.
    pub fn resolve(&self) -> OverlayPlan<'a, I> {
        match self.secondary {
            None => OverlayPlan::Passthrough { base: self.base },
            Some(secondary) => OverlayPlan::Blend {
                base: self.base,
                secondary,
                shift: self.offset,
                alpha: clamp_alpha(self.alpha),
            },
        }
    }
}
