//! Offset vector between RGB and depth coordinate frames.
//!
//! The offset is an integer translation with both components bounded to
//! `[OFFSET_MIN, OFFSET_MAX]`. A vector is never mutated in place; every edit
//! produces a new one and reports the change so the active correspondence set
//! can re-derive its depth points.

use std::fmt;

use thiserror::Error;

use crate::constants::{DEFAULT_OFFSET_DX, DEFAULT_OFFSET_DY, OFFSET_MAX, OFFSET_MIN};

/// Offset component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal component
    X,
    /// Vertical component
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "X"),
            Axis::Y => write!(f, "Y"),
        }
    }
}

/// Rejected offset input. The previous offset stays in effect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Component outside the accepted range
    #[error("{axis} offset {value} is outside [{min}, {max}]")]
    OutOfRange {
        /// Which component was rejected
        axis: Axis,
        /// The rejected value
        value: i64,
        /// Lower bound
        min: i32,
        /// Upper bound
        max: i32,
    },

    /// Text input that is not an integer
    #[error("{axis} offset '{input}' is not an integer")]
    NotAnInteger {
        /// Which component was rejected
        axis: Axis,
        /// The raw text as entered
        input: String,
    },
}

impl ValidationError {
    fn out_of_range(axis: Axis, value: i64) -> Self {
        Self::OutOfRange {
            axis,
            value,
            min: OFFSET_MIN,
            max: OFFSET_MAX,
        }
    }
}

/// Integer translation from RGB coordinates to depth coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OffsetVector {
    dx: i32,
    dy: i32,
}

impl OffsetVector {
    /// The identity offset.
    pub const ZERO: Self = Self { dx: 0, dy: 0 };

    /// Create a validated offset vector.
    pub fn new(dx: i32, dy: i32) -> Result<Self, ValidationError> {
        Ok(Self {
            dx: check_component(Axis::X, i64::from(dx))?,
            dy: check_component(Axis::Y, i64::from(dy))?,
        })
    }

    /// Create an offset vector, clamping each component into range.
    pub fn clamped(dx: i32, dy: i32) -> Self {
        Self {
            dx: dx.clamp(OFFSET_MIN, OFFSET_MAX),
            dy: dy.clamp(OFFSET_MIN, OFFSET_MAX),
        }
    }

    /// Horizontal component.
    pub fn dx(&self) -> i32 {
        self.dx
    }

    /// Vertical component.
    pub fn dy(&self) -> i32 {
        self.dy
    }
}

impl Default for OffsetVector {
    fn default() -> Self {
        Self {
            dx: DEFAULT_OFFSET_DX,
            dy: DEFAULT_OFFSET_DY,
        }
    }
}

impl fmt::Display for OffsetVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.dx, self.dy)
    }
}

fn check_component(axis: Axis, value: i64) -> Result<i32, ValidationError> {
    if value < i64::from(OFFSET_MIN) || value > i64::from(OFFSET_MAX) {
        return Err(ValidationError::out_of_range(axis, value));
    }
    i32::try_from(value).map_err(|_| ValidationError::out_of_range(axis, value))
}

fn parse_component(axis: Axis, input: &str) -> Result<i32, ValidationError> {
    let value: i64 = input
        .trim()
        .parse()
        .map_err(|_| ValidationError::NotAnInteger {
            axis,
            input: input.to_string(),
        })?;
    check_component(axis, value)
}

/// Converts a slider reading to a component. Non-finite readings keep `fallback`.
fn slider_component(value: f64, fallback: i32) -> i32 {
    if !value.is_finite() {
        return fallback;
    }
    // Truncation toward zero, then the slider's own bounds.
    value.trunc().clamp(f64::from(OFFSET_MIN), f64::from(OFFSET_MAX)) as i32
}

/// Outcome of an offset edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetChange {
    /// Offset before the edit
    pub previous: OffsetVector,
    /// Offset after the edit
    pub current: OffsetVector,
}

impl OffsetChange {
    /// Whether the edit actually changed the offset.
    pub fn is_change(&self) -> bool {
        self.previous != self.current
    }
}

/// Holder of the current offset vector.
#[derive(Debug, Clone, Default)]
pub struct OffsetModel {
    current: OffsetVector,
}

impl OffsetModel {
    /// Create a model starting at `initial`.
    pub fn new(initial: OffsetVector) -> Self {
        Self { current: initial }
    }

    /// Current offset vector.
    pub fn get(&self) -> OffsetVector {
        self.current
    }

    /// Replace the offset with `(dx, dy)`.
    ///
    /// Fails without touching the current vector if either component is out
    /// of range.
    pub fn set(&mut self, dx: i32, dy: i32) -> Result<OffsetChange, ValidationError> {
        let next = OffsetVector::new(dx, dy)?;
        Ok(self.replace(next))
    }

    /// Replace the offset from text fields.
    ///
    /// Unparseable or out-of-range text is rejected, never clamped.
    pub fn set_from_text(&mut self, dx: &str, dy: &str) -> Result<OffsetChange, ValidationError> {
        let next = OffsetVector {
            dx: parse_component(Axis::X, dx)?,
            dy: parse_component(Axis::Y, dy)?,
        };
        Ok(self.replace(next))
    }

    /// Replace the offset from slider positions, clamping into range.
    pub fn set_from_slider(&mut self, dx: f64, dy: f64) -> OffsetChange {
        let next = OffsetVector {
            dx: slider_component(dx, self.current.dx),
            dy: slider_component(dy, self.current.dy),
        };
        self.replace(next)
    }

    /// Put back a vector that was current before a failed follow-up action.
    pub(crate) fn restore(&mut self, vector: OffsetVector) {
        self.current = vector;
    }

    fn replace(&mut self, next: OffsetVector) -> OffsetChange {
        let previous = self.current;
        self.current = next;
        if previous != next {
            log::debug!("Offset changed {} -> {}", previous, next);
        }
        OffsetChange {
            previous,
            current: next,
        }
    }
}
