//! Color utility functions shared across the application.

/// Map an intensity to the classic "jet" colormap.
///
/// # Arguments
/// * `value` - Intensity in range 0-255 (blue at 0, red at 255)
///
/// # Returns
/// RGB triple in range 0-255
pub fn jet(value: u8) -> [u8; 3] {
    let t = f32::from(value) / 255.0;
    let channel = |center: f32| {
        let v = (1.5 - (4.0 * t - center).abs()).clamp(0.0, 1.0);
        (v * 255.0).round() as u8
    };
    [channel(3.0), channel(2.0), channel(1.0)]
}
