// THEORY:
// Exponential smoothing between a paddle's previous position and the newly observed
// one. The factor is the weight kept on the past: higher means more inertia, less
// jitter, and more lag. The smoother is stateless; the previous value lives in the
// caller's `TrackingState`.

pub type SmoothingFactor = f64;

pub const DEFAULT_SMOOTHING_FACTOR: SmoothingFactor = 0.8;

/// `round(previous * factor + observed * (1 - factor))`.
///
/// `factor` must lie in `[0, 1]`; this is not checked here.
pub fn smooth(previous: i32, observed: i32, factor: SmoothingFactor) -> i32 {
    (previous as f64 * factor + observed as f64 * (1.0 - factor)).round() as i32
}
