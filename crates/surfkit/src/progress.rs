//! Progress reporting.

/// Label reported while bytes are being acquired.
pub const LOADING_LABEL: &str = "Loading...";
/// Label reported while decoding, and with the final `1.0`.
pub const DECODE_LABEL: &str = "Loading surface...";

/// Receives load progress as a fraction in `[0, 1]`.
pub trait ProgressSink: Send + Sync {
    fn report(&self, fraction: f32, label: &str);
}

/// Discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _fraction: f32, _label: &str) {}
}

impl<F> ProgressSink for F
where
    F: Fn(f32, &str) + Send + Sync,
{
    fn report(&self, fraction: f32, label: &str) {
        self(fraction, label);
    }
}

/// `done / total`, or `None` when the total is unknown.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub(crate) fn fraction(done: usize, total: Option<u64>) -> Option<f32> {
    match total {
        Some(total) if total > 0 => Some((done as f64 / total as f64).min(1.0) as f32),
        _ => None,
    }
}
