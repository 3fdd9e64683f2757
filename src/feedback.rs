/// Latency of the most recently completed signing operation, carried into the next
/// decision. Not an average: every record replaces the previous value.
///
/// The service loop owns the only instance and lends it `&mut` to one session at a time,
/// so the write for session N always precedes the read for session N+1.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FeedbackState {
    last_latency_ms: f32,
}

impl FeedbackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 0 until the first signature has been measured.
    pub fn previous_latency_ms(&self) -> f32 {
        self.last_latency_ms
    }

    pub fn record(&mut self, latency_ms: f32) {
        self.last_latency_ms = latency_ms;
    }
}
