/// Simulated progress never passes this while the request is pending.
pub const SIMULATED_CEILING: f32 = 95.0;
/// Upper bound for one simulated tick.
pub const MAX_SIMULATED_INCREMENT: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressSource {
    /// Driven by timer ticks until the outcome arrives.
    #[default]
    Simulated,
    /// Mirrors progress reported by the transport.
    Mirrored,
}

/// Percentage for the in-flight request. Non-decreasing until reset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressState {
    value: f32,
    source: ProgressSource,
    finished: bool,
}

impl ProgressState {
    /// Fresh state for a newly dispatched request.
    pub fn start() -> Self {
        Self::default()
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn percent(&self) -> u8 {
        self.value.round().clamp(0.0, 100.0) as u8
    }

    pub fn source(&self) -> ProgressSource {
        self.source
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Applies one simulated tick. Ignored once real progress has been seen.
    pub fn tick(&mut self, increment: f32) {
        if self.finished || self.source == ProgressSource::Mirrored {
            return;
        }
        let increment = if increment.is_finite() {
            increment.clamp(0.0, MAX_SIMULATED_INCREMENT)
        } else {
            0.0
        };
        let next = (self.value + increment).min(SIMULATED_CEILING);
        self.value = self.value.max(next);
    }

    /// Mirrors a transport-reported percentage.
    ///
    /// Returns `true` the first time real progress is seen, which is when the
    /// simulation timer should stop.
    pub fn mirror(&mut self, percent: f32) -> bool {
        if self.finished || !percent.is_finite() {
            return false;
        }
        self.value = self.value.max(percent.clamp(0.0, 100.0));
        let switched = self.source != ProgressSource::Mirrored;
        self.source = ProgressSource::Mirrored;
        switched
    }

    /// Forces 100% on any outcome.
    pub fn finish(&mut self) {
        self.value = 100.0;
        self.finished = true;
    }
}
