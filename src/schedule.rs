const MIN_PERIOD_MS: f64 = 1.0;

/// Fixed-period timer on a host clock. A stall longer than one period
/// fires once and then resumes on the original phase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interval {
    period_ms: f64,
    next_deadline_ms: f64,
}

impl Interval {
    pub fn new(start_ms: f64, period_ms: f64) -> Self {
        let period_ms = if period_ms.is_finite() {
            period_ms.max(MIN_PERIOD_MS)
        } else {
            MIN_PERIOD_MS
        };
        let start_ms = if start_ms.is_finite() { start_ms } else { 0.0 };

        Self {
            period_ms,
            next_deadline_ms: start_ms + period_ms,
        }
    }

    pub fn period_ms(&self) -> f64 {
        self.period_ms
    }

    pub fn next_deadline_ms(&self) -> f64 {
        self.next_deadline_ms
    }

    pub fn poll(&mut self, now_ms: f64) -> bool {
        if !(now_ms >= self.next_deadline_ms) {
            return false;
        }

        let missed = ((now_ms - self.next_deadline_ms) / self.period_ms).floor();
        self.next_deadline_ms += (missed + 1.0) * self.period_ms;
        true
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailingTimeout {
    duration_ms: f64,
    deadline_ms: Option<f64>,
}

impl TrailingTimeout {
    pub fn new(duration_ms: f64) -> Self {
        Self {
            duration_ms: duration_ms.max(0.0),
            deadline_ms: None,
        }
    }

    pub fn touch(&mut self, now_ms: f64) {
        if now_ms.is_finite() {
            self.deadline_ms = Some(now_ms + self.duration_ms);
        }
    }

    pub fn is_active(&self, now_ms: f64) -> bool {
        matches!(self.deadline_ms, Some(deadline) if now_ms < deadline)
    }
}
