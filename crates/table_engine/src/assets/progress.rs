//! Load progress aggregation
//!
//! Collects model-load milestones into a single percentage for the
//! page-load collaborator. Reported values are guaranteed
//! non-decreasing and the sequence terminates at exactly 100.

/// Share of the total percentage granted to model loads. The remainder
/// is reserved for the host page and released by [`ProgressTracker::finalize`].
pub const MODEL_LOAD_BAND: u32 = 50;

/// Callback receiving the aggregated percentage in [0, 100]
pub type ProgressListener = Box<dyn FnMut(u32)>;

/// Monotonic progress aggregator
#[derive(Default)]
pub struct ProgressTracker {
    current: u32,
    listener: Option<ProgressListener>,
}

impl ProgressTracker {
    /// Create a tracker at 0%
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the listener invoked on every advance
    pub fn set_listener(&mut self, listener: ProgressListener) {
        self.listener = Some(listener);
    }

    /// Last reported percentage
    pub fn current(&self) -> u32 {
        self.current
    }

    /// Report raw percentage; values below the current mark are ignored
    pub fn report(&mut self, percent: u32) {
        let percent = percent.min(100);
        if percent <= self.current {
            return;
        }
        self.current = percent;
        if let Some(listener) = self.listener.as_mut() {
            listener(percent);
        }
    }

    /// Fold cumulative model-load counts into the model band
    pub fn report_model_loads(&mut self, loaded: usize, requested: usize) {
        if requested == 0 {
            return;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percent = ((loaded as f64 / requested as f64) * f64::from(MODEL_LOAD_BAND)).round() as u32;
        self.report(percent);
    }

    /// Drive progress to exactly 100
    pub fn finalize(&mut self) {
        self.report(100);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn recording_tracker() -> (ProgressTracker, Rc<RefCell<Vec<u32>>>) {
        let seen: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut tracker = ProgressTracker::new();
        tracker.set_listener(Box::new(move |pct| sink.borrow_mut().push(pct)));
        (tracker, seen)
    }

    #[test]
    fn test_progress_is_monotonic_and_terminates_at_100() {
        let (mut tracker, seen) = recording_tracker();

        tracker.report_model_loads(1, 4);
        tracker.report_model_loads(2, 4);
        tracker.report_model_loads(1, 4); // regression attempt, ignored
        tracker.report_model_loads(4, 4);
        tracker.finalize();

        let reports = seen.borrow();
        assert!(reports.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*reports.last().unwrap(), 100);
    }

    #[test]
    fn test_model_loads_fill_half_the_band() {
        let (mut tracker, _) = recording_tracker();
        tracker.report_model_loads(3, 3);
        assert_eq!(tracker.current(), MODEL_LOAD_BAND);
    }

    #[test]
    fn test_no_division_by_zero_before_first_request() {
        let (mut tracker, seen) = recording_tracker();
        tracker.report_model_loads(0, 0);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_report_caps_at_100() {
        let (mut tracker, _) = recording_tracker();
        tracker.report(250);
        assert_eq!(tracker.current(), 100);
    }
}
