//! In-Flight Indicator
//!
//! Observable "request outstanding" flag, split into a write side held by
//! the synchronizer and read-only watches handed to the UI.

use tokio::sync::watch;

/// Write side: counts outstanding requests
#[derive(Debug)]
pub struct InFlightIndicator {
    count: watch::Sender<usize>,
}

impl Default for InFlightIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl InFlightIndicator {
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self { count }
    }

    pub fn is_active(&self) -> bool {
        *self.count.borrow() > 0
    }

    pub fn outstanding(&self) -> usize {
        *self.count.borrow()
    }

    pub fn watch(&self) -> InFlightWatch {
        InFlightWatch {
            count: self.count.subscribe(),
        }
    }

    /// Mark one request as outstanding until the ticket is dropped
    pub fn begin(&self) -> InFlightTicket<'_> {
        self.count.send_modify(|count| *count += 1);
        InFlightTicket { indicator: self }
    }
}

/// Clears its share of the indicator on drop, whatever the exit path
#[must_use = "the indicator is cleared when the ticket is dropped"]
pub struct InFlightTicket<'a> {
    indicator: &'a InFlightIndicator,
}

impl Drop for InFlightTicket<'_> {
    fn drop(&mut self) {
        self.indicator
            .count
            .send_modify(|count| *count = count.saturating_sub(1));
    }
}

/// Read side of the indicator
#[derive(Debug, Clone)]
pub struct InFlightWatch {
    count: watch::Receiver<usize>,
}

impl InFlightWatch {
    pub fn is_active(&self) -> bool {
        *self.count.borrow() > 0
    }

    /// Wait until the indicator reaches `active`
    pub async fn wait_for(&mut self, active: bool) {
        // Sender lives as long as the synchronizer; a closed channel means idle
        let _ = self.count.wait_for(|count| (*count > 0) == active).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_sets_and_clears() {
        let indicator = InFlightIndicator::new();
        let watch = indicator.watch();
        assert!(!watch.is_active());

        {
            let _ticket = indicator.begin();
            assert!(indicator.is_active());
            assert!(watch.is_active());
        }

        assert!(!indicator.is_active());
        assert!(!watch.is_active());
    }

    #[test]
    fn test_overlapping_tickets_stay_active_until_last() {
        let indicator = InFlightIndicator::new();
        let first = indicator.begin();
        let second = indicator.begin();
        assert_eq!(indicator.outstanding(), 2);

        drop(first);
        assert!(indicator.is_active());
        drop(second);
        assert!(!indicator.is_active());
    }

    #[test]
    fn test_cleared_on_panic() {
        let indicator = InFlightIndicator::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ticket = indicator.begin();
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(!indicator.is_active());
    }
}
