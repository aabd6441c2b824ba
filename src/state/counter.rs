/// Default spacing between progress notifications
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;

/// Running total of questions found on leaf nodes
///
/// One counter belongs to one crawl. It only grows; there is no reset.
#[derive(Debug, Clone)]
pub struct QuestionCounter {
    total: u64,
    interval: u64,
    last_milestone: u64,
}

impl QuestionCounter {
    /// Creates a counter that reports every `interval` questions
    ///
    /// An interval of zero is treated as one.
    pub fn new(interval: u64) -> Self {
        Self {
            total: 0,
            interval: interval.max(1),
            last_milestone: 0,
        }
    }

    /// Adds a leaf's questions to the total
    ///
    /// Returns the highest multiple of the interval crossed for the first
    /// time by this addition, if any. A single large addition that skips
    /// several multiples reports only the highest one.
    pub fn add(&mut self, questions: u64) -> Option<u64> {
        self.total = self.total.saturating_add(questions);

        let milestone = (self.total / self.interval) * self.interval;
        if milestone > self.last_milestone {
            self.last_milestone = milestone;
            Some(milestone)
        } else {
            None
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }
}

impl Default for QuestionCounter {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_INTERVAL)
    }
}
