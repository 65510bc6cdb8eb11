use std::collections::HashMap;

use panelio_protocol::AUTO_SUFFIX_SEED;

/// Per-name numeric suffixes for arguments added with `auto`, so repeated
/// additions produce `name1`, `name2`, ... Scoped to one builder.
#[derive(Debug, Clone)]
pub struct AutoCounter {
    seed: u32,
    counters: HashMap<String, u32>,
}

impl Default for AutoCounter {
    fn default() -> Self {
        Self::with_seed(AUTO_SUFFIX_SEED)
    }
}

impl AutoCounter {
    #[must_use]
    pub fn with_seed(seed: u32) -> Self {
        Self {
            seed,
            counters: HashMap::new(),
        }
    }

    #[must_use]
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Suffix the next addition of `name` will use.
    pub fn suffix(&mut self, name: &str) -> u32 {
        *self.counters.entry(name.to_string()).or_insert(self.seed)
    }

    pub fn increment(&mut self, name: &str) -> u32 {
        let next = self.suffix(name).saturating_add(1);
        self.counters.insert(name.to_string(), next);
        next
    }

    /// Steps back one suffix, never below the seed, and returns the suffix of
    /// the last addition.
    pub fn decrement(&mut self, name: &str) -> u32 {
        let current = self.suffix(name);
        if current > self.seed {
            self.counters.insert(name.to_string(), current - 1);
            current - 1
        } else {
            current
        }
    }

    /// Forgets every counter but keeps the seed.
    pub fn reset(&mut self) {
        self.counters.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_saturates_at_max_seed() {
        let mut counter = AutoCounter::with_seed(u32::MAX);
        assert_eq!(counter.increment("x"), u32::MAX);
        assert_eq!(counter.suffix("x"), u32::MAX);
    }

    #[test]
    fn starts_at_seed() {
        let mut counter = AutoCounter::default();
        assert_eq!(counter.suffix("filter"), 1);
        assert_eq!(counter.increment("filter"), 2);
        assert_eq!(counter.suffix("filter"), 2);
        assert_eq!(counter.suffix("other"), 1);
    }

    #[test]
    fn decrement_never_goes_below_seed() {
        let mut counter = AutoCounter::with_seed(5);
        counter.increment("x");
        assert_eq!(counter.decrement("x"), 5);
        assert_eq!(counter.decrement("x"), 5);
    }

    #[test]
    fn reset_keeps_custom_seed() {
        let mut counter = AutoCounter::with_seed(3);
        counter.increment("x");
        counter.reset();
        assert_eq!(counter.seed(), 3);
        assert_eq!(counter.suffix("x"), 3);
    }
}
