//! Scheduling priorities

/// Relative urgency of a task
///
/// Ordered most urgent first, so `Priority::Critical < Priority::Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Priority {
    Critical,
    High,
    Normal,
    Low,
    /// Reserved for the display consumer
    Background,
}

impl Priority {
    /// Numeric level, lower is more urgent
    pub const fn level(self) -> u16 {
        match self {
            Priority::Critical => 10,
            Priority::High => 20,
            Priority::Normal => 30,
            Priority::Low => 50,
            Priority::Background => 1000,
        }
    }

    /// Parse a priority name as used in `node.toml`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "critical" => Some(Priority::Critical),
            "high" => Some(Priority::High),
            "normal" => Some(Priority::Normal),
            "low" => Some(Priority::Low),
            "background" => Some(Priority::Background),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_matches_level() {
        let levels = [
            Priority::Critical,
            Priority::High,
            Priority::Normal,
            Priority::Low,
            Priority::Background,
        ];
        for pair in levels.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].level() < pair[1].level());
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Priority::from_name("high"), Some(Priority::High));
        assert_eq!(Priority::from_name("background"), Some(Priority::Background));
        assert_eq!(Priority::from_name("urgent"), None);
    }
}
