//! Engine configuration.
//!
//! Values are provided by the application at construction time, not read
//! from the environment here.

use std::time::Duration;

/// Overstay sweeper configuration.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// How often the sweep runs.
    pub interval: Duration,
    /// Maximum number of expired bookings processed per run. Anything
    /// beyond the limit is picked up by the next run.
    pub batch_limit: u32,
}

impl SweeperConfig {
    /// Create a sweeper configuration with the given interval.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            batch_limit: 500,
        }
    }

    /// Set the per-run batch limit.
    #[must_use]
    pub const fn with_batch_limit(mut self, limit: u32) -> Self {
        self.batch_limit = limit;
        self
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

/// Ticket number generation configuration.
#[derive(Debug, Clone)]
pub struct TicketConfig {
    /// Fixed prefix in front of the random suffix, e.g. `"TICKET-"`.
    pub prefix: String,
    /// How many times entry recording retries generation after a
    /// uniqueness collision before giving up.
    pub max_attempts: u32,
}

impl TicketConfig {
    /// Create a ticket configuration with the given prefix.
    #[must_use]
    pub const fn new(prefix: String) -> Self {
        Self {
            prefix,
            max_attempts: 5,
        }
    }

    /// Set the retry bound for collision handling.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self::new("TICKET-".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweeper_config_builder() {
        let config = SweeperConfig::new(Duration::from_secs(30)).with_batch_limit(10);
        assert_eq!(config.interval, Duration::from_secs(30));
        assert_eq!(config.batch_limit, 10);
    }

    #[test]
    fn ticket_config_defaults() {
        let config = TicketConfig::default();
        assert_eq!(config.prefix, "TICKET-");
        assert_eq!(config.max_attempts, 5);
    }
}
