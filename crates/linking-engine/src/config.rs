use std::time::Duration;

/// Time budgets for coordinator-driven operations.
///
/// Each knob bounds one await point. The acquire budget covers the whole
/// interactive provider flow, so it is much larger than the backend calls.
#[derive(Debug, Clone)]
pub struct LinkingConfig {
    /// Budget for submitting an acquired credential to the backend.
    pub link_timeout: Duration,
    /// Budget for the unlink call, including secret verification.
    pub unlink_timeout: Duration,
    /// Budget for the interactive credential acquisition flow.
    pub acquire_timeout: Duration,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            link_timeout: Duration::from_secs(10),
            unlink_timeout: Duration::from_secs(10),
            acquire_timeout: Duration::from_secs(120),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budgets() {
        let config = LinkingConfig::default();
        assert_eq!(config.link_timeout, Duration::from_secs(10));
        assert_eq!(config.unlink_timeout, Duration::from_secs(10));
        assert_eq!(config.acquire_timeout, Duration::from_secs(120));
    }
}
