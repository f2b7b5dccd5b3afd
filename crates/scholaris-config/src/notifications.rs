use std::env;

#[derive(Clone, Debug)]
pub struct NotificationConfig {
    /// Pending notifications held in memory before new ones are dropped.
    pub queue_capacity: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
        }
    }
}

impl NotificationConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let queue_capacity = lookup("NOTIFICATION_QUEUE_CAPACITY")
            .and_then(|s| s.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(Self::default().queue_capacity);

        Self { queue_capacity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_is_rejected() {
        let config = NotificationConfig::from_lookup(|_| Some("0".to_string()));
        assert_eq!(config.queue_capacity, 1024);
    }
}
