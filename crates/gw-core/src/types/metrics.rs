use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct ActivityStats {
    pub total: u64,
    pub succeeded: u64,
}

impl ActivityStats {
    /// Percentage of successful calls, rounded to two decimals.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let rate = self.succeeded as f64 / self.total as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GatewayMetrics {
    pub total_requests: u64,
    pub success_rate: f64,
    pub total_teams: u64,
    pub total_servers: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_handles_empty_and_rounds() {
        assert!((ActivityStats::default().success_rate() - 0.0).abs() < f64::EPSILON);
        let stats = ActivityStats {
            total: 3,
            succeeded: 2,
        };
        assert!((stats.success_rate() - 66.67).abs() < 1e-9);
    }
}
