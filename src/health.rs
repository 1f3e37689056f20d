use chrono::{SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::handler::Dispatcher;

/// Shared by every transport for the lifetime of the process.
pub struct ServerState {
    pub started: Instant,
    pub dispatcher: Arc<Dispatcher>,
}

impl ServerState {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            started: Instant::now(),
            dispatcher,
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct HealthReport {
    pub status: String,
    /// Seconds since start.
    pub uptime: f64,
    pub timestamp: String,
}

pub fn health_report(state: &ServerState) -> HealthReport {
    HealthReport {
        status: "healthy".to_string(),
        uptime: state.uptime().as_secs_f64(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{Scheduler, testing::RecordingNotifier};
    use tokio_util::sync::CancellationToken;

    #[test]
    fn report_is_healthy_with_rfc3339_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = Scheduler::new(Arc::new(RecordingNotifier::default()), CancellationToken::new());
        let dispatcher = Arc::new(Dispatcher::load(dir.path().to_path_buf(), scheduler));
        let state = ServerState::new(dispatcher);

        let report = health_report(&state);
        assert_eq!(report.status, "healthy");
        assert!(report.uptime >= 0.0);
        assert!(chrono::DateTime::parse_from_rfc3339(&report.timestamp).is_ok());

        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("uptime").unwrap().is_f64());
    }
}
