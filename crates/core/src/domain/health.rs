use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Healthy,
    Unhealthy,
    Unavailable,
    Disabled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Healthy,
    PartiallyHealthy,
    Unhealthy,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::PartiallyHealthy => "partially_healthy",
            Self::Unhealthy => "unhealthy",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    pub details: String,
}

impl ComponentHealth {
    pub fn new(status: ComponentStatus, details: impl Into<String>) -> Self {
        Self { status, details: details.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub overall: OverallStatus,
    pub document_provider: ComponentHealth,
    pub tracking_sink: ComponentHealth,
    pub notifier: ComponentHealth,
    pub checked_at: String,
}

impl HealthReport {
    /// Any unhealthy component makes the whole report unhealthy; otherwise any
    /// unavailable or disabled component degrades it to partially healthy.
    pub fn from_components(
        document_provider: ComponentHealth,
        tracking_sink: ComponentHealth,
        notifier: ComponentHealth,
        checked_at: impl Into<String>,
    ) -> Self {
        let statuses = [document_provider.status, tracking_sink.status, notifier.status];
        let overall = if statuses.contains(&ComponentStatus::Unhealthy) {
            OverallStatus::Unhealthy
        } else if statuses
            .iter()
            .any(|status| matches!(status, ComponentStatus::Unavailable | ComponentStatus::Disabled))
        {
            OverallStatus::PartiallyHealthy
        } else {
            OverallStatus::Healthy
        };

        Self { overall, document_provider, tracking_sink, notifier, checked_at: checked_at.into() }
    }
}
