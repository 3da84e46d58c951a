//! Visit recording
//!
//! Turns request metadata into a `NewVisit` (client IP, device class,
//! OS, browser, referrer, location) and appends it to the visit store.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::geoip::GeoIpProvider;
use super::user_agent::parse_user_agent;
use crate::errors::Result;
use crate::storage::{NewVisit, VisitStore, bounded};

pub const IP_NOT_FOUND: &str = "IP not found";
pub const DIRECT_REFERRER: &str = "Direct";

/// Request metadata captured by the HTTP layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

pub struct VisitRecorder {
    store: Arc<dyn VisitStore>,
    geoip: GeoIpProvider,
    timeout: Duration,
}

impl VisitRecorder {
    pub fn new(store: Arc<dyn VisitStore>, geoip: GeoIpProvider, timeout: Duration) -> Self {
        Self {
            store,
            geoip,
            timeout,
        }
    }

    /// Derive the visit row for a request
    pub async fn derive(&self, meta: &RequestMeta) -> NewVisit {
        let client = parse_user_agent(meta.user_agent.as_deref());

        let (ip_address, location) = match meta.ip.as_deref().filter(|ip| !ip.is_empty()) {
            Some(ip) => (ip.to_string(), self.geoip.location_of(ip).await),
            None => (
                IP_NOT_FOUND.to_string(),
                super::geoip::UNKNOWN_LOCATION.to_string(),
            ),
        };

        NewVisit {
            ip_address,
            user_agent: meta.user_agent.clone(),
            device_type: client.device_type,
            os: client.os,
            browser: client.browser,
            referrer: meta
                .referrer
                .clone()
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DIRECT_REFERRER.to_string()),
            location,
            visited_at: Utc::now(),
        }
    }

    /// Append a visit for `link_id`. Errors are returned to the caller,
    /// which decides whether they matter.
    pub async fn record(&self, link_id: i64, meta: &RequestMeta) -> Result<()> {
        let visit = self.derive(meta).await;
        bounded(
            "visit.insert",
            self.timeout,
            self.store.insert_visit(link_id, visit),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyticsConfig;
    use crate::storage::DeviceType;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct CapturingStore {
        visits: Mutex<Vec<(i64, NewVisit)>>,
    }

    #[async_trait]
    impl VisitStore for CapturingStore {
        async fn insert_visit(&self, link_id: i64, visit: NewVisit) -> Result<()> {
            self.visits.lock().await.push((link_id, visit));
            Ok(())
        }
    }

    fn recorder(store: Arc<CapturingStore>) -> VisitRecorder {
        VisitRecorder::new(
            store,
            GeoIpProvider::new(&AnalyticsConfig::default()),
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn test_defaults_for_bare_request() {
        let store = Arc::new(CapturingStore::default());
        let visit = recorder(store).derive(&RequestMeta::default()).await;

        assert_eq!(visit.ip_address, "IP not found");
        assert_eq!(visit.referrer, "Direct");
        assert_eq!(visit.location, "Unknown");
        assert_eq!(visit.device_type, DeviceType::Desktop);
        assert_eq!(visit.os, "Unknown");
        assert_eq!(visit.browser, "Unknown");
        assert!(visit.user_agent.is_none());
    }

    #[tokio::test]
    async fn test_record_appends_derived_visit() {
        let store = Arc::new(CapturingStore::default());
        let meta = RequestMeta {
            ip: Some("203.0.113.7".to_string()),
            user_agent: Some(
                "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1"
                    .to_string(),
            ),
            referrer: Some("https://news.example.org/".to_string()),
        };

        recorder(store.clone()).record(42, &meta).await.unwrap();

        let visits = store.visits.lock().await;
        assert_eq!(visits.len(), 1);
        let (link_id, visit) = &visits[0];
        assert_eq!(*link_id, 42);
        assert_eq!(visit.ip_address, "203.0.113.7");
        assert_eq!(visit.device_type, DeviceType::Mobile);
        assert_eq!(visit.referrer, "https://news.example.org/");
        assert_eq!(visit.location, "Unknown");
    }
}
