use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::errors::{CompactError, Result};

pub mod backend;
pub mod memory;
pub mod models;
pub mod traits;

pub use backend::SeaOrmStorage;
pub use memory::MemoryRateLimitStore;
pub use models::{
    DeviceType, NewShortLink, NewVisit, ShortLink, Tenant, TenantUpdate, Tier, Visit,
    WindowSnapshot,
};
pub use traits::{LinkStore, RateLimitStore, TenantStore, VisitStore};

pub struct StorageFactory;

impl StorageFactory {
    pub async fn create(config: &DatabaseConfig) -> Result<Arc<SeaOrmStorage>> {
        let database_url = &config.database_url;

        // 从 URL 自动推断数据库类型
        let backend_type = backend::infer_backend_from_url(database_url)?;

        let storage = SeaOrmStorage::new(database_url, &backend_type, config).await?;
        Ok(Arc::new(storage))
    }
}

/// 为一次存储调用加上超时，超时按存储错误（`StoreTimeout`）返回
pub async fn bounded<T, F>(operation: &str, timeout: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(CompactError::store_timeout(format!(
            "{} timed out after {} ms",
            operation,
            timeout.as_millis()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_passes_result_through() {
        let ok = bounded("op", Duration::from_millis(100), async { Ok(5) }).await;
        assert_eq!(ok.unwrap(), 5);

        let err: Result<()> = bounded("op", Duration::from_millis(100), async {
            Err(CompactError::not_found("x"))
        })
        .await;
        assert!(matches!(err, Err(CompactError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let result: Result<()> = bounded("slow_op", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        match result {
            Err(CompactError::StoreTimeout(msg)) => assert!(msg.contains("slow_op")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
