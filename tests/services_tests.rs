//! Service-level tests against a real SQLite database and failing mocks

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use common::{TestEnv, setup};
use compactlink::config::AnalyticsConfig;
use compactlink::errors::{CompactError, Result};
use compactlink::services::{
    CodeGenerator, CreationService, CreationSettings, GeoIpProvider, QuotaManager, RateLimiter,
    RequestMeta, ResolutionService, VisitRecorder,
};
use compactlink::storage::{
    LinkStore, MemoryRateLimitStore, NewShortLink, NewVisit, RateLimitStore, SeaOrmStorage,
    ShortLink, Tier, VisitStore, WindowSnapshot,
};

const TOKEN: &str = "service-test-token-0001";
const BODY: &[u8] = br#"{"longUrl":"https://example.com/landing"}"#;

fn bearer() -> String {
    format!("Bearer {}", TOKEN)
}

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

/// 用指定的生成器组装创建服务
fn creation_with(env: &TestEnv, generator: CodeGenerator) -> CreationService {
    CreationService::new(
        env.storage.clone(),
        env.storage.clone(),
        Arc::new(RateLimiter::new(
            Arc::new(MemoryRateLimitStore::new()),
            60,
            1_000,
            Duration::from_secs(5),
        )),
        QuotaManager::new(60),
        generator,
        CreationSettings::from_config(&env.config),
        Duration::from_secs(5),
    )
}

// =============================================================================
// Quota
// =============================================================================

#[tokio::test]
async fn test_quota_allows_last_link_then_denies() {
    let env = setup().await;
    let mut tenant = env.tenant(Tier::Free, TOKEN).await;
    tenant.links_this_month = 499;
    env.storage.overwrite_tenant_usage(&tenant).await.unwrap();

    let created = env
        .services
        .creation
        .create(BODY, Some(&bearer()), "req-1")
        .await
        .unwrap();
    assert_eq!(created.link.tenant_id, tenant.id);

    let after = env.storage.find_tenant(&tenant.id).await.unwrap().unwrap();
    assert_eq!(after.links_this_month, 500);
    assert_eq!(after.link_count, 1);

    let denied = env
        .services
        .creation
        .create(BODY, Some(&bearer()), "req-2")
        .await;
    match denied {
        Err(CompactError::QuotaExceeded(msg)) => assert!(msg.contains("500/500")),
        other => panic!("expected quota error, got {:?}", other),
    }

    // 拒绝不写库
    let after = env.storage.find_tenant(&tenant.id).await.unwrap().unwrap();
    assert_eq!(after.links_this_month, 500);
    assert_eq!(after.link_count, 1);
}

#[tokio::test]
async fn test_monthly_reset_applies_before_quota_check() {
    let env = setup().await;
    let mut tenant = env
        .storage
        .create_tenant_at(Tier::Free, Some(TOKEN.to_string()), at(2026, 3, 15))
        .await
        .unwrap();
    assert_eq!(
        tenant.link_limit_reset_date,
        Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap()
    );
    tenant.links_this_month = 500;
    tenant.api_calls_today = 100;
    env.storage.overwrite_tenant_usage(&tenant).await.unwrap();

    let service = creation_with(&env, CodeGenerator::new(7, 100));

    // 重置日之前：仍然超限
    let denied = service
        .create_at(BODY, Some(&bearer()), "req-1", at(2026, 3, 31))
        .await;
    assert!(matches!(denied, Err(CompactError::QuotaExceeded(_))));

    // 过了重置日
    let now = at(2026, 4, 2);
    service
        .create_at(BODY, Some(&bearer()), "req-2", now)
        .await
        .unwrap();

    let after = env.storage.find_tenant(&tenant.id).await.unwrap().unwrap();
    assert_eq!(after.links_this_month, 1);
    assert_eq!(after.api_calls_today, 1);
    assert_eq!(
        after.link_limit_reset_date,
        Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap()
    );
    assert!(after.link_limit_reset_date > now);
}

// =============================================================================
// Code uniqueness
// =============================================================================

#[tokio::test]
async fn test_forced_collisions_retry_then_exhaust() {
    let env = setup().await;
    env.tenant(Tier::Enterprise, TOKEN).await;

    // 两个字符、长度 1：只有 "a" 和 "b"
    let service = creation_with(&env, CodeGenerator::with_alphabet(1, 40, b"ab"));

    let first = service.create(BODY, Some(&bearer()), "r1").await.unwrap();
    let second = service.create(BODY, Some(&bearer()), "r2").await.unwrap();
    let mut codes = vec![first.link.code.clone(), second.link.code.clone()];
    codes.sort();
    assert_eq!(codes, vec!["a", "b"]);

    let exhausted = service.create(BODY, Some(&bearer()), "r3").await;
    assert!(matches!(
        exhausted,
        Err(CompactError::CodeGenerationExhausted(_))
    ));

    // 另一个 header 命名空间还有空位
    let namespaced = service
        .create(
            br#"{"longUrl":"https://example.com/landing","header":"promo"}"#,
            Some(&bearer()),
            "r4",
        )
        .await
        .unwrap();
    assert_eq!(namespaced.link.header.as_deref(), Some("promo"));
    assert!(env
        .storage
        .find_link(&namespaced.link.code, Some("promo"))
        .await
        .unwrap()
        .is_some());
}

/// 第一次插入报短码冲突，模拟检查之后被并发请求抢先
struct LosesFirstInsert {
    inner: Arc<SeaOrmStorage>,
    inserts: AtomicU32,
}

#[async_trait]
impl LinkStore for LosesFirstInsert {
    async fn insert_link(&self, link: NewShortLink) -> Result<ShortLink> {
        if self.inserts.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(CompactError::duplicate_code(format!(
                "短码已存在: {}",
                link.code
            )));
        }
        self.inner.insert_link(link).await
    }
    async fn find_link(&self, code: &str, header: Option<&str>) -> Result<Option<ShortLink>> {
        self.inner.find_link(code, header).await
    }
    async fn link_exists(&self, code: &str, header: Option<&str>) -> Result<bool> {
        self.inner.link_exists(code, header).await
    }
    async fn increment_click(&self, link_id: i64) -> Result<()> {
        self.inner.increment_click(link_id).await
    }
}

#[tokio::test]
async fn test_duplicate_on_insert_retries_with_new_code() {
    let env = setup().await;
    let tenant = env.tenant(Tier::Free, TOKEN).await;

    let links = Arc::new(LosesFirstInsert {
        inner: env.storage.clone(),
        inserts: AtomicU32::new(0),
    });
    let service = CreationService::new(
        links.clone(),
        env.storage.clone(),
        Arc::new(RateLimiter::new(
            Arc::new(MemoryRateLimitStore::new()),
            60,
            1_000,
            Duration::from_secs(5),
        )),
        QuotaManager::new(60),
        CodeGenerator::new(7, 10),
        CreationSettings::from_config(&env.config),
        Duration::from_secs(5),
    );

    let created = service.create(BODY, Some(&bearer()), "race").await.unwrap();
    assert_eq!(links.inserts.load(Ordering::SeqCst), 2);
    assert!(env
        .storage
        .find_link(&created.link.code, None)
        .await
        .unwrap()
        .is_some());

    // 失败的那次插入不计入用量
    let after = env.storage.find_tenant(&tenant.id).await.unwrap().unwrap();
    assert_eq!(after.links_this_month, 1);
    assert_eq!(after.link_count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creation_never_duplicates_codes() {
    let env = setup().await;
    env.tenant(Tier::Enterprise, TOKEN).await;

    // 只有 3 个可用短码，24 个请求同时抢
    let service = Arc::new(creation_with(
        &env,
        CodeGenerator::with_alphabet(1, 40, b"abc"),
    ));

    let tasks: Vec<_> = (0..24)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .create(BODY, Some(&bearer()), &format!("req-{}", i))
                    .await
            })
        })
        .collect();

    let mut codes = Vec::new();
    let mut exhausted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(created) => codes.push(created.link.code),
            Err(CompactError::CodeGenerationExhausted(_)) => exhausted += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    codes.sort();
    assert_eq!(codes, vec!["a", "b", "c"]);
    assert_eq!(exhausted, 21);
}

#[tokio::test]
async fn test_array_body_is_rejected_without_writes() {
    let env = setup().await;
    let tenant = env.tenant(Tier::Free, TOKEN).await;

    let result = env
        .services
        .creation
        .create(
            br#"["https://example.com/x","promo"]"#,
            Some(&bearer()),
            "array",
        )
        .await;
    assert!(matches!(result, Err(CompactError::MalformedBody(_))));

    let after = env.storage.find_tenant(&tenant.id).await.unwrap().unwrap();
    assert_eq!(after.link_count, 0);
    assert_eq!(after.api_calls_today, 0);
}

// =============================================================================
// Rate limiting
// =============================================================================

#[tokio::test]
async fn test_database_rate_limit_window() {
    let env = setup().await;
    let limiter = RateLimiter::new(env.storage.clone(), 60, 3, Duration::from_secs(5));
    let start = Utc::now();

    for expected in [2, 1, 0] {
        let status = limiter.check_limit_at(TOKEN, start).await;
        assert!(status.allowed);
        assert_eq!(status.remaining, expected);
    }

    let denied = limiter
        .check_limit_at(TOKEN, start + chrono::Duration::seconds(10))
        .await;
    assert!(!denied.allowed);
    assert_eq!(denied.remaining, 0);
    assert!(denied.retry_after_secs > 0 && denied.retry_after_secs <= 50);

    // 其他标识不受影响
    assert!(limiter.check_limit_at("someone-else", start).await.allowed);

    // 窗口过后恢复
    let later = start + chrono::Duration::seconds(61);
    assert!(limiter.check_limit_at(TOKEN, later).await.allowed);
    assert!(limiter.sweep().await.is_ok());
}

struct UnreachableRateLimitStore;

#[async_trait]
impl RateLimitStore for UnreachableRateLimitStore {
    async fn purge_expired(&self, _identifier: &str, _now: DateTime<Utc>) -> Result<()> {
        Err(CompactError::database_connection("connection refused"))
    }
    async fn window_entries(&self, _identifier: &str) -> Result<WindowSnapshot> {
        Err(CompactError::database_connection("connection refused"))
    }
    async fn record_hit(
        &self,
        _identifier: &str,
        _created_at: DateTime<Utc>,
        _expires_at: DateTime<Utc>,
    ) -> Result<()> {
        Err(CompactError::database_connection("connection refused"))
    }
    async fn sweep_expired(&self, _now: DateTime<Utc>) -> Result<u64> {
        Err(CompactError::database_connection("connection refused"))
    }
    fn name(&self) -> &'static str {
        "unreachable"
    }
}

struct HangingRateLimitStore;

#[async_trait]
impl RateLimitStore for HangingRateLimitStore {
    async fn purge_expired(&self, _identifier: &str, _now: DateTime<Utc>) -> Result<()> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
    async fn window_entries(&self, _identifier: &str) -> Result<WindowSnapshot> {
        Ok(WindowSnapshot {
            count: 0,
            oldest_expiry: None,
        })
    }
    async fn record_hit(
        &self,
        _identifier: &str,
        _created_at: DateTime<Utc>,
        _expires_at: DateTime<Utc>,
    ) -> Result<()> {
        Ok(())
    }
    async fn sweep_expired(&self, _now: DateTime<Utc>) -> Result<u64> {
        Ok(0)
    }
    fn name(&self) -> &'static str {
        "hanging"
    }
}

#[tokio::test]
async fn test_rate_limiter_fails_open() {
    let limiter = RateLimiter::new(
        Arc::new(UnreachableRateLimitStore),
        60,
        10,
        Duration::from_secs(1),
    );
    for _ in 0..20 {
        let status = limiter.check_limit(TOKEN).await;
        assert!(status.allowed);
        assert_eq!(status.remaining, 9);
    }
    assert!(limiter.sweep().await.is_err());

    let slow = RateLimiter::new(
        Arc::new(HangingRateLimitStore),
        60,
        10,
        Duration::from_millis(50),
    );
    assert!(slow.check_limit(TOKEN).await.allowed);
}

// =============================================================================
// Resolution bookkeeping
// =============================================================================

struct BrokenVisitStore;

#[async_trait]
impl VisitStore for BrokenVisitStore {
    async fn insert_visit(&self, _link_id: i64, _visit: NewVisit) -> Result<()> {
        Err(CompactError::database_operation("disk full"))
    }
}

#[tokio::test]
async fn test_resolution_survives_visit_failure() {
    let env = setup().await;
    env.tenant(Tier::Free, TOKEN).await;
    let created = env
        .services
        .creation
        .create(BODY, Some(&bearer()), "req")
        .await
        .unwrap();

    let recorder = Arc::new(VisitRecorder::new(
        Arc::new(BrokenVisitStore),
        GeoIpProvider::new(&AnalyticsConfig::default()),
        Duration::from_secs(1),
    ));
    let resolution =
        ResolutionService::new(env.storage.clone(), recorder, Duration::from_secs(5), 50);

    let link = resolution
        .resolve_path(&created.link.code, &RequestMeta::default(), "req")
        .await
        .unwrap();
    assert_eq!(link.target, "https://example.com/landing");

    // 访问记录失败，点击数照常增加
    let stored = env
        .storage
        .find_link(&created.link.code, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.click_count, 1);
    assert_eq!(env.storage.count_visits(link.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_each_resolution_records_one_visit() {
    let env = setup().await;
    env.tenant(Tier::Free, TOKEN).await;
    let created = env
        .services
        .creation
        .create(BODY, Some(&bearer()), "req")
        .await
        .unwrap();

    let meta = RequestMeta {
        ip: None,
        user_agent: None,
        referrer: None,
    };
    for _ in 0..3 {
        env.services
            .resolution
            .resolve_path(&format!("/{}", created.link.code), &meta, "req")
            .await
            .unwrap();
    }

    let stored = env
        .storage
        .find_link(&created.link.code, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.click_count, 3);

    let visits = env.storage.list_visits(stored.id).await.unwrap();
    assert_eq!(visits.len(), 3);
    assert!(visits.iter().all(|v| v.ip_address == "IP not found"));
    assert!(visits.iter().all(|v| v.referrer == "Direct"));
    assert!(visits.iter().all(|v| v.location == "Unknown"));
}
