//! 存储层重试策略
//!
//! 失败先归类，再由操作的重放语义决定要不要再试一次：
//!
//! - 唯一索引冲突是业务结果（短码碰撞），原样交给上层换码
//! - 语句没执行或已被数据库回滚（取连接超时、死锁、SQLite BUSY）随时可以重放
//! - 语句发出后连接断开，结果未知；只有幂等操作才能重放，
//!   否则一次插入可能落两行、一次计数可能加两次

use std::future::Future;
use std::ops::Deref;
use std::time::Duration;

use sea_orm::error::RuntimeErr;
use sea_orm::{DbErr, SqlErr};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::DatabaseConfig;

/// 失败归类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// 唯一索引冲突
    Conflict,
    /// 数据库保证语句没有生效
    NotApplied,
    /// 语句可能已经生效
    Indeterminate,
    /// 重试也不会变好
    Fatal,
}

/// 操作能否在结果未知时重放
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replay {
    /// 读、删除过期数据、写绝对值
    Idempotent,
    /// 插入、计数器自增
    AtMostOnce,
}

impl Replay {
    pub fn permits(self, failure: Failure) -> bool {
        match failure {
            Failure::NotApplied => true,
            Failure::Indeterminate => self == Replay::Idempotent,
            Failure::Conflict | Failure::Fatal => false,
        }
    }
}

// MySQL 死锁 / 锁等待超时，PostgreSQL 序列化失败 / 死锁 / 拿不到锁，
// SQLite BUSY / LOCKED 及其扩展码
const ROLLED_BACK_CODES: &[&str] = &[
    "1213", "1205", "40001", "40P01", "55P03", "5", "6", "261", "262", "517",
];

pub fn classify(err: &DbErr) -> Failure {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return Failure::Conflict;
    }

    match err {
        DbErr::ConnectionAcquire(_) => Failure::NotApplied,
        DbErr::Conn(_) => Failure::Indeterminate,
        DbErr::Exec(runtime) | DbErr::Query(runtime) => classify_runtime(runtime),
        _ => Failure::Fatal,
    }
}

fn classify_runtime(err: &RuntimeErr) -> Failure {
    match err {
        RuntimeErr::SqlxError(sqlx_err) => match sqlx_err.deref().as_database_error() {
            Some(db_err) => {
                let code = db_err.code();
                match code.as_deref() {
                    Some(code) if ROLLED_BACK_CODES.contains(&code) => Failure::NotApplied,
                    _ => Failure::Fatal,
                }
            }
            // IO / 协议错误：请求可能已经到达数据库
            None => Failure::Indeterminate,
        },
        RuntimeErr::Internal(msg) => classify_message(&msg.to_lowercase()),
        #[allow(unreachable_patterns)]
        _ => Failure::Fatal,
    }
}

/// 驱动只给出文本时的兜底
fn classify_message(msg: &str) -> Failure {
    if msg.contains("unique constraint") || msg.contains("duplicate") {
        Failure::Conflict
    } else if msg.contains("deadlock")
        || msg.contains("lock wait timeout")
        || msg.contains("database is locked")
    {
        Failure::NotApplied
    } else if msg.contains("connection") {
        Failure::Indeterminate
    } else {
        Failure::Fatal
    }
}

/// 指数退避 + 0-25% 抖动
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl From<&DatabaseConfig> for RetryPolicy {
    fn from(config: &DatabaseConfig) -> Self {
        let base_delay = Duration::from_millis(config.retry_base_delay_ms);
        Self {
            max_retries: config.retry_count,
            base_delay,
            max_delay: Duration::from_millis(config.retry_max_delay_ms).max(base_delay),
        }
    }
}

impl RetryPolicy {
    /// 第 `retry` 次重试前的等待时间（从 1 开始）
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.saturating_sub(1).min(16);
        let capped = self.base_delay.saturating_mul(factor).min(self.max_delay);
        let jitter_ms = rand::random_range(0..=capped.as_millis() as u64 / 4);
        capped + Duration::from_millis(jitter_ms)
    }

    pub async fn run<T, F, Fut>(
        &self,
        operation: &str,
        replay: Replay,
        mut attempt_once: F,
    ) -> Result<T, DbErr>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DbErr>>,
    {
        let mut retries = 0;
        loop {
            let err = match attempt_once().await {
                Ok(value) => {
                    if retries > 0 {
                        debug!("{} succeeded after {} retries", operation, retries);
                    }
                    return Ok(value);
                }
                Err(e) => e,
            };

            let failure = classify(&err);
            if !replay.permits(failure) || retries >= self.max_retries {
                debug!("{} failed ({:?}, {:?}): {}", operation, failure, replay, err);
                return Err(err);
            }

            retries += 1;
            let delay = self.backoff(retries);
            warn!(
                "{} failed (attempt {}/{}): {}; retrying in {:?}",
                operation,
                retries,
                self.max_retries + 1,
                err,
                delay
            );
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn internal_exec(msg: &str) -> DbErr {
        DbErr::Exec(RuntimeErr::Internal(msg.to_string()))
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            classify(&DbErr::ConnectionAcquire(
                sea_orm::error::ConnAcquireErr::Timeout
            )),
            Failure::NotApplied
        );
        assert_eq!(
            classify(&DbErr::Conn(RuntimeErr::Internal("connection reset".into()))),
            Failure::Indeterminate
        );
        assert_eq!(
            classify(&internal_exec("Deadlock found when trying to get lock")),
            Failure::NotApplied
        );
        assert_eq!(
            classify(&DbErr::Query(RuntimeErr::Internal("database is locked".into()))),
            Failure::NotApplied
        );
        assert_eq!(
            classify(&internal_exec(
                "UNIQUE constraint failed: short_links.short_code, short_links.header"
            )),
            Failure::Conflict
        );
        assert_eq!(
            classify(&DbErr::RecordNotFound("gone".into())),
            Failure::Fatal
        );
    }

    #[test]
    fn test_replay_permits() {
        assert!(Replay::Idempotent.permits(Failure::Indeterminate));
        assert!(!Replay::AtMostOnce.permits(Failure::Indeterminate));
        assert!(Replay::AtMostOnce.permits(Failure::NotApplied));
        for replay in [Replay::Idempotent, Replay::AtMostOnce] {
            assert!(!replay.permits(Failure::Conflict));
            assert!(!replay.permits(Failure::Fatal));
        }
    }

    #[test]
    fn test_policy_from_database_config() {
        let db_config = DatabaseConfig {
            retry_count: 5,
            retry_base_delay_ms: 500,
            retry_max_delay_ms: 100,
            ..Default::default()
        };
        let policy = RetryPolicy::from(&db_config);
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(500));
        // max 不能小于 base
        assert_eq!(policy.max_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy::default();
        let ms = |retry| policy.backoff(retry).as_millis();
        assert!((100..=125).contains(&ms(1)));
        assert!((200..=250).contains(&ms(2)));
        assert!((400..=500).contains(&ms(3)));
        assert!((2000..=2500).contains(&ms(40)));
    }

    #[tokio::test]
    async fn test_run_retries_until_success() {
        let calls = AtomicU32::new(0);
        let result = fast_policy(3)
            .run("op", Replay::AtMostOnce, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(DbErr::ConnectionAcquire(
                            sea_orm::error::ConnAcquireErr::Timeout,
                        ))
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result = fast_policy(2)
            .run("op", Replay::Idempotent, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(internal_exec("database is locked")) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_indeterminate_failure_replays_only_idempotent_work() {
        let lost_ack = || DbErr::Conn(RuntimeErr::Internal("connection closed".into()));

        let calls = AtomicU32::new(0);
        let result = fast_policy(3)
            .run("insert", Replay::AtMostOnce, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(lost_ack()) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let calls = AtomicU32::new(0);
        let result = fast_policy(3)
            .run("read", Replay::Idempotent, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { if n == 0 { Err(lost_ack()) } else { Ok(()) } }
            })
            .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_conflict_is_returned_without_retry() {
        let calls = AtomicU32::new(0);
        let result = fast_policy(3)
            .run("insert", Replay::Idempotent, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(internal_exec("Duplicate entry 'abc' for key")) }
            })
            .await;

        assert_eq!(classify(&result.unwrap_err()), Failure::Conflict);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
