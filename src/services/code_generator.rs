//! 短码生成
//!
//! 从字母表中均匀随机取字符（`rand::random_range` 走线程本地 CSPRNG，
//! 不存在取模偏差）。唯一性由调用方在存储层确认，碰撞时重新生成，
//! 总尝试次数有上限。

use std::future::Future;

use tracing::{debug, warn};

use crate::errors::{CompactError, Result};

pub const DEFAULT_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// 单次尝试的结果
#[derive(Debug)]
pub enum Attempt<T> {
    /// 短码可用，流程结束
    Accepted(T),
    /// 短码已被占用，换一个重试
    Collision,
}

#[derive(Debug, Clone)]
pub struct CodeGenerator {
    length: usize,
    max_attempts: u32,
    alphabet: Vec<u8>,
}

impl CodeGenerator {
    pub fn new(length: usize, max_attempts: u32) -> Self {
        Self::with_alphabet(length, max_attempts, DEFAULT_ALPHABET)
    }

    /// 自定义字母表（测试里缩小字母表和长度来制造碰撞）
    pub fn with_alphabet(length: usize, max_attempts: u32, alphabet: &[u8]) -> Self {
        let alphabet = if alphabet.is_empty() {
            DEFAULT_ALPHABET.to_vec()
        } else {
            alphabet.to_vec()
        };
        Self {
            length: length.max(1),
            max_attempts: max_attempts.max(1),
            alphabet,
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// 生成一个候选短码（不检查唯一性）
    pub fn generate(&self) -> String {
        std::iter::repeat_with(|| {
            self.alphabet[rand::random_range(0..self.alphabet.len())] as char
        })
        .take(self.length)
        .collect()
    }

    /// 有界重试：每个候选交给 `attempt`，直到被接受或用完尝试次数
    ///
    /// `attempt` 返回 `Collision` 表示短码已占用；返回错误则立即终止。
    pub async fn generate_unique<T, F, Fut>(&self, mut attempt: F) -> Result<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<Attempt<T>>>,
    {
        for round in 1..=self.max_attempts {
            let candidate = self.generate();
            match attempt(candidate.clone()).await? {
                Attempt::Accepted(value) => {
                    if round > 1 {
                        debug!("Short code {} accepted after {} attempts", candidate, round);
                    }
                    return Ok(value);
                }
                Attempt::Collision => {
                    debug!("Short code collision: {} (attempt {})", candidate, round);
                }
            }
        }

        warn!(
            "Failed to find an unused short code after {} attempts (length {})",
            self.max_attempts, self.length
        );
        Err(CompactError::code_generation_exhausted(format!(
            "Failed to generate a unique short code after {} attempts",
            self.max_attempts
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[test]
    fn test_generate_length_and_charset() {
        let generator = CodeGenerator::new(7, 100);
        for _ in 0..200 {
            let code = generator.generate();
            assert_eq!(code.len(), 7);
            assert!(code.bytes().all(|b| DEFAULT_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_legacy_length_is_just_a_setting() {
        let generator = CodeGenerator::new(5, 100);
        assert_eq!(generator.generate().len(), 5);
    }

    #[test]
    fn test_codes_are_spread_over_alphabet() {
        let generator = CodeGenerator::with_alphabet(1, 1, b"abcd");
        let seen: HashSet<String> = (0..400).map(|_| generator.generate()).collect();
        assert_eq!(seen.len(), 4);
    }

    #[tokio::test]
    async fn test_generate_unique_skips_collisions() {
        let generator = CodeGenerator::with_alphabet(1, 50, b"ab");
        let taken = Mutex::new(HashSet::from(["a".to_string()]));

        let code = generator
            .generate_unique(|candidate| {
                let free = !taken.lock().unwrap().contains(&candidate);
                async move {
                    Ok(if free {
                        Attempt::Accepted(candidate)
                    } else {
                        Attempt::Collision
                    })
                }
            })
            .await
            .unwrap();

        assert_eq!(code, "b");
    }

    #[tokio::test]
    async fn test_generate_unique_exhausts_cleanly() {
        let generator = CodeGenerator::with_alphabet(1, 5, b"x");
        let mut calls = 0u32;

        let result: Result<String> = generator
            .generate_unique(|_| {
                calls += 1;
                async { Ok(Attempt::Collision) }
            })
            .await;

        assert!(matches!(result, Err(CompactError::CodeGenerationExhausted(_))));
        assert_eq!(calls, 5);
    }

    #[tokio::test]
    async fn test_generate_unique_propagates_store_errors() {
        let generator = CodeGenerator::new(7, 10);
        let mut calls = 0u32;

        let result: Result<String> = generator
            .generate_unique(|_| {
                calls += 1;
                async { Err(CompactError::database_operation("boom")) }
            })
            .await;

        assert!(matches!(result, Err(CompactError::DatabaseOperation(_))));
        assert_eq!(calls, 1);
    }
}
