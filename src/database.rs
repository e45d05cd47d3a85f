// src/database.rs

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{MySql, Pool, Row};
use tokio::sync::Mutex;

use crate::models::Job;

pub const CACHE_TTL_HOURS: i64 = 1;

/// One cached fetch result, keyed by (query, location, page).
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub jobs: Vec<Job>,
    pub total: usize,
    pub timestamp: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.timestamp < Duration::hours(CACHE_TTL_HOURS)
    }
}

pub fn cache_key(query: &str, location: &str, page: usize) -> String {
    format!("{}_{}_{}", query, location, page)
}

/// Key/value store with TTL-on-read semantics. Writes are upsert-by-key,
/// last writer wins; entries are never deleted, staleness is decided at
/// read time via [`CacheEntry::is_fresh`].
#[async_trait]
pub trait JobCache: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<CacheEntry>>;
    async fn upsert(&self, key: &str, entry: CacheEntry) -> anyhow::Result<()>;
    async fn ping(&self) -> bool;
}

#[derive(Clone)]
pub struct Database {
    pool: Pool<MySql>,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = Pool::connect(database_url).await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS linkedin_jobs_cache (
                cache_key VARCHAR(512) NOT NULL PRIMARY KEY,
                jobs JSON NOT NULL,
                total BIGINT NOT NULL,
                timestamp DATETIME(6) NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;
        Ok(Database { pool })
    }
}

#[async_trait]
impl JobCache for Database {
    async fn get(&self, key: &str) -> anyhow::Result<Option<CacheEntry>> {
        let row = sqlx::query(
            r#"SELECT jobs, total, timestamp FROM linkedin_jobs_cache WHERE cache_key = ? LIMIT 1"#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        let row = match row {
            Some(r) => r,
            None => return Ok(None),
        };
        let jobs_json: serde_json::Value = row.try_get("jobs")?;
        let jobs: Vec<Job> = serde_json::from_value(jobs_json)?;
        let total: i64 = row.try_get("total")?;
        let timestamp: DateTime<Utc> = row.try_get("timestamp")?;
        Ok(Some(CacheEntry {
            jobs,
            total: total.max(0) as usize,
            timestamp,
        }))
    }

    async fn upsert(&self, key: &str, entry: CacheEntry) -> anyhow::Result<()> {
        let jobs_json = serde_json::to_value(&entry.jobs)?;
        sqlx::query(
            r#"
            INSERT INTO linkedin_jobs_cache (cache_key, jobs, total, timestamp)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                jobs = VALUES(jobs),
                total = VALUES(total),
                timestamp = VALUES(timestamp)
            "#,
        )
        .bind(key)
        .bind(jobs_json)
        .bind(entry.total as i64)
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

/// Fallback store used when no DATABASE_URL is configured; also the test
/// double for the paged fetcher.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobCache for MemoryCache {
    async fn get(&self, key: &str) -> anyhow::Result<Option<CacheEntry>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn upsert(&self, key: &str, entry: CacheEntry) -> anyhow::Result<()> {
        self.entries.lock().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn ping(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExperienceLevel, Source};

    fn job(link: &str) -> Job {
        Job {
            title: "Engineer".into(),
            company: "Acme".into(),
            link: link.into(),
            location: "Austin, TX".into(),
            description: String::new(),
            posted_date: Utc::now(),
            salary: 0.0,
            skills: vec![],
            is_remote: false,
            sponsorship_available: false,
            experience_level: ExperienceLevel::Mid,
            source: Source::Linkedin,
        }
    }

    #[test]
    fn entry_freshness_uses_one_hour_ttl() {
        let now = Utc::now();
        let fresh = CacheEntry {
            jobs: vec![],
            total: 0,
            timestamp: now - Duration::minutes(59),
        };
        let stale = CacheEntry {
            jobs: vec![],
            total: 0,
            timestamp: now - Duration::minutes(61),
        };
        assert!(fresh.is_fresh(now));
        assert!(!stale.is_fresh(now));
    }

    #[test]
    fn cache_key_is_deterministic() {
        assert_eq!(cache_key("rust", "United States", 1), "rust_United States_1");
        assert_eq!(
            cache_key("rust", "United States", 1),
            cache_key("rust", "United States", 1)
        );
    }

    #[tokio::test]
    async fn memory_cache_upsert_overwrites() {
        let cache = MemoryCache::new();
        let first = CacheEntry {
            jobs: vec![job("a")],
            total: 1,
            timestamp: Utc::now(),
        };
        let second = CacheEntry {
            jobs: vec![job("b"), job("c")],
            total: 2,
            timestamp: Utc::now(),
        };
        cache.upsert("k", first).await.unwrap();
        cache.upsert("k", second).await.unwrap();
        let got = cache.get("k").await.unwrap().unwrap();
        assert_eq!(got.total, 2);
        assert_eq!(got.jobs[0].link, "b");
        assert!(cache.get("missing").await.unwrap().is_none());
    }
}
