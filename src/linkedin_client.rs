// src/linkedin_client.rs

use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::database::{cache_key, CacheEntry, JobCache};
use crate::models::{Job, Source};
use crate::normalize;

const MAX_PAGES: usize = 50;
/// Soft wall-clock budget; leaves headroom under an assumed 60 s
/// caller-side request timeout.
const WALL_BUDGET: Duration = Duration::from_secs(50);
/// Pacing between successful page fetches, for upstream rate limits.
const PAGE_DELAY: Duration = Duration::from_secs(4);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounded retry with exponential backoff, driving a tokio sleep so other
/// in-flight fetches keep running during the wait.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_factor: 4.0,
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying `attempt` (0-based).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        Duration::from_secs_f64(self.backoff_factor.powi(attempt as i32))
    }
}

#[derive(Debug, Serialize)]
struct SearchPayload<'a> {
    search_terms: &'a str,
    location: &'a str,
    page: String,
    fetch_full_text: &'static str,
}

#[derive(Debug, Deserialize)]
struct RawLinkedInJob {
    #[serde(default)]
    job_title: Option<String>,
    #[serde(default)]
    job_location: Option<String>,
    #[serde(default)]
    job_description: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    posted_date: Option<String>,
    #[serde(default)]
    salary: Option<String>,
    #[serde(default)]
    linkedin_job_url_cleaned: Option<String>,
    #[serde(default)]
    job_url: Option<String>,
    #[serde(default)]
    company_name: Option<String>,
}

enum PageFetch {
    Jobs(Vec<RawLinkedInJob>),
    /// Empty page: no more results upstream.
    Exhausted,
    /// 429 after all retry attempts.
    RateLimited,
    /// Request timeout; abort paging without retry.
    TimedOut,
    /// Any other HTTP failure, fatal for this fetch.
    Failed(anyhow::Error),
}

/// Paged fetcher with a 1-hour read-through cache, retry/backoff on 429,
/// and fixed inter-page pacing. Never fails the caller: on any exhaustion
/// it returns whatever was collected.
#[derive(Clone)]
pub struct LinkedInClient {
    client: reqwest::Client,
    api_key: String,
    url: String,
    host: String,
    retry: RetryPolicy,
}

impl LinkedInClient {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("jobmatch/0.1")
            .build()
            .expect("build reqwest client");
        Self {
            client,
            api_key,
            url: "https://linkedin-jobs-search.p.rapidapi.com/".to_string(),
            host: "linkedin-jobs-search.p.rapidapi.com".to_string(),
            retry: RetryPolicy::default(),
        }
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-rapidapi-host",
            HeaderValue::from_str(&self.host).expect("invalid host"),
        );
        headers.insert(
            "x-rapidapi-key",
            HeaderValue::from_str(&self.api_key).expect("invalid rapidapi key"),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    /// Returns (jobs for the requested page, total collected count).
    pub async fn fetch(
        &self,
        query: &str,
        location: &str,
        page: usize,
        per_page: usize,
        min_jobs: usize,
        cache: &dyn JobCache,
    ) -> (Vec<Job>, usize) {
        let key = cache_key(query, location, page);
        let now = Utc::now();
        match cache.get(&key).await {
            Ok(Some(entry)) if entry.is_fresh(now) => {
                tracing::info!(query, page, "using cached LinkedIn jobs");
                let total = entry.total;
                return (entry.jobs, total);
            }
            Ok(_) => {}
            Err(e) => {
                // Store unreachable is a cache miss, never fatal.
                tracing::warn!(error = %e, "cache read failed, fetching upstream");
            }
        }

        let mut all_jobs: Vec<Job> = Vec::new();
        let mut current_page = page;
        let started = Instant::now();

        while all_jobs.len() < min_jobs && current_page <= MAX_PAGES {
            if started.elapsed() > WALL_BUDGET {
                tracing::warn!(
                    elapsed_secs = started.elapsed().as_secs(),
                    collected = all_jobs.len(),
                    "approaching timeout, stopping fetch"
                );
                break;
            }

            match self.fetch_page(query, location, current_page).await {
                PageFetch::Jobs(raw_jobs) => {
                    let fetched_at = Utc::now();
                    let page_count = raw_jobs.len();
                    all_jobs.extend(
                        raw_jobs
                            .into_iter()
                            .filter_map(|raw| normalize_linkedin_job(raw, fetched_at)),
                    );
                    all_jobs.sort_by(|a, b| b.posted_date.cmp(&a.posted_date));
                    tracing::info!(
                        page = current_page,
                        fetched = page_count,
                        collected = all_jobs.len(),
                        "fetched LinkedIn page"
                    );
                    current_page += 1;
                    if all_jobs.len() < min_jobs && current_page <= MAX_PAGES {
                        tokio::time::sleep(PAGE_DELAY).await;
                    }
                }
                PageFetch::Exhausted => {
                    tracing::info!(page = current_page, "no more jobs upstream");
                    break;
                }
                PageFetch::RateLimited => {
                    tracing::error!(page = current_page, "max retries reached on rate limit");
                    break;
                }
                PageFetch::TimedOut => {
                    tracing::warn!(page = current_page, "request timeout, stopping fetch");
                    break;
                }
                PageFetch::Failed(e) => {
                    tracing::error!(error = %e, page = current_page, "LinkedIn API error");
                    break;
                }
            }
        }

        let total = all_jobs.len();
        if !all_jobs.is_empty() {
            let entry = CacheEntry {
                jobs: all_jobs.iter().take(min_jobs).cloned().collect(),
                total,
                timestamp: Utc::now(),
            };
            if let Err(e) = cache.upsert(&key, entry).await {
                tracing::warn!(error = %e, "cache write failed");
            } else {
                tracing::info!(count = total, query, page, "cached LinkedIn jobs");
            }
        }

        (slice_page(&all_jobs, page, per_page, min_jobs), total)
    }

    async fn fetch_page(&self, query: &str, location: &str, page: usize) -> PageFetch {
        let payload = SearchPayload {
            search_terms: query,
            location: if location.is_empty() {
                "United States"
            } else {
                location
            },
            page: page.to_string(),
            fetch_full_text: "yes",
        };

        for attempt in 0..self.retry.max_attempts {
            tracing::info!(query, location, page, attempt = attempt + 1, "fetching LinkedIn jobs");
            let result = self
                .client
                .post(&self.url)
                .headers(self.auth_headers())
                .json(&payload)
                .send()
                .await;

            let resp = match result {
                Ok(r) => r,
                Err(e) if e.is_timeout() => return PageFetch::TimedOut,
                Err(e) => return PageFetch::Failed(e.into()),
            };

            if resp.status() == StatusCode::TOO_MANY_REQUESTS {
                if attempt + 1 == self.retry.max_attempts {
                    return PageFetch::RateLimited;
                }
                let wait = self.retry.backoff_delay(attempt);
                tracing::warn!(
                    wait_secs = wait.as_secs_f64(),
                    attempt = attempt + 1,
                    max = self.retry.max_attempts,
                    "rate limit hit, backing off"
                );
                tokio::time::sleep(wait).await;
                continue;
            }
            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return PageFetch::Failed(anyhow::anyhow!("HTTP {}: {}", status, body));
            }

            return match resp.json::<Vec<RawLinkedInJob>>().await {
                Ok(jobs) if jobs.is_empty() => PageFetch::Exhausted,
                Ok(jobs) => PageFetch::Jobs(jobs),
                Err(e) => {
                    tracing::warn!(error = %e, "unexpected LinkedIn response shape");
                    PageFetch::Exhausted
                }
            };
        }
        PageFetch::RateLimited
    }
}

/// Page 1 returns the full working set (up to `min_jobs`) so downstream
/// ranking has enough material; later pages get a plain window.
fn slice_page(jobs: &[Job], page: usize, per_page: usize, min_jobs: usize) -> Vec<Job> {
    if page > 1 {
        let start = (page - 1) * per_page;
        let end = (start + per_page).min(jobs.len());
        if start >= jobs.len() {
            return Vec::new();
        }
        jobs[start..end].to_vec()
    } else {
        jobs.iter().take(min_jobs).cloned().collect()
    }
}

fn normalize_linkedin_job(raw: RawLinkedInJob, fetched_at: DateTime<Utc>) -> Option<Job> {
    let location = raw
        .job_location
        .unwrap_or_else(|| "United States".to_string());
    let title = raw.job_title.unwrap_or_default();
    if !normalize::is_us_location(&location) {
        tracing::debug!(%title, %location, "filtered out non-US LinkedIn job");
        return None;
    }
    let description = raw
        .job_description
        .or(raw.description)
        .unwrap_or_default();
    let posted_date = raw
        .posted_date
        .as_deref()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(fetched_at);
    let salary_str = match raw.salary {
        Some(s) if !s.is_empty() => s,
        _ => normalize::extract_salary_from_description(&description),
    };
    let salary = normalize::parse_salary(&salary_str);

    Some(Job {
        link: raw
            .linkedin_job_url_cleaned
            .or(raw.job_url)
            .unwrap_or_default(),
        company: raw.company_name.unwrap_or_else(|| "Unknown".to_string()),
        posted_date,
        location,
        skills: normalize::extract_skills(&description),
        salary,
        is_remote: description.to_lowercase().contains("remote"),
        sponsorship_available: normalize::infer_sponsorship(&description),
        experience_level: normalize::infer_experience_level(&title, &description),
        title,
        description,
        source: Source::Linkedin,
    })
}
