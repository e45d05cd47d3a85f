// src/adzuna_client.rs

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::models::{Job, Source};
use crate::normalize;

const SEARCH_URL: &str = "https://api.adzuna.com/v1/api/jobs/us/search/1";
const MAX_RESULTS_PER_PAGE: usize = 50;

// Raw upstream shapes; every field may be absent.
#[derive(Debug, Deserialize)]
struct RawLocation {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCompany {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAdzunaJob {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    created: Option<String>,
    #[serde(default)]
    redirect_url: Option<String>,
    #[serde(default)]
    salary_min: Option<f64>,
    #[serde(default)]
    salary_max: Option<f64>,
    #[serde(default)]
    skill_tags: Option<Vec<String>>,
    #[serde(default)]
    location: Option<RawLocation>,
    #[serde(default)]
    company: Option<RawCompany>,
    #[serde(default)]
    category: Option<RawCategory>,
}

#[derive(Debug, Deserialize)]
struct AdzunaResponse {
    #[serde(default)]
    results: Vec<RawAdzunaJob>,
}

/// Single-page fetcher: one GET per invocation, no cache, no retry. Any
/// upstream failure degrades to an empty result.
#[derive(Clone)]
pub struct AdzunaClient {
    client: Client,
    app_id: String,
    app_key: String,
}

impl AdzunaClient {
    pub fn new(app_id: String, app_key: String) -> Self {
        Self {
            client: Client::builder()
                .user_agent("jobmatch/0.1")
                .timeout(Duration::from_secs(20))
                .build()
                .expect("build reqwest client"),
            app_id,
            app_key,
        }
    }

    pub async fn fetch(&self, query: &str, limit: usize) -> Vec<Job> {
        let location = "United States";
        tracing::info!(query, location, limit, "fetching Adzuna jobs");
        match self.search(query, location, limit).await {
            Ok(jobs) => {
                tracing::info!(count = jobs.len(), "fetched US jobs from Adzuna");
                jobs
            }
            Err(e) => {
                tracing::error!(error = %e, "Adzuna API request failed");
                Vec::new()
            }
        }
    }

    async fn search(
        &self,
        query: &str,
        location: &str,
        limit: usize,
    ) -> Result<Vec<Job>, Box<dyn std::error::Error + Send + Sync>> {
        let per_page = limit.min(MAX_RESULTS_PER_PAGE);
        let resp = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("app_id", self.app_id.as_str()),
                ("app_key", self.app_key.as_str()),
                ("what", query),
                ("where", location),
                ("results_per_page", &per_page.to_string()),
                ("content-type", "application/json"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: AdzunaResponse = resp.json().await?;
        let fetched_at = Utc::now();
        let jobs = body
            .results
            .into_iter()
            .take(limit)
            .filter_map(|raw| normalize_adzuna_job(raw, location, fetched_at))
            .collect();
        Ok(jobs)
    }
}

/// Maps one raw record into the canonical Job, or None when the location
/// fails the US filter.
fn normalize_adzuna_job(
    raw: RawAdzunaJob,
    default_location: &str,
    fetched_at: DateTime<Utc>,
) -> Option<Job> {
    let description = raw.description.unwrap_or_default();
    let title = raw.title.unwrap_or_default();
    let posted_date = raw
        .created
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(&s.replace('Z', "+00:00")).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(fetched_at);
    let salary = raw.salary_max.or(raw.salary_min).unwrap_or(0.0);
    let location = raw
        .location
        .and_then(|l| l.display_name)
        .unwrap_or_else(|| default_location.to_string());
    if !normalize::is_us_location(&location) {
        tracing::debug!(%title, %location, "filtered out non-US Adzuna job");
        return None;
    }
    let skills = match raw.skill_tags {
        Some(tags) if !tags.is_empty() => tags,
        _ => normalize::extract_skills(&description),
    };
    let category = raw.category.and_then(|c| c.label).unwrap_or_default();
    let is_remote = format!("{}{}", category, description)
        .to_lowercase()
        .contains("remote");

    Some(Job {
        experience_level: normalize::infer_experience_level(&title, &description),
        sponsorship_available: normalize::infer_sponsorship(&description),
        title,
        link: raw.redirect_url.unwrap_or_default(),
        company: raw
            .company
            .and_then(|c| c.display_name)
            .unwrap_or_else(|| "Unknown".to_string()),
        posted_date,
        location,
        skills,
        salary,
        is_remote,
        description,
        source: Source::Adzuna,
    })
}
