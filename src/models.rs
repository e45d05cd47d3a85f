// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_now() -> DateTime<Utc> {
    Utc::now()
}
fn default_mid() -> String {
    "mid".to_string()
}
fn default_page() -> usize {
    1
}
fn default_per_page() -> usize {
    20
}
fn default_sort_by() -> String {
    "posted_date".to_string()
}

/// Which upstream provider a job came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Adzuna,
    Linkedin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
}

impl ExperienceLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "entry" => Some(Self::Entry),
            "mid" => Some(Self::Mid),
            "senior" => Some(Self::Senior),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Mid => "mid",
            Self::Senior => "senior",
        }
    }
}

/// Canonical job record. Built once by a source fetcher's normalization
/// step and immutable downstream; every instance has already passed the
/// US-location filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub title: String,
    pub company: String,
    pub link: String,
    pub location: String,
    pub description: String,
    #[serde(default = "default_now")]
    pub posted_date: DateTime<Utc>,
    /// Annualized estimate; 0.0 when the posting lists nothing usable.
    pub salary: f64,
    pub skills: Vec<String>,
    pub is_remote: bool,
    pub sponsorship_available: bool,
    pub experience_level: ExperienceLevel,
    pub source: Source,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default = "default_mid")]
    pub experience_level: String,
    #[serde(default)]
    pub needs_sponsorship: bool,
    #[serde(default)]
    pub preferred_locations: Vec<String>,
    #[serde(default)]
    pub min_salary: f64,
    #[serde(default)]
    pub remote_preference: bool,
    #[serde(default)]
    pub desired_job_role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Filters {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "experienceLevel", default)]
    pub experience_level: Option<String>,
    #[serde(rename = "remoteOnly", default)]
    pub remote_only: bool,
    #[serde(rename = "minSalary", default)]
    pub min_salary: f64,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_per_page")]
    pub per_page: usize,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default)]
    pub date_posted: Option<String>,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            location: None,
            experience_level: None,
            remote_only: false,
            min_salary: 0.0,
            page: 1,
            per_page: 20,
            sort_by: default_sort_by(),
            date_posted: None,
        }
    }
}

impl Filters {
    pub fn page(&self) -> usize {
        self.page.max(1)
    }
}

/// A job that cleared the score threshold, with its ranking attachments.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredJob {
    #[serde(flatten)]
    pub job: Job,
    #[serde(rename = "matchScore")]
    pub match_score: f64,
    pub skill_gaps: Vec<String>,
    pub is_hot: bool,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub user_profile: UserProfile,
    #[serde(default)]
    pub filters: Option<Filters>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<ScoredJob>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}
