// src/recommender.rs
//
// Aggregation and ranking core: runs both source fetchers concurrently,
// merges and time-filters the results, scores each job against the
// candidate profile, and composes the final balanced page.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::adzuna_client::AdzunaClient;
use crate::database::JobCache;
use crate::embeddings::{similarity, EmbeddingProvider};
use crate::error::RecommendError;
use crate::linkedin_client::LinkedInClient;
use crate::models::{ExperienceLevel, Filters, Job, ScoredJob, Source, UserProfile};

const SCORE_THRESHOLD: f64 = 60.0;
const MIN_JOBS: usize = 100;
const ADZUNA_LIMIT: usize = 50;
const LINKEDIN_PAGE_SHARE: f64 = 0.7;

#[derive(Debug, Deserialize)]
struct CorpusRecord {
    #[serde(flatten)]
    job: Job,
    embedding: Vec<f32>,
}

/// Pre-embedded job corpus loaded once at startup and read-only
/// thereafter. Its jobs join the merged set with their stored vectors;
/// freshly fetched jobs get vectors computed per request.
pub struct CorpusCache {
    jobs: Vec<Job>,
    embeddings: Vec<Vec<f32>>,
}

impl CorpusCache {
    pub async fn load(path: &str) -> anyhow::Result<Self> {
        let raw = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading corpus file {}", path))?;
        let records: Vec<CorpusRecord> =
            serde_json::from_slice(&raw).context("parsing corpus file")?;
        let (jobs, embeddings) = records
            .into_iter()
            .map(|r| (r.job, r.embedding))
            .unzip();
        Ok(Self { jobs, embeddings })
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

pub struct Recommender {
    adzuna: AdzunaClient,
    linkedin: LinkedInClient,
    cache: Arc<dyn JobCache>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    corpus: Option<CorpusCache>,
}

impl Recommender {
    pub fn new(
        adzuna: AdzunaClient,
        linkedin: LinkedInClient,
        cache: Arc<dyn JobCache>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        corpus: Option<CorpusCache>,
    ) -> Self {
        Self {
            adzuna,
            linkedin,
            cache,
            embedder,
            corpus,
        }
    }

    /// The single inbound operation: fetch, aggregate, rank, compose.
    /// Upstream and cache failures degrade to fewer results; only bad
    /// input or a scoring failure surfaces as an error.
    pub async fn recommend(
        &self,
        profile: &UserProfile,
        filters: &Filters,
    ) -> Result<(Vec<ScoredJob>, usize), RecommendError> {
        if profile.skills.is_empty() && profile.desired_job_role.is_empty() {
            return Err(RecommendError::Validation(
                "At least one skill or desired job role is required".to_string(),
            ));
        }

        let query = if profile.desired_job_role.is_empty() {
            profile
                .skills
                .iter()
                .take(5)
                .cloned()
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            profile.desired_job_role.clone()
        };
        let location = filters.location.clone().unwrap_or_default();

        // Both fetchers run concurrently; visible latency is the max of
        // the two.
        let (adzuna_jobs, (linkedin_jobs, linkedin_total)) = tokio::join!(
            self.adzuna.fetch(&query, ADZUNA_LIMIT),
            self.linkedin.fetch(
                &query,
                &location,
                filters.page(),
                filters.per_page,
                MIN_JOBS,
                self.cache.as_ref(),
            )
        );
        let adzuna_count = adzuna_jobs.len();
        tracing::info!(
            linkedin = linkedin_jobs.len(),
            adzuna = adzuna_count,
            "collected jobs from sources"
        );

        let now = Utc::now();
        let mut all_jobs: Vec<Job> = linkedin_jobs;
        all_jobs.extend(adzuna_jobs);
        let all_jobs = apply_date_filter(all_jobs, filters.date_posted.as_deref(), now);

        let scored = self.score(profile, all_jobs, now).await?;
        Ok(compose_results(
            scored,
            filters,
            linkedin_total,
            adzuna_count,
        ))
    }

    /// Attach a base similarity to every job, then run the ranking pass.
    async fn score(
        &self,
        profile: &UserProfile,
        jobs: Vec<Job>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScoredJob>, RecommendError> {
        let similarities = match &self.embedder {
            Some(embedder) => {
                let job_texts: Vec<String> = jobs.iter().map(job_text).collect();
                let user_text = profile_text(profile);
                // Corpus and user embeddings may run concurrently; both
                // must land before scoring starts.
                let (job_vectors, user_vector) = tokio::join!(
                    embedder.embed_batch(&job_texts),
                    embedder.embed(&user_text)
                );
                let job_vectors = job_vectors?;
                let user_vector = user_vector?;
                let mut sims: Vec<f64> = job_vectors
                    .iter()
                    .map(|v| similarity(&user_vector, v))
                    .collect();
                if let Some(corpus) = &self.corpus {
                    sims.extend(
                        corpus
                            .embeddings
                            .iter()
                            .map(|v| similarity(&user_vector, v)),
                    );
                }
                sims
            }
            None => vec![0.0; jobs.len() + self.corpus.as_ref().map_or(0, |c| c.len())],
        };

        let mut all_jobs = jobs;
        if let Some(corpus) = &self.corpus {
            all_jobs.extend(corpus.jobs.iter().cloned());
        }
        debug_assert_eq!(similarities.len(), all_jobs.len());

        let pairs: Vec<(Job, f64)> = all_jobs.into_iter().zip(similarities).collect();
        Ok(rank_jobs(profile, pairs, now))
    }
}

/// No caller preference defaults to a 7-day window; unknown values mean no
/// filter.
pub fn apply_date_filter(
    jobs: Vec<Job>,
    date_posted: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<Job> {
    let cutoff = match date_posted {
        None | Some("") => Some(now - Duration::days(7)),
        Some("24h") => Some(now - Duration::hours(24)),
        Some("7d") => Some(now - Duration::days(7)),
        Some("30d") => Some(now - Duration::days(30)),
        Some(_) => None,
    };
    match cutoff {
        Some(cutoff) => {
            let filtered: Vec<Job> = jobs
                .into_iter()
                .filter(|j| j.posted_date >= cutoff)
                .collect();
            tracing::info!(remaining = filtered.len(), "applied date filter");
            filtered
        }
        None => jobs,
    }
}

fn profile_text(profile: &UserProfile) -> String {
    let skills = if profile.skills.is_empty() {
        "various skills".to_string()
    } else {
        profile.skills.join(", ")
    };
    let role = if profile.desired_job_role.is_empty() {
        "any"
    } else {
        &profile.desired_job_role
    };
    let remote = if profile.remote_preference {
        " preferring remote work"
    } else {
        ""
    };
    let sponsorship = if profile.needs_sponsorship {
        " requiring visa sponsorship"
    } else {
        ""
    };
    format!(
        "A {} level professional skilled in {}. Seeking a {} position{}{}.",
        profile.experience_level, skills, role, remote, sponsorship
    )
}

fn job_text(job: &Job) -> String {
    format!(
        "{} at {} requiring skills: {}. Experience level: {}. Located in {}, {}.",
        job.title,
        job.company,
        job.skills.join(", "),
        job.experience_level.as_str(),
        job.location,
        if job.is_remote { "remote" } else { "on-site" }
    )
}

fn user_level(profile: &UserProfile) -> ExperienceLevel {
    ExperienceLevel::parse(&profile.experience_level).unwrap_or(ExperienceLevel::Mid)
}

/// One ranking pass over the merged list in merge order: dedup by link
/// (first occurrence wins), base similarity plus heuristic bonuses, a
/// per-company diversity penalty, and the inclusive score-60 threshold.
/// Scores stay unclamped here; clamping happens at output.
pub fn rank_jobs(
    profile: &UserProfile,
    jobs: Vec<(Job, f64)>,
    now: DateTime<Utc>,
) -> Vec<ScoredJob> {
    let user_skills: HashSet<String> = profile.skills.iter().map(|s| s.to_lowercase()).collect();
    let level = user_level(profile);
    let mut seen_links: HashSet<String> = HashSet::new();
    let mut seen_companies: HashMap<String, u32> = HashMap::new();
    let mut ranked = Vec::new();

    for (job, base_similarity) in jobs {
        if !seen_links.insert(job.link.clone()) {
            continue;
        }

        let score = base_similarity * 100.0;
        let job_skills: HashSet<String> = job.skills.iter().map(|s| s.to_lowercase()).collect();
        let skill_match = job_skills.intersection(&user_skills).count() as f64
            / user_skills.len().max(1) as f64
            * 50.0;
        let exp_match = if job.experience_level == level { 40.0 } else { 0.0 };
        let job_location = job.location.to_lowercase();
        let location_match = if profile
            .preferred_locations
            .iter()
            .any(|loc| job_location.contains(&loc.to_lowercase()))
        {
            15.0
        } else {
            0.0
        };
        let remote_match = if profile.remote_preference && job.is_remote {
            15.0
        } else {
            0.0
        };
        let sponsorship_match = if profile.needs_sponsorship && job.sponsorship_available {
            15.0
        } else {
            0.0
        };
        let source_boost = if job.source == Source::Linkedin { 20.0 } else { 0.0 };
        let recency_boost = if (now - job.posted_date).num_days() <= 3 {
            10.0
        } else {
            0.0
        };

        let prior = seen_companies.entry(job.company.clone()).or_insert(0);
        let diversity_penalty = (5.0 * f64::from(*prior)).min(20.0);
        *prior += 1;

        let total = score
            + skill_match
            + exp_match
            + location_match
            + remote_match
            + sponsorship_match
            + source_boost
            + recency_boost
            - diversity_penalty;

        if total >= SCORE_THRESHOLD {
            let skill_gaps = job
                .skills
                .iter()
                .filter(|s| !user_skills.contains(&s.to_lowercase()))
                .cloned()
                .collect();
            let is_hot =
                total > 90.0 || (now - job.posted_date) < Duration::hours(24);
            ranked.push(ScoredJob {
                job,
                match_score: total,
                skill_gaps,
                is_hot,
            });
        }
    }
    ranked
}

/// Caller filters in fixed order, stable sort, 70/30 source balancing,
/// then pagination. Reported total is the upper-bound source estimate, not
/// the post-threshold count.
pub fn compose_results(
    mut jobs: Vec<ScoredJob>,
    filters: &Filters,
    linkedin_total: usize,
    adzuna_count: usize,
) -> (Vec<ScoredJob>, usize) {
    if filters.remote_only {
        jobs.retain(|j| j.job.is_remote);
    }
    if filters.min_salary > 0.0 {
        jobs.retain(|j| j.job.salary >= filters.min_salary);
    }
    if let Some(location) = &filters.location {
        let needle = location.to_lowercase();
        jobs.retain(|j| j.job.location.to_lowercase().contains(&needle));
    }
    if let Some(level) = filters
        .experience_level
        .as_deref()
        .and_then(ExperienceLevel::parse)
    {
        jobs.retain(|j| j.job.experience_level == level);
    }

    // Vec::sort_by is stable, so equal keys keep their merge order.
    if filters.sort_by == "posted_date" {
        jobs.sort_by(|a, b| b.job.posted_date.cmp(&a.job.posted_date));
    } else {
        jobs.sort_by(|a, b| {
            b.match_score
                .partial_cmp(&a.match_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    // per_page of 0 yields an empty page rather than being clamped up,
    // keeping the echoed envelope consistent with the slice.
    let per_page = filters.per_page;
    let linkedin_min = (per_page as f64 * LINKEDIN_PAGE_SHARE) as usize;
    let (linkedin_jobs, other_jobs): (Vec<ScoredJob>, Vec<ScoredJob>) = jobs
        .into_iter()
        .partition(|j| j.job.source == Source::Linkedin);
    let mut balanced: Vec<ScoredJob> = linkedin_jobs.into_iter().take(linkedin_min).collect();
    balanced.extend(other_jobs.into_iter().take(per_page - linkedin_min));

    let total = linkedin_total + adzuna_count;

    let page = filters.page();
    let start = (page - 1) * per_page;
    let end = (start + per_page).min(balanced.len());
    let mut page_jobs: Vec<ScoredJob> = if start >= balanced.len() {
        Vec::new()
    } else {
        balanced[start..end].to_vec()
    };
    for job in &mut page_jobs {
        job.match_score = ((job.match_score * 10.0).round() / 10.0).clamp(0.0, 100.0);
    }
    (page_jobs, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn profile(skills: &[&str]) -> UserProfile {
        UserProfile {
            skills: skills.iter().map(|s| s.to_string()).collect(),
            experience_level: "senior".into(),
            needs_sponsorship: false,
            preferred_locations: vec![],
            min_salary: 0.0,
            remote_preference: false,
            desired_job_role: "engineer".into(),
        }
    }

    fn job(link: &str, company: &str, source: Source, posted: DateTime<Utc>) -> Job {
        Job {
            title: "Engineer".into(),
            company: company.into(),
            link: link.into(),
            location: "Austin, TX".into(),
            description: String::new(),
            posted_date: posted,
            salary: 100_000.0,
            skills: vec![],
            is_remote: false,
            sponsorship_available: false,
            experience_level: ExperienceLevel::Entry,
            source,
        }
    }

    fn scored(job: Job, score: f64) -> ScoredJob {
        ScoredJob {
            job,
            match_score: score,
            skill_gaps: vec![],
            is_hot: false,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 29, 12, 0, 0).unwrap()
    }

    fn old_date() -> DateTime<Utc> {
        now() - Duration::days(10)
    }

    #[test]
    fn score_threshold_is_inclusive_at_60() {
        // No bonuses apply: adzuna source, entry vs senior level, stale
        // posting, no skills. Total is the base similarity alone.
        let included = rank_jobs(
            &profile(&["python"]),
            vec![(job("a", "Acme", Source::Adzuna, old_date()), 0.60)],
            now(),
        );
        assert_eq!(included.len(), 1);
        assert!((included[0].match_score - 60.0).abs() < 1e-9);

        let excluded = rank_jobs(
            &profile(&["python"]),
            vec![(job("b", "Acme", Source::Adzuna, old_date()), 0.599)],
            now(),
        );
        assert!(excluded.is_empty());
    }

    #[test]
    fn duplicate_links_keep_first_occurrence() {
        let mut first = job("same", "First Co", Source::Linkedin, old_date());
        first.skills = vec!["python".into()];
        let second = job("same", "Second Co", Source::Adzuna, old_date());
        let ranked = rank_jobs(
            &profile(&["python"]),
            vec![(first, 0.9), (second, 0.9)],
            now(),
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].job.company, "First Co");
    }

    #[test]
    fn diversity_penalty_steps_by_five_capped_at_twenty() {
        let jobs: Vec<(Job, f64)> = (0..6)
            .map(|i| {
                (
                    job(&format!("l{}", i), "Monoculture", Source::Adzuna, old_date()),
                    0.9,
                )
            })
            .collect();
        let ranked = rank_jobs(&profile(&["python"]), jobs, now());
        assert_eq!(ranked.len(), 6);
        let scores: Vec<f64> = ranked.iter().map(|j| j.match_score).collect();
        assert!((scores[0] - 90.0).abs() < 1e-9);
        assert!((scores[1] - 85.0).abs() < 1e-9);
        assert!((scores[2] - 80.0).abs() < 1e-9);
        assert!((scores[3] - 75.0).abs() < 1e-9);
        assert!((scores[4] - 70.0).abs() < 1e-9);
        // Fifth-plus repeat stays capped at 20.
        assert!((scores[5] - 70.0).abs() < 1e-9);
    }

    #[test]
    fn bonuses_stack_on_base_similarity() {
        let mut j = job("l1", "Acme", Source::Linkedin, now() - Duration::days(1));
        j.skills = vec!["python".into(), "sql".into()];
        j.is_remote = true;
        j.sponsorship_available = true;
        j.experience_level = ExperienceLevel::Senior;
        j.location = "New York, NY".into();
        let mut p = profile(&["python", "sql"]);
        p.remote_preference = true;
        p.needs_sponsorship = true;
        p.preferred_locations = vec!["new york".into()];
        let ranked = rank_jobs(&p, vec![(j, 0.5)], now());
        // 50 base + 50 skills + 40 level + 15 location + 15 remote
        // + 15 sponsorship + 20 source + 10 recency = 215
        assert_eq!(ranked.len(), 1);
        assert!((ranked[0].match_score - 215.0).abs() < 1e-9);
        assert!(ranked[0].is_hot);
        assert!(ranked[0].skill_gaps.is_empty());
    }

    #[test]
    fn skill_gaps_list_unmatched_job_skills() {
        let mut j = job("l1", "Acme", Source::Linkedin, old_date());
        j.skills = vec!["python".into(), "kubernetes".into()];
        let ranked = rank_jobs(&profile(&["Python"]), vec![(j, 0.5)], now());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].skill_gaps, vec!["kubernetes".to_string()]);
    }

    #[test]
    fn hot_flag_from_recent_posting() {
        let j = job("l1", "Acme", Source::Adzuna, now() - Duration::hours(2));
        let ranked = rank_jobs(&profile(&["python"]), vec![(j, 0.55)], now());
        // 55 base + 10 recency = 65: above threshold, below 90, but fresh.
        assert_eq!(ranked.len(), 1);
        assert!(ranked[0].is_hot);
    }

    #[test]
    fn default_date_filter_is_seven_days() {
        let jobs = vec![
            job("recent", "A", Source::Linkedin, now() - Duration::days(2)),
            job("stale", "B", Source::Linkedin, now() - Duration::days(9)),
        ];
        let filtered = apply_date_filter(jobs, None, now());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].link, "recent");
    }

    #[test]
    fn date_filter_windows() {
        let jobs = vec![
            job("h12", "A", Source::Linkedin, now() - Duration::hours(12)),
            job("d5", "B", Source::Linkedin, now() - Duration::days(5)),
            job("d20", "C", Source::Linkedin, now() - Duration::days(20)),
        ];
        assert_eq!(apply_date_filter(jobs.clone(), Some("24h"), now()).len(), 1);
        assert_eq!(apply_date_filter(jobs.clone(), Some("7d"), now()).len(), 2);
        assert_eq!(apply_date_filter(jobs.clone(), Some("30d"), now()).len(), 3);
        // Unknown window means no filter.
        assert_eq!(apply_date_filter(jobs, Some("all"), now()).len(), 3);
    }

    #[test]
    fn source_balance_caps_each_source() {
        let mut jobs: Vec<ScoredJob> = (0..20)
            .map(|i| scored(job(&format!("l{}", i), "A", Source::Linkedin, old_date()), 80.0))
            .collect();
        jobs.extend(
            (0..10).map(|i| scored(job(&format!("a{}", i), "B", Source::Adzuna, old_date()), 80.0)),
        );
        let filters = Filters::default();
        let (page, total) = compose_results(jobs, &filters, 120, 10);
        assert_eq!(total, 130);
        let linkedin = page.iter().filter(|j| j.job.source == Source::Linkedin).count();
        let adzuna = page.iter().filter(|j| j.job.source == Source::Adzuna).count();
        assert_eq!(linkedin, 14);
        assert_eq!(adzuna, 6);
    }

    #[test]
    fn pages_are_disjoint_and_contiguous() {
        let jobs: Vec<ScoredJob> = (0..30)
            .map(|i| {
                scored(
                    job(&format!("l{}", i), "A", Source::Linkedin, old_date()),
                    80.0,
                )
            })
            .collect();
        let mut filters = Filters {
            per_page: 10,
            ..Filters::default()
        };
        // Balancing caps the working set at floor(10 * 0.7) = 7 LinkedIn
        // jobs; page 1 holds all of them, page 2 is past the end.
        let (page1, _) = compose_results(jobs.clone(), &filters, 30, 0);
        assert_eq!(page1.len(), 7);
        filters.page = 2;
        let (page2, _) = compose_results(jobs, &filters, 30, 0);
        assert!(page2.is_empty());
    }

    #[test]
    fn zero_per_page_returns_empty_page() {
        let jobs = vec![
            scored(job("l1", "A", Source::Linkedin, old_date()), 80.0),
            scored(job("a1", "B", Source::Adzuna, old_date()), 80.0),
        ];
        let filters = Filters {
            per_page: 0,
            ..Filters::default()
        };
        let (page, total) = compose_results(jobs, &filters, 5, 1);
        assert!(page.is_empty());
        assert_eq!(total, 6);
    }

    #[test]
    fn caller_filters_apply_in_order() {
        let mut remote = job("r", "A", Source::Linkedin, old_date());
        remote.is_remote = true;
        remote.salary = 150_000.0;
        let mut onsite = job("o", "B", Source::Linkedin, old_date());
        onsite.salary = 200_000.0;
        let mut lowpay = job("p", "C", Source::Linkedin, old_date());
        lowpay.is_remote = true;
        lowpay.salary = 50_000.0;
        let jobs = vec![
            scored(remote, 80.0),
            scored(onsite, 80.0),
            scored(lowpay, 80.0),
        ];
        let filters = Filters {
            remote_only: true,
            min_salary: 100_000.0,
            ..Filters::default()
        };
        let (page, _) = compose_results(jobs, &filters, 0, 0);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].job.link, "r");
    }

    #[test]
    fn experience_filter_is_exact() {
        let mut senior = job("s", "A", Source::Linkedin, old_date());
        senior.experience_level = ExperienceLevel::Senior;
        let entry = job("e", "B", Source::Linkedin, old_date());
        let filters = Filters {
            experience_level: Some("senior".into()),
            ..Filters::default()
        };
        let (page, _) = compose_results(vec![scored(senior, 80.0), scored(entry, 80.0)], &filters, 0, 0);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].job.link, "s");
    }

    #[test]
    fn sort_by_match_score_descending() {
        let jobs = vec![
            scored(job("low", "A", Source::Linkedin, old_date()), 65.0),
            scored(job("high", "B", Source::Linkedin, now() - Duration::days(6)), 95.0),
        ];
        let filters = Filters {
            sort_by: "match_score".into(),
            ..Filters::default()
        };
        let (page, _) = compose_results(jobs, &filters, 0, 0);
        assert_eq!(page[0].job.link, "high");
    }

    #[test]
    fn output_scores_rounded_and_clamped() {
        let jobs = vec![scored(job("l", "A", Source::Linkedin, old_date()), 215.37)];
        let (page, _) = compose_results(jobs, &Filters::default(), 0, 0);
        assert_eq!(page[0].match_score, 100.0);

        let jobs = vec![scored(job("l", "A", Source::Linkedin, old_date()), 87.6543)];
        let (page, _) = compose_results(jobs, &Filters::default(), 0, 0);
        assert_eq!(page[0].match_score, 87.7);
    }

    struct StubEmbedder;

    #[async_trait::async_trait]
    impl crate::embeddings::EmbeddingProvider for StubEmbedder {
        async fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    if t.contains("Rust") {
                        vec![1.0, 0.0]
                    } else {
                        vec![0.0, 1.0]
                    }
                })
                .collect())
        }
    }

    fn test_recommender(
        embedder: Option<Arc<dyn crate::embeddings::EmbeddingProvider>>,
        corpus: Option<CorpusCache>,
    ) -> Recommender {
        Recommender::new(
            crate::adzuna_client::AdzunaClient::new("id".into(), "key".into()),
            crate::linkedin_client::LinkedInClient::new("key".into()),
            Arc::new(crate::database::MemoryCache::new()),
            embedder,
            corpus,
        )
    }

    #[tokio::test]
    async fn validation_requires_skills_or_role() {
        let recommender = test_recommender(None, None);
        let mut p = profile(&[]);
        p.desired_job_role = String::new();
        let err = recommender
            .recommend(&p, &Filters::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RecommendError::Validation(_)));
    }

    #[tokio::test]
    async fn stub_embedder_drives_base_score() {
        let recommender = test_recommender(Some(Arc::new(StubEmbedder)), None);
        let mut matching = job("m", "A", Source::Adzuna, old_date());
        matching.title = "Rust Engineer".into();
        let other = job("o", "B", Source::Adzuna, old_date());
        let scored = recommender
            .score(&profile(&["python"]), vec![matching, other], now())
            .await
            .unwrap();
        // Only the similar job clears the threshold: 100 base vs 0 base.
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].job.link, "m");
        assert!((scored[0].match_score - 100.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn corpus_jobs_join_the_ranking_pass() {
        let corpus_job = job("corpus", "C", Source::Linkedin, now() - Duration::days(1));
        let corpus = CorpusCache {
            jobs: vec![corpus_job],
            embeddings: vec![vec![1.0, 0.0]],
        };
        let recommender = test_recommender(Some(Arc::new(StubEmbedder)), Some(corpus));
        let scored = recommender
            .score(&profile(&["python"]), vec![], now())
            .await
            .unwrap();
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].job.link, "corpus");
        // 100 base + 20 source + 10 recency.
        assert!((scored[0].match_score - 130.0).abs() < 1e-6);
    }

    #[test]
    fn profile_sentence_shape() {
        let mut p = profile(&["python", "sql"]);
        p.remote_preference = true;
        assert_eq!(
            profile_text(&p),
            "A senior level professional skilled in python, sql. Seeking a engineer position preferring remote work."
        );
        let empty = UserProfile {
            skills: vec![],
            experience_level: "mid".into(),
            needs_sponsorship: false,
            preferred_locations: vec![],
            min_salary: 0.0,
            remote_preference: false,
            desired_job_role: String::new(),
        };
        assert_eq!(
            profile_text(&empty),
            "A mid level professional skilled in various skills. Seeking a any position."
        );
    }

    #[test]
    fn job_sentence_shape() {
        let mut j = job("l", "Acme", Source::Linkedin, old_date());
        j.title = "Data Engineer".into();
        j.skills = vec!["python".into(), "sql".into()];
        j.is_remote = true;
        j.experience_level = ExperienceLevel::Mid;
        assert_eq!(
            job_text(&j),
            "Data Engineer at Acme requiring skills: python, sql. Experience level: mid. Located in Austin, TX, remote."
        );
    }
}
