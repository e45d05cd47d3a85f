// src/main.rs
//
// jobmatch - aggregates job postings from Adzuna and LinkedIn, scores them
// against a candidate profile, and serves ranked recommendations.
//
// Endpoints
// - POST /jobs/recommendations -> ranked, paginated recommendations
// - GET  /health               -> service + cache-store status
//
// Environment Variables (.env)
// - ADZUNA_APP_ID  / ADZUNA_APP_KEY
// - RAPIDAPI_KEY
// - OPENAI_API_KEY (optional; without it the semantic base score is 0)
// - DATABASE_URL   (optional MySQL; without it an in-memory cache is used)
// - CORPUS_PATH    (optional pre-embedded job corpus, JSON)
// - LISTEN_PORT    (default 3030)

mod adzuna_client;
mod database;
mod embeddings;
mod error;
mod handlers;
mod linkedin_client;
mod models;
mod normalize;
mod recommender;

use std::env;
use std::sync::Arc;

use dotenv::dotenv;
use warp::Filter;

use crate::database::{Database, JobCache, MemoryCache};
use crate::embeddings::{EmbeddingProvider, OpenAiEmbeddings};
use crate::recommender::{CorpusCache, Recommender};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let adzuna_app_id = env::var("ADZUNA_APP_ID").expect("ADZUNA_APP_ID must be set");
    let adzuna_app_key = env::var("ADZUNA_APP_KEY").expect("ADZUNA_APP_KEY must be set");
    let rapidapi_key = env::var("RAPIDAPI_KEY").expect("RAPIDAPI_KEY must be set");
    let openai_key = env::var("OPENAI_API_KEY").unwrap_or_default();
    let port: u16 = env::var("LISTEN_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3030);

    let cache: Arc<dyn JobCache> = match env::var("DATABASE_URL") {
        Ok(url) => match Database::new(&url).await {
            Ok(db) => Arc::new(db),
            Err(e) => {
                tracing::warn!(error = %e, "database unavailable, using in-memory cache");
                Arc::new(MemoryCache::new())
            }
        },
        Err(_) => {
            tracing::info!("DATABASE_URL not set, using in-memory cache");
            Arc::new(MemoryCache::new())
        }
    };

    let embeddings_client = OpenAiEmbeddings::new(openai_key);
    let embedder: Option<Arc<dyn EmbeddingProvider>> = if embeddings_client.available() {
        Some(Arc::new(embeddings_client))
    } else {
        tracing::warn!("OPENAI_API_KEY not configured, semantic base score disabled");
        None
    };

    let corpus = match env::var("CORPUS_PATH") {
        Ok(path) => match CorpusCache::load(&path).await {
            Ok(c) if c.is_empty() => {
                tracing::warn!(%path, "corpus file is empty, continuing without");
                None
            }
            Ok(c) => {
                tracing::info!(jobs = c.len(), %path, "loaded precomputed job corpus");
                Some(c)
            }
            Err(e) => {
                tracing::warn!(error = %e, %path, "failed to load corpus, continuing without");
                None
            }
        },
        Err(_) => None,
    };

    let adzuna = adzuna_client::AdzunaClient::new(adzuna_app_id, adzuna_app_key);
    let linkedin = linkedin_client::LinkedInClient::new(rapidapi_key);
    let recommender = Arc::new(Recommender::new(
        adzuna,
        linkedin,
        cache.clone(),
        embedder,
        corpus,
    ));

    // Routes
    let recommendations = warp::post()
        .and(warp::path!("jobs" / "recommendations"))
        .and(warp::body::json())
        .and(with_recommender(recommender.clone()))
        .and_then(|request, recommender| async move {
            handlers::recommendations_handler(request, recommender).await
        });

    let health = warp::get()
        .and(warp::path("health"))
        .and(with_cache(cache.clone()))
        .and_then(|cache| async move { handlers::health_handler(cache).await });

    let routes = recommendations.or(health);

    tracing::info!(port, "server started");
    warp::serve(routes).run(([127, 0, 0, 1], port)).await;
}

fn with_recommender(
    recommender: Arc<Recommender>,
) -> impl Filter<Extract = (Arc<Recommender>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || recommender.clone())
}

fn with_cache(
    cache: Arc<dyn JobCache>,
) -> impl Filter<Extract = (Arc<dyn JobCache>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || cache.clone())
}
