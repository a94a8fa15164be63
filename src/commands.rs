use anyhow::{Context, Result, anyhow};
use itertools::Itertools;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::advisor::Advisor;
use crate::affirmation::AffirmationGenerator;
use crate::chat::{GeminiClient, OpenAiCompatibleClient};
use crate::chunking::ChunkSplitter;
use crate::config::{Config, QueryLogBackend, Secrets, StoreBackend};
use crate::database::Database;
use crate::documents::{DirectorySource, DocumentSource, GitHubSource};
use crate::embeddings::{CohereClient, Embedder};
use crate::ingest::{Ingestor, progress_bar};
use crate::query::QueryEngine;
use crate::query_log::{QueryLog, SqliteQueryLog, SupabaseQueryLog};
use crate::server::{self, AppState};
use crate::store::{SqliteVectorStore, SupabaseClient, SupabaseVectorStore, VectorStore};

#[inline]
pub async fn open_database(config: &Config) -> Result<Database> {
    Database::initialize_from_config(config)
        .await
        .context("Failed to initialize database")
}

fn supabase_client(config: &Config, secrets: &Secrets) -> Result<SupabaseClient> {
    let url = config
        .store
        .supabase_url
        .as_deref()
        .ok_or_else(|| anyhow!("SUPABASE_URL is not set"))?;
    Ok(SupabaseClient::new(url, secrets.supabase()?, config.timeout())?)
}

#[inline]
pub fn build_embedder(config: &Config, secrets: &Secrets) -> Result<Arc<dyn Embedder>> {
    let client = CohereClient::new(&config.embedding, secrets.cohere()?, config.timeout())?;
    info!(
        "Embedding with {} ({} dimensions)",
        client.model(),
        client.dimension()
    );
    Ok(Arc::new(client))
}

#[inline]
pub fn build_store(
    config: &Config,
    secrets: &Secrets,
    database: &Database,
) -> Result<Arc<dyn VectorStore>> {
    Ok(match config.store.backend {
        StoreBackend::Supabase => Arc::new(SupabaseVectorStore::new(
            supabase_client(config, secrets)?,
            config.store.table.clone(),
            config.store.match_function.clone(),
        )),
        StoreBackend::Sqlite => Arc::new(SqliteVectorStore::new(database.clone())),
    })
}

#[inline]
pub fn build_query_log(
    config: &Config,
    secrets: &Secrets,
    database: &Database,
) -> Result<Option<Arc<dyn QueryLog>>> {
    if !config.query_log.enabled {
        return Ok(None);
    }

    let log: Arc<dyn QueryLog> = match config.query_log.backend {
        QueryLogBackend::Sqlite => Arc::new(SqliteQueryLog::new(database.clone())),
        QueryLogBackend::Supabase => Arc::new(SupabaseQueryLog::new(
            supabase_client(config, secrets)?,
            config.query_log.table.clone(),
        )),
    };
    Ok(Some(log))
}

#[inline]
pub fn build_query_engine(
    config: &Config,
    secrets: &Secrets,
    database: &Database,
) -> Result<QueryEngine> {
    let chat = OpenAiCompatibleClient::new(&config.chat, secrets.groq()?, config.timeout())?;
    info!("Answering questions with {}", chat.model());

    let mut engine = QueryEngine::new(
        build_embedder(config, secrets)?,
        build_store(config, secrets, database)?,
        Arc::new(chat),
        config.chat.system_prompt.clone(),
    )
    .with_match_count(config.store.match_count);

    if let Some(log) = build_query_log(config, secrets, database)? {
        engine = engine.with_log(log);
    }
    Ok(engine)
}

/// Ingest from the configured GitHub repository, or from `dir` when given
#[inline]
pub async fn run_ingest(
    config: &Config,
    secrets: &Secrets,
    reset: bool,
    dir: Option<PathBuf>,
) -> Result<()> {
    let database = open_database(config).await?;

    let ingestor = Ingestor::new(
        build_embedder(config, secrets)?,
        build_store(config, secrets, &database)?,
        ChunkSplitter::new(config.chunking.clone()),
    )
    .with_throttle(Duration::from_millis(config.ingest.throttle_ms))
    .with_progress(progress_bar());

    let source: Box<dyn DocumentSource> = match dir {
        Some(dir) => {
            info!("Ingesting from local directory {}", dir.display());
            Box::new(DirectorySource::new(dir, config.ingest.extensions.clone()))
        }
        None => {
            info!("Ingesting from {}", config.ingest.repository);
            Box::new(GitHubSource::new(
                &config.ingest,
                secrets.github_token.as_deref(),
                config.timeout(),
            )?)
        }
    };

    let result = if reset {
        println!("Clearing vector store");
        ingestor.reingest_from(source.as_ref()).await
    } else {
        ingestor.ingest_from(source.as_ref()).await
    };
    let report = result.context("Ingestion failed")?;

    println!("Documents loaded: {}", report.documents);
    println!("Chunks: {}", report.chunks);
    println!("Already stored: {}", report.existing);
    if report.new_chunks == 0 {
        println!("No new chunks to add");
    } else {
        println!("Added: {} of {} new chunks", report.added, report.new_chunks);
    }
    if report.failed > 0 {
        println!("Failed: {} (they will be retried on the next run)", report.failed);
    }

    Ok(())
}

#[inline]
pub async fn run_query(config: &Config, secrets: &Secrets, query: &str) -> Result<String> {
    let database = open_database(config).await?;
    let engine = build_query_engine(config, secrets, &database)?;

    let answer = engine.answer(query).await.context("Query failed")?;
    println!("{}", answer.text);
    if !answer.sources.is_empty() {
        println!();
        println!("Sources: {}", answer.sources.iter().unique().join(", "));
    }
    Ok(answer.text)
}

/// Build every capability once and serve the HTTP API
#[inline]
pub async fn serve(config: &Config, secrets: &Secrets) -> Result<()> {
    let database = open_database(config).await?;
    let gemini = Arc::new(GeminiClient::new(
        &config.advisor,
        secrets.gemini()?,
        config.timeout(),
    )?);
    info!("Advising and writing affirmations with {}", gemini.model());

    let state = AppState {
        query: Arc::new(build_query_engine(config, secrets, &database)?),
        advisor: Arc::new(Advisor::new(gemini.clone())),
        affirmations: Arc::new(AffirmationGenerator::new(gemini)),
        database,
    };

    server::serve(state, &config.server).await
}
