
use console::style;

use super::{Config, Secrets};

#[inline]
pub fn show_config(config: &Config, secrets: &Secrets) {
    eprint!("{}", render_config(config, secrets));
}

/// Render the effective configuration, reporting secrets only as set/unset
#[inline]
pub fn render_config(config: &Config, secrets: &Secrets) -> String {
    let mut out = String::new();
    let mut line = |text: String| {
        out.push_str(&text);
        out.push('\n');
    };

    line(format!("{}", style("📋 Current Configuration").bold().cyan()));
    line(String::new());

    line(format!("{}", style("Embeddings:").bold().yellow()));
    line(format!("  Endpoint: {}", style(&config.embedding.base_url).cyan()));
    line(format!("  Model: {}", style(&config.embedding.model).cyan()));
    line(format!("  Dimension: {}", style(config.embedding.dimension).cyan()));

    line(format!("{}", style("Vector Store:").bold().yellow()));
    line(format!("  Backend: {}", style(format!("{:?}", config.store.backend)).cyan()));
    line(format!(
        "  Supabase URL: {}",
        style(config.store.supabase_url.as_deref().unwrap_or("<unset>")).cyan()
    ));
    line(format!("  Table: {}", style(&config.store.table).cyan()));
    line(format!("  Match Count: {}", style(config.store.match_count).cyan()));

    line(format!("{}", style("Chat:").bold().yellow()));
    line(format!("  Endpoint: {}", style(&config.chat.base_url).cyan()));
    line(format!("  Model: {}", style(&config.chat.model).cyan()));
    line(format!("  Advisor Model: {}", style(&config.advisor.model).cyan()));

    line(format!("{}", style("Chunking:").bold().yellow()));
    line(format!("  Chunk Size: {}", style(config.chunking.chunk_size).cyan()));
    line(format!("  Overlap: {}", style(config.chunking.chunk_overlap).cyan()));

    line(format!("{}", style("Ingestion:").bold().yellow()));
    line(format!(
        "  Repository: {} ({})",
        style(&config.ingest.repository).cyan(),
        config.ingest.branch
    ));
    line(format!("  Path Prefix: {}", style(&config.ingest.path_prefix).cyan()));
    line(format!("  Throttle: {}ms", style(config.ingest.throttle_ms).cyan()));

    line(format!("{}", style("Server:").bold().yellow()));
    line(format!(
        "  Listen: {}:{}",
        style(&config.server.host).cyan(),
        style(config.server.port).cyan()
    ));
    line(format!(
        "  Query Log: {}",
        style(if config.query_log.enabled { "enabled" } else { "disabled" }).cyan()
    ));

    line(format!("{}", style("Secrets:").bold().yellow()));
    for (name, value) in [
        ("COHERE_API_KEY", &secrets.cohere_api_key),
        ("SUPABASE_SERVICE_KEY", &secrets.supabase_key),
        ("GROQ_API_KEY", &secrets.groq_api_key),
        ("GEMINI_API_KEY", &secrets.gemini_api_key),
        ("GITHUB_TOKEN", &secrets.github_token),
    ] {
        let status = if value.is_some() {
            style("set").green()
        } else {
            style("unset").red()
        };
        line(format!("  {}: {}", name, status));
    }

    line(String::new());
    line(format!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    ));

    out
}
