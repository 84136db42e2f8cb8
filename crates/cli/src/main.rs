#![deny(warnings)]

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use moodtune_core::api::{self, AppState};
use moodtune_core::config::{
    resolve_port, resolve_spotify_credentials, resolve_string_with_default, AppConfig, Env,
    SearchTimeout, ServerConfig, StdEnv, DEFAULT_HOST, DEFAULT_SEARCH_TIMEOUT_MS, ENV_HOST,
};
use moodtune_core::emotion::Emotion;
use moodtune_core::pipeline::EmotionPipeline;
use moodtune_core::recommend::{describe, MusicSearch, OfflineSearch, Recommender, SpotifyClient};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "moodtune")]
#[command(about = "Emotion detection from text and voice, with mood-matched music")]
struct Cli {
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,

        #[command(flatten)]
        search: SearchArgs,
    },
    /// Normalize a label or classify a free-text hint.
    Text { hint: String },
    /// Classify the first seconds of an audio file.
    Voice {
        path: PathBuf,

        /// Also print the extracted features.
        #[arg(long)]
        features: bool,
    },
    /// Recommend music for an emotion label.
    Recommend {
        emotion: String,

        #[command(flatten)]
        search: SearchArgs,
    },
    /// Show the genres and mood searched for an emotion label.
    Describe { emotion: String },
}

#[derive(Args, Debug)]
struct SearchArgs {
    #[arg(long)]
    spotify_client_id: Option<String>,

    #[arg(long)]
    spotify_client_secret: Option<String>,

    /// Skip remote search and use the built-in playlists.
    #[arg(long)]
    offline: bool,

    #[arg(long, default_value_t = DEFAULT_SEARCH_TIMEOUT_MS)]
    search_timeout_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let env = StdEnv;
    match cli.command {
        Command::Serve { host, port, search } => {
            let cfg = build_config(host, port, search, &env)?;
            run_server(cfg).await
        }
        Command::Text { hint } => {
            let emotion = EmotionPipeline::default().resolve_label(Some(&hint));
            print_json(&json!({ "processed_emotion": emotion }))
        }
        Command::Voice { path, features } => {
            let analysis = EmotionPipeline::default()
                .analyze_file(&path)
                .with_context(|| format!("failed to analyze {}", path.display()))?;
            if features {
                print_json(&analysis)
            } else {
                print_json(&json!({ "emotion": analysis.emotion }))
            }
        }
        Command::Recommend { emotion, search } => {
            let cfg = build_config(None, None, search, &env)?;
            let recommender = Recommender::new(build_search(&cfg)?);
            let (_, recommendations) = recommender.recommend_label(&emotion).await;
            print_json(&json!({ "emotion": emotion, "recommendations": recommendations }))
        }
        Command::Describe { emotion } => print_json(describe(Emotion::from_label(&emotion))),
    }
}

async fn run_server(cfg: AppConfig) -> anyhow::Result<()> {
    let addr = cfg.server.resolve_addr().await?;
    let state = AppState::new(build_search(&cfg)?);

    tracing::info!(
        %addr,
        spotify = cfg.spotify.is_some(),
        search_timeout_ms = cfg.search_timeout.millis,
        "config loaded"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    api::serve(listener, state).await.context("server error")?;
    Ok(())
}

fn build_search(cfg: &AppConfig) -> anyhow::Result<Arc<dyn MusicSearch>> {
    match cfg.spotify.clone() {
        Some(credentials) => {
            let client = SpotifyClient::new(credentials, cfg.search_timeout.duration())
                .context("failed to build spotify client")?;
            Ok(Arc::new(client))
        }
        None => {
            tracing::info!("spotify credentials not set; using built-in playlists");
            Ok(Arc::new(OfflineSearch::new()))
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn build_config(
    host: Option<String>,
    port: Option<u16>,
    search: SearchArgs,
    env: &impl Env,
) -> anyhow::Result<AppConfig> {
    let spotify = if search.offline {
        None
    } else {
        resolve_spotify_credentials(search.spotify_client_id, search.spotify_client_secret, env)?
    };

    Ok(AppConfig {
        spotify,
        server: ServerConfig {
            host: resolve_string_with_default(host, ENV_HOST, env, DEFAULT_HOST),
            port: resolve_port(port, env)?,
        },
        search_timeout: SearchTimeout::new(search.search_timeout_ms)?,
    })
}
