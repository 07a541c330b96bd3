//! Lingo Tutor · Language Learning Backend
//!
//! - Axum HTTP + WebSocket API for vocabulary exercises and progress
//! - Delegated translation, answer similarity and speech (OpenAI / gTTS)
//! - Static SPA fallback (STATIC_DIR, default ./static)
//!
//! Important env variables:
//!   PORT                  : u16 (default 3000)
//!   OPENAI_API_KEY        : enables OpenAI translation + embedding similarity
//!   OPENAI_BASE_URL       : default "https://api.openai.com/v1"
//!   OPENAI_TRANSLATE_MODEL: default "gpt-4o-mini"
//!   OPENAI_EMBEDDING_MODEL: default "text-embedding-3-small"
//!   OPENAI_TTS_MODEL      : default "tts-1"
//!   OPENAI_TTS_VOICE      : default "alloy"
//!   SPEECH_BACKEND        : "gtts" (default), "openai" or "disabled"
//!   GTTS_BASE_URL         : default "https://translate.google.com"
//!   TUTOR_CONFIG_PATH     : path to TOML config (tuning, prompts, extra vocabulary)
//!   TUTOR_SEED            : fixed RNG seed for reproducible exercise order
//!   SESSION_IDLE_SECS     : drop HTTP sessions idle this long (default 3600)
//!   MAX_SESSIONS          : cap on HTTP sessions held at once (default 10000)
//!   LOG_LEVEL             : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT            : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod config;
mod vocabulary;
mod progress;
mod exercise;
mod evaluator;
mod services;
mod openai;
mod gtts;
mod session;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared state: vocabulary, tuning, delegated services, HTTP sessions.
  let state = Arc::new(AppState::new());

  let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "./static".into());
  let app = build_router(state, &static_dir);

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "lingo_tutor", %addr, %static_dir, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "lingo_tutor", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "lingo_tutor", "Shutdown signal received");
}
