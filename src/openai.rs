//! Minimal OpenAI client for our use-cases.
//!
//! We call chat.completions (translation), embeddings (answer similarity) and
//! audio/speech (pronunciation). Calls are instrumented and log model names,
//! latencies and sizes, never contents or the API key.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::Prompts;
use crate::domain::Language;
use crate::error::ServiceError;
use crate::services::{AudioClip, SimilarityScorer, SpeechSynthesizer, Translator};
use crate::util::fill_template;

const CLIENT_UA: &str = "lingo-tutor-backend/0.1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub translate_model: String,
  pub embedding_model: String,
  pub tts_model: String,
  pub tts_voice: String,
  pub prompts: Prompts,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env(prompts: Prompts) -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let mut oa = Self::new(api_key, base_url, prompts).ok()?;
    if let Ok(m) = std::env::var("OPENAI_TRANSLATE_MODEL") { oa.translate_model = m; }
    if let Ok(m) = std::env::var("OPENAI_EMBEDDING_MODEL") { oa.embedding_model = m; }
    if let Ok(m) = std::env::var("OPENAI_TTS_MODEL") { oa.tts_model = m; }
    if let Ok(v) = std::env::var("OPENAI_TTS_VOICE") { oa.tts_voice = v; }
    Some(oa)
  }

  /// Client with default models against `base_url` (e.g. "https://api.openai.com/v1").
  pub fn new(api_key: String, base_url: String, prompts: Prompts) -> Result<Self, ServiceError> {
    let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    Ok(Self {
      client,
      api_key,
      base_url: base_url.trim_end_matches('/').to_string(),
      translate_model: "gpt-4o-mini".into(),
      embedding_model: "text-embedding-3-small".into(),
      tts_model: "tts-1".into(),
      tts_voice: "alloy".into(),
      prompts,
    })
  }

  fn post(&self, endpoint: &str) -> reqwest::RequestBuilder {
    self.client.post(format!("{}/{}", self.base_url, endpoint))
      .header(USER_AGENT, CLIENT_UA)
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
  }

  /// Plain-text chat completion.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.translate_model))]
  async fn chat_plain(&self, system: &str, user: &str, temperature: f32) -> Result<String, ServiceError> {
    let req = ChatCompletionRequest {
      model: self.translate_model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
    };

    let res = check_status(self.post("chat/completions").json(&req).send().await?).await?;
    let body: ChatCompletionResponse = res.json().await?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default().trim().to_string();
    if text.is_empty() {
      return Err(ServiceError::Decode("empty completion".into()));
    }
    Ok(text)
  }

  /// Embed both strings in one request.
  #[instrument(level = "info", skip(self, a, b), fields(model = %self.embedding_model))]
  async fn embed_pair(&self, a: &str, b: &str) -> Result<(Vec<f32>, Vec<f32>), ServiceError> {
    let req = EmbeddingRequest { model: self.embedding_model.clone(), input: vec![a.to_string(), b.to_string()] };
    let res = check_status(self.post("embeddings").json(&req).send().await?).await?;
    let mut body: EmbeddingResponse = res.json().await?;
    if body.data.len() != 2 {
      return Err(ServiceError::Decode(format!("expected 2 embeddings, got {}", body.data.len())));
    }
    body.data.sort_by_key(|d| d.index);
    let second = body.data.pop().map(|d| d.embedding).unwrap_or_default();
    let first = body.data.pop().map(|d| d.embedding).unwrap_or_default();
    Ok((first, second))
  }
}

#[async_trait]
impl Translator for OpenAI {
  fn name(&self) -> &str { "openai" }

  #[instrument(level = "info", skip(self, text), fields(text_len = text.len(), %language))]
  async fn translate(&self, text: &str, language: Language) -> Result<String, ServiceError> {
    let input = text.trim();
    if input.is_empty() {
      return Err(ServiceError::InvalidInput("empty text".into()));
    }
    let system = fill_template(&self.prompts.translate_system, &[("language", language.display_name())]);
    let start = Instant::now();
    let out = self.chat_plain(&system, input, 0.0).await;
    info!(elapsed = ?start.elapsed(), ok = out.is_ok(), "Translation finished");
    out
  }
}

#[async_trait]
impl SimilarityScorer for OpenAI {
  fn name(&self) -> &str { "openai" }

  #[instrument(level = "info", skip(self, a, b), fields(a_len = a.len(), b_len = b.len()))]
  async fn similarity(&self, a: &str, b: &str) -> Result<f32, ServiceError> {
    let (ea, eb) = self.embed_pair(a, b).await?;
    let cos = cosine_similarity(&ea, &eb)
      .ok_or_else(|| ServiceError::Decode("embeddings have mismatched or zero length".into()))?;
    Ok(cos.clamp(0.0, 1.0))
  }
}

#[async_trait]
impl SpeechSynthesizer for OpenAI {
  fn name(&self) -> &str { "openai" }

  #[instrument(level = "info", skip(self, text), fields(text_len = text.len(), lang = %language.code(), model = %self.tts_model))]
  async fn synthesize(&self, text: &str, language: Language) -> Result<AudioClip, ServiceError> {
    if text.trim().is_empty() {
      return Err(ServiceError::InvalidInput("empty text".into()));
    }
    let req = SpeechRequest {
      model: self.tts_model.clone(),
      voice: self.tts_voice.clone(),
      input: text.trim().to_string(),
      response_format: "mp3".into(),
    };
    let res = check_status(self.post("audio/speech").json(&req).send().await?).await?;
    let bytes = res.bytes().await?.to_vec();
    info!(audio_bytes = bytes.len(), "Speech synthesized");
    Ok(AudioClip { mime: "audio/mpeg", bytes })
  }
}

/// Cosine of the angle between two vectors; None for empty, mismatched or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
  if a.is_empty() || a.len() != b.len() {
    return None;
  }
  let mut dot = 0.0f64;
  let mut na = 0.0f64;
  let mut nb = 0.0f64;
  for (x, y) in a.iter().zip(b) {
    dot += (*x as f64) * (*y as f64);
    na += (*x as f64) * (*x as f64);
    nb += (*y as f64) * (*y as f64);
  }
  if na == 0.0 || nb == 0.0 {
    return None;
  }
  Some((dot / (na.sqrt() * nb.sqrt())) as f32)
}

async fn check_status(res: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
  if res.status().is_success() {
    return Ok(res);
  }
  let status = res.status().as_u16();
  let body = res.text().await.unwrap_or_default();
  let message = extract_openai_error(&body).unwrap_or(body);
  Err(ServiceError::Http { status, message })
}

// --- DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

#[derive(Serialize)]
struct EmbeddingRequest { model: String, input: Vec<String> }
#[derive(Deserialize)]
struct EmbeddingResponse { data: Vec<EmbeddingData> }
#[derive(Deserialize)]
struct EmbeddingData {
  #[serde(default)] index: usize,
  embedding: Vec<f32>,
}

#[derive(Serialize)]
struct SpeechRequest {
  model: String,
  voice: String,
  input: String,
  response_format: String,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
