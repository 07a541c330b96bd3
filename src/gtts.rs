//! Keyless speech backend using the Google Translate TTS endpoint.
//!
//! The endpoint accepts short inputs only, so text is split on whitespace into
//! chunks of at most `MAX_CHUNK_CHARS` and the returned MP3 segments are
//! concatenated in order.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use tracing::{debug, instrument};

use crate::domain::Language;
use crate::error::ServiceError;
use crate::services::{AudioClip, SpeechSynthesizer};

const MAX_CHUNK_CHARS: usize = 100;
const MAX_INPUT_CHARS: usize = 1000;

#[derive(Clone)]
pub struct GoogleTts {
  client: reqwest::Client,
  base_url: String,
}

impl GoogleTts {
  pub fn from_env() -> Option<Self> {
    let base_url = std::env::var("GTTS_BASE_URL").unwrap_or_else(|_| "https://translate.google.com".into());
    Self::new(base_url).ok()
  }

  pub fn new(base_url: String) -> Result<Self, ServiceError> {
    let client = reqwest::Client::builder().timeout(Duration::from_secs(15)).build()?;
    Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
  }

  async fn fetch_chunk(&self, chunk: &str, language: Language, idx: usize, total: usize) -> Result<Vec<u8>, ServiceError> {
    let url = format!("{}/translate_tts", self.base_url);
    let idx = idx.to_string();
    let total = total.to_string();
    let len = chunk.chars().count().to_string();
    let res = self.client.get(&url)
      .header(USER_AGENT, "Mozilla/5.0 (lingo-tutor-backend)")
      .query(&[
        ("ie", "UTF-8"),
        ("client", "tw-ob"),
        ("tl", language.code()),
        ("q", chunk),
        ("idx", idx.as_str()),
        ("total", total.as_str()),
        ("textlen", len.as_str()),
      ])
      .send()
      .await?;
    if !res.status().is_success() {
      let status = res.status().as_u16();
      return Err(ServiceError::Http { status, message: "speech request rejected".into() });
    }
    Ok(res.bytes().await?.to_vec())
  }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
  fn name(&self) -> &str { "gtts" }

  #[instrument(level = "info", skip(self, text), fields(text_len = text.len(), lang = %language.code()))]
  async fn synthesize(&self, text: &str, language: Language) -> Result<AudioClip, ServiceError> {
    let text = text.trim();
    if text.is_empty() {
      return Err(ServiceError::InvalidInput("empty text".into()));
    }
    if text.chars().count() > MAX_INPUT_CHARS {
      return Err(ServiceError::InvalidInput(format!("text longer than {} characters", MAX_INPUT_CHARS)));
    }
    let chunks = split_chunks(text, MAX_CHUNK_CHARS);
    let mut bytes = Vec::new();
    for (i, chunk) in chunks.iter().enumerate() {
      bytes.extend(self.fetch_chunk(chunk, language, i, chunks.len()).await?);
    }
    debug!(target: "lingo_tutor", chunks = chunks.len(), audio_bytes = bytes.len(), "gTTS synthesized");
    Ok(AudioClip { mime: "audio/mpeg", bytes })
  }
}

/// Split on whitespace into chunks of at most `max` chars. Words longer than
/// `max` are hard-split.
fn split_chunks(text: &str, max: usize) -> Vec<String> {
  let mut chunks = Vec::new();
  let mut current = String::new();
  for word in text.split_whitespace() {
    let mut word: Vec<char> = word.chars().collect();
    while word.len() > max {
      if !current.is_empty() {
        chunks.push(std::mem::take(&mut current));
      }
      chunks.push(word.drain(..max).collect());
    }
    let word: String = word.into_iter().collect();
    if word.is_empty() {
      continue;
    }
    let needed = current.chars().count() + word.chars().count() + usize::from(!current.is_empty());
    if needed > max {
      chunks.push(std::mem::take(&mut current));
    }
    if !current.is_empty() {
      current.push(' ');
    }
    current.push_str(&word);
  }
  if !current.is_empty() {
    chunks.push(current);
  }
  chunks
}
