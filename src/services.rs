//! Delegated service boundaries: translation, answer similarity and speech.
//!
//! Each boundary is a trait so the session logic can run against mocks.
//! Concrete backends live in `openai` and `gtts`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::Prompts;
use crate::domain::Language;
use crate::error::ServiceError;
use crate::gtts::GoogleTts;
use crate::openai::OpenAI;

/// English text to target-language text.
#[async_trait]
pub trait Translator: Send + Sync {
  fn name(&self) -> &str;
  fn is_available(&self) -> bool { true }
  async fn translate(&self, text: &str, language: Language) -> Result<String, ServiceError>;
}

/// Semantic closeness of two strings, in [0, 1].
#[async_trait]
pub trait SimilarityScorer: Send + Sync {
  fn name(&self) -> &str;
  fn is_available(&self) -> bool { true }
  async fn similarity(&self, a: &str, b: &str) -> Result<f32, ServiceError>;
}

/// A synthesized clip, ready to ship to the browser.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioClip {
  pub mime: &'static str,
  pub bytes: Vec<u8>,
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
  fn name(&self) -> &str;
  fn is_available(&self) -> bool { true }
  async fn synthesize(&self, text: &str, language: Language) -> Result<AudioClip, ServiceError>;
}

/// Stand-in for a boundary with no configured backend.
pub struct Disabled(pub &'static str);

#[async_trait]
impl Translator for Disabled {
  fn name(&self) -> &str { "disabled" }
  fn is_available(&self) -> bool { false }
  async fn translate(&self, _text: &str, _language: Language) -> Result<String, ServiceError> {
    Err(ServiceError::Unavailable(self.0))
  }
}

#[async_trait]
impl SimilarityScorer for Disabled {
  fn name(&self) -> &str { "disabled" }
  fn is_available(&self) -> bool { false }
  async fn similarity(&self, _a: &str, _b: &str) -> Result<f32, ServiceError> {
    Err(ServiceError::Unavailable(self.0))
  }
}

#[async_trait]
impl SpeechSynthesizer for Disabled {
  fn name(&self) -> &str { "disabled" }
  fn is_available(&self) -> bool { false }
  async fn synthesize(&self, _text: &str, _language: Language) -> Result<AudioClip, ServiceError> {
    Err(ServiceError::Unavailable(self.0))
  }
}

/// The three delegated services used by every session.
#[derive(Clone)]
pub struct Services {
  pub translator: Arc<dyn Translator>,
  pub similarity: Arc<dyn SimilarityScorer>,
  pub speech: Arc<dyn SpeechSynthesizer>,
}

impl Services {
  /// Everything disabled. Sessions still work with exact-match grading.
  pub fn disabled() -> Self {
    Self {
      translator: Arc::new(Disabled("translation")),
      similarity: Arc::new(Disabled("similarity")),
      speech: Arc::new(Disabled("speech")),
    }
  }

  /// Build backends from env:
  /// - OPENAI_API_KEY enables OpenAI translation and embeddings
  /// - SPEECH_BACKEND selects "gtts" (default), "openai" or "disabled"
  pub fn from_env(prompts: &Prompts) -> Self {
    let mut services = Self::disabled();

    let openai = OpenAI::from_env(prompts.clone()).map(Arc::new);
    if let Some(oa) = &openai {
      info!(target: "lingo_tutor", base_url = %oa.base_url, translate_model = %oa.translate_model, embedding_model = %oa.embedding_model, "OpenAI enabled.");
      services.translator = oa.clone();
      services.similarity = oa.clone();
    } else {
      info!(target: "lingo_tutor", "OpenAI disabled (no OPENAI_API_KEY). Answers are graded by exact match.");
    }

    let backend = std::env::var("SPEECH_BACKEND").unwrap_or_else(|_| "gtts".into());
    match backend.as_str() {
      "openai" => match &openai {
        Some(oa) => services.speech = oa.clone(),
        None => warn!(target: "lingo_tutor", "SPEECH_BACKEND=openai but OpenAI is disabled; speech off"),
      },
      "disabled" | "off" => {}
      other => {
        if other != "gtts" {
          warn!(target: "lingo_tutor", backend = %other, "Unknown SPEECH_BACKEND; using gtts");
        }
        match GoogleTts::from_env() {
          Some(tts) => services.speech = Arc::new(tts),
          None => warn!(target: "lingo_tutor", "Failed to build gTTS client; speech off"),
        }
      }
    }
    info!(
      target: "lingo_tutor",
      translator = services.translator.name(),
      similarity = services.similarity.name(),
      speech = services.speech.name(),
      "Delegated services ready"
    );
    services
  }

  /// True when at least one delegated service can be used.
  pub fn any_available(&self) -> bool {
    self.translator.is_available() || self.similarity.is_available() || self.speech.is_available()
  }
}

#[cfg(test)]
pub mod mock {
  //! Deterministic services for tests.

  use std::collections::HashMap;
  use std::sync::atomic::{AtomicU32, Ordering};

  use super::*;

  /// Returns a fixed score (or fails) and counts calls.
  pub struct FixedSimilarity {
    score: Option<f32>,
    calls: AtomicU32,
  }

  impl FixedSimilarity {
    pub fn new(score: f32) -> Self { Self { score: Some(score), calls: AtomicU32::new(0) } }
    pub fn failing() -> Self { Self { score: None, calls: AtomicU32::new(0) } }
    pub fn calls(&self) -> u32 { self.calls.load(Ordering::Relaxed) }
  }

  #[async_trait]
  impl SimilarityScorer for FixedSimilarity {
    fn name(&self) -> &str { "fixed" }
    async fn similarity(&self, _a: &str, _b: &str) -> Result<f32, ServiceError> {
      self.calls.fetch_add(1, Ordering::Relaxed);
      self.score.ok_or_else(|| ServiceError::Network("connection refused".into()))
    }
  }

  /// Phrase-book translator; unknown text is an error.
  pub struct PhraseBook(pub HashMap<String, String>);

  #[async_trait]
  impl Translator for PhraseBook {
    fn name(&self) -> &str { "phrase_book" }
    async fn translate(&self, text: &str, _language: Language) -> Result<String, ServiceError> {
      self.0.get(text).cloned().ok_or_else(|| ServiceError::Http { status: 500, message: "no translation".into() })
    }
  }

  /// Echoes the text as "audio" bytes.
  pub struct EchoSpeech;

  #[async_trait]
  impl SpeechSynthesizer for EchoSpeech {
    fn name(&self) -> &str { "echo" }
    async fn synthesize(&self, text: &str, language: Language) -> Result<AudioClip, ServiceError> {
      Ok(AudioClip { mime: "audio/mpeg", bytes: format!("{}:{}", language.code(), text).into_bytes() })
    }
  }
}
