//! Error types for session transitions and delegated service calls.

use thiserror::Error;

use crate::session::Phase;

/// Errors raised by the session controller. None of them end the session.
#[derive(Debug, Error, PartialEq)]
pub enum TutorError {
  /// An action other than initialize/reset was attempted before initialization.
  #[error("tutor is not initialized; choose a language and level first")]
  NotInitialized,

  /// The action is not allowed from the current phase.
  #[error("cannot {action} while {phase}")]
  InvalidTransition { action: &'static str, phase: Phase },

  /// Answer or reveal requested without a practice exercise on screen.
  #[error("no active exercise; request a new exercise first")]
  NoActiveExercise,

  /// The current exercise was already answered correctly.
  #[error("exercise already solved; request a new exercise")]
  AlreadySolved,

  /// Every delegated service failed to come up at initialization time.
  #[error("no delegated service is available (translation, similarity, speech)")]
  ServicesUnavailable,

  #[error("unknown session: {0}")]
  UnknownSession(String),

  /// The request body could not be read as the expected JSON.
  #[error("bad request: {0}")]
  BadRequest(String),
}

/// Failures of the translation, similarity or speech backends.
#[derive(Debug, Error)]
pub enum ServiceError {
  /// The backend is not configured.
  #[error("{0} service unavailable")]
  Unavailable(&'static str),

  /// The backend answered with a non-success status.
  #[error("HTTP {status}: {message}")]
  Http { status: u16, message: String },

  #[error("network error: {0}")]
  Network(String),

  /// The response body could not be decoded.
  #[error("decode error: {0}")]
  Decode(String),

  #[error("invalid input: {0}")]
  InvalidInput(String),
}

impl From<reqwest::Error> for ServiceError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_decode() {
      ServiceError::Decode(e.to_string())
    } else {
      ServiceError::Network(e.to_string())
    }
  }
}
