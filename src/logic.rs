//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! Each function runs one learner action to completion against a session the
//! caller has locked: synchronous transitions from `session`, delegated calls
//! (similarity, translation, speech) through `state.services`, with local
//! fallbacks when those fail.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{error, info, instrument, warn};

use crate::domain::{Language, Level};
use crate::error::TutorError;
use crate::evaluator::{evaluate, feedback};
use crate::protocol::{to_out, AnswerOut, ExerciseResponse, RevealOut, SpeechOut, TranslateOut, VocabularyOut};
use crate::session::{SessionSnapshot, TutorSession};
use crate::state::AppState;

#[instrument(level = "info", skip(state, session), fields(session_id = %session.id, %language, %level))]
pub fn initialize(
  state: &AppState,
  session: &mut TutorSession,
  language: Language,
  level: Level,
) -> Result<SessionSnapshot, TutorError> {
  if !state.services.any_available() {
    error!(target: "lingo_tutor", session = %session.id, "No delegated service could be started");
    return Err(TutorError::ServicesUnavailable);
  }
  session.initialize(language, level);
  Ok(session.snapshot())
}

#[instrument(level = "info", skip(session), fields(session_id = %session.id))]
pub fn new_exercise(session: &mut TutorSession) -> Result<ExerciseResponse, TutorError> {
  let exercise = to_out(session.next_exercise()?);
  Ok(ExerciseResponse { exercise, session: session.snapshot() })
}

#[instrument(level = "info", skip(state, session, answer), fields(session_id = %session.id, answer_len = answer.len()))]
pub async fn submit_answer(state: &AppState, session: &mut TutorSession, answer: &str) -> Result<AnswerOut, TutorError> {
  let pending = session.begin_check(answer)?;
  let evaluation = evaluate(
    pending.kind,
    &pending.submitted,
    &pending.expected,
    state.services.similarity.as_ref(),
    session.tuning().similarity_threshold,
  )
  .await;
  let close_threshold = session.tuning().close_threshold;
  let outcome = session.apply_check(evaluation)?;

  let mut explanation = feedback(&outcome.evaluation, close_threshold);
  if outcome.credit_withheld {
    explanation.push_str(" (answer was revealed, no points awarded)");
  }

  // Pronunciation of the correct answer once it is solved.
  let (expected, speech) = if outcome.evaluation.is_correct {
    let speech = match session.language() {
      Some(language) => Some(speak(state, &outcome.expected, language).await),
      None => None,
    };
    (Some(outcome.expected.clone()), speech)
  } else {
    (None, None)
  };

  Ok(AnswerOut {
    correct: outcome.evaluation.is_correct,
    similarity: outcome.evaluation.score,
    method: outcome.evaluation.method,
    points_awarded: outcome.awarded,
    credit_withheld: outcome.credit_withheld,
    explanation,
    expected,
    speech,
    session: session.snapshot(),
  })
}

#[instrument(level = "info", skip(state, session), fields(session_id = %session.id))]
pub async fn reveal_answer(state: &AppState, session: &mut TutorSession) -> Result<RevealOut, TutorError> {
  let answer = session.reveal()?;
  let language = session.language().ok_or(TutorError::NotInitialized)?;
  let speech = speak(state, &answer, language).await;
  Ok(RevealOut { answer, speech, session: session.snapshot() })
}

pub fn reset(session: &mut TutorSession) -> SessionSnapshot {
  session.reset();
  session.snapshot()
}

pub fn select_level(session: &mut TutorSession, level: Level) -> Result<SessionSnapshot, TutorError> {
  session.select_level(level)?;
  Ok(session.snapshot())
}

pub fn vocabulary(session: &TutorSession) -> Result<VocabularyOut, TutorError> {
  Ok(VocabularyOut { level: session.progress().current_level, categories: session.vocabulary_bank()? })
}

/// Translate English text; failures degrade to a vocabulary lookup, then to an inline message.
#[instrument(level = "info", skip(state, text), fields(text_len = text.len(), %language))]
pub async fn translate(state: &AppState, text: &str, language: Language) -> String {
  let text = text.trim();
  if text.is_empty() {
    return String::new();
  }
  let translator = &state.services.translator;
  if translator.is_available() {
    match translator.translate(text, language).await {
      Ok(t) => return t,
      Err(e) => {
        warn!(target: "lingo_tutor", error = %e, "Translation failed; trying vocabulary lookup");
        return match state.vocabulary.lookup(language, text) {
          Some(entry) => entry.target.clone(),
          None => format!("Translation error: {e}"),
        };
      }
    }
  }
  match state.vocabulary.lookup(language, text) {
    Some(entry) => entry.target.clone(),
    None => "Translation service unavailable".into(),
  }
}

/// Translation plus pronunciation of the result. Blank input gets no audio.
pub async fn translate_with_speech(state: &AppState, text: &str, language: Language) -> TranslateOut {
  let translation = translate(state, text, language).await;
  let speech = if translation.is_empty() { None } else { Some(speak(state, &translation, language).await) };
  TranslateOut { translation, speech }
}

/// One transient audio clip for `text`, or an inline error.
#[instrument(level = "info", skip(state, text), fields(text_len = text.len(), lang = %language.code()))]
pub async fn speak(state: &AppState, text: &str, language: Language) -> SpeechOut {
  match state.services.speech.synthesize(text, language).await {
    Ok(clip) => {
      info!(target: "lingo_tutor", audio_bytes = clip.bytes.len(), "Audio generated");
      SpeechOut::Ok { mime: clip.mime.to_string(), audio_base64: STANDARD.encode(&clip.bytes) }
    }
    Err(e) => {
      warn!(target: "lingo_tutor", error = %e, "Audio generation failed");
      SpeechOut::Error { message: format!("Audio generation failed: {e}") }
    }
  }
}
