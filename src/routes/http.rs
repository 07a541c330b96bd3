//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler locks its session for the whole request, so events on one
//! session are processed one at a time.

use std::sync::Arc;
use axum::{
  extract::{rejection::JsonRejection, FromRequest, Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument};

use crate::error::TutorError;
use crate::logic;
use crate::protocol::*;
use crate::state::AppState;

/// `Json` whose rejections come back as an `ErrorOut` body with status 400.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(TutorError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for TutorError {
  fn from(rejection: JsonRejection) -> Self {
    TutorError::BadRequest(rejection.body_text())
  }
}

impl IntoResponse for TutorError {
  fn into_response(self) -> Response {
    let status = match &self {
      TutorError::UnknownSession(_) => StatusCode::NOT_FOUND,
      TutorError::BadRequest(_) => StatusCode::BAD_REQUEST,
      TutorError::ServicesUnavailable => StatusCode::SERVICE_UNAVAILABLE,
      TutorError::NotInitialized
      | TutorError::InvalidTransition { .. }
      | TutorError::NoActiveExercise
      | TutorError::AlreadySolved => StatusCode::CONFLICT,
    };
    (status, Json(ErrorOut { error: self.to_string() })).into_response()
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let s = &state.services;
  Json(HealthOut {
    ok: true,
    translator: s.translator.name().to_string(),
    similarity: s.similarity.name().to_string(),
    speech: s.speech.name().to_string(),
  })
}

#[instrument(level = "info", skip(state))]
pub async fn http_create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let (session_id, handle) = state.create_session().await;
  let session = handle.lock().await.snapshot();
  Json(SessionCreatedOut { session_id, session })
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, TutorError> {
  let handle = state.get_session(&id).await?;
  let snapshot = handle.lock().await.snapshot();
  Ok(Json(snapshot))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_delete_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<StatusCode, TutorError> {
  state.remove_session(&id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[instrument(level = "info", skip(state, body), fields(%id, language = %body.language, level = %body.level))]
pub async fn http_initialize(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  ApiJson(body): ApiJson<InitializeIn>,
) -> Result<impl IntoResponse, TutorError> {
  let handle = state.get_session(&id).await?;
  let mut session = handle.lock().await;
  let snapshot = logic::initialize(&state, &mut session, body.language, body.level)?;
  info!(target: "exercise", session = %id, "HTTP initialize");
  Ok(Json(snapshot))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_new_exercise(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, TutorError> {
  let handle = state.get_session(&id).await?;
  let mut session = handle.lock().await;
  let out = logic::new_exercise(&mut session)?;
  info!(target: "exercise", session = %id, kind = ?out.exercise.kind, "HTTP exercise served");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(%id, answer_len = body.answer.len()))]
pub async fn http_submit_answer(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  ApiJson(body): ApiJson<AnswerIn>,
) -> Result<impl IntoResponse, TutorError> {
  let handle = state.get_session(&id).await?;
  let mut session = handle.lock().await;
  let out = logic::submit_answer(&state, &mut session, &body.answer).await?;
  info!(target: "exercise", session = %id, correct = out.correct, similarity = %format!("{:.2}", out.similarity), "HTTP submit_answer evaluated");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_reveal_answer(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, TutorError> {
  let handle = state.get_session(&id).await?;
  let mut session = handle.lock().await;
  Ok(Json(logic::reveal_answer(&state, &mut session).await?))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_reset(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, TutorError> {
  let handle = state.get_session(&id).await?;
  let mut session = handle.lock().await;
  Ok(Json(logic::reset(&mut session)))
}

#[instrument(level = "info", skip(state, body), fields(%id, level = %body.level))]
pub async fn http_select_level(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  ApiJson(body): ApiJson<LevelIn>,
) -> Result<impl IntoResponse, TutorError> {
  let handle = state.get_session(&id).await?;
  let mut session = handle.lock().await;
  Ok(Json(logic::select_level(&mut session, body.level)?))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_vocabulary(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, TutorError> {
  let handle = state.get_session(&id).await?;
  let session = handle.lock().await;
  Ok(Json(logic::vocabulary(&session)?))
}

#[instrument(level = "info", skip(state, body), fields(text_len = body.text.len(), language = %body.language))]
pub async fn http_translate(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<TranslateIn>,
) -> impl IntoResponse {
  Json(logic::translate_with_speech(&state, &body.text, body.language).await)
}

#[instrument(level = "info", skip(state, body), fields(text_len = body.text.len(), language = %body.language))]
pub async fn http_speech(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<SpeechIn>,
) -> impl IntoResponse {
  Json(logic::speak(&state, &body.text, body.language).await)
}
