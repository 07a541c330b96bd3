//! WebSocket upgrade + message loop. Each connection owns one tutor session;
//! each client message is parsed as JSON, handled to completion, and answered
//! with a single JSON message.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::logic;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::session::TutorSession;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "lingo_tutor", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  let mut session = state.new_session();
  info!(target: "lingo_tutor", session = %session.id, "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "lingo_tutor", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state, &mut session).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "lingo_tutor", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "lingo_tutor", session = %session.id, score = session.state().score, "WebSocket disconnected");
}

#[instrument(level = "info", skip(state, session), fields(session_id = %session.id))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState, session: &mut TutorSession) -> ServerWsMessage {
  let result = match msg {
    ClientWsMessage::Ping => Ok(ServerWsMessage::Pong),

    ClientWsMessage::Initialize { language, level } =>
      logic::initialize(state, session, language, level).map(|session| ServerWsMessage::Session { session }),

    ClientWsMessage::NewExercise => logic::new_exercise(session).map(|out| {
      info!(target: "exercise", kind = ?out.exercise.kind, "WS new_exercise served");
      ServerWsMessage::Exercise { exercise: out.exercise, session: out.session }
    }),

    ClientWsMessage::SubmitAnswer { answer } => logic::submit_answer(state, session, &answer).await.map(|out| {
      info!(target: "exercise", correct = out.correct, "WS submit_answer evaluated");
      ServerWsMessage::AnswerResult(out)
    }),

    ClientWsMessage::RevealAnswer => logic::reveal_answer(state, session).await.map(ServerWsMessage::Revealed),

    ClientWsMessage::Reset => Ok(ServerWsMessage::Session { session: logic::reset(session) }),

    ClientWsMessage::SelectLevel { level } =>
      logic::select_level(session, level).map(|session| ServerWsMessage::Session { session }),

    ClientWsMessage::Progress => Ok(ServerWsMessage::Session { session: session.snapshot() }),

    ClientWsMessage::Vocabulary => logic::vocabulary(session)
      .map(|v| ServerWsMessage::Vocabulary { level: v.level, categories: v.categories }),

    ClientWsMessage::TranslateInput { text } => match session.language() {
      Some(language) => {
        let out = logic::translate_with_speech(state, &text, language).await;
        Ok(ServerWsMessage::Translate { text, translation: out.translation, speech: out.speech })
      }
      None => Err(crate::error::TutorError::NotInitialized),
    },

    ClientWsMessage::Speak { text } => match session.language() {
      Some(language) => {
        let speech = logic::speak(state, &text, language).await;
        Ok(ServerWsMessage::Speech { text, speech })
      }
      None => Err(crate::error::TutorError::NotInitialized),
    },
  };

  result.unwrap_or_else(|e| ServerWsMessage::Error { message: e.to_string() })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::TutorConfig;
  use crate::domain::{Language, Level};
  use crate::services::mock::{EchoSpeech, FixedSimilarity};
  use crate::services::Services;

  fn state() -> AppState {
    let mut services = Services::disabled();
    services.similarity = Arc::new(FixedSimilarity::new(0.0));
    services.speech = Arc::new(EchoSpeech);
    AppState::with_services(TutorConfig::default(), services, Some(5))
  }

  #[tokio::test]
  async fn messages_drive_the_connection_session() {
    let state = state();
    let mut session = state.new_session();

    let reply = handle_client_ws(ClientWsMessage::Speak { text: "hola".into() }, &state, &mut session).await;
    assert!(matches!(reply, ServerWsMessage::Error { .. }));

    let reply = handle_client_ws(
      ClientWsMessage::Initialize { language: Language::French, level: Level::Advanced },
      &state,
      &mut session,
    )
    .await;
    assert!(matches!(reply, ServerWsMessage::Session { .. }));

    let reply = handle_client_ws(ClientWsMessage::NewExercise, &state, &mut session).await;
    assert!(matches!(reply, ServerWsMessage::Exercise { .. }));

    let expected = session.state().current_exercise.as_ref().unwrap().expected().unwrap().to_string();
    let reply = handle_client_ws(ClientWsMessage::SubmitAnswer { answer: expected }, &state, &mut session).await;
    match reply {
      ServerWsMessage::AnswerResult(out) => {
        assert!(out.correct);
        assert_eq!(out.session.score, 10);
      }
      other => panic!("unexpected reply: {other:?}"),
    }

    let reply = handle_client_ws(ClientWsMessage::SubmitAnswer { answer: "again".into() }, &state, &mut session).await;
    assert!(matches!(reply, ServerWsMessage::Error { .. }));

    let reply = handle_client_ws(ClientWsMessage::Reset, &state, &mut session).await;
    match reply {
      ServerWsMessage::Session { session } => assert_eq!(session.score, 0),
      other => panic!("unexpected reply: {other:?}"),
    }
  }

  #[test]
  fn replies_serialize_with_type_tag() {
    let json = serde_json::to_value(ServerWsMessage::Pong).unwrap();
    assert_eq!(json["type"], "pong");
  }
}
