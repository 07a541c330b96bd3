//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Exercise, ExerciseKind, Language, Level};
use crate::evaluator::ScoringMethod;
use crate::session::{CategoryGroup, SessionSnapshot};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Initialize {
        language: Language,
        level: Level,
    },
    NewExercise,
    SubmitAnswer {
        answer: String,
    },
    RevealAnswer,
    Reset,
    SelectLevel {
        level: Level,
    },
    Progress,
    Vocabulary,
    TranslateInput {
        text: String,
    },
    Speak {
        text: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Session {
        session: SessionSnapshot,
    },
    Exercise {
        exercise: ExerciseOut,
        session: SessionSnapshot,
    },
    AnswerResult(AnswerOut),
    Revealed(RevealOut),
    Vocabulary {
        level: Level,
        categories: Vec<CategoryGroup>,
    },
    Translate {
        text: String,
        translation: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        speech: Option<SpeechOut>,
    },
    Speech {
        text: String,
        speech: SpeechOut,
    },
    Error {
        message: String,
    },
}

/// Exercise as shown to the learner: no expected answer.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseOut {
    #[serde(rename = "type")]
    pub kind: ExerciseKindOut,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKindOut {
    Translation,
    Matching,
    FillBlank,
    LevelComplete,
}

/// Convert an internal `Exercise` to the public DTO.
pub fn to_out(ex: &Exercise) -> ExerciseOut {
    let kind = match ex.kind() {
        Some(ExerciseKind::Translation) => ExerciseKindOut::Translation,
        Some(ExerciseKind::Matching) => ExerciseKindOut::Matching,
        Some(ExerciseKind::FillBlank) => ExerciseKindOut::FillBlank,
        None => ExerciseKindOut::LevelComplete,
    };
    ExerciseOut {
        kind,
        prompt: ex.prompt().to_string(),
        hint: ex.hint().map(str::to_string),
        options: ex.options().to_vec(),
    }
}

/// Audio for the browser, or an inline error in place of the player.
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpeechOut {
    Ok {
        mime: String,
        #[serde(rename = "audioBase64")]
        audio_base64: String,
    },
    Error {
        message: String,
    },
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreatedOut {
    pub session_id: String,
    pub session: SessionSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct InitializeIn {
    pub language: Language,
    pub level: Level,
}

#[derive(Debug, Deserialize)]
pub struct LevelIn {
    pub level: Level,
}

#[derive(Debug, Serialize)]
pub struct ExerciseResponse {
    pub exercise: ExerciseOut,
    pub session: SessionSnapshot,
}

#[derive(Deserialize)]
pub struct AnswerIn {
    pub answer: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOut {
    pub correct: bool,
    /// Similarity in [0, 1].
    pub similarity: f32,
    pub method: ScoringMethod,
    pub points_awarded: u32,
    pub credit_withheld: bool,
    pub explanation: String,
    /// Shown only once the answer is correct.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech: Option<SpeechOut>,
    pub session: SessionSnapshot,
}

#[derive(Debug, Serialize)]
pub struct RevealOut {
    pub answer: String,
    pub speech: SpeechOut,
    pub session: SessionSnapshot,
}

#[derive(Debug, Serialize)]
pub struct VocabularyOut {
    pub level: Level,
    pub categories: Vec<CategoryGroup>,
}

#[derive(Deserialize)]
pub struct TranslateIn {
    pub text: String,
    pub language: Language,
}
#[derive(Serialize)]
pub struct TranslateOut {
    pub translation: String,
    /// Absent when there is nothing to pronounce.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech: Option<SpeechOut>,
}

#[derive(Deserialize)]
pub struct SpeechIn {
    pub text: String,
    pub language: Language,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub translator: String,
    pub similarity: String,
    pub speech: String,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VocabularyEntry;

    #[test]
    fn exercise_out_hides_expected_answer() {
        let ex = Exercise::Matching {
            prompt: "Match the English word/phrase: 'hello'".into(),
            expected: "hola".into(),
            options: vec!["adiós".into(), "hola".into()],
            entry: VocabularyEntry::new("hello", "hola", "greetings"),
        };
        let json = serde_json::to_value(to_out(&ex)).unwrap();
        assert_eq!(json["type"], "matching");
        assert_eq!(json["options"].as_array().unwrap().len(), 2);
        assert!(json.get("expected").is_none());
        assert!(json.get("entry").is_none());
        assert!(json.get("hint").is_none());
    }

    #[test]
    fn client_messages_parse() {
        let msg: ClientWsMessage =
            serde_json::from_str(r#"{"type":"initialize","language":"french","level":"advanced"}"#).unwrap();
        assert!(matches!(
            msg,
            ClientWsMessage::Initialize { language: Language::French, level: Level::Advanced }
        ));
        let msg: ClientWsMessage = serde_json::from_str(r#"{"type":"reveal_answer"}"#).unwrap();
        assert!(matches!(msg, ClientWsMessage::RevealAnswer));
    }

    #[test]
    fn speech_out_is_tagged_by_status() {
        let ok = serde_json::to_value(SpeechOut::Ok { mime: "audio/mpeg".into(), audio_base64: "AAE=".into() }).unwrap();
        assert_eq!(ok["status"], "ok");
        assert_eq!(ok["audioBase64"], "AAE=");
        let err = serde_json::to_value(SpeechOut::Error { message: "nope".into() }).unwrap();
        assert_eq!(err["status"], "error");
    }
}
