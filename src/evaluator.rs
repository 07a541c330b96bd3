//! Answer grading. Matching is a single choice compared exactly; free text is
//! normalized and scored by the similarity service, with exact match as the
//! fallback when that service is unavailable or fails.

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::ExerciseKind;
use crate::services::SimilarityScorer;
use crate::util::normalize_answer;

/// How a score was obtained.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
  Choice,
  /// Normalized strings were identical (or the input was empty).
  Exact,
  Similarity,
  /// Similarity service unavailable; exact comparison used instead.
  ExactFallback,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Evaluation {
  pub is_correct: bool,
  /// In [0, 1].
  pub score: f32,
  pub method: ScoringMethod,
}

impl Evaluation {
  fn exact(is_correct: bool, method: ScoringMethod) -> Self {
    Self { is_correct, score: if is_correct { 1.0 } else { 0.0 }, method }
  }
}

/// Single-choice grading: the selected option must equal the answer.
pub fn judge_choice(submitted: &str, expected: &str) -> Evaluation {
  Evaluation::exact(submitted == expected, ScoringMethod::Choice)
}

/// Grade a similarity score against the threshold (strictly greater wins).
pub fn judge_similarity(score: f32, threshold: f32) -> Evaluation {
  let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
  Evaluation { is_correct: score > threshold, score, method: ScoringMethod::Similarity }
}

/// Exact comparison of already-normalized strings.
pub fn judge_exact_fallback(submitted: &str, expected: &str) -> Evaluation {
  Evaluation::exact(submitted == expected, ScoringMethod::ExactFallback)
}

/// Grade `submitted` against `expected` for an exercise of `kind`.
pub async fn evaluate(
  kind: ExerciseKind,
  submitted: &str,
  expected: &str,
  scorer: &dyn SimilarityScorer,
  threshold: f32,
) -> Evaluation {
  if !kind.is_free_text() {
    return judge_choice(submitted, expected);
  }

  let submitted = normalize_answer(submitted);
  let expected = normalize_answer(expected);
  if submitted.is_empty() {
    return Evaluation::exact(false, ScoringMethod::Exact);
  }
  if submitted == expected {
    return Evaluation::exact(true, ScoringMethod::Exact);
  }
  if !scorer.is_available() {
    return judge_exact_fallback(&submitted, &expected);
  }

  match scorer.similarity(&submitted, &expected).await {
    Ok(score) => {
      debug!(target: "exercise", scorer = scorer.name(), score, "Similarity scored");
      judge_similarity(score, threshold)
    }
    Err(e) => {
      warn!(target: "exercise", scorer = scorer.name(), error = %e, "Similarity failed; using exact match");
      judge_exact_fallback(&submitted, &expected)
    }
  }
}

/// Learner-facing feedback line for an evaluation.
pub fn feedback(eval: &Evaluation, close_threshold: f32) -> String {
  if eval.is_correct {
    "Correct! Well done!".into()
  } else if eval.score > close_threshold {
    format!("Not quite right (similarity {:.0}%). You're close! Check spelling and try again.", eval.score * 100.0)
  } else {
    format!("Not quite right (similarity {:.0}%). Listen to the pronunciation and try again!", eval.score * 100.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::services::mock::FixedSimilarity;
  use crate::services::Disabled;

  #[tokio::test]
  async fn matching_is_exact() {
    let scorer = FixedSimilarity::new(0.99);
    let ok = evaluate(ExerciseKind::Matching, "hola", "hola", &scorer, 0.7).await;
    assert!(ok.is_correct);
    assert_eq!(ok.score, 1.0);

    let wrong = evaluate(ExerciseKind::Matching, "adiós", "hola", &scorer, 0.7).await;
    assert!(!wrong.is_correct);
    assert_eq!(wrong.score, 0.0);
    assert_eq!(wrong.method, ScoringMethod::Choice);
    assert_eq!(scorer.calls(), 0);
  }

  #[tokio::test]
  async fn threshold_is_strict() {
    let at = FixedSimilarity::new(0.7);
    assert!(!evaluate(ExerciseKind::Translation, "hola!", "hola", &at, 0.7).await.is_correct);

    let above = FixedSimilarity::new(0.71);
    let eval = evaluate(ExerciseKind::FillBlank, "ola", "hola", &above, 0.7).await;
    assert!(eval.is_correct);
    assert_eq!(eval.method, ScoringMethod::Similarity);
    assert_eq!(above.calls(), 1);
  }

  #[tokio::test]
  async fn identical_answers_are_always_correct() {
    for scorer in [FixedSimilarity::new(0.0), FixedSimilarity::failing()] {
      for text in ["hola", "  Por Favor ", "¿Qué recomienda?"] {
        let eval = evaluate(ExerciseKind::Translation, text, text, &scorer, 0.7).await;
        assert!(eval.is_correct, "{text}");
        assert_eq!(eval.score, 1.0);
      }
    }
  }

  #[tokio::test]
  async fn normalization_ignores_case_and_padding() {
    let scorer = FixedSimilarity::new(0.0);
    let eval = evaluate(ExerciseKind::Translation, "  GRACIAS ", "gracias", &scorer, 0.7).await;
    assert!(eval.is_correct);
    assert_eq!(scorer.calls(), 0);
  }

  #[tokio::test]
  async fn failing_scorer_falls_back_to_exact() {
    let scorer = FixedSimilarity::failing();
    let eval = evaluate(ExerciseKind::Translation, "ola", "hola", &scorer, 0.7).await;
    assert!(!eval.is_correct);
    assert_eq!(eval.score, 0.0);
    assert_eq!(eval.method, ScoringMethod::ExactFallback);
  }

  #[tokio::test]
  async fn disabled_scorer_is_not_called() {
    let eval = evaluate(ExerciseKind::FillBlank, "ola", "hola", &Disabled("similarity"), 0.7).await;
    assert_eq!(eval.method, ScoringMethod::ExactFallback);
  }

  #[tokio::test]
  async fn empty_answer_is_incorrect() {
    let scorer = FixedSimilarity::new(1.0);
    let eval = evaluate(ExerciseKind::Translation, "   ", "hola", &scorer, 0.7).await;
    assert!(!eval.is_correct);
    assert_eq!(scorer.calls(), 0);
  }

  #[test]
  fn out_of_range_scores_are_clamped() {
    assert_eq!(judge_similarity(1.3, 0.7).score, 1.0);
    assert_eq!(judge_similarity(-0.2, 0.7).score, 0.0);
    assert!(!judge_similarity(f32::NAN, 0.7).is_correct);
  }

  #[test]
  fn feedback_messages() {
    assert_eq!(feedback(&judge_similarity(0.9, 0.7), 0.5), "Correct! Well done!");
    assert!(feedback(&judge_similarity(0.6, 0.7), 0.5).contains("You're close"));
    assert!(feedback(&judge_similarity(0.2, 0.7), 0.5).contains("Listen to the pronunciation"));
    assert!(feedback(&judge_similarity(0.2, 0.7), 0.5).contains("20%"));
  }
}
