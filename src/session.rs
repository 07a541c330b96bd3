//! Session controller: the per-learner context object.
//!
//! Phases: `Uninitialized → Ready → ExerciseActive → AnswerChecked →
//! (ExerciseActive | LevelComplete)`, with reset back to `Ready` and reveal as
//! a side transition. Everything here is synchronous; answer grading happens
//! between `begin_check` and `apply_check` so delegated calls stay outside.

use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Tuning;
use crate::domain::{Exercise, ExerciseKind, Language, Level};
use crate::error::TutorError;
use crate::evaluator::Evaluation;
use crate::exercise;
use crate::progress::{completion_ratio, encouragement, ProgressState};
use crate::vocabulary::VocabularyBank;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  Uninitialized,
  Ready,
  ExerciseActive,
  AnswerChecked,
  LevelComplete,
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Phase::Uninitialized => "uninitialized",
      Phase::Ready => "ready",
      Phase::ExerciseActive => "an exercise is active",
      Phase::AnswerChecked => "an answer was checked",
      Phase::LevelComplete => "the level is complete",
    })
  }
}

/// Score and counters for the session in progress.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct SessionState {
  pub score: u32,
  pub exercises_completed: u32,
  pub current_exercise: Option<Exercise>,
  pub answer_revealed: bool,
  pub pending_answer_text: String,
}

/// What the grader needs for the current exercise.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingCheck {
  pub kind: ExerciseKind,
  pub submitted: String,
  pub expected: String,
}

/// Result of applying an evaluation to the session.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckOutcome {
  pub evaluation: Evaluation,
  /// Points added to the score (0 when incorrect or after a reveal).
  pub awarded: u32,
  /// Correct, but credit withheld because the answer had been revealed.
  pub credit_withheld: bool,
  /// The entry's source phrase entered the learned set with this answer.
  pub newly_learned: bool,
  pub expected: String,
}

pub struct TutorSession {
  pub id: String,
  phase: Phase,
  language: Option<Language>,
  progress: ProgressState,
  state: SessionState,
  solved: bool,
  tuning: Tuning,
  vocabulary: Arc<VocabularyBank>,
  rng: StdRng,
}

impl TutorSession {
  pub fn new(id: String, vocabulary: Arc<VocabularyBank>, tuning: Tuning, seed: Option<u64>) -> Self {
    let rng = match seed {
      Some(s) => StdRng::seed_from_u64(s),
      None => StdRng::from_entropy(),
    };
    Self {
      id,
      phase: Phase::Uninitialized,
      language: None,
      progress: ProgressState::default(),
      state: SessionState::default(),
      solved: false,
      tuning,
      vocabulary,
      rng,
    }
  }

  pub fn phase(&self) -> Phase { self.phase }
  pub fn language(&self) -> Option<Language> { self.language }
  pub fn progress(&self) -> &ProgressState { &self.progress }
  pub fn state(&self) -> &SessionState { &self.state }
  pub fn tuning(&self) -> &Tuning { &self.tuning }

  /// Choose language and level; fresh progress and zeroed counters.
  pub fn initialize(&mut self, language: Language, level: Level) {
    self.language = Some(language);
    self.progress = ProgressState::new(level);
    self.clear_counters();
    self.phase = Phase::Ready;
    info!(target: "exercise", session = %self.id, %language, %level, "Tutor initialized");
  }

  /// Generate the next exercise for the current level.
  pub fn next_exercise(&mut self) -> Result<&Exercise, TutorError> {
    let language = self.require_language()?;
    match self.phase {
      Phase::Ready | Phase::ExerciseActive | Phase::AnswerChecked => {}
      phase => return Err(TutorError::InvalidTransition { action: "start a new exercise", phase }),
    }

    let level = self.progress.current_level;
    let entries = self.vocabulary.entries(language, level);
    let ex = exercise::generate(&mut self.rng, language, entries, &self.progress, self.tuning.review_probability);

    if ex.is_level_complete() {
      self.progress.complete_lesson(level.as_str());
      self.phase = Phase::LevelComplete;
      info!(target: "exercise", session = %self.id, %level, "Level complete");
    } else {
      self.phase = Phase::ExerciseActive;
      debug!(target: "exercise", session = %self.id, kind = ?ex.kind(), "Exercise generated");
    }
    self.state.answer_revealed = false;
    self.state.pending_answer_text.clear();
    self.solved = false;
    let current: &Exercise = self.state.current_exercise.insert(ex);
    Ok(current)
  }

  /// Validate an answer submission and capture what the grader needs.
  pub fn begin_check(&mut self, answer: &str) -> Result<PendingCheck, TutorError> {
    self.require_language()?;
    match self.phase {
      Phase::ExerciseActive | Phase::AnswerChecked => {}
      phase => return Err(TutorError::InvalidTransition { action: "check an answer", phase }),
    }
    if self.solved {
      return Err(TutorError::AlreadySolved);
    }
    let ex = self.state.current_exercise.as_ref().ok_or(TutorError::NoActiveExercise)?;
    let (kind, expected) = match (ex.kind(), ex.expected()) {
      (Some(kind), Some(expected)) => (kind, expected.to_string()),
      _ => return Err(TutorError::NoActiveExercise),
    };
    self.state.pending_answer_text = answer.to_string();
    Ok(PendingCheck { kind, submitted: answer.to_string(), expected })
  }

  /// Record an evaluation for the current exercise.
  ///
  /// A correct answer adds `points_per_correct`, counts one completed exercise
  /// and marks the entry learned, unless the answer was revealed first.
  pub fn apply_check(&mut self, evaluation: Evaluation) -> Result<CheckOutcome, TutorError> {
    let ex = self.state.current_exercise.as_ref().ok_or(TutorError::NoActiveExercise)?;
    let expected = ex.expected().ok_or(TutorError::NoActiveExercise)?.to_string();
    let source = ex.entry().map(|e| e.source.clone());

    let mut outcome = CheckOutcome {
      evaluation,
      awarded: 0,
      credit_withheld: false,
      newly_learned: false,
      expected,
    };

    if outcome.evaluation.is_correct {
      self.solved = true;
      if self.state.answer_revealed {
        outcome.credit_withheld = true;
      } else {
        outcome.awarded = self.tuning.points_per_correct;
        self.state.score += outcome.awarded;
        self.state.exercises_completed += 1;
        if let Some(source) = source {
          outcome.newly_learned = self.progress.mark_learned(&source);
        }
      }
    }
    self.phase = Phase::AnswerChecked;
    info!(
      target: "exercise",
      session = %self.id,
      correct = outcome.evaluation.is_correct,
      score = outcome.evaluation.score,
      awarded = outcome.awarded,
      total = self.state.score,
      "Answer checked"
    );
    Ok(outcome)
  }

  /// Reveal the expected answer. Does not touch the score.
  pub fn reveal(&mut self) -> Result<String, TutorError> {
    self.require_language()?;
    match self.phase {
      Phase::ExerciseActive | Phase::AnswerChecked => {}
      phase => return Err(TutorError::InvalidTransition { action: "reveal the answer", phase }),
    }
    let expected = self
      .state
      .current_exercise
      .as_ref()
      .and_then(|ex| ex.expected())
      .ok_or(TutorError::NoActiveExercise)?
      .to_string();
    self.state.answer_revealed = true;
    Ok(expected)
  }

  /// Clear counters and the current exercise. Learned words survive.
  pub fn reset(&mut self) {
    self.clear_counters();
    if self.phase != Phase::Uninitialized {
      self.phase = Phase::Ready;
    }
    info!(target: "exercise", session = %self.id, phase = %self.phase, "Progress reset");
  }

  /// Move to another level, keeping learned words and score.
  pub fn select_level(&mut self, level: Level) -> Result<(), TutorError> {
    self.require_language()?;
    self.progress.current_level = level;
    self.state.current_exercise = None;
    self.state.answer_revealed = false;
    self.state.pending_answer_text.clear();
    self.solved = false;
    self.phase = Phase::Ready;
    info!(target: "exercise", session = %self.id, %level, "Level selected");
    Ok(())
  }

  pub fn snapshot(&self) -> SessionSnapshot {
    let level = self.progress.current_level;
    let entries = self.language.map(|l| self.vocabulary.entries(l, level)).unwrap_or(&[]);
    let learned = self.progress.learned_in(entries);
    let ratio = completion_ratio(learned, entries.len());
    SessionSnapshot {
      phase: self.phase,
      language: self.language,
      level,
      score: self.state.score,
      exercises_completed: self.state.exercises_completed,
      answer_revealed: self.state.answer_revealed,
      learned_in_level: learned,
      level_total: entries.len(),
      learned_total: self.progress.learned_words.len(),
      progress_ratio: ratio,
      encouragement: encouragement(ratio).map(str::to_string),
      completed_lessons: self.progress.completed_lessons.clone(),
    }
  }

  /// Current level entries grouped by category, in first-appearance order.
  pub fn vocabulary_bank(&self) -> Result<Vec<CategoryGroup>, TutorError> {
    let language = self.require_language()?;
    let mut groups: Vec<CategoryGroup> = Vec::new();
    for e in self.vocabulary.entries(language, self.progress.current_level) {
      let word = BankWord { source: e.source.clone(), target: e.target.clone(), learned: self.progress.is_learned(&e.source) };
      match groups.iter_mut().find(|g| g.category == e.category) {
        Some(g) => g.words.push(word),
        None => groups.push(CategoryGroup { category: e.category.clone(), words: vec![word] }),
      }
    }
    Ok(groups)
  }

  fn require_language(&self) -> Result<Language, TutorError> {
    match (self.phase, self.language) {
      (Phase::Uninitialized, _) | (_, None) => Err(TutorError::NotInitialized),
      (_, Some(l)) => Ok(l),
    }
  }

  fn clear_counters(&mut self) {
    self.state = SessionState::default();
    self.solved = false;
  }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
  pub phase: Phase,
  pub language: Option<Language>,
  pub level: Level,
  pub score: u32,
  pub exercises_completed: u32,
  pub answer_revealed: bool,
  pub learned_in_level: usize,
  pub level_total: usize,
  pub learned_total: usize,
  pub progress_ratio: f32,
  pub encouragement: Option<String>,
  pub completed_lessons: Vec<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CategoryGroup {
  pub category: String,
  pub words: Vec<BankWord>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct BankWord {
  pub source: String,
  pub target: String,
  pub learned: bool,
}
