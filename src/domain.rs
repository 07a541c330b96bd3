//! Domain models: languages, proficiency levels, vocabulary entries and exercises.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Target language the learner is studying. The source language is English.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Language {
  Spanish,
  French,
}

impl Language {
  pub const ALL: [Language; 2] = [Language::Spanish, Language::French];

  /// ISO 639-1 code, used by the speech backends.
  pub fn code(self) -> &'static str {
    match self {
      Language::Spanish => "es",
      Language::French => "fr",
    }
  }

  pub fn display_name(self) -> &'static str {
    match self {
      Language::Spanish => "Spanish",
      Language::French => "French",
    }
  }
}

impl fmt::Display for Language {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.display_name())
  }
}

/// Proficiency tier, ordered by difficulty.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Level {
  #[default]
  Beginner,
  Intermediate,
  Advanced,
}

impl Level {
  pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Advanced];

  pub fn as_str(self) -> &'static str {
    match self {
      Level::Beginner => "beginner",
      Level::Intermediate => "intermediate",
      Level::Advanced => "advanced",
    }
  }
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One vocabulary pairing. Identity is `source` within a level.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VocabularyEntry {
  pub source: String,
  pub target: String,
  pub category: String,
}

impl VocabularyEntry {
  pub fn new(source: &str, target: &str, category: &str) -> Self {
    Self { source: source.into(), target: target.into(), category: category.into() }
  }
}

/// Which quiz template produced an exercise.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
  Translation,
  Matching,
  FillBlank,
}

impl ExerciseKind {
  pub const ALL: [ExerciseKind; 3] = [ExerciseKind::Translation, ExerciseKind::Matching, ExerciseKind::FillBlank];

  /// Free-text kinds are graded by similarity; Matching is a single choice.
  pub fn is_free_text(self) -> bool {
    !matches!(self, ExerciseKind::Matching)
  }
}

/// One generated quiz item, or the terminal marker for an exhausted level.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Exercise {
  Translation {
    prompt: String,
    expected: String,
    hint: String,
    entry: VocabularyEntry,
  },
  Matching {
    prompt: String,
    expected: String,
    options: Vec<String>,
    entry: VocabularyEntry,
  },
  FillBlank {
    prompt: String,
    expected: String,
    entry: VocabularyEntry,
  },
  LevelComplete {
    message: String,
  },
}

impl Exercise {
  pub fn kind(&self) -> Option<ExerciseKind> {
    match self {
      Exercise::Translation { .. } => Some(ExerciseKind::Translation),
      Exercise::Matching { .. } => Some(ExerciseKind::Matching),
      Exercise::FillBlank { .. } => Some(ExerciseKind::FillBlank),
      Exercise::LevelComplete { .. } => None,
    }
  }

  pub fn prompt(&self) -> &str {
    match self {
      Exercise::Translation { prompt, .. }
      | Exercise::Matching { prompt, .. }
      | Exercise::FillBlank { prompt, .. } => prompt,
      Exercise::LevelComplete { message } => message,
    }
  }

  pub fn expected(&self) -> Option<&str> {
    match self {
      Exercise::Translation { expected, .. }
      | Exercise::Matching { expected, .. }
      | Exercise::FillBlank { expected, .. } => Some(expected),
      Exercise::LevelComplete { .. } => None,
    }
  }

  pub fn entry(&self) -> Option<&VocabularyEntry> {
    match self {
      Exercise::Translation { entry, .. }
      | Exercise::Matching { entry, .. }
      | Exercise::FillBlank { entry, .. } => Some(entry),
      Exercise::LevelComplete { .. } => None,
    }
  }

  pub fn hint(&self) -> Option<&str> {
    match self {
      Exercise::Translation { hint, .. } => Some(hint),
      _ => None,
    }
  }

  pub fn options(&self) -> &[String] {
    match self {
      Exercise::Matching { options, .. } => options,
      _ => &[],
    }
  }

  pub fn is_level_complete(&self) -> bool {
    matches!(self, Exercise::LevelComplete { .. })
  }
}
