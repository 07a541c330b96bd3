//! Learner progress: learned words, completed lessons, current level.

use std::collections::HashSet;

use serde::Serialize;

use crate::domain::{Level, VocabularyEntry};

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct ProgressState {
  /// Learned entries, keyed by level and source phrase.
  pub learned_words: HashSet<(Level, String)>,
  pub completed_lessons: Vec<String>,
  pub current_level: Level,
}

impl ProgressState {
  pub fn new(level: Level) -> Self {
    Self { current_level: level, ..Self::default() }
  }

  /// Whether `source` was learned at the current level.
  pub fn is_learned(&self, source: &str) -> bool {
    self.is_learned_at(self.current_level, source)
  }

  pub fn is_learned_at(&self, level: Level, source: &str) -> bool {
    self.learned_words.contains(&(level, source.to_string()))
  }

  /// Mark a source phrase learned at the current level. Returns true the first time only.
  pub fn mark_learned(&mut self, source: &str) -> bool {
    self.learned_words.insert((self.current_level, source.to_string()))
  }

  /// Record a finished lesson once, keeping first-completion order.
  pub fn complete_lesson(&mut self, lesson: &str) -> bool {
    if self.completed_lessons.iter().any(|l| l == lesson) {
      return false;
    }
    self.completed_lessons.push(lesson.to_string());
    true
  }

  /// Number of `entries` already learned.
  pub fn learned_in(&self, entries: &[VocabularyEntry]) -> usize {
    entries.iter().filter(|e| self.is_learned(&e.source)).count()
  }

  pub fn all_learned(&self, entries: &[VocabularyEntry]) -> bool {
    entries.iter().all(|e| self.is_learned(&e.source))
  }
}

/// Fraction of a level learned, in [0, 1]; an empty level counts as 0.
pub fn completion_ratio(learned: usize, total: usize) -> f32 {
  if total == 0 { 0.0 } else { learned as f32 / total as f32 }
}

/// Encouragement shown next to the progress bar.
pub fn encouragement(ratio: f32) -> Option<&'static str> {
  if ratio > 0.8 {
    Some("Excellent progress! Consider moving to the next level.")
  } else if ratio > 0.5 {
    Some("Good progress! Keep practicing.")
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn marking_is_idempotent() {
    let mut p = ProgressState::new(Level::Beginner);
    assert!(p.mark_learned("hello"));
    assert!(!p.mark_learned("hello"));
    assert_eq!(p.learned_words.len(), 1);
  }

  #[test]
  fn learned_words_are_scoped_to_their_level() {
    let mut p = ProgressState::new(Level::Beginner);
    assert!(p.mark_learned("hello"));
    p.current_level = Level::Advanced;
    assert!(!p.is_learned("hello"));
    assert!(p.is_learned_at(Level::Beginner, "hello"));
    assert!(p.mark_learned("hello"));
    assert_eq!(p.learned_words.len(), 2);
  }

  #[test]
  fn lessons_are_recorded_once_in_order() {
    let mut p = ProgressState::default();
    assert!(p.complete_lesson("beginner"));
    assert!(p.complete_lesson("advanced"));
    assert!(!p.complete_lesson("beginner"));
    assert_eq!(p.completed_lessons, vec!["beginner", "advanced"]);
  }

  #[test]
  fn learned_counts_only_listed_entries() {
    let entries = vec![VocabularyEntry::new("yes", "sí", "basics"), VocabularyEntry::new("no", "no", "basics")];
    let mut p = ProgressState::default();
    p.mark_learned("yes");
    p.mark_learned("car");
    assert_eq!(p.learned_in(&entries), 1);
    assert!(!p.all_learned(&entries));
    p.mark_learned("no");
    assert!(p.all_learned(&entries));
    assert!(p.all_learned(&[]));
  }

  #[test]
  fn encouragement_thresholds() {
    assert_eq!(completion_ratio(0, 0), 0.0);
    assert_eq!(encouragement(completion_ratio(9, 10)), Some("Excellent progress! Consider moving to the next level."));
    assert_eq!(encouragement(completion_ratio(6, 10)), Some("Good progress! Keep practicing."));
    assert_eq!(encouragement(completion_ratio(5, 10)), None);
  }
}
