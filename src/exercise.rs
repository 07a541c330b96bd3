//! Exercise generation: candidate selection with occasional review of learned
//! entries, then one of three quiz templates.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::{Exercise, ExerciseKind, Language, VocabularyEntry};
use crate::progress::ProgressState;
use crate::util::fill_template;

const MAX_DISTRACTORS: usize = 3;

const LEVEL_COMPLETE_MESSAGE: &str = "Congratulations! You've completed all exercises for this level!";

const FILL_BLANK_TEMPLATES: [&str; 3] = [
  "The {language} word for '{source}' is: _____",
  "I need to say '{source}' in {language}. It is: _____",
  "How do you say '{source}' in {language}? _____",
];

/// Produce one exercise for the current level of `progress`.
///
/// `entries` is the vocabulary of that level. Returns `LevelComplete` when the
/// list is empty or every entry is learned.
pub fn generate<R: Rng + ?Sized>(
  rng: &mut R,
  language: Language,
  entries: &[VocabularyEntry],
  progress: &ProgressState,
  review_probability: f64,
) -> Exercise {
  if progress.all_learned(entries) {
    return Exercise::LevelComplete { message: LEVEL_COMPLETE_MESSAGE.into() };
  }

  // Unlearned entries always qualify; learned ones come back for review now and then.
  let candidates: Vec<&VocabularyEntry> = entries
    .iter()
    .filter(|e| !progress.is_learned(&e.source) || rng.gen_bool(review_probability))
    .collect();

  // Non-empty: at least one entry is unlearned.
  let Some(entry) = candidates.choose(rng).copied() else {
    return Exercise::LevelComplete { message: LEVEL_COMPLETE_MESSAGE.into() };
  };

  let kind = ExerciseKind::ALL.choose(rng).copied().unwrap_or(ExerciseKind::Translation);
  build(rng, kind, language, entry, entries)
}

/// Build an exercise of a given kind around `entry`.
pub fn build<R: Rng + ?Sized>(
  rng: &mut R,
  kind: ExerciseKind,
  language: Language,
  entry: &VocabularyEntry,
  level_entries: &[VocabularyEntry],
) -> Exercise {
  let language = language.display_name();
  match kind {
    ExerciseKind::Translation => Exercise::Translation {
      prompt: format!("Translate to {}: '{}'", language, entry.source),
      expected: entry.target.clone(),
      hint: format!("Category: {}", entry.category),
      entry: entry.clone(),
    },
    ExerciseKind::Matching => Exercise::Matching {
      prompt: format!("Match the English word/phrase: '{}'", entry.source),
      expected: entry.target.clone(),
      options: matching_options(rng, entry, level_entries),
      entry: entry.clone(),
    },
    ExerciseKind::FillBlank => {
      let tpl = FILL_BLANK_TEMPLATES.choose(rng).copied().unwrap_or(FILL_BLANK_TEMPLATES[0]);
      Exercise::FillBlank {
        prompt: fill_template(tpl, &[("language", language), ("source", &entry.source)]),
        expected: entry.target.clone(),
        entry: entry.clone(),
      }
    }
  }
}

/// Correct target plus up to three distinct distractor targets, shuffled.
fn matching_options<R: Rng + ?Sized>(rng: &mut R, entry: &VocabularyEntry, level_entries: &[VocabularyEntry]) -> Vec<String> {
  let mut pool: Vec<&str> = Vec::new();
  for other in level_entries {
    if other.source == entry.source || other.target == entry.target {
      continue;
    }
    if !pool.contains(&other.target.as_str()) {
      pool.push(&other.target);
    }
  }

  let mut options = vec![entry.target.clone()];
  options.extend(
    pool
      .choose_multiple(rng, MAX_DISTRACTORS.min(pool.len()))
      .map(|t| t.to_string()),
  );
  options.shuffle(rng);
  options
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  use crate::domain::Level;
  use crate::vocabulary::VocabularyBank;

  fn beginner() -> Vec<VocabularyEntry> {
    VocabularyBank::builtin().entries(Language::Spanish, Level::Beginner).to_vec()
  }

  #[test]
  fn empty_level_is_complete() {
    let mut rng = StdRng::seed_from_u64(1);
    let ex = generate(&mut rng, Language::Spanish, &[], &ProgressState::default(), 0.3);
    assert!(ex.is_level_complete());
  }

  #[test]
  fn fully_learned_level_is_complete_for_every_level() {
    let bank = VocabularyBank::builtin();
    let mut rng = StdRng::seed_from_u64(2);
    for language in Language::ALL {
      for level in Level::ALL {
        let entries = bank.entries(language, level);
        let mut progress = ProgressState::new(level);
        for e in entries {
          progress.mark_learned(&e.source);
        }
        for _ in 0..20 {
          assert!(generate(&mut rng, language, entries, &progress, 1.0).is_level_complete());
        }
      }
    }
  }

  #[test]
  fn only_unlearned_entry_is_chosen_without_review() {
    let entries = beginner();
    let mut progress = ProgressState::new(Level::Beginner);
    for e in entries.iter().filter(|e| e.source != "water") {
      progress.mark_learned(&e.source);
    }
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..50 {
      let ex = generate(&mut rng, Language::Spanish, &entries, &progress, 0.0);
      assert_eq!(ex.entry().unwrap().source, "water");
      assert_eq!(ex.expected(), Some("agua"));
    }
  }

  #[test]
  fn learned_entries_return_for_review() {
    let entries = beginner();
    let mut progress = ProgressState::new(Level::Beginner);
    for e in entries.iter().filter(|e| e.source != "water") {
      progress.mark_learned(&e.source);
    }
    let mut rng = StdRng::seed_from_u64(4);
    let reviewed = (0..200)
      .filter(|_| generate(&mut rng, Language::Spanish, &entries, &progress, 1.0).entry().unwrap().source != "water")
      .count();
    assert!(reviewed > 0);
  }

  #[test]
  fn matching_options_are_unique_and_hold_answer_once() {
    let entries = beginner();
    let mut rng = StdRng::seed_from_u64(5);
    for entry in &entries {
      for _ in 0..10 {
        let ex = build(&mut rng, ExerciseKind::Matching, Language::Spanish, entry, &entries);
        let options = ex.options();
        assert_eq!(options.len(), 4);
        assert_eq!(options.iter().filter(|o| **o == entry.target).count(), 1);
        let mut dedup = options.to_vec();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), options.len());
      }
    }
  }

  #[test]
  fn matching_with_few_entries_uses_all_others() {
    let entries = VocabularyBank::builtin().entries(Language::French, Level::Advanced).to_vec();
    let mut rng = StdRng::seed_from_u64(6);
    let ex = build(&mut rng, ExerciseKind::Matching, Language::French, &entries[0], &entries);
    assert_eq!(ex.options().len(), 3);

    let alone = build(&mut rng, ExerciseKind::Matching, Language::French, &entries[0], &entries[..1]);
    assert_eq!(alone.options(), &[entries[0].target.clone()]);
  }

  #[test]
  fn matching_skips_distractors_sharing_the_answer() {
    let entries = vec![
      VocabularyEntry::new("no", "no", "basics"),
      VocabularyEntry::new("not", "no", "basics"),
      VocabularyEntry::new("yes", "sí", "basics"),
    ];
    let mut rng = StdRng::seed_from_u64(7);
    let ex = build(&mut rng, ExerciseKind::Matching, Language::Spanish, &entries[0], &entries);
    assert_eq!(ex.options().len(), 2);
    assert_eq!(ex.options().iter().filter(|o| o.as_str() == "no").count(), 1);
  }

  #[test]
  fn translation_prompt_and_hint() {
    let entry = VocabularyEntry::new("hello", "hola", "greetings");
    let mut rng = StdRng::seed_from_u64(8);
    let ex = build(&mut rng, ExerciseKind::Translation, Language::Spanish, &entry, &[]);
    assert_eq!(ex.prompt(), "Translate to Spanish: 'hello'");
    assert_eq!(ex.hint(), Some("Category: greetings"));
    assert_eq!(ex.expected(), Some("hola"));
  }

  #[test]
  fn fill_blank_uses_one_of_the_templates() {
    let entry = VocabularyEntry::new("water", "eau", "food");
    let mut rng = StdRng::seed_from_u64(9);
    for _ in 0..20 {
      let ex = build(&mut rng, ExerciseKind::FillBlank, Language::French, &entry, &[]);
      let prompt = ex.prompt();
      assert!(prompt.contains("'water'"));
      assert!(prompt.contains("French"));
      assert!(prompt.contains("_____"));
      assert_eq!(ex.kind(), Some(ExerciseKind::FillBlank));
    }
  }

  #[test]
  fn all_kinds_show_up() {
    let entries = beginner();
    let progress = ProgressState::new(Level::Beginner);
    let mut rng = StdRng::seed_from_u64(10);
    let kinds: Vec<_> = (0..100)
      .filter_map(|_| generate(&mut rng, Language::Spanish, &entries, &progress, 0.3).kind())
      .collect();
    for kind in ExerciseKind::ALL {
      assert!(kinds.contains(&kind));
    }
  }
}
