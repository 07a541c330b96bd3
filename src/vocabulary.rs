//! Vocabulary store: built-in tables per language and level, optionally
//! extended from configuration.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::config::VocabularyCfg;
use crate::domain::{Language, Level, VocabularyEntry};

#[derive(Clone, Debug, Default)]
pub struct VocabularyBank {
  tables: HashMap<(Language, Level), Vec<VocabularyEntry>>,
}

impl VocabularyBank {
  /// Bank holding only the built-in Spanish and French tables.
  pub fn builtin() -> Self {
    let mut bank = Self::default();
    for language in Language::ALL {
      for level in Level::ALL {
        for (source, target, category) in builtin_table(language, level) {
          bank.insert(language, level, VocabularyEntry::new(source, target, category));
        }
      }
    }
    bank
  }

  /// Built-in tables plus configured extras.
  pub fn with_extras(extras: &[VocabularyCfg]) -> Self {
    let mut bank = Self::builtin();
    let mut added = 0usize;
    for cfg in extras {
      let entry = VocabularyEntry::new(cfg.source.trim(), cfg.target.trim(), cfg.category.trim());
      if entry.source.is_empty() || entry.target.is_empty() {
        warn!(target: "lingo_tutor", language = %cfg.language, level = %cfg.level, "Skipping vocabulary item with empty source or target");
        continue;
      }
      if bank.insert(cfg.language, cfg.level, entry) {
        added += 1;
      } else {
        warn!(target: "lingo_tutor", language = %cfg.language, level = %cfg.level, source = %cfg.source, "Skipping duplicate vocabulary item");
      }
    }
    for language in Language::ALL {
      for level in Level::ALL {
        info!(target: "lingo_tutor", %language, %level, entries = bank.entries(language, level).len(), "Vocabulary inventory");
      }
    }
    if added > 0 {
      info!(target: "lingo_tutor", added, "Extended vocabulary from config");
    }
    bank
  }

  /// Insert an entry; returns false when the source phrase already exists at that level.
  pub fn insert(&mut self, language: Language, level: Level, entry: VocabularyEntry) -> bool {
    let list = self.tables.entry((language, level)).or_default();
    if list.iter().any(|e| e.source == entry.source) {
      return false;
    }
    list.push(entry);
    true
  }

  pub fn entries(&self, language: Language, level: Level) -> &[VocabularyEntry] {
    self.tables.get(&(language, level)).map(Vec::as_slice).unwrap_or(&[])
  }

  /// Case-insensitive lookup of a source phrase across all levels of a language.
  pub fn lookup(&self, language: Language, source: &str) -> Option<&VocabularyEntry> {
    let needle = source.trim().to_lowercase();
    Level::ALL
      .iter()
      .flat_map(|level| self.entries(language, *level))
      .find(|e| e.source.to_lowercase() == needle)
  }
}

fn builtin_table(language: Language, level: Level) -> &'static [(&'static str, &'static str, &'static str)] {
  match (language, level) {
    (Language::Spanish, Level::Beginner) => &[
      ("hello", "hola", "greetings"),
      ("goodbye", "adiós", "greetings"),
      ("please", "por favor", "courtesy"),
      ("thank you", "gracias", "courtesy"),
      ("yes", "sí", "basics"),
      ("no", "no", "basics"),
      ("water", "agua", "food"),
      ("food", "comida", "food"),
      ("house", "casa", "places"),
      ("car", "coche", "transportation"),
    ],
    (Language::Spanish, Level::Intermediate) => &[
      ("I would like to eat", "me gustaría comer", "phrases"),
      ("Where is the bathroom?", "¿Dónde está el baño?", "questions"),
      ("How much does it cost?", "¿Cuánto cuesta?", "questions"),
      ("My name is", "Me llamo", "introductions"),
      ("I don't understand", "No entiendo", "conversation"),
    ],
    (Language::Spanish, Level::Advanced) => &[
      ("I would like to make a reservation", "Me gustaría hacer una reservación", "travel"),
      ("Could you help me please?", "¿Podría ayudarme por favor?", "requests"),
      ("What do you recommend?", "¿Qué recomienda?", "questions"),
    ],
    (Language::French, Level::Beginner) => &[
      ("hello", "bonjour", "greetings"),
      ("goodbye", "au revoir", "greetings"),
      ("please", "s'il vous plaît", "courtesy"),
      ("thank you", "merci", "courtesy"),
      ("yes", "oui", "basics"),
      ("no", "non", "basics"),
      ("water", "eau", "food"),
      ("food", "nourriture", "food"),
      ("house", "maison", "places"),
      ("car", "voiture", "transportation"),
    ],
    (Language::French, Level::Intermediate) => &[
      ("I would like to eat", "je voudrais manger", "phrases"),
      ("Where is the bathroom?", "Où sont les toilettes?", "questions"),
      ("How much does it cost?", "Combien ça coûte?", "questions"),
      ("My name is", "Je m'appelle", "introductions"),
      ("I don't understand", "Je ne comprends pas", "conversation"),
    ],
    (Language::French, Level::Advanced) => &[
      ("I would like to make a reservation", "Je voudrais faire une réservation", "travel"),
      ("Could you help me please?", "Pourriez-vous m'aider s'il vous plaît?", "requests"),
      ("What do you recommend?", "Que recommandez-vous?", "questions"),
    ],
  }
}
