//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Lowercase and trim a free-text answer before comparison.
pub fn normalize_answer(s: &str) -> String {
  s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fills_all_occurrences() {
    let out = fill_template("{a} and {a} but {b}", &[("a", "x"), ("b", "y")]);
    assert_eq!(out, "x and x but y");
  }

  #[test]
  fn normalizes_case_and_outer_whitespace() {
    assert_eq!(normalize_answer("  Por Favor \n"), "por favor");
    assert_eq!(normalize_answer("¿Dónde ESTÁ?"), "¿dónde está?");
  }
}
