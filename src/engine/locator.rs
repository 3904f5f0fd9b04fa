use regex::Regex;

use crate::findings::{OccurrenceKind, OccurrenceOrigin, ParameterOccurrence};

/// Longest line context kept on an occurrence; longer lines are cut.
const MAX_LINE_CONTEXT: usize = 160;

/// Groovy declaration calls that bind a parameter name to a default value
/// inside a `parameters { }` section.
const DECLARATION_CALLS: &str = "string|text|booleanParam|choice|password";

/// Finds and classifies occurrences of target parameters in arbitrary text.
///
/// Matching is exact-token: a target must appear as a whole identifier, never
/// as a substring of a longer one, and is case-sensitive by design (parameter
/// names are exact identifiers). Patterns are compiled once per scan.
pub struct ParameterLocator {
    targets: Vec<TargetPatterns>,
}

struct TargetPatterns {
    name: String,
    word: Regex,
    declaration: Regex,
}

impl ParameterLocator {
    /// Builds matchers for an ordered set of target names. The order is
    /// preserved: occurrences on the same line are emitted in target order.
    pub fn new(targets: &[String]) -> Self {
        let targets = targets
            .iter()
            .map(|name| {
                let escaped = regex::escape(name);
                TargetPatterns {
                    name: name.clone(),
                    word: Regex::new(&format!(r"\b{escaped}\b"))
                        .expect("escaped identifier is a valid pattern"),
                    declaration: Regex::new(&format!(
                        r#"(?:{DECLARATION_CALLS})\s*\(\s*name\s*:\s*['"]{escaped}['"]"#
                    ))
                    .expect("escaped identifier is a valid pattern"),
                }
            })
            .collect();
        Self { targets }
    }

    /// Scans `text` line by line (1-based numbering) and returns every
    /// occurrence of every target, ordered by line number and then by target
    /// order. Duplicate matches on one line are all retained: occurrence
    /// counts are part of the audit signal.
    ///
    /// Empty text or an empty target set yields an empty result.
    pub fn locate(
        &self,
        text: &str,
        origin: OccurrenceOrigin,
        origin_identifier: &str,
    ) -> Vec<ParameterOccurrence> {
        let mut occurrences = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let line_number = index + 1;
            for target in &self.targets {
                let matches = target.word.find_iter(line).count();
                if matches == 0 {
                    continue;
                }

                let kind = if target.declaration.is_match(line) {
                    OccurrenceKind::DeclaredAsJobParameter
                } else {
                    OccurrenceKind::UsedInScriptText
                };
                let line_context = trim_context(line);

                for _ in 0..matches {
                    occurrences.push(ParameterOccurrence {
                        parameter_name: target.name.clone(),
                        kind,
                        line_number,
                        line_context: line_context.clone(),
                        origin,
                        origin_identifier: origin_identifier.to_string(),
                    });
                }
            }
        }

        occurrences
    }
}

fn trim_context(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.chars().count() <= MAX_LINE_CONTEXT {
        trimmed.to_string()
    } else {
        trimmed.chars().take(MAX_LINE_CONTEXT).collect()
    }
}
