//! Regex safety gate
//!
//! Custom patterns are user input. Before one is saved it must compile and
//! pass a few cheap structural heuristics: bounded counts of repetition
//! operators, groups and alternations, and no repeated group that already
//! contains an unbounded quantifier.

use ghostlayer_core::{Error, Result, UnsafeReason};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Thresholds applied by the safety gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyLimits {
    /// Maximum number of `*` and `+` operators
    pub max_repetitions: usize,

    /// Maximum number of `(` groups
    pub max_groups: usize,

    /// Maximum number of `|` alternations
    pub max_alternations: usize,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_repetitions: 20,
            max_groups: 15,
            max_alternations: 30,
        }
    }
}

/// A custom pattern that passed the gate
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub source: String,
    pub regex: Regex,
}

/// Validate a custom pattern with the default limits
pub fn validate_custom_pattern(pattern: &str) -> Result<CompiledPattern> {
    validate_custom_pattern_with(pattern, &SafetyLimits::default())
}

/// Validate a custom pattern against explicit limits
///
/// Syntax errors yield `Error::InvalidPattern`; heuristic rejections yield
/// `Error::UnsafePattern` carrying the reason.
pub fn validate_custom_pattern_with(pattern: &str, limits: &SafetyLimits) -> Result<CompiledPattern> {
    if pattern.trim().is_empty() {
        return Err(Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason: "pattern is empty".to_string(),
        });
    }

    let regex = compile_case_insensitive(pattern).map_err(|e| Error::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    if let Some(reason) = PatternProfile::scan(pattern).violation(limits) {
        warn!("Rejected custom pattern '{}': {}", pattern, reason);
        return Err(Error::UnsafePattern {
            pattern: pattern.to_string(),
            reason,
        });
    }

    Ok(CompiledPattern {
        source: pattern.to_string(),
        regex,
    })
}

/// Compile with the flags every user-supplied pattern runs with
pub(crate) fn compile_case_insensitive(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Operator counts gathered from the pattern source
#[derive(Debug, Default, PartialEq, Eq)]
struct PatternProfile {
    repetitions: usize,
    groups: usize,
    alternations: usize,
    nested_quantifier: bool,
}

impl PatternProfile {
    /// Walk the source, skipping escapes and character classes
    fn scan(pattern: &str) -> Self {
        let chars: Vec<char> = pattern.chars().collect();
        let mut profile = PatternProfile::default();
        // One entry per open group: does it contain an unbounded quantifier
        let mut open: Vec<bool> = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '\\' => {
                    i = skip_escape(&chars, i);
                    continue;
                }
                '[' => {
                    i = skip_class(&chars, i);
                    continue;
                }
                '(' => {
                    profile.groups += 1;
                    open.push(false);
                }
                ')' => {
                    let inner_unbounded = open.pop().unwrap_or(false);
                    if inner_unbounded && repeats(&chars, i + 1) {
                        profile.nested_quantifier = true;
                    }
                    if let Some(parent) = open.last_mut() {
                        *parent |= inner_unbounded;
                    }
                }
                '*' | '+' => {
                    profile.repetitions += 1;
                    if let Some(group) = open.last_mut() {
                        *group = true;
                    }
                }
                '{' => {
                    if let Some(brace) = parse_brace(&chars, i) {
                        if brace.max.is_none()
                            && let Some(group) = open.last_mut()
                        {
                            *group = true;
                        }
                        i = brace.end;
                        continue;
                    }
                }
                '|' => profile.alternations += 1,
                _ => {}
            }
            i += 1;
        }

        profile
    }

    /// First limit broken, checked in a fixed order
    fn violation(&self, limits: &SafetyLimits) -> Option<UnsafeReason> {
        if self.nested_quantifier {
            return Some(UnsafeReason::NestedQuantifier);
        }
        if self.repetitions > limits.max_repetitions {
            return Some(UnsafeReason::TooManyRepetitions {
                found: self.repetitions,
                limit: limits.max_repetitions,
            });
        }
        if self.groups > limits.max_groups {
            return Some(UnsafeReason::TooManyGroups {
                found: self.groups,
                limit: limits.max_groups,
            });
        }
        if self.alternations > limits.max_alternations {
            return Some(UnsafeReason::TooManyAlternations {
                found: self.alternations,
                limit: limits.max_alternations,
            });
        }
        None
    }
}

/// `{min}`, `{min,}` or `{min,max}` starting at `chars[start]`
struct Brace {
    max: Option<usize>,
    /// Index just past the closing brace
    end: usize,
}

fn parse_brace(chars: &[char], start: usize) -> Option<Brace> {
    let close = chars[start..].iter().position(|&c| c == '}')? + start;
    let body: String = chars[start + 1..close].iter().collect();
    let (min, max) = match body.split_once(',') {
        Some((min, "")) => (min, None),
        Some((min, max)) => (min, Some(max.trim().parse::<usize>().ok()?)),
        None => (body.as_str(), Some(body.trim().parse::<usize>().ok()?)),
    };
    min.trim().parse::<usize>().ok()?;

    Some(Brace {
        max,
        end: close + 1,
    })
}

/// Whether the token at `idx` repeats the preceding atom more than once
fn repeats(chars: &[char], idx: usize) -> bool {
    match chars.get(idx) {
        Some('*') | Some('+') => true,
        Some('{') => parse_brace(chars, idx).is_some_and(|b| b.max.is_none_or(|max| max > 1)),
        _ => false,
    }
}

fn skip_escape(chars: &[char], start: usize) -> usize {
    let braced = matches!(chars.get(start + 1), Some('p' | 'P' | 'x' | 'u' | 'U'))
        && chars.get(start + 2) == Some(&'{');

    if braced {
        match chars[start..].iter().position(|&c| c == '}') {
            Some(offset) => start + offset + 1,
            None => chars.len(),
        }
    } else {
        start + 2
    }
}

/// Skip a bracketed class, including nested classes such as `[[:alpha:]x]`
fn skip_class(chars: &[char], start: usize) -> usize {
    let mut i = start + 1;
    if chars.get(i) == Some(&'^') {
        i += 1;
    }
    // A leading `]` is a literal member
    if chars.get(i) == Some(&']') {
        i += 1;
    }

    let mut depth = 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                i = skip_escape(chars, i);
                continue;
            }
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    chars.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejection(pattern: &str) -> UnsafeReason {
        match validate_custom_pattern(pattern) {
            Err(Error::UnsafePattern { reason, .. }) => reason,
            other => panic!("expected unsafe pattern for {:?}, got {:?}", pattern, other),
        }
    }

    #[test]
    fn test_accepts_ordinary_patterns() {
        for pattern in [
            r"TCK-\d+",
            r"\d+-\d+",
            r"[A-Z]{2}\d{6}",
            r"(?:ref|id)\s*:\s*\w+",
            r"\p{Lu}\p{Ll}+",
            r"(ab)+",
            r"(a+)?",
            r"(a+){1}",
        ] {
            assert!(
                validate_custom_pattern(pattern).is_ok(),
                "rejected {:?}",
                pattern
            );
        }
    }

    #[test]
    fn test_rejects_nested_quantifiers() {
        for pattern in [r"(a+)+", r"(a*)*", r"(?:\d+)+", r"(a+){2,}", r"((ab)+c)*", r"(x{2,})+"] {
            assert_eq!(rejection(pattern), UnsafeReason::NestedQuantifier, "{}", pattern);
        }
    }

    #[test]
    fn test_rejects_too_many_repetitions() {
        let pattern = "a+".repeat(21);
        assert_eq!(
            rejection(&pattern),
            UnsafeReason::TooManyRepetitions {
                found: 21,
                limit: 20
            }
        );
        assert!(validate_custom_pattern(&"a+".repeat(20)).is_ok());
    }

    #[test]
    fn test_rejects_too_many_groups() {
        let pattern = "(a)".repeat(16);
        assert_eq!(
            rejection(&pattern),
            UnsafeReason::TooManyGroups {
                found: 16,
                limit: 15
            }
        );
    }

    #[test]
    fn test_rejects_too_many_alternations() {
        let words: Vec<String> = (0..32).map(|i| format!("w{}", i)).collect();
        assert_eq!(
            rejection(&words.join("|")),
            UnsafeReason::TooManyAlternations {
                found: 31,
                limit: 30
            }
        );
        assert!(validate_custom_pattern(&words[..31].join("|")).is_ok());
    }

    #[test]
    fn test_escaped_and_class_metacharacters_are_not_counted() {
        let profile = PatternProfile::scan(r"\(\+\*\|\)[(+*|]+");
        assert_eq!(
            profile,
            PatternProfile {
                repetitions: 1,
                groups: 0,
                alternations: 0,
                nested_quantifier: false,
            }
        );

        let profile = PatternProfile::scan(r"[]a+][^]|]\p{L}+");
        assert_eq!(profile.repetitions, 1);
        assert_eq!(profile.alternations, 0);
    }

    #[test]
    fn test_syntax_errors_are_invalid_not_unsafe() {
        let err = validate_custom_pattern("(unclosed").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
        assert!(err.is_pattern_rejection());

        let err = validate_custom_pattern("   ").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn test_compiled_pattern_is_case_insensitive() {
        let compiled = validate_custom_pattern(r"ticket-\d+").unwrap();
        assert_eq!(compiled.source, r"ticket-\d+");
        assert!(compiled.regex.is_match("see TICKET-42"));
    }

    #[test]
    fn test_custom_limits() {
        let strict = SafetyLimits {
            max_repetitions: 1,
            ..SafetyLimits::default()
        };
        assert!(validate_custom_pattern_with(r"\d+", &strict).is_ok());
        assert!(matches!(
            validate_custom_pattern_with(r"\d+\w+", &strict),
            Err(Error::UnsafePattern {
                reason: UnsafeReason::TooManyRepetitions { found: 2, limit: 1 },
                ..
            })
        ));
    }

    #[test]
    fn test_limits_deserialize_with_defaults() {
        let limits: SafetyLimits = serde_json::from_str(r#"{"max_groups": 3}"#).unwrap();
        assert_eq!(limits.max_groups, 3);
        assert_eq!(limits.max_repetitions, 20);
        assert_eq!(limits.max_alternations, 30);
    }
}
