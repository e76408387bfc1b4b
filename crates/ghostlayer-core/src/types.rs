//! Records exchanged between the engine, the session layer and persistence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::category::Category;

/// A detected span of interest
///
/// `start` and `end` are UTF-8 byte offsets into the source text, not
/// character indices. Slice with `&source[m.start..m.end]`; convert before
/// handing them to anything that counts chars or UTF-16 units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Opaque identifier generated at detection time
    pub id: String,

    /// Exact matched text, `source[start..end]`
    pub text: String,

    /// Start byte offset (inclusive)
    pub start: usize,

    /// End byte offset (exclusive)
    pub end: usize,

    /// Category of the match
    pub category: Category,

    /// Whether the match is replaced by a tag in rendered output
    pub is_redacted: bool,

    /// System pattern id or custom pattern id that produced the match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,

    /// Bracketed replacement tag, present only on effectively redacted matches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement_tag: Option<String>,

    /// Per-match override suppressing redaction
    #[serde(default)]
    pub excluded: bool,

    /// When the match was excluded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_at: Option<DateTime<Utc>>,
}

impl Match {
    /// Create a fresh match with a new id and no tag
    pub fn new(
        text: impl Into<String>,
        start: usize,
        end: usize,
        category: Category,
        is_redacted: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            start,
            end,
            category,
            is_redacted,
            rule_id: None,
            replacement_tag: None,
            excluded: false,
            excluded_at: None,
        }
    }

    /// Attach the id of the rule that produced this match
    pub fn with_rule_id(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    /// Span length in bytes
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Half-open interval overlap
    pub fn overlaps(&self, other: &Match) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Redacted and not excluded
    pub fn is_effectively_redacted(&self) -> bool {
        self.is_redacted && !self.excluded
    }

    /// Identity used to share one replacement tag between recurring mentions
    pub fn entity_key(&self) -> EntityKey {
        EntityKey::new(&self.text, self.category)
    }
}

/// `(lowercased text, category)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub text: String,
    pub category: Category,
}

impl EntityKey {
    pub fn new(text: &str, category: Category) -> Self {
        Self {
            text: text.to_lowercase(),
            category,
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.text, self.category)
    }
}

/// A literal phrase the user taught the tool to always redact ("Memory")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRule {
    pub id: String,

    /// Phrase to match, stored trimmed
    pub text: String,

    #[serde(default = "default_rule_category")]
    pub category: Category,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserRule {
    /// Create an enabled rule; the phrase is trimmed
    pub fn new(text: &str, category: Category) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.trim().to_string(),
            category,
            enabled: true,
            created_at: Some(Utc::now()),
        }
    }

    /// Rules are distinguished by trimmed text and category
    pub fn same_rule(&self, text: &str, category: Category) -> bool {
        self.category == category && self.text == text.trim()
    }
}

/// A user-authored regular expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomPattern {
    pub id: String,

    /// Display name
    pub name: String,

    /// Regex source, compiled case-insensitively
    pub regex: String,

    #[serde(default = "default_pattern_category")]
    pub category: Category,

    /// Inactive patterns are skipped entirely during detection
    #[serde(default = "default_true")]
    pub active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl CustomPattern {
    pub fn new(name: impl Into<String>, regex: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            regex: regex.into(),
            category: Category::Custom,
            active: true,
            created_at: Some(Utc::now()),
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }
}

/// A phrase or a whole category exempted from redaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum WhitelistEntry {
    Phrase(String),
    Category(Category),
}

impl From<&str> for WhitelistEntry {
    fn from(phrase: &str) -> Self {
        WhitelistEntry::Phrase(phrase.to_string())
    }
}

impl From<String> for WhitelistEntry {
    fn from(phrase: String) -> Self {
        WhitelistEntry::Phrase(phrase)
    }
}

impl From<Category> for WhitelistEntry {
    fn from(category: Category) -> Self {
        WhitelistEntry::Category(category)
    }
}

/// The user-visible state of one prior match, carried across re-detection runs
///
/// Every match is recorded, toggled or not, so an untouched occurrence keeps
/// its own state instead of inheriting a sibling's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleOverride {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub category: Category,
    pub is_redacted: bool,
    pub excluded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement_tag: Option<String>,
}

impl ToggleOverride {
    /// Record the state of every match
    pub fn collect(matches: &[Match]) -> Vec<ToggleOverride> {
        matches
            .iter()
            .map(|m| ToggleOverride {
                start: m.start,
                end: m.end,
                text: m.text.clone(),
                category: m.category,
                is_redacted: m.is_redacted,
                excluded: m.excluded,
                excluded_at: m.excluded_at,
                replacement_tag: m.replacement_tag.clone(),
            })
            .collect()
    }

    /// Same redaction and exclusion flags
    pub fn same_state(&self, other: &ToggleOverride) -> bool {
        self.is_redacted == other.is_redacted && self.excluded == other.excluded
    }

    pub fn entity_key(&self) -> EntityKey {
        EntityKey::new(&self.text, self.category)
    }

    /// Copy the toggle flags onto a freshly detected match; the tag is left alone
    pub fn apply_to(&self, m: &mut Match) {
        m.is_redacted = self.is_redacted;
        m.excluded = self.excluded;
        m.excluded_at = self.excluded_at;
    }

    /// Same span and text, same category
    pub fn applies_exactly_to(&self, m: &Match) -> bool {
        self.start == m.start && self.end == m.end && self.category == m.category && self.text == m.text
    }
}

fn default_true() -> bool {
    true
}

fn default_rule_category() -> Category {
    Category::UserMemory
}

fn default_pattern_category() -> Category {
    Category::Custom
}
