//! GhostLayer Redaction Engine
//!
//! This crate detects sensitive spans in free-form text and makes the
//! redaction reversible:
//! - Validators and the built-in pattern catalog
//! - A safety gate for user-supplied regular expressions
//! - Overlap resolution and entity-consistent replacement tags
//! - Rendering tagged text and restoring originals from rewritten output

pub mod engine;
pub mod patterns;
pub mod redactor;
pub mod safety;
pub mod stats;
pub mod validators;

pub use engine::{
    apply_overrides, assign_tags, detect, reattach_tags, retag_match, EngineConfig, OverrideScope,
    RedactionEngine, RuleSet, ToggleReconciliation, PROPAGATION_RULE_ID,
};
pub use patterns::{generate_smart_pattern, system_pattern, SystemPattern, SYSTEM_PATTERNS};
pub use redactor::{find_tags, render_redacted, restore, restore_with, tag_map};
pub use safety::{validate_custom_pattern, validate_custom_pattern_with, CompiledPattern, SafetyLimits};
pub use stats::{CategoryCount, RedactionStats};
pub use validators::{
    is_valid_card_number, is_valid_national_id, is_valid_tax_id, CountryProfile,
};
