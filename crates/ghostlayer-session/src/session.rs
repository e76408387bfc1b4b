//! Session controller
//!
//! A `Session` owns the working text, the rule set and the current match
//! list. Every mutating action snapshots the state it is about to change,
//! applies the change and re-runs detection. Snapshots hold text, rules and
//! the recorded state of every match; matches are always recomputed from
//! them. Toggling or excluding a match is not a detection run, so it leaves
//! every other tag as it was.

use chrono::Utc;
use ghostlayer_core::{
    Category, CustomPattern, Error, Match, Result, ToggleOverride, UserRule, WhitelistEntry,
};
use ghostlayer_redact::{
    reattach_tags, render_redacted, restore, retag_match, validate_custom_pattern_with,
    OverrideScope, RedactionEngine, RedactionStats, RuleSet,
};
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::history::History;
use crate::notification::{Notification, NotificationKind, NotificationSlot};
use crate::store::RuleStore;

/// Undo/redo unit
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub text: String,
    pub rules: RuleSet,
    pub overrides: Vec<ToggleOverride>,
}

#[derive(Debug)]
pub struct Session {
    engine: RedactionEngine,
    text: String,
    rules: RuleSet,
    matches: Vec<Match>,
    history: History<Snapshot>,
    notification: NotificationSlot,
    restored_output: Option<String>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_rules(config, RuleSet::default())
    }

    pub fn with_rules(config: SessionConfig, rules: RuleSet) -> Self {
        Self {
            engine: RedactionEngine::new(config.engine.clone()),
            text: String::new(),
            rules,
            matches: Vec::new(),
            history: History::new(config.history_limit),
            notification: NotificationSlot::new(config.notification_ttl()),
            restored_output: None,
        }
    }

    /// Open a session with the rules held by `store`
    pub async fn load(config: SessionConfig, store: &dyn RuleStore) -> Result<Self> {
        let rules = store.load().await?;
        info!(
            "Session loaded {} rules, {} patterns, {} whitelist entries",
            rules.user_rules.len(),
            rules.custom_patterns.len(),
            rules.whitelist.len()
        );
        Ok(Self::with_rules(config, rules))
    }

    /// Write the current rules to `store`
    pub async fn persist(&self, store: &dyn RuleStore) -> Result<()> {
        store.save(&self.rules).await?;
        info!("Session rules persisted");
        Ok(())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn engine(&self) -> &RedactionEngine {
        &self.engine
    }

    pub fn redacted_text(&self) -> String {
        render_redacted(&self.text, &self.matches)
    }

    pub fn stats(&self) -> RedactionStats {
        RedactionStats::from_matches(&self.matches)
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.current()
    }

    pub fn notification_slot(&self) -> &NotificationSlot {
        &self.notification
    }

    pub fn dismiss_notification(&mut self) {
        self.notification.dismiss();
    }

    /// Output of the last `restore_text` call
    pub fn restored_output(&self) -> Option<&str> {
        self.restored_output.as_deref()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Replace the working text
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.record();
        self.text = text.into();
        self.redetect();
    }

    /// Teach a phrase; blank and duplicate phrases are ignored
    pub fn add_user_rule(&mut self, text: &str, category: Category) -> Option<String> {
        let clean = text.trim();
        if clean.is_empty() || self.rules.user_rules.iter().any(|r| r.same_rule(clean, category)) {
            return None;
        }

        self.record();
        let rule = UserRule::new(clean, category);
        let id = rule.id.clone();
        self.rules.user_rules.push(rule);
        self.notify("Added to Memory", NotificationKind::Success);
        self.redetect();
        Some(id)
    }

    pub fn update_user_rule_category(&mut self, id: &str, category: Category) -> Result<()> {
        let index = self.user_rule_index(id)?;
        self.record();
        self.rules.user_rules[index].category = category;
        self.redetect();
        Ok(())
    }

    pub fn toggle_user_rule(&mut self, id: &str) -> Result<()> {
        let index = self.user_rule_index(id)?;
        self.record();
        let rule = &mut self.rules.user_rules[index];
        rule.enabled = !rule.enabled;
        self.redetect();
        Ok(())
    }

    pub fn remove_user_rule(&mut self, id: &str) -> Result<UserRule> {
        let index = self.user_rule_index(id)?;
        self.record();
        let removed = self.rules.user_rules.remove(index);
        self.redetect();
        Ok(removed)
    }

    /// Add a custom pattern after it passes the safety gate
    pub fn add_custom_pattern(&mut self, name: &str, regex: &str, category: Category) -> Result<String> {
        if let Err(e) = validate_custom_pattern_with(regex, &self.engine.config().safety) {
            self.notify(e.to_string(), NotificationKind::Error);
            return Err(e);
        }

        self.record();
        let pattern = CustomPattern::new(name.trim(), regex).with_category(category);
        let id = pattern.id.clone();
        self.rules.custom_patterns.push(pattern);
        self.redetect();
        Ok(id)
    }

    pub fn toggle_custom_pattern(&mut self, id: &str) -> Result<()> {
        let index = self.custom_pattern_index(id)?;
        self.record();
        let pattern = &mut self.rules.custom_patterns[index];
        pattern.active = !pattern.active;
        self.redetect();
        Ok(())
    }

    pub fn remove_custom_pattern(&mut self, id: &str) -> Result<CustomPattern> {
        let index = self.custom_pattern_index(id)?;
        self.record();
        let removed = self.rules.custom_patterns.remove(index);
        self.redetect();
        Ok(removed)
    }

    /// Exempt a phrase or a category; returns false for blanks and duplicates
    pub fn add_to_whitelist(&mut self, entry: impl Into<WhitelistEntry>) -> bool {
        let entry = match entry.into() {
            WhitelistEntry::Phrase(phrase) => {
                let clean = phrase.trim();
                if clean.is_empty() {
                    return false;
                }
                WhitelistEntry::Phrase(clean.to_string())
            }
            category => category,
        };
        if self.rules.whitelist.contains(&entry) {
            return false;
        }

        self.record();
        self.rules.whitelist.push(entry);
        self.notify("Added to Whitelist", NotificationKind::Success);
        self.redetect();
        true
    }

    pub fn remove_from_whitelist(&mut self, entry: &WhitelistEntry) -> bool {
        let Some(index) = self.rules.whitelist.iter().position(|e| e == entry) else {
            return false;
        };

        self.record();
        self.rules.whitelist.remove(index);
        self.redetect();
        true
    }

    /// Flip a match between redacted and kept
    pub fn toggle_match(&mut self, id: &str) -> Result<()> {
        self.update_match(id, |m| m.is_redacted = !m.is_redacted)
    }

    /// Suppress redaction of one match without touching its category
    pub fn exclude_match(&mut self, id: &str) -> Result<()> {
        self.update_match(id, |m| {
            m.excluded = true;
            m.excluded_at = Some(Utc::now());
        })
    }

    pub fn restore_excluded_match(&mut self, id: &str) -> Result<()> {
        self.update_match(id, |m| {
            m.excluded = false;
            m.excluded_at = None;
        })
    }

    /// Swap tags in rewritten text back to the originals of the current run
    pub fn restore_text(&mut self, tagged: &str) -> String {
        let output = restore(tagged, &self.matches);
        self.restored_output = Some(output.clone());
        output
    }

    /// Drop the working text and everything derived from it
    ///
    /// Undo history is discarded too, since snapshots carry the text. Rules,
    /// patterns and the whitelist are kept.
    pub fn clear_sensitive_data(&mut self) {
        self.text.clear();
        self.matches.clear();
        self.restored_output = None;
        self.history.clear();
        self.notification.dismiss();
        info!("Sensitive session data cleared");
    }

    pub fn undo(&mut self) -> bool {
        let current = self.snapshot();
        let Some(previous) = self.history.undo(current) else {
            return false;
        };

        self.apply_snapshot(previous);
        self.notify("Undo", NotificationKind::Info);
        info!("Undo ({} steps left)", self.history.past_len());
        true
    }

    pub fn redo(&mut self) -> bool {
        let current = self.snapshot();
        let Some(next) = self.history.redo(current) else {
            return false;
        };

        self.apply_snapshot(next);
        self.notify("Redo", NotificationKind::Info);
        info!("Redo ({} steps left)", self.history.future_len());
        true
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            text: self.text.clone(),
            rules: self.rules.clone(),
            overrides: ToggleOverride::collect(&self.matches),
        }
    }

    fn record(&mut self) {
        let snapshot = self.snapshot();
        self.history.record(snapshot);
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.text = snapshot.text;
        self.rules = snapshot.rules;
        self.matches = self.engine.detect_with(
            &self.text,
            &self.rules,
            &snapshot.overrides,
            OverrideScope::ExactSpan,
        );
        reattach_tags(&mut self.matches, &snapshot.overrides);
    }

    fn redetect(&mut self) {
        let previous = ToggleOverride::collect(&self.matches);
        self.matches = self.engine.detect_reconciled(&self.text, &self.rules, &previous);
        debug!("Re-detected {} matches", self.matches.len());
    }

    fn update_match(&mut self, id: &str, change: impl FnOnce(&mut Match)) -> Result<()> {
        let index = self
            .matches
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| Error::NotFound(format!("Match {}", id)))?;

        self.record();
        change(&mut self.matches[index]);
        retag_match(&mut self.matches, index);
        Ok(())
    }

    fn user_rule_index(&self, id: &str) -> Result<usize> {
        self.rules
            .user_rules
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| Error::NotFound(format!("User rule {}", id)))
    }

    fn custom_pattern_index(&self, id: &str) -> Result<usize> {
        self.rules
            .custom_patterns
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::NotFound(format!("Custom pattern {}", id)))
    }

    fn notify(&mut self, message: impl Into<String>, kind: NotificationKind) {
        self.notification.show(message, kind);
    }
}

#[cfg(test)]
mod tests;
