//! Detection and overlap resolution
//!
//! Every rule source (whitelist phrases, user rules, custom patterns, the
//! system catalog) is run independently over the text. The resulting
//! candidates are ranked (whitelist first, then longest span, then earliest
//! start) and swept greedily: a candidate survives only if none of its bytes
//! were claimed by a higher-ranked one. Surviving matches are tagged so that
//! every occurrence of one entity shares a single replacement tag.

use aho_corasick::AhoCorasick;
use ghostlayer_core::{
    Category, CustomPattern, EntityKey, Match, ToggleOverride, UserRule, WhitelistEntry,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::patterns::{generate_smart_pattern, literal_pattern, SYSTEM_PATTERNS};
use crate::safety::{compile_case_insensitive, SafetyLimits};

/// Rule id attached to matches found by entity propagation
pub const PROPAGATION_RULE_ID: &str = "consistency_propagation";

/// Categories whose values are searched again across the whole text when
/// propagation is enabled
const PROPAGATED_CATEGORIES: &[Category] = &[
    Category::PersonName,
    Category::Company,
    Category::Email,
    Category::Phone,
    Category::IdDocument,
    Category::Ssn,
    Category::Ein,
    Category::Address,
];

/// Minimum character count for a propagated value
const MIN_PROPAGATED_CHARS: usize = 4;

/// How user toggles survive a re-detection run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleReconciliation {
    /// Every run starts from detection defaults
    #[default]
    Reset,
    /// Prior toggles are re-applied by span, then by entity key
    EntityKey,
}

/// Which prior overrides a single run honors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideScope {
    None,
    /// Only overrides recorded at the identical span with identical text
    ExactSpan,
    /// Exact span first, otherwise the last override for the same entity key
    EntityKey,
}

impl From<ToggleReconciliation> for OverrideScope {
    fn from(mode: ToggleReconciliation) -> Self {
        match mode {
            ToggleReconciliation::Reset => OverrideScope::None,
            ToggleReconciliation::EntityKey => OverrideScope::EntityKey,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Literal substrings that veto any non-whitelist candidate containing them
    pub false_positive_blacklist: Vec<String>,

    pub toggle_reconciliation: ToggleReconciliation,

    /// Search detected entity values again across the whole text
    pub propagate_entities: bool,

    /// Limits enforced when custom patterns are saved
    pub safety: SafetyLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            false_positive_blacklist: default_blacklist(),
            toggle_reconciliation: ToggleReconciliation::default(),
            propagate_entities: false,
            safety: SafetyLimits::default(),
        }
    }
}

fn default_blacklist() -> Vec<String> {
    ["г. Дата", "П. Дата", "N/A", "TBD", "TODO"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// User-controlled detection inputs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub user_rules: Vec<UserRule>,
    pub custom_patterns: Vec<CustomPattern>,
    pub whitelist: Vec<WhitelistEntry>,
}

impl RuleSet {
    pub fn is_empty(&self) -> bool {
        self.user_rules.is_empty() && self.custom_patterns.is_empty() && self.whitelist.is_empty()
    }

    /// Categories exempted as a whole
    pub fn whitelisted_categories(&self) -> HashSet<Category> {
        whitelisted_categories(&self.whitelist)
    }
}

fn whitelisted_categories(whitelist: &[WhitelistEntry]) -> HashSet<Category> {
    whitelist
        .iter()
        .filter_map(|entry| match entry {
            WhitelistEntry::Category(category) => Some(*category),
            WhitelistEntry::Phrase(_) => None,
        })
        .collect()
}

/// A raw hit before overlap resolution
#[derive(Debug, Clone)]
struct Candidate {
    start: usize,
    end: usize,
    category: Category,
    rule_id: Option<String>,
    /// Claims its span but never reaches the output
    whitelist: bool,
}

impl Candidate {
    fn len(&self) -> usize {
        self.end - self.start
    }
}

/// The detection pipeline
#[derive(Debug, Clone)]
pub struct RedactionEngine {
    config: EngineConfig,
    blacklist: Option<AhoCorasick>,
}

impl Default for RedactionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl RedactionEngine {
    /// Create a new engine with the given configuration
    pub fn new(config: EngineConfig) -> Self {
        let phrases: Vec<&str> = config
            .false_positive_blacklist
            .iter()
            .map(String::as_str)
            .filter(|p| !p.is_empty())
            .collect();

        let blacklist = if phrases.is_empty() {
            None
        } else {
            match AhoCorasick::new(&phrases) {
                Ok(automaton) => Some(automaton),
                Err(e) => {
                    warn!("Failed to build false-positive blacklist: {}", e);
                    None
                }
            }
        };

        Self { config, blacklist }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Detect from scratch; every match carries detection defaults
    pub fn detect(&self, text: &str, rules: &RuleSet) -> Vec<Match> {
        self.detect_with(text, rules, &[], OverrideScope::None)
    }

    /// Detect and carry prior toggles forward according to the configured
    /// reconciliation mode
    pub fn detect_reconciled(
        &self,
        text: &str,
        rules: &RuleSet,
        previous: &[ToggleOverride],
    ) -> Vec<Match> {
        let scope = self.config.toggle_reconciliation.into();
        self.detect_with(text, rules, previous, scope)
    }

    /// Detect and apply `overrides` with an explicit scope
    pub fn detect_with(
        &self,
        text: &str,
        rules: &RuleSet,
        overrides: &[ToggleOverride],
        scope: OverrideScope,
    ) -> Vec<Match> {
        self.run(
            text,
            &rules.user_rules,
            &rules.custom_patterns,
            &rules.whitelist,
            overrides,
            scope,
        )
    }

    fn run(
        &self,
        text: &str,
        user_rules: &[UserRule],
        custom_patterns: &[CustomPattern],
        whitelist: &[WhitelistEntry],
        overrides: &[ToggleOverride],
        scope: OverrideScope,
    ) -> Vec<Match> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut candidates = Vec::new();
        collect_whitelist(text, whitelist, &mut candidates);
        collect_user_rules(text, user_rules, &mut candidates);
        collect_custom_patterns(text, custom_patterns, &mut candidates);
        collect_system_patterns(text, &mut candidates);

        if let Some(blacklist) = &self.blacklist {
            candidates.retain(|c| c.whitelist || !blacklist.is_match(&text[c.start..c.end]));
        }

        if self.config.propagate_entities {
            propagate_entities(text, &mut candidates);
        }

        let candidate_count = candidates.len();
        let mut matches = resolve_overlaps(text, candidates, &whitelisted_categories(whitelist));
        debug!(
            "Resolved {} matches from {} candidates",
            matches.len(),
            candidate_count
        );

        apply_overrides(&mut matches, overrides, scope);
        assign_tags(&mut matches);
        matches
    }
}

fn push_hits(
    text: &str,
    regex: &Regex,
    category: Category,
    rule_id: Option<&str>,
    whitelist: bool,
    candidates: &mut Vec<Candidate>,
) {
    for hit in regex.find_iter(text) {
        if hit.is_empty() {
            continue;
        }
        candidates.push(Candidate {
            start: hit.start(),
            end: hit.end(),
            category,
            rule_id: rule_id.map(String::from),
            whitelist,
        });
    }
}

fn collect_whitelist(text: &str, whitelist: &[WhitelistEntry], candidates: &mut Vec<Candidate>) {
    for entry in whitelist {
        let WhitelistEntry::Phrase(phrase) = entry else {
            continue;
        };
        let phrase = phrase.trim();
        if phrase.is_empty() {
            continue;
        }

        let source = if phrase.chars().any(char::is_whitespace) {
            regex::escape(phrase)
        } else {
            literal_pattern(phrase)
        };

        match compile_case_insensitive(&source) {
            Ok(regex) => push_hits(text, &regex, Category::Whitelist, None, true, candidates),
            Err(e) => warn!("Skipping whitelist phrase '{}': {}", phrase, e),
        }
    }
}

fn collect_user_rules(text: &str, rules: &[UserRule], candidates: &mut Vec<Candidate>) {
    for rule in rules.iter().filter(|r| r.enabled) {
        let source = generate_smart_pattern(&rule.text);
        if source.is_empty() {
            continue;
        }

        match compile_case_insensitive(&source) {
            Ok(regex) => push_hits(text, &regex, rule.category, Some(rule.id.as_str()), false, candidates),
            Err(e) => warn!("Skipping user rule '{}': {}", rule.text, e),
        }
    }
}

fn collect_custom_patterns(text: &str, patterns: &[CustomPattern], candidates: &mut Vec<Candidate>) {
    for pattern in patterns.iter().filter(|p| p.active) {
        match compile_case_insensitive(&pattern.regex) {
            Ok(regex) => push_hits(
                text,
                &regex,
                pattern.category,
                Some(pattern.id.as_str()),
                false,
                candidates,
            ),
            Err(e) => warn!("Skipping custom pattern '{}': {}", pattern.name, e),
        }
    }
}

fn collect_system_patterns(text: &str, candidates: &mut Vec<Candidate>) {
    for pattern in SYSTEM_PATTERNS.iter() {
        for hit in pattern.regex.find_iter(text) {
            if hit.is_empty() || !pattern.accepts(hit.as_str(), &text[hit.end()..]) {
                continue;
            }
            candidates.push(Candidate {
                start: hit.start(),
                end: hit.end(),
                category: pattern.category,
                rule_id: Some(pattern.id.to_string()),
                whitelist: false,
            });
        }
    }
}

/// Search every distinct propagatable value again, case-insensitively
fn propagate_entities(text: &str, candidates: &mut Vec<Candidate>) {
    let mut seen: HashSet<EntityKey> = HashSet::new();
    let mut values: Vec<(String, Category)> = Vec::new();

    for c in candidates.iter().filter(|c| !c.whitelist) {
        if !PROPAGATED_CATEGORIES.contains(&c.category) {
            continue;
        }
        let value = &text[c.start..c.end];
        if value.chars().count() < MIN_PROPAGATED_CHARS {
            continue;
        }
        // Single-word company names are too ambiguous to chase
        if c.category == Category::Company && !value.trim().contains(char::is_whitespace) {
            continue;
        }
        if seen.insert(EntityKey::new(value, c.category)) {
            values.push((value.to_string(), c.category));
        }
    }

    for (value, category) in values {
        match compile_case_insensitive(&literal_pattern(&value)) {
            Ok(regex) => push_hits(
                text,
                &regex,
                category,
                Some(PROPAGATION_RULE_ID),
                false,
                candidates,
            ),
            Err(e) => warn!("Skipping propagation of '{}': {}", value, e),
        }
    }
}

/// Rank candidates and sweep them into a non-overlapping, start-ordered list
fn resolve_overlaps(
    text: &str,
    mut candidates: Vec<Candidate>,
    whitelisted: &HashSet<Category>,
) -> Vec<Match> {
    candidates.sort_by(|a, b| {
        b.whitelist
            .cmp(&a.whitelist)
            .then_with(|| b.len().cmp(&a.len()))
            .then_with(|| a.start.cmp(&b.start))
    });

    let mut claimed = vec![false; text.len()];
    let mut matches = Vec::new();

    for candidate in candidates {
        if !candidate.whitelist && whitelisted.contains(&candidate.category) {
            continue;
        }

        let span = candidate.start..candidate.end;
        if claimed[span.clone()].iter().any(|&taken| taken) {
            continue;
        }
        claimed[span.clone()].fill(true);

        if candidate.whitelist {
            continue;
        }

        let mut m = Match::new(&text[span], candidate.start, candidate.end, candidate.category, true);
        m.rule_id = candidate.rule_id;
        matches.push(m);
    }

    matches.sort_by_key(|m| m.start);
    matches
}

/// Re-apply prior toggle state to freshly detected matches
///
/// A prior match at the same span with the same text wins. Under
/// `EntityKey` scope, matches with no such prior fall back to the state of
/// their entity, but only when every prior occurrence of that entity agreed.
pub fn apply_overrides(matches: &mut [Match], overrides: &[ToggleOverride], scope: OverrideScope) {
    if overrides.is_empty() || scope == OverrideScope::None {
        return;
    }

    // None marks an entity whose occurrences were toggled differently
    let mut by_key: HashMap<EntityKey, Option<&ToggleOverride>> = HashMap::new();
    if scope == OverrideScope::EntityKey {
        for o in overrides {
            by_key
                .entry(o.entity_key())
                .and_modify(|slot| {
                    if slot.is_some_and(|seen| !seen.same_state(o)) {
                        *slot = None;
                    }
                })
                .or_insert(Some(o));
        }
    }

    for m in matches.iter_mut() {
        let chosen = match overrides.iter().rev().find(|o| o.applies_exactly_to(m)) {
            Some(exact) => Some(exact),
            None => by_key.get(&m.entity_key()).copied().flatten(),
        };
        if let Some(o) = chosen {
            o.apply_to(m);
        }
    }
}

/// Put back the tags recorded for matches at identical spans
///
/// Meant for re-running detection over unchanged text and rules, where every
/// match has a recorded counterpart.
pub fn reattach_tags(matches: &mut [Match], previous: &[ToggleOverride]) {
    for m in matches.iter_mut() {
        if !m.is_effectively_redacted() {
            m.replacement_tag = None;
            continue;
        }
        if let Some(tag) = previous
            .iter()
            .rev()
            .find(|o| o.applies_exactly_to(m))
            .and_then(|o| o.replacement_tag.clone())
        {
            m.replacement_tag = Some(tag);
        }
    }
}

/// Update the tag of one match after its flags changed
///
/// Every other match keeps its tag. A match that stops being redacted loses
/// its tag. One that becomes redacted again reuses the tag its entity already
/// holds, or takes the lowest number not held by any match in its category.
pub fn retag_match(matches: &mut [Match], index: usize) {
    let Some(target) = matches.get(index) else {
        return;
    };
    let (key, category) = (target.entity_key(), target.category);
    if !target.is_effectively_redacted() {
        matches[index].replacement_tag = None;
        return;
    }

    let shared = matches
        .iter()
        .enumerate()
        .filter(|(i, m)| *i != index && m.is_effectively_redacted() && m.entity_key() == key)
        .find_map(|(_, m)| m.replacement_tag.clone());

    let tag = shared.unwrap_or_else(|| {
        let held: HashSet<&str> = matches
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .filter_map(|(_, m)| m.replacement_tag.as_deref())
            .collect();
        let mut n = 1;
        while held.contains(category.tag(n).as_str()) {
            n += 1;
        }
        category.tag(n)
    });
    matches[index].replacement_tag = Some(tag);
}

/// Assign replacement tags in list order
///
/// Counters are per category and start at 1 on every call. Matches sharing an
/// entity key share a tag; matches that are not effectively redacted get none.
pub fn assign_tags(matches: &mut [Match]) {
    let mut counters: HashMap<Category, usize> = HashMap::new();
    let mut tags: HashMap<EntityKey, String> = HashMap::new();

    for m in matches.iter_mut() {
        m.replacement_tag = None;
        if !m.is_effectively_redacted() {
            continue;
        }

        let category = m.category;
        let tag = tags
            .entry(m.entity_key())
            .or_insert_with(|| {
                let counter = counters.entry(category).or_insert(0);
                *counter += 1;
                category.tag(*counter)
            })
            .clone();
        m.replacement_tag = Some(tag);
    }
}

static DEFAULT_ENGINE: Lazy<RedactionEngine> = Lazy::new(RedactionEngine::default);

/// Detect with the default engine configuration
pub fn detect(
    text: &str,
    user_rules: &[UserRule],
    custom_patterns: &[CustomPattern],
    whitelist: &[WhitelistEntry],
) -> Vec<Match> {
    DEFAULT_ENGINE.run(
        text,
        user_rules,
        custom_patterns,
        whitelist,
        &[],
        OverrideScope::None,
    )
}
