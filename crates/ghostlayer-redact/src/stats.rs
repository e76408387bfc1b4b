//! Summary counts over a match list

use ghostlayer_core::{Category, EntityKey, Match};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Per-category counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub total: usize,
    pub redacted: usize,
}

/// Counts for one detection run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RedactionStats {
    pub total: usize,

    /// Effectively redacted matches
    pub redacted: usize,

    /// Matches left in clear text, excluded ones included
    pub kept: usize,

    pub excluded: usize,

    /// Distinct entity keys among redacted matches
    pub entities: usize,

    pub by_category: BTreeMap<Category, CategoryCount>,
}

impl RedactionStats {
    pub fn from_matches(matches: &[Match]) -> Self {
        let mut stats = RedactionStats::default();
        let mut entities: HashSet<EntityKey> = HashSet::new();

        for m in matches {
            stats.total += 1;
            let count = stats.by_category.entry(m.category).or_default();
            count.total += 1;

            if m.excluded {
                stats.excluded += 1;
            }

            if m.is_effectively_redacted() {
                stats.redacted += 1;
                count.redacted += 1;
                entities.insert(m.entity_key());
            } else {
                stats.kept += 1;
            }
        }

        stats.entities = entities.len();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_from_matches() {
        let mut excluded = Match::new("c@d.com", 20, 27, Category::Email, true);
        excluded.excluded = true;

        let matches = vec![
            Match::new("a@b.com", 0, 7, Category::Email, true),
            Match::new("A@B.com", 10, 17, Category::Email, true),
            excluded,
            Match::new("555-123-4567", 30, 42, Category::Phone, false),
        ];

        let stats = RedactionStats::from_matches(&matches);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.redacted, 2);
        assert_eq!(stats.kept, 2);
        assert_eq!(stats.excluded, 1);
        assert_eq!(stats.entities, 1);
        assert_eq!(
            stats.by_category[&Category::Email],
            CategoryCount {
                total: 3,
                redacted: 2
            }
        );
        assert_eq!(stats.by_category[&Category::Phone].redacted, 0);
    }

    #[test]
    fn test_empty_stats() {
        assert_eq!(RedactionStats::from_matches(&[]), RedactionStats::default());
    }

    #[test]
    fn test_stats_serialize_with_wire_names() {
        let stats = RedactionStats::from_matches(&[Match::new("x", 0, 1, Category::KzIin, true)]);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["by_category"]["KZ_IIN"]["total"], 1);
    }
}
