//! Tests for the session controller

use super::*;
use crate::store::MemoryRuleStore;
use ghostlayer_redact::{EngineConfig, ToggleReconciliation};

fn session() -> Session {
    Session::new(SessionConfig::default())
}

fn texts(session: &Session) -> Vec<&str> {
    session.matches().iter().map(|m| m.text.as_str()).collect()
}

#[test]
fn test_set_text_detects_and_renders() {
    let mut session = session();
    session.set_text("Email: a@b.com");

    assert_eq!(texts(&session), vec!["a@b.com"]);
    assert_eq!(session.redacted_text(), "Email: [EMAIL_1]");
    assert!(session.can_undo());
}

#[test]
fn test_add_user_rule_redacts_every_mention() {
    let mut session = session();
    session.set_text("John Smith called. Later John Smith wrote back.");

    let id = session.add_user_rule("  John Smith ", Category::UserMemory);
    assert!(id.is_some());
    assert_eq!(session.rules().user_rules[0].text, "John Smith");
    assert_eq!(session.matches().len(), 2);
    assert_eq!(
        session.redacted_text(),
        "[MEMORY_1] called. Later [MEMORY_1] wrote back."
    );

    let notification = session.notification().unwrap();
    assert_eq!(notification.message, "Added to Memory");
    assert_eq!(notification.kind, NotificationKind::Success);
}

#[test]
fn test_duplicate_and_blank_rules_are_ignored() {
    let mut session = session();
    session.add_user_rule("John Smith", Category::UserMemory).unwrap();
    session.dismiss_notification();

    assert!(session.add_user_rule("John Smith ", Category::UserMemory).is_none());
    assert!(session.add_user_rule("   ", Category::UserMemory).is_none());
    assert_eq!(session.rules().user_rules.len(), 1);
    assert!(session.notification().is_none());

    // Same phrase under another category is a distinct rule
    assert!(session.add_user_rule("John Smith", Category::PersonName).is_some());
    assert_eq!(session.rules().user_rules.len(), 2);
}

#[test]
fn test_user_rule_lifecycle() {
    let mut session = session();
    session.set_text("Ask Jane Roe about it");
    let id = session.add_user_rule("Jane Roe", Category::UserMemory).unwrap();
    assert_eq!(session.matches().len(), 1);

    session.update_user_rule_category(&id, Category::PersonName).unwrap();
    assert_eq!(session.matches()[0].category, Category::PersonName);
    assert_eq!(session.redacted_text(), "Ask [PERSON_NAME_1] about it");

    session.toggle_user_rule(&id).unwrap();
    assert!(!session.rules().user_rules[0].enabled);
    assert!(session.matches().is_empty());

    let removed = session.remove_user_rule(&id).unwrap();
    assert_eq!(removed.text, "Jane Roe");
    assert!(session.rules().user_rules.is_empty());
}

#[test]
fn test_unknown_ids_are_not_found() {
    let mut session = session();
    session.set_text("Email: a@b.com");
    let before = session.history.past_len();

    assert!(matches!(session.toggle_user_rule("missing"), Err(Error::NotFound(_))));
    assert!(matches!(session.remove_custom_pattern("missing"), Err(Error::NotFound(_))));
    assert!(matches!(session.toggle_match("missing"), Err(Error::NotFound(_))));
    assert_eq!(session.history.past_len(), before);
}

#[test]
fn test_undo_redo_rules_and_text() {
    let mut session = session();
    session.set_text("John Smith, a@b.com");
    session.add_user_rule("John Smith", Category::UserMemory).unwrap();
    assert_eq!(session.matches().len(), 2);

    assert!(session.undo());
    assert!(session.rules().user_rules.is_empty());
    assert_eq!(texts(&session), vec!["a@b.com"]);
    assert_eq!(session.notification().unwrap().message, "Undo");

    assert!(session.undo());
    assert_eq!(session.text(), "");
    assert!(session.matches().is_empty());
    assert!(!session.undo());

    assert!(session.redo());
    assert!(session.redo());
    assert_eq!(session.rules().user_rules.len(), 1);
    assert_eq!(session.matches().len(), 2);
    assert_eq!(session.notification().unwrap().message, "Redo");
    assert!(!session.redo());
}

#[test]
fn test_new_action_clears_redo() {
    let mut session = session();
    session.set_text("a@b.com");
    session.set_text("c@d.com");
    session.undo();
    assert!(session.can_redo());

    session.set_text("e@f.com");
    assert!(!session.can_redo());
}

#[test]
fn test_toggle_match_undo_is_exact() {
    let mut session = session();
    session.set_text("a@b.com c@d.com");
    let id = session.matches()[0].id.clone();

    session.toggle_match(&id).unwrap();
    assert!(!session.matches()[0].is_redacted);
    assert_eq!(session.redacted_text(), "a@b.com [EMAIL_2]");

    session.undo();
    assert!(session.matches().iter().all(|m| m.is_redacted));
    assert_eq!(session.redacted_text(), "[EMAIL_1] [EMAIL_2]");

    session.redo();
    assert!(!session.matches()[0].is_redacted);
    assert!(session.matches()[1].is_redacted);
    assert_eq!(session.redacted_text(), "a@b.com [EMAIL_2]");
}

#[test]
fn test_toggle_keeps_other_tags_stable() {
    let mut session = session();
    session.set_text("a@x.com and b@y.com");
    assert_eq!(session.redacted_text(), "[EMAIL_1] and [EMAIL_2]");
    let first = session.matches()[0].id.clone();

    session.toggle_match(&first).unwrap();
    assert_eq!(session.redacted_text(), "a@x.com and [EMAIL_2]");
    assert_eq!(session.matches()[0].replacement_tag, None);

    // A transcript produced before the toggle must not resolve to the other entity
    let restored = session.restore_text("Reply sent to [EMAIL_1] only");
    assert!(!restored.contains("b@y.com"));
    assert_eq!(session.restore_text("Forward [EMAIL_2]"), "Forward b@y.com");

    // Re-redacting takes the free number back
    session.toggle_match(&first).unwrap();
    assert_eq!(session.redacted_text(), "[EMAIL_1] and [EMAIL_2]");
    assert_eq!(session.restore_text("[EMAIL_1]"), "a@x.com");
}

#[test]
fn test_reredacted_match_reuses_entity_tag() {
    let mut session = session();
    session.set_text("a@x.com, b@y.com, A@X.com");
    assert_eq!(session.redacted_text(), "[EMAIL_1], [EMAIL_2], [EMAIL_1]");
    let last = session.matches()[2].id.clone();

    session.toggle_match(&last).unwrap();
    assert_eq!(session.redacted_text(), "[EMAIL_1], [EMAIL_2], A@X.com");

    session.toggle_match(&last).unwrap();
    assert_eq!(session.redacted_text(), "[EMAIL_1], [EMAIL_2], [EMAIL_1]");
}

#[test]
fn test_exclude_keeps_other_tags_stable() {
    let mut session = session();
    session.set_text("a@b.com c@d.com e@f.com");
    let id = session.matches()[0].id.clone();

    session.exclude_match(&id).unwrap();
    assert_eq!(session.redacted_text(), "a@b.com [EMAIL_2] [EMAIL_3]");
    assert_eq!(session.restore_text("[EMAIL_3]"), "e@f.com");

    session.restore_excluded_match(&id).unwrap();
    assert_eq!(session.redacted_text(), "[EMAIL_1] [EMAIL_2] [EMAIL_3]");
}

#[test]
fn test_exclude_and_restore_match() {
    let mut session = session();
    session.set_text("a@b.com c@d.com");
    let id = session.matches()[1].id.clone();

    session.exclude_match(&id).unwrap();
    let excluded = &session.matches()[1];
    assert!(excluded.excluded);
    assert!(excluded.is_redacted);
    assert!(excluded.excluded_at.is_some());
    assert!(excluded.replacement_tag.is_none());

    let stats = session.stats();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.excluded, 1);
    assert_eq!(stats.redacted, 1);

    session.restore_excluded_match(&id).unwrap();
    assert!(!session.matches()[1].excluded);
    assert!(session.matches()[1].excluded_at.is_none());
    assert_eq!(session.redacted_text(), "[EMAIL_1] [EMAIL_2]");
}

#[test]
fn test_reset_reconciliation_drops_toggles_on_edit() {
    let mut session = session();
    session.set_text("a@b.com");
    let id = session.matches()[0].id.clone();
    session.toggle_match(&id).unwrap();

    session.set_text("a@b.com again");
    assert!(session.matches()[0].is_redacted);
}

#[test]
fn test_entity_key_reconciliation_keeps_toggles_on_edit() {
    let config = SessionConfig {
        engine: EngineConfig {
            toggle_reconciliation: ToggleReconciliation::EntityKey,
            ..EngineConfig::default()
        },
        ..SessionConfig::default()
    };
    let mut session = Session::new(config);
    session.set_text("a@b.com");
    let id = session.matches()[0].id.clone();
    session.toggle_match(&id).unwrap();

    session.set_text("> a@b.com and c@d.com");
    assert!(!session.matches()[0].is_redacted);
    assert!(session.matches()[1].is_redacted);
    assert_eq!(session.redacted_text(), "> a@b.com and [EMAIL_1]");
}

#[test]
fn test_entity_key_reconciliation_leaves_untouched_siblings_redacted() {
    let config = SessionConfig {
        engine: EngineConfig {
            toggle_reconciliation: ToggleReconciliation::EntityKey,
            ..EngineConfig::default()
        },
        ..SessionConfig::default()
    };
    let mut session = Session::new(config);
    session.set_text("first a@b.com then a@b.com again");
    let id = session.matches()[0].id.clone();
    session.toggle_match(&id).unwrap();
    assert_eq!(session.redacted_text(), "first a@b.com then [EMAIL_1] again");

    assert!(session.add_to_whitelist("unrelated phrase"));
    assert!(!session.matches()[0].is_redacted);
    assert!(session.matches()[1].is_redacted);
    assert_eq!(session.redacted_text(), "first a@b.com then [EMAIL_1] again");
}

#[test]
fn test_custom_pattern_lifecycle() {
    let mut session = session();
    session.set_text("Ticket TCK-1042 opened");

    let id = session
        .add_custom_pattern("ticket", r"TCK-\d+", Category::Custom)
        .unwrap();
    assert!(session.matches().iter().any(|m| m.text == "TCK-1042"));

    session.toggle_custom_pattern(&id).unwrap();
    assert!(!session.rules().custom_patterns[0].active);
    assert!(session.matches().iter().all(|m| m.text != "TCK-1042"));

    let removed = session.remove_custom_pattern(&id).unwrap();
    assert_eq!(removed.name, "ticket");
    assert!(session.rules().custom_patterns.is_empty());
}

#[test]
fn test_unsafe_custom_pattern_is_rejected() {
    let mut session = session();
    session.set_text("aaaa");
    let before = session.history.past_len();

    let err = session
        .add_custom_pattern("bad", "(a+)+", Category::Custom)
        .unwrap_err();
    assert!(err.is_pattern_rejection());
    assert!(session.rules().custom_patterns.is_empty());
    assert_eq!(session.history.past_len(), before);
    assert_eq!(session.notification().unwrap().kind, NotificationKind::Error);

    let err = session.add_custom_pattern("broken", "(", Category::Custom).unwrap_err();
    assert!(matches!(err, Error::InvalidPattern { .. }));
}

#[test]
fn test_whitelist_phrase_and_category() {
    let mut session = session();
    session.set_text("Write to support@company.com or a@b.com");
    assert_eq!(session.matches().len(), 2);

    assert!(session.add_to_whitelist(" support@company.com "));
    assert_eq!(texts(&session), vec!["a@b.com"]);
    assert_eq!(session.notification().unwrap().message, "Added to Whitelist");

    assert!(!session.add_to_whitelist("support@company.com"));
    assert!(!session.add_to_whitelist("  "));

    assert!(session.add_to_whitelist(Category::Email));
    assert!(session.matches().is_empty());

    assert!(session.remove_from_whitelist(&WhitelistEntry::Category(Category::Email)));
    assert!(!session.remove_from_whitelist(&WhitelistEntry::Category(Category::Email)));
    assert_eq!(texts(&session), vec!["a@b.com"]);
}

#[test]
fn test_restore_text_keeps_output() {
    let mut session = session();
    session.set_text("Email: a@b.com");
    assert!(session.restored_output().is_none());

    let restored = session.restore_text("Reply sent to [EMAIL_1], not [EMAIL_9].");
    assert_eq!(restored, "Reply sent to a@b.com, not [EMAIL_9].");
    assert_eq!(session.restored_output(), Some(restored.as_str()));
}

#[test]
fn test_clear_sensitive_data_keeps_rules() {
    let mut session = session();
    session.set_text("John Smith, a@b.com");
    session.add_user_rule("John Smith", Category::UserMemory).unwrap();
    session.restore_text("[EMAIL_1]");

    session.clear_sensitive_data();
    assert_eq!(session.text(), "");
    assert!(session.matches().is_empty());
    assert!(session.restored_output().is_none());
    assert!(session.notification().is_none());
    assert!(!session.can_undo());
    assert!(!session.can_redo());
    assert_eq!(session.rules().user_rules.len(), 1);
}

#[test]
fn test_history_limit() {
    let config = SessionConfig {
        history_limit: 2,
        ..SessionConfig::default()
    };
    let mut session = Session::new(config);
    for text in ["one", "two", "three", "four"] {
        session.set_text(text);
    }

    assert!(session.undo());
    assert!(session.undo());
    assert!(!session.undo());
    assert_eq!(session.text(), "two");
}

#[tokio::test]
async fn test_load_and_persist() {
    let store = MemoryRuleStore::new();
    let mut session = Session::load(SessionConfig::default(), &store).await.unwrap();
    assert!(session.rules().is_empty());

    session.add_user_rule("John Smith", Category::UserMemory).unwrap();
    session.add_to_whitelist(Category::Date);
    session.persist(&store).await.unwrap();

    let reopened = Session::load(SessionConfig::default(), &store).await.unwrap();
    assert_eq!(reopened.rules(), session.rules());
    assert!(reopened.text().is_empty());
    assert!(!reopened.can_undo());
}
