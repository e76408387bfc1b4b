//! GhostLayer Session
//!
//! Interactive layer on top of the redaction engine:
//! - Working text, rules and the current match list
//! - Linear undo/redo over text, rules and toggles
//! - Transient notifications
//! - Rule persistence behind a `RuleStore`

pub mod config;
pub mod history;
pub mod notification;
pub mod session;
pub mod store;

pub use config::SessionConfig;
pub use history::History;
pub use notification::{Notification, NotificationKind, NotificationSlot};
pub use session::{Session, Snapshot};
pub use store::{JsonFileRuleStore, MemoryRuleStore, RuleStore, StoredState, write_atomic};
