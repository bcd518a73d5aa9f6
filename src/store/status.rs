// Copyright (c) 2025 - Cowboy AI, Inc.
//! Session status branches: push connection mirror and notifications

use std::collections::VecDeque;

use super::branch::Branch;
use crate::action::Action;
use crate::model::NotificationLevel;
use crate::state_machine::ConnectionState;

/// Maximum number of notifications retained
pub const MAX_NOTIFICATIONS: usize = 20;

/// Read-only mirror of the connection manager's state
///
/// Only the connection manager dispatches `ConnectionChanged`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionBranch {
    /// Current state
    pub state: ConnectionState,
    /// Consecutive failed attempts
    pub attempts: u32,
    /// Last error reported by the manager
    pub last_error: Option<String>,
}

impl Branch for ConnectionBranch {
    const NAME: &'static str = "connection";

    fn reduce(&self, action: &Action) -> Option<Self> {
        match action {
            Action::ConnectionChanged {
                state,
                attempts,
                error,
            } => Some(Self {
                state: *state,
                attempts: *attempts,
                last_error: error.clone(),
            }),
            _ => None,
        }
    }
}

/// A notification shown to the user
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Locally assigned identifier
    pub id: u64,
    /// Message
    pub note: String,
    /// Severity
    pub level: NotificationLevel,
}

/// Notifications, oldest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationsBranch {
    /// Visible notifications
    pub items: VecDeque<Notification>,
    next_id: u64,
}

impl Branch for NotificationsBranch {
    const NAME: &'static str = "notifications";

    fn reduce(&self, action: &Action) -> Option<Self> {
        match action {
            Action::ShowNotification { note, level } => {
                let mut next = self.clone();
                next.items.push_back(Notification {
                    id: self.next_id,
                    note: note.clone(),
                    level: *level,
                });
                next.next_id += 1;
                while next.items.len() > MAX_NOTIFICATIONS {
                    next.items.pop_front();
                }
                Some(next)
            }
            Action::DismissNotification { id } => {
                if !self.items.iter().any(|n| n.id == *id) {
                    return None;
                }
                let mut next = self.clone();
                next.items.retain(|n| n.id != *id);
                Some(next)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(branch: &NotificationsBranch, note: &str) -> NotificationsBranch {
        branch
            .reduce(&Action::ShowNotification {
                note: note.into(),
                level: NotificationLevel::Info,
            })
            .unwrap()
    }

    #[test]
    fn test_notifications_are_bounded() {
        let mut branch = NotificationsBranch::default();
        for i in 0..(MAX_NOTIFICATIONS + 5) {
            branch = show(&branch, &format!("note {i}"));
        }
        assert_eq!(branch.items.len(), MAX_NOTIFICATIONS);
        assert_eq!(branch.items.front().unwrap().note, "note 5");
    }

    #[test]
    fn test_dismiss() {
        let branch = show(&show(&NotificationsBranch::default(), "a"), "b");
        let dismissed = branch
            .reduce(&Action::DismissNotification { id: 0 })
            .unwrap();
        assert_eq!(dismissed.items.len(), 1);
        assert!(dismissed
            .reduce(&Action::DismissNotification { id: 0 })
            .is_none());
    }

    #[test]
    fn test_connection_mirror() {
        let branch = ConnectionBranch::default()
            .reduce(&Action::ConnectionChanged {
                state: ConnectionState::Reconnecting,
                attempts: 2,
                error: Some("channel closed".into()),
            })
            .unwrap();
        assert_eq!(branch.state, ConnectionState::Reconnecting);
        assert_eq!(branch.attempts, 2);
    }
}
