// Copyright (c) 2025 - Cowboy AI, Inc.
//! Routing table from push frame kinds to store actions
//!
//! The table is fixed and explicit: every routed kind maps to exactly one
//! action, decoded from the frame's `data`. Kinds not in the table are
//! logged and dropped by the caller.
//!
//! | kind | data | action |
//! |---|---|---|
//! | `skyportal/REFRESH_SOURCE` | `{obj_id}` | `RefreshSource` |
//! | `source_updated` | source document | `SourceUpdated` |
//! | `comment_added` | `{obj_id, comment}` | `CommentAdded` |
//! | `skyportal/REFRESH_GROUP` | `{group_id}` | `RefreshGroup` |
//! | `skyportal/REFRESH_PROFILE` | none | `RefreshProfile` |
//! | `baselayer/SHOW_NOTIFICATION` | `{note, type}` | `ShowNotification` |

use serde::Deserialize;
use serde_json::Value;

use super::frame::Frame;
use crate::action::Action;
use crate::model::{Comment, GroupId, NotificationLevel, ObjId, Source};

type Decoder = fn(&Value) -> Result<Action, serde_json::Error>;

/// Outcome of routing one domain frame
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    /// The frame maps to this action
    Action(Action),
    /// No route for this kind
    Unknown,
    /// The kind is routed but its data did not decode
    Malformed(String),
}

#[derive(Deserialize)]
struct RefreshSourceData {
    #[serde(alias = "source_id")]
    obj_id: ObjId,
}

#[derive(Deserialize)]
struct CommentAddedData {
    obj_id: ObjId,
    comment: Comment,
}

#[derive(Deserialize)]
struct RefreshGroupData {
    group_id: GroupId,
}

#[derive(Deserialize)]
struct NotificationData {
    note: String,
    #[serde(rename = "type", default = "default_level")]
    level: NotificationLevel,
}

fn default_level() -> NotificationLevel {
    NotificationLevel::Info
}

fn refresh_source(data: &Value) -> Result<Action, serde_json::Error> {
    let RefreshSourceData { obj_id } = RefreshSourceData::deserialize(data)?;
    Ok(Action::RefreshSource { obj_id })
}

fn source_updated(data: &Value) -> Result<Action, serde_json::Error> {
    let source = Source::deserialize(data)?;
    Ok(Action::SourceUpdated { source })
}

fn comment_added(data: &Value) -> Result<Action, serde_json::Error> {
    let CommentAddedData { obj_id, comment } = CommentAddedData::deserialize(data)?;
    Ok(Action::CommentAdded { obj_id, comment })
}

fn refresh_group(data: &Value) -> Result<Action, serde_json::Error> {
    let RefreshGroupData { group_id } = RefreshGroupData::deserialize(data)?;
    Ok(Action::RefreshGroup { group_id })
}

fn refresh_profile(_: &Value) -> Result<Action, serde_json::Error> {
    Ok(Action::RefreshProfile)
}

fn show_notification(data: &Value) -> Result<Action, serde_json::Error> {
    let NotificationData { note, level } = NotificationData::deserialize(data)?;
    Ok(Action::ShowNotification { note, level })
}

/// Every routed kind and its decoder
pub const ROUTES: &[(&str, Decoder)] = &[
    ("skyportal/REFRESH_SOURCE", refresh_source),
    ("source_updated", source_updated),
    ("comment_added", comment_added),
    ("skyportal/REFRESH_GROUP", refresh_group),
    ("skyportal/REFRESH_PROFILE", refresh_profile),
    ("baselayer/SHOW_NOTIFICATION", show_notification),
];

/// Map a domain frame to zero or one action
pub fn route(frame: &Frame) -> Routed {
    let Some((_, decode)) = ROUTES.iter().find(|(kind, _)| *kind == frame.kind) else {
        return Routed::Unknown;
    };
    match decode(&frame.data) {
        Ok(action) => Routed::Action(action),
        Err(e) => Routed::Malformed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test]
    fn test_source_updated_carries_the_document() {
        let frame = Frame::new(
            "source_updated",
            json!({ "id": "SN2020x", "ra": 10.5, "dec": -3.25, "redshift": 0.03 }),
        );
        let Routed::Action(Action::SourceUpdated { source }) = route(&frame) else {
            panic!("expected SourceUpdated");
        };
        assert_eq!(source.id, ObjId::new("SN2020x"));
        assert_eq!(source.redshift, Some(0.03));
    }

    #[test_case(json!({ "obj_id": "A" }); "current field name")]
    #[test_case(json!({ "source_id": "A" }); "legacy field name")]
    fn test_refresh_source(data: Value) {
        assert_eq!(
            route(&Frame::new("skyportal/REFRESH_SOURCE", data)),
            Routed::Action(Action::RefreshSource { obj_id: ObjId::new("A") })
        );
    }

    #[test]
    fn test_notification_type_field() {
        let frame = Frame::new(
            "baselayer/SHOW_NOTIFICATION",
            json!({ "note": "Saved", "type": "warning" }),
        );
        assert_eq!(
            route(&frame),
            Routed::Action(Action::ShowNotification {
                note: "Saved".into(),
                level: NotificationLevel::Warning
            })
        );
    }

    #[test]
    fn test_refresh_profile_ignores_data() {
        assert_eq!(
            route(&Frame::new("skyportal/REFRESH_PROFILE", Value::Null)),
            Routed::Action(Action::RefreshProfile)
        );
    }

    #[test]
    fn test_unknown_kind() {
        assert_eq!(route(&Frame::new("skyportal/FETCH_NOTHING", Value::Null)), Routed::Unknown);
    }

    #[test]
    fn test_malformed_data() {
        let routed = route(&Frame::new("skyportal/REFRESH_GROUP", json!({ "group": 1 })));
        assert!(matches!(routed, Routed::Malformed(_)));
    }
}
