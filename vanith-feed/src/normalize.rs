//! Tolerant parsing of the backend document
//!
//! Optional containers the backend sometimes omits are repaired in place
//! (missing or `null` lists become empty) before the strict typed parse.
//! Anything else that does not fit the model is a shape failure.

use crate::error::FetchError;
use crate::models::Snapshot;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

/// Top-level lists that default to empty
const OPTIONAL_LISTS: &[&str] = &["activities", "channels", "roles"];

/// Staff partitions, each defaulting to empty
const STAFF_PARTITIONS: &[&str] = &["owner", "moderators", "bots", "members"];

/// Per-entry fields that read as empty/false/zero when `null`
const ACTIVITY_DEFAULTED: &[&str] = &[
    "avatar",
    "mentions",
    "hasMentions",
    "attachments",
    "hasAttachments",
    "isBot",
    "isLogChannel",
];
const MENTION_DEFAULTED: &[&str] = &["avatar"];
const STAFF_DEFAULTED: &[&str] = &["avatar", "isServerOwner"];
const PERMISSION_FLAGS: &[&str] = &["admin", "kick", "ban"];

/// A gap filled while normalizing a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repair {
    /// Field absent, filled with an empty value
    Missing(String),
    /// Field was `null`, replaced with an empty value
    Null(String),
    /// `timestamp` absent, set to the fetch instant
    Timestamp,
    /// Entry dropped because its id was already listed
    DuplicateId { field: String, id: String },
}

impl fmt::Display for Repair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Repair::Missing(path) => write!(f, "{} missing, using empty", path),
            Repair::Null(path) => write!(f, "{} null, using empty", path),
            Repair::Timestamp => write!(f, "timestamp missing, using fetch time"),
            Repair::DuplicateId { field, id } => write!(f, "{} lists id {} twice, dropped repeat", field, id),
        }
    }
}

/// Validate and repair a decoded payload into a [`Snapshot`]
pub fn normalize(payload: Value, fetched_at: DateTime<Utc>) -> Result<(Snapshot, Vec<Repair>), FetchError> {
    let Value::Object(mut root) = payload else {
        return Err(FetchError::Shape("payload is not a JSON object".to_string()));
    };
    let mut repairs = Vec::new();

    for field in OPTIONAL_LISTS {
        fill_gap(&mut root, field, field, || Value::Array(Vec::new()), &mut repairs);
    }

    fill_gap(&mut root, "staff", "staff", || Value::Object(Map::new()), &mut repairs);
    match root.get_mut("staff") {
        Some(Value::Object(staff)) => {
            for partition in STAFF_PARTITIONS {
                let path = format!("staff.{}", partition);
                fill_gap(staff, partition, &path, || Value::Array(Vec::new()), &mut repairs);
            }
        }
        _ => return Err(FetchError::Shape("staff is not an object".to_string())),
    }

    null_entry_fields(&mut root, &mut repairs);

    if matches!(root.get("timestamp"), None | Some(Value::Null)) {
        root.insert("timestamp".to_string(), Value::String(fetched_at.to_rfc3339()));
        repairs.push(Repair::Timestamp);
    }

    let mut snapshot: Snapshot = serde_json::from_value(Value::Object(root))
        .map_err(|e| FetchError::Shape(e.to_string()))?;

    dedupe_by_id(&mut snapshot.channels, |c| &c.id, "channels", &mut repairs);
    dedupe_by_id(&mut snapshot.roles, |r| &r.id, "roles", &mut repairs);
    dedupe_by_id(&mut snapshot.staff.owner, |m| &m.id, "staff.owner", &mut repairs);
    dedupe_by_id(&mut snapshot.staff.moderators, |m| &m.id, "staff.moderators", &mut repairs);
    dedupe_by_id(&mut snapshot.staff.bots, |m| &m.id, "staff.bots", &mut repairs);
    dedupe_by_id(&mut snapshot.staff.members, |m| &m.id, "staff.members", &mut repairs);

    for activity in &mut snapshot.activities {
        activity.sync_flags();
    }

    for repair in &repairs {
        warn!(%repair, "repaired backend payload");
    }

    Ok((snapshot, repairs))
}

fn fill_gap(
    map: &mut Map<String, Value>,
    key: &str,
    path: &str,
    empty: impl Fn() -> Value,
    repairs: &mut Vec<Repair>,
) {
    match map.get(key) {
        None => {
            map.insert(key.to_string(), empty());
            repairs.push(Repair::Missing(path.to_string()));
        }
        Some(Value::Null) => {
            map.insert(key.to_string(), empty());
            repairs.push(Repair::Null(path.to_string()));
        }
        Some(_) => {}
    }
}

/// Drop `null` per-entry fields so the typed parse falls back to defaults
fn null_entry_fields(root: &mut Map<String, Value>, repairs: &mut Vec<Repair>) {
    if let Some(Value::Array(activities)) = root.get_mut("activities") {
        for (i, activity) in activities.iter_mut().enumerate() {
            let Value::Object(entry) = activity else { continue };
            let path = format!("activities[{}]", i);
            drop_nulls(entry, &path, ACTIVITY_DEFAULTED, repairs);

            if let Some(Value::Array(mentions)) = entry.get_mut("mentions") {
                for (j, mention) in mentions.iter_mut().enumerate() {
                    if let Value::Object(mention) = mention {
                        let path = format!("{}.mentions[{}]", path, j);
                        drop_nulls(mention, &path, MENTION_DEFAULTED, repairs);
                    }
                }
            }
        }
    }

    let Some(Value::Object(staff)) = root.get_mut("staff") else {
        return;
    };
    for partition in STAFF_PARTITIONS {
        let Some(Value::Array(members)) = staff.get_mut(*partition) else {
            continue;
        };
        for (i, member) in members.iter_mut().enumerate() {
            let Value::Object(entry) = member else { continue };
            let path = format!("staff.{}[{}]", partition, i);
            drop_nulls(entry, &path, STAFF_DEFAULTED, repairs);

            if let Some(Value::Object(permissions)) = entry.get_mut("permissions") {
                let path = format!("{}.permissions", path);
                drop_nulls(permissions, &path, PERMISSION_FLAGS, repairs);
            }
        }
    }
}

fn drop_nulls(entry: &mut Map<String, Value>, path: &str, fields: &[&str], repairs: &mut Vec<Repair>) {
    for field in fields {
        if matches!(entry.get(*field), Some(Value::Null)) {
            entry.remove(*field);
            repairs.push(Repair::Null(format!("{}.{}", path, field)));
        }
    }
}

fn dedupe_by_id<T>(items: &mut Vec<T>, id_of: impl Fn(&T) -> &String, field: &str, repairs: &mut Vec<Repair>) {
    let mut seen = HashSet::new();
    items.retain(|item| {
        let id = id_of(item);
        if seen.insert(id.clone()) {
            true
        } else {
            repairs.push(Repair::DuplicateId {
                field: field.to_string(),
                id: id.clone(),
            });
            false
        }
    });
}
