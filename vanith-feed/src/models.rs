//! Snapshot data model (matches the backend's `/api/all` document)
//!
//! Wire names are camelCase. Optional per-entry fields default when the
//! backend omits them; container-level gaps are repaired in `normalize`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// `null` reads as the type's default, same as an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Full state published once per poll cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub stats: ServerStats,
    pub activities: Vec<Activity>,
    pub channels: Vec<Channel>,
    pub roles: Vec<Role>,
    pub staff: StaffRoster,
    /// ISO 8601 instant the backend produced this document
    pub timestamp: String,
}

impl Snapshot {
    /// Channels ordered by their `position` sort key
    pub fn channels_by_position(&self) -> Vec<&Channel> {
        let mut channels: Vec<&Channel> = self.channels.iter().collect();
        channels.sort_by_key(|c| c.position);
        channels
    }

    /// Same content, ignoring when it was produced
    pub fn same_content(&self, other: &Snapshot) -> bool {
        self.stats == other.stats
            && self.activities == other.activities
            && self.channels == other.channels
            && self.roles == other.roles
            && self.staff == other.staff
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStats {
    pub total_members: u64,
    pub online_members: u64,
    pub messages_today: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Join,
    Leave,
    Message,
    Log,
}

impl ActivityKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActivityKind::Join => "join",
            ActivityKind::Leave => "leave",
            ActivityKind::Message => "message",
            ActivityKind::Log => "log",
        }
    }
}

/// A single feed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub user: String,
    pub user_id: String,
    pub display_name: String,
    /// Human-readable description ("joined the server")
    pub action: String,
    /// ISO 8601
    pub time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub avatar: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub channel_name: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mentions: Vec<Mention>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_mentions: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachments: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_attachments: bool,
    #[serde(default)]
    pub author_role: Option<String>,
    #[serde(default)]
    pub author_role_color: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_bot: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_log_channel: bool,
}

impl Activity {
    /// Recompute the derived flags from `mentions` and `attachments`
    pub fn sync_flags(&mut self) {
        self.has_mentions = !self.mentions.is_empty();
        self.has_attachments = self.attachments > 0;
    }

    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.time)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub id: String,
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: String,
    pub name: String,
    /// Hex string, e.g. `#E67E22`
    pub color: String,
    pub member_count: u64,
}

/// Staff partitioned by rank; a member sits in exactly one list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffRoster {
    pub owner: Vec<StaffMember>,
    pub moderators: Vec<StaffMember>,
    pub bots: Vec<StaffMember>,
    pub members: Vec<StaffMember>,
}

impl StaffRoster {
    pub fn total(&self) -> usize {
        self.owner.len() + self.moderators.len() + self.bots.len() + self.members.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub id: String,
    pub username: String,
    pub display_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub avatar: String,
    pub role: String,
    pub role_color: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_server_owner: bool,
    #[serde(default)]
    pub permissions: Option<Permissions>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default, deserialize_with = "null_as_default")]
    pub admin: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub kick: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ban: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(id: &str, position: i64) -> Channel {
        Channel { id: id.into(), name: id.into(), position }
    }

    #[test]
    fn test_activity_wire_names() {
        let json = serde_json::json!({
            "type": "message",
            "user": "kite",
            "userId": "42",
            "displayName": "Kite",
            "action": "sent a message",
            "time": "2026-10-19T10:00:00Z",
            "isBot": true,
            "attachments": 2
        });
        let activity: Activity = serde_json::from_value(json).unwrap();
        assert_eq!(activity.kind, ActivityKind::Message);
        assert_eq!(activity.user_id, "42");
        assert!(activity.is_bot);
        assert!(activity.avatar.is_empty());
        assert!(activity.mentions.is_empty());
        assert!(!activity.has_attachments);
    }

    #[test]
    fn test_sync_flags() {
        let json = serde_json::json!({
            "type": "message", "user": "a", "userId": "1", "displayName": "A",
            "action": "x", "time": "2026-10-19T10:00:00Z",
            "mentions": [{"id": "2", "username": "b", "avatar": ""}],
            "hasMentions": false,
            "attachments": 0,
            "hasAttachments": true
        });
        let mut activity: Activity = serde_json::from_value(json).unwrap();
        activity.sync_flags();
        assert!(activity.has_mentions);
        assert!(!activity.has_attachments);
    }

    #[test]
    fn test_unknown_activity_kind_rejected() {
        let json = serde_json::json!({
            "type": "boost", "user": "a", "userId": "1", "displayName": "A",
            "action": "x", "time": "2026-10-19T10:00:00Z"
        });
        assert!(serde_json::from_value::<Activity>(json).is_err());
    }

    #[test]
    fn test_channels_by_position() {
        let snapshot = Snapshot {
            stats: ServerStats { total_members: 0, online_members: 0, messages_today: 0 },
            activities: vec![],
            channels: vec![channel("c", 2), channel("a", 0), channel("b", 1)],
            roles: vec![],
            staff: StaffRoster::default(),
            timestamp: String::new(),
        };
        let ids: Vec<&str> = snapshot.channels_by_position().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_occurred_at_parses_offsets() {
        let json = serde_json::json!({
            "type": "join", "user": "a", "userId": "1", "displayName": "A",
            "action": "joined", "time": "2026-10-19T12:00:00+02:00"
        });
        let activity: Activity = serde_json::from_value(json).unwrap();
        let at = activity.occurred_at().unwrap();
        assert_eq!(at.to_rfc3339(), "2026-10-19T10:00:00+00:00");
    }

    #[test]
    fn test_null_defaulted_fields() {
        let json = serde_json::json!({
            "type": "message", "user": "a", "userId": "1", "displayName": "A",
            "action": "x", "time": "2026-10-19T10:00:00Z",
            "avatar": null, "mentions": null, "hasMentions": null,
            "attachments": null, "hasAttachments": null, "isBot": null,
            "isLogChannel": null, "content": null
        });
        let activity: Activity = serde_json::from_value(json).unwrap();
        assert!(activity.avatar.is_empty());
        assert!(activity.mentions.is_empty());
        assert_eq!(activity.attachments, 0);
        assert!(!activity.is_bot && !activity.is_log_channel);
        assert!(activity.content.is_none());

        let json = serde_json::json!({
            "id": "1", "username": "a", "displayName": "A", "avatar": null,
            "role": "Owner", "roleColor": "#fff", "isServerOwner": null,
            "permissions": { "admin": null, "kick": true, "ban": null }
        });
        let member: StaffMember = serde_json::from_value(json).unwrap();
        assert!(member.avatar.is_empty());
        assert!(!member.is_server_owner);
        assert_eq!(
            member.permissions,
            Some(Permissions { admin: false, kick: true, ban: false })
        );
    }
}
