/*!
Payload builders for the `/api/all` document

Builds JSON the way the community backend emits it (camelCase keys),
with knobs to drop or overwrite any field for tolerance tests.
*/

use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};

/// Fluent builder for a full backend payload
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    payload: Value,
}

impl PayloadBuilder {
    /// Minimal valid payload: stats set, every list empty
    pub fn new() -> Self {
        Self {
            payload: json!({
                "stats": {
                    "totalMembers": 1200,
                    "onlineMembers": 340,
                    "messagesToday": 910
                },
                "activities": [],
                "channels": [],
                "roles": [],
                "staff": {
                    "owner": [],
                    "moderators": [],
                    "bots": [],
                    "members": []
                },
                "timestamp": Utc::now().to_rfc3339()
            }),
        }
    }

    pub fn stats(mut self, total: u64, online: u64, messages_today: u64) -> Self {
        self.payload["stats"] = json!({
            "totalMembers": total,
            "onlineMembers": online,
            "messagesToday": messages_today
        });
        self
    }

    pub fn activity(self, activity: Value) -> Self {
        self.push("activities", activity)
    }

    pub fn channel(self, id: &str, name: &str, position: i64) -> Self {
        self.push("channels", json!({ "id": id, "name": name, "position": position }))
    }

    pub fn role(self, id: &str, name: &str, color: &str, member_count: u64) -> Self {
        self.push(
            "roles",
            json!({ "id": id, "name": name, "color": color, "memberCount": member_count }),
        )
    }

    /// Add a member to `owner`, `moderators`, `bots` or `members`
    pub fn staff(self, partition: &str, member: Value) -> Self {
        self.push(&format!("staff.{}", partition), member)
    }

    pub fn timestamp(mut self, timestamp: &str) -> Self {
        self.payload["timestamp"] = Value::String(timestamp.to_string());
        self
    }

    /// Remove a field by dotted path, e.g. `staff.members`
    pub fn without(mut self, path: &str) -> Self {
        let (parent, key) = match path.rsplit_once('.') {
            Some((parent, key)) => (to_pointer(parent), key),
            None => (String::new(), path),
        };
        if let Some(Value::Object(map)) = self.payload.pointer_mut(&parent) {
            map.remove(key);
        }
        self
    }

    /// Overwrite a field by dotted path, creating parent objects as needed
    pub fn set(mut self, path: &str, value: Value) -> Self {
        let mut current = &mut self.payload;
        let mut parts = path.split('.').peekable();
        while let Some(part) = parts.next() {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            let Value::Object(map) = current else { break };
            if parts.peek().is_none() {
                map.insert(part.to_string(), value);
                break;
            }
            current = map
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        self
    }

    pub fn build(self) -> Value {
        self.payload
    }

    fn push(mut self, path: &str, entry: Value) -> Self {
        if let Some(Value::Array(list)) = self.payload.pointer_mut(&to_pointer(path)) {
            list.push(entry);
            return self;
        }
        self.set(path, Value::Array(vec![entry]))
    }
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn to_pointer(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    format!("/{}", path.replace('.', "/"))
}

/// A staff member entry
pub fn staff_member(id: &str, username: &str, display_name: &str, role: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "displayName": display_name,
        "avatar": format!("https://cdn.example.test/avatars/{}.png", id),
        "role": role,
        "roleColor": "#9B59B6"
    })
}

/// A join event `seconds_ago` in the past
pub fn join_activity(user: &str, seconds_ago: i64) -> Value {
    json!({
        "type": "join",
        "user": user,
        "userId": format!("{}-id", user),
        "displayName": user,
        "action": "joined the server",
        "time": (Utc::now() - Duration::seconds(seconds_ago)).to_rfc3339(),
        "avatar": format!("https://cdn.example.test/avatars/{}.png", user)
    })
}

/// A chat message event with optional mentions and attachment count
pub fn message_activity(user: &str, content: &str, mentions: Vec<Value>, attachments: u32) -> Value {
    json!({
        "type": "message",
        "user": user,
        "userId": format!("{}-id", user),
        "displayName": user,
        "action": "sent a message in #general",
        "time": Utc::now().to_rfc3339(),
        "avatar": format!("https://cdn.example.test/avatars/{}.png", user),
        "content": content,
        "channelName": "general",
        "channelId": "c-general",
        "mentions": mentions,
        "attachments": attachments,
        "authorRole": "Member",
        "authorRoleColor": "#A855F7"
    })
}

pub fn mention(id: &str, username: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "avatar": format!("https://cdn.example.test/avatars/{}.png", id)
    })
}

/// Populated payload resembling a live server
pub fn sample_payload() -> Value {
    PayloadBuilder::new()
        .stats(12_847, 3_456, 8_923)
        .activity(join_activity("nova", 45))
        .activity(message_activity("kite", "hello @ryze", vec![mention("u-ryze", "ryze")], 2))
        .channel("c-rules", "rules", 0)
        .channel("c-general", "general", 1)
        .role("r-mod", "Moderator", "#E67E22", 4)
        .staff("owner", staff_member("u-owner", "vanith", "Vanith", "Owner"))
        .staff("moderators", staff_member("u-ryze", "ryze", "Ryze", "Moderator"))
        .staff("bots", staff_member("u-bot", "helper", "Helper Bot", "Bot"))
        .staff("members", staff_member("u-kite", "kite", "Kite", "Member"))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_are_complete() {
        let payload = PayloadBuilder::new().build();
        assert_eq!(payload["stats"]["totalMembers"], 1200);
        assert!(payload["staff"]["members"].is_array());
        assert!(payload["timestamp"].is_string());
    }

    #[test]
    fn test_without_and_set() {
        let payload = PayloadBuilder::new()
            .without("staff.members")
            .set("extra.nested", json!(true))
            .build();
        assert!(payload["staff"].get("members").is_none());
        assert!(payload["staff"].get("owner").is_some());
        assert_eq!(payload["extra"]["nested"], true);
    }

    #[test]
    fn test_staff_push_recreates_missing_partition() {
        let payload = PayloadBuilder::new()
            .without("staff")
            .staff("bots", staff_member("b1", "bot", "Bot", "Bot"))
            .build();
        assert_eq!(payload["staff"]["bots"][0]["id"], "b1");
    }

    #[test]
    fn test_sample_payload_shape() {
        let payload = sample_payload();
        assert_eq!(payload["activities"].as_array().map(|a| a.len()), Some(2));
        assert_eq!(payload["activities"][1]["attachments"], 2);
        assert_eq!(payload["staff"]["owner"][0]["username"], "vanith");
    }
}
