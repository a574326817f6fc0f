use crate::models::Activity;

pub const DEFAULT_AUTHOR_COLOR: &str = "#A855F7";

/// Role that never gets a badge
const PLAIN_ROLE: &str = "Member";

/// `12847` -> `12,847`
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Cut to `max` characters, marking the cut with `...`
pub fn truncate_text(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub fn attachment_label(count: u32) -> String {
    if count == 1 {
        "1 attachment".to_string()
    } else {
        format!("{} attachments", count)
    }
}

/// Author role worth showing next to a message
pub fn role_badge(activity: &Activity) -> Option<&str> {
    activity
        .author_role
        .as_deref()
        .filter(|role| !role.is_empty() && *role != PLAIN_ROLE)
}

pub fn author_color(activity: &Activity) -> &str {
    activity
        .author_role_color
        .as_deref()
        .filter(|color| !color.is_empty())
        .unwrap_or(DEFAULT_AUTHOR_COLOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(role: Option<&str>, color: Option<&str>) -> Activity {
        let json = serde_json::json!({
            "type": "message", "user": "kite", "userId": "42", "displayName": "Kite",
            "action": "sent a message", "time": "2026-10-19T10:00:00Z",
            "authorRole": role, "authorRoleColor": color
        });
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(12_847), "12,847");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("exactly10!", 10), "exactly10!");
        assert_eq!(truncate_text("hello world", 5), "hello...");
        assert_eq!(truncate_text("héllo wörld", 7), "héllo w...");
    }

    #[test]
    fn test_attachment_label() {
        assert_eq!(attachment_label(1), "1 attachment");
        assert_eq!(attachment_label(3), "3 attachments");
    }

    #[test]
    fn test_role_badge() {
        assert_eq!(role_badge(&message(Some("Moderator"), None)), Some("Moderator"));
        assert_eq!(role_badge(&message(Some("Member"), None)), None);
        assert_eq!(role_badge(&message(None, None)), None);
    }

    #[test]
    fn test_author_color() {
        assert_eq!(author_color(&message(None, Some("#E67E22"))), "#E67E22");
        assert_eq!(author_color(&message(None, None)), DEFAULT_AUTHOR_COLOR);
        assert_eq!(author_color(&message(None, Some(""))), DEFAULT_AUTHOR_COLOR);
    }
}
