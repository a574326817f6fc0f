//! Console rendering of the community page
//!
//! Produces the page as plain text lines, top to bottom:
//! hero, stats, activity feed, staff team, channels. `None` renders the
//! loading placeholders shown before the first publish.

use crate::config::DisplayConfig;
use crate::models::{Activity, Snapshot, StaffMember};
use crate::store::Published;
use crate::views::{
    attachment_label, author_color, filter_members, format_count, role_badge, time_ago,
    truncate_text,
};
use chrono::{DateTime, Utc};

const LOADING: &str = "...";
const CONTENT_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub max_activities: usize,
    pub search: Option<String>,
    pub color: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from(&DisplayConfig::default())
    }
}

impl From<&DisplayConfig> for RenderOptions {
    fn from(display: &DisplayConfig) -> Self {
        Self {
            max_activities: display.max_activities,
            search: display.search.clone(),
            color: display.color,
        }
    }
}

pub fn render_page(state: Option<&Published>, options: &RenderOptions, now: DateTime<Utc>) -> String {
    let snapshot = state.map(|p| p.snapshot.as_ref());
    let mut lines = Vec::new();

    lines.push(hero_line(snapshot.map(|s| s.stats.total_members)));
    if let Some(published) = state {
        lines.push(format!("Updated {}", time_ago(published.received_at, now)));
    }
    lines.push(String::new());

    if let Some(kind) = state.and_then(Published::failure) {
        lines.push(format!("! Failed to load latest data ({}); showing placeholder stats", kind));
        lines.push(String::new());
    }

    render_stats(&mut lines, snapshot);
    lines.push(String::new());
    render_feed(&mut lines, snapshot, options, now);
    lines.push(String::new());
    render_staff(&mut lines, snapshot, options);
    lines.push(String::new());
    render_channels(&mut lines, snapshot);

    lines.join("\n")
}

/// Title line; an unknown or zero member count shows as `...`
pub fn hero_line(total_members: Option<u64>) -> String {
    let members = total_members
        .filter(|&n| n > 0)
        .map(format_count)
        .unwrap_or_else(|| LOADING.to_string());
    format!("Vanith Community | {} Members", members)
}

fn render_stats(lines: &mut Vec<String>, snapshot: Option<&Snapshot>) {
    let value = |pick: fn(&Snapshot) -> u64| {
        snapshot
            .map(|s| format_count(pick(s)))
            .unwrap_or_else(|| LOADING.to_string())
    };

    lines.push(format!("  Total Members     {}", value(|s| s.stats.total_members)));
    lines.push(format!("  Currently Online  {}", value(|s| s.stats.online_members)));
    lines.push(format!("  Messages Today    {}", value(|s| s.stats.messages_today)));
}

fn render_feed(
    lines: &mut Vec<String>,
    snapshot: Option<&Snapshot>,
    options: &RenderOptions,
    now: DateTime<Utc>,
) {
    lines.push("Live Activity Feed".to_string());

    let Some(snapshot) = snapshot else {
        lines.push("  Loading activities...".to_string());
        return;
    };
    if snapshot.activities.is_empty() {
        lines.push("  No recent activities".to_string());
        return;
    }

    for activity in snapshot.activities.iter().take(options.max_activities) {
        render_activity(lines, activity, options, now);
    }

    let hidden = snapshot.activities.len().saturating_sub(options.max_activities);
    if hidden > 0 {
        lines.push(format!("  ... and {} more", hidden));
    }
}

fn render_activity(lines: &mut Vec<String>, activity: &Activity, options: &RenderOptions, now: DateTime<Utc>) {
    let mut head = format!("  [{}] ", activity.kind.label());
    if options.color {
        head.push_str(&paint(author_color(activity), &activity.display_name));
    } else {
        head.push_str(&activity.display_name);
    }
    if activity.is_bot {
        head.push_str(" BOT");
    }
    if let Some(role) = role_badge(activity) {
        head.push_str(&format!(" <{}>", role));
    }
    head.push_str(&format!(" {}", activity.action));
    if let Some(ago) = activity.time_ago(now) {
        head.push_str(&format!("  {}", ago));
    }
    lines.push(head);

    if let Some(content) = activity.content.as_deref().filter(|c| !c.is_empty()) {
        lines.push(format!("      | {}", truncate_text(content, CONTENT_PREVIEW_CHARS)));
        if activity.has_attachments {
            lines.push(format!("      | {}", attachment_label(activity.attachments)));
        }
    }

    if activity.has_mentions {
        let names: Vec<String> = activity.mentions.iter().map(|m| format!("@{}", m.username)).collect();
        lines.push(format!("      Mentioned: {}", names.join(" ")));
    }

    if activity.is_log_channel {
        lines.push("      [Log Channel]".to_string());
    }
}

fn render_staff(lines: &mut Vec<String>, snapshot: Option<&Snapshot>, options: &RenderOptions) {
    lines.push("Staff Team".to_string());

    let Some(snapshot) = snapshot else {
        lines.push("  Loading staff...".to_string());
        return;
    };
    let staff = &snapshot.staff;
    if staff.total() == 0 {
        lines.push("  No staff data available".to_string());
        return;
    }

    if !staff.owner.is_empty() {
        lines.push("  Server Owner".to_string());
        lines.extend(staff.owner.iter().map(|m| staff_line(m, false)));
    }
    if !staff.moderators.is_empty() {
        lines.push(format!("  Moderators ({})", staff.moderators.len()));
        lines.extend(staff.moderators.iter().map(|m| staff_line(m, false)));
    }
    if !staff.bots.is_empty() {
        lines.push(format!("  Bots ({})", staff.bots.len()));
        lines.extend(staff.bots.iter().map(|m| staff_line(m, true)));
    }

    let query = options.search.as_deref().unwrap_or("");
    let shown = filter_members(query, &staff.members);
    if query.trim().is_empty() {
        if staff.members.is_empty() {
            return;
        }
        lines.push(format!("  Members ({})", staff.members.len()));
    } else {
        lines.push(format!(
            "  Members matching \"{}\" ({} of {})",
            query.trim(),
            shown.len(),
            staff.members.len()
        ));
        if shown.is_empty() {
            lines.push("    No members found".to_string());
        }
    }
    lines.extend(shown.into_iter().map(|m| staff_line(m, false)));
}

fn staff_line(member: &StaffMember, is_bot: bool) -> String {
    let mut line = format!("    {} (@{}) {}", member.display_name, member.username, member.role);
    if is_bot {
        line.push_str(" BOT");
    }
    if let Some(perms) = member.permissions {
        let granted: Vec<&str> = [("Admin", perms.admin), ("Kick", perms.kick), ("Ban", perms.ban)]
            .into_iter()
            .filter_map(|(name, on)| on.then_some(name))
            .collect();
        if !granted.is_empty() {
            line.push_str(&format!(" [{}]", granted.join(", ")));
        }
    }
    line
}

fn render_channels(lines: &mut Vec<String>, snapshot: Option<&Snapshot>) {
    lines.push("Channels".to_string());

    match snapshot {
        None => lines.push(format!("  {}", LOADING)),
        Some(s) if s.channels.is_empty() => lines.push("  No channels".to_string()),
        Some(s) => lines.extend(s.channels_by_position().iter().map(|c| format!("  #{}", c.name))),
    }
}

/// Wrap `text` in a 24-bit foreground colour; unparseable colours leave it plain
fn paint(hex: &str, text: &str) -> String {
    match parse_hex(hex) {
        Some((r, g, b)) => format!("\x1b[38;2;{};{};{}m{}\x1b[0m", r, g, b, text),
        None => text.to_string(),
    }
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}
