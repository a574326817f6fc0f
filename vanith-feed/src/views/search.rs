use crate::models::StaffMember;

/// Members whose `username` or `displayName` contains `query`, ignoring case.
/// A blank query keeps everyone, in order.
pub fn filter_members<'a>(query: &str, members: &'a [StaffMember]) -> Vec<&'a StaffMember> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return members.iter().collect();
    }

    members
        .iter()
        .filter(|m| {
            m.username.to_lowercase().contains(&needle)
                || m.display_name.to_lowercase().contains(&needle)
        })
        .collect()
}
