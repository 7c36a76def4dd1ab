//! Role to permission-code mapping.
//!
//! Membership rows in `company_users` carry a role; the permission codes it
//! grants are resolved here at login and stored in the session as CSV. The
//! rest of the application only ever asks "does the session hold code X".

/// Permission codes granted by a company-membership role.
pub fn codes_for_role(role: &str) -> Vec<&'static str> {
    match role {
        "admin" => vec![
            "questions.manage",
            "sections.manage",
            "tags.manage",
            "pir.view",
            "pir.create",
            "pir.respond",
            "pir.review",
            "comments.post",
        ],
        "editor" => vec![
            "pir.view",
            "pir.create",
            "pir.respond",
            "pir.review",
            "comments.post",
        ],
        "viewer" => vec!["pir.view"],
        // Unknown or plain member: view + comment only.
        _ => vec!["pir.view", "comments.post"],
    }
}
