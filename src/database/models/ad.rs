//! Ad placement model.

use serde::{Deserialize, Serialize};

/// An ad network placement shown on the watch page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ad {
    pub ad_id: i64,
    pub title: String,
    /// `<script src>` of the ad network SDK.
    pub script_url: String,
    /// Global JS function the SDK exposes; it returns a promise resolved
    /// once the ad was watched.
    pub show_fn: String,
    /// Points for one completed view.
    pub reward: i64,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub created_at: i64,
}

fn default_active() -> bool {
    true
}

impl Ad {
    pub fn new(ad_id: i64, title: String, script_url: String, show_fn: String, reward: i64, now: i64) -> Self {
        Self {
            ad_id,
            title,
            script_url,
            show_fn,
            reward,
            active: true,
            views: 0,
            created_at: now,
        }
    }
}

/// True if `name` is a plain JS identifier (safe to call from the page).
pub fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_identifier() {
        assert!(is_js_identifier("showGiga"));
        assert!(is_js_identifier("_show$1"));
        assert!(!is_js_identifier("1show"));
        assert!(!is_js_identifier("show();alert(1)"));
        assert!(!is_js_identifier(""));
    }
}
