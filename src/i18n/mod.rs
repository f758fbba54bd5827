//! Internationalization (i18n) module.
//!
//! Translations are embedded at compile time; Indonesian is the default
//! language, English the alternative.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde_json::Value;

/// Default language.
pub const DEFAULT_LANG: &str = "id";

/// Languages with a translation file.
pub const LANGS: [&str; 2] = ["id", "en"];

/// Global translation store: LangCode -> nested JSON.
static TRANSLATIONS: OnceLock<HashMap<&'static str, Value>> = OnceLock::new();

fn store() -> &'static HashMap<&'static str, Value> {
    TRANSLATIONS.get_or_init(|| {
        let mut map = HashMap::new();
        for (lang, raw) in [("id", include_str!("id.json")), ("en", include_str!("en.json"))] {
            match serde_json::from_str(raw) {
                Ok(val) => {
                    map.insert(lang, val);
                }
                Err(e) => tracing::error!("Invalid translation file {}.json: {}", lang, e),
            }
        }
        map
    })
}

/// Load the translations eagerly (otherwise done on first lookup).
pub fn init() {
    let langs = store().len();
    tracing::debug!("Loaded {} translation files", langs);
}

/// Get text for a key in a specific language.
///
/// Nested keys use dot notation, e.g. `"withdraw.status.pending"`. Missing
/// keys fall back to the default language, then to the key itself.
pub fn get_text(lang: &str, key: &str) -> String {
    let store = store();

    if let Some(text) = store.get(lang).and_then(|val| resolve_key(val, key)) {
        return text;
    }
    if lang != DEFAULT_LANG
        && let Some(text) = store.get(DEFAULT_LANG).and_then(|val| resolve_key(val, key))
    {
        return text;
    }

    key.to_string()
}

/// `get_text` with `{placeholder}` substitution.
pub fn format_text(lang: &str, key: &str, args: &[(&str, &str)]) -> String {
    fill_placeholders(&get_text(lang, key), args)
}

/// Replace `{name}` in one pass over the template. Substituted values are
/// never scanned again, and unknown placeholders are kept as written.
fn fill_placeholders(template: &str, args: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            args.iter()
                .find(|(arg, _)| *arg == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn resolve_key(val: &Value, key: &str) -> Option<String> {
    let mut current = val;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    current.as_str().map(|s| s.to_string())
}

/// Resolve effective locale.
///
/// Priority: stored preference -> Telegram client language -> default.
pub fn resolve_locale(stored: Option<&str>, telegram: Option<&str>) -> &'static str {
    if let Some(lang) = stored.and_then(known_lang) {
        return lang;
    }
    match telegram.map(|code| code.to_lowercase()) {
        Some(code) if code.starts_with("en") => "en",
        _ => DEFAULT_LANG,
    }
}

/// Normalize a language code to one we ship.
pub fn known_lang(code: &str) -> Option<&'static str> {
    let code = code.trim().to_lowercase();
    LANGS.into_iter().find(|lang| *lang == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_lookup() {
        assert_eq!(get_text("id", "withdraw.status.pending"), "menunggu");
        assert_eq!(get_text("en", "withdraw.status.pending"), "pending");
    }

    #[test]
    fn test_fallbacks() {
        assert_eq!(get_text("fr", "menu.watch"), "🎬 Nonton Iklan");
        assert_eq!(get_text("id", "no.such.key"), "no.such.key");
    }

    #[test]
    fn test_format_text() {
        let text = format_text("id", "daily.claimed", &[("points", "20")]);
        assert_eq!(text, "🎁 Kamu berhasil klaim 20 poin harian!");
    }

    #[test]
    fn test_format_text_keeps_placeholders_in_values() {
        let text = format_text("en", "start.welcome_back", &[("name", "{points}"), ("points", "42")]);
        assert_eq!(text, "👋 Welcome back, <b>{points}</b>! Your points: <b>42</b>.");

        assert_eq!(fill_placeholders("{a}{b}", &[("a", "{b}"), ("b", "x")]), "{b}x");
        assert_eq!(fill_placeholders("{unknown} {a", &[("a", "1")]), "{unknown} {a");
        assert_eq!(fill_placeholders("{{a}}", &[("a", "1")]), "{1}}");
    }

    #[test]
    fn test_resolve_locale() {
        assert_eq!(resolve_locale(Some("en"), Some("id")), "en");
        assert_eq!(resolve_locale(None, Some("en-US")), "en");
        assert_eq!(resolve_locale(None, Some("ru")), "id");
        assert_eq!(resolve_locale(Some("xx"), None), "id");
    }

    #[test]
    fn test_both_files_have_same_keys() {
        fn keys(prefix: &str, val: &Value, out: &mut Vec<String>) {
            if let Some(map) = val.as_object() {
                for (k, v) in map {
                    let path = if prefix.is_empty() { k.clone() } else { format!("{prefix}.{k}") };
                    keys(&path, v, out);
                }
            } else {
                out.push(prefix.to_string());
            }
        }

        let mut id = Vec::new();
        let mut en = Vec::new();
        keys("", &store()["id"], &mut id);
        keys("", &store()["en"], &mut en);
        id.sort();
        en.sort();
        assert_eq!(id, en);
    }
}
