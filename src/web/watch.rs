//! Ad watch page and the reward callback it calls.
//!
//! `/watch` issues a one-time session token; the page hands it back to
//! `/reward` once the ad SDK reports a completed view.

use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use super::{WebError, WebState};
use crate::bot::notify;
use crate::database::models::ad::is_js_identifier;
use crate::i18n::{get_text, resolve_locale};
use crate::rewards::RewardError;
use crate::utils::html_escape;

#[derive(Debug, Deserialize)]
pub struct WatchQuery {
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RewardQuery {
    #[serde(default)]
    pub token: String,
}

/// Everything the watch page needs to run one ad.
#[derive(Debug, Clone)]
pub struct WatchPage {
    pub script_url: String,
    pub show_fn: String,
    pub token: String,
}

/// `GET /watch?user_id=`
pub async fn watch_page(
    State(state): State<WebState>,
    Query(query): Query<WatchQuery>,
) -> Result<Html<String>, WebError> {
    let user_id = query
        .user_id
        .ok_or_else(|| WebError::BadRequest("user_id is required".to_string()))?;
    let Some(account) = state.app.users.get(user_id).await? else {
        return Err(WebError::NotFound(get_text(
            crate::i18n::DEFAULT_LANG,
            "web.not_registered",
        )));
    };
    let lang = resolve_locale(account.lang.as_deref(), None);

    let fallback = &state.app.config.ads;
    let (script_url, show_fn, reward, ad_id) = match state.app.ads.random_active().await? {
        Some(ad) if is_js_identifier(&ad.show_fn) => (ad.script_url, ad.show_fn, ad.reward, Some(ad.ad_id)),
        _ => (
            fallback.fallback_script_url.clone(),
            fallback.fallback_show_fn.clone(),
            state.app.rewards().ad,
            None,
        ),
    };

    let token = state
        .app
        .ledger
        .sessions
        .issue(user_id, ad_id, reward, Instant::now());
    debug!("Issued ad session for user {} (ad {:?})", user_id, ad_id);

    Ok(Html(render_watch_page(
        &WatchPage {
            script_url,
            show_fn,
            token,
        },
        lang,
    )))
}

/// `GET /reward?token=`
pub async fn reward(State(state): State<WebState>, Query(query): Query<RewardQuery>) -> Response {
    match state.app.ledger.redeem_ad(&query.token).await {
        Ok(reward) => {
            let body = json!({ "ok": true, "points": reward.points, "balance": reward.account.points });
            let bot = state.bot.clone();
            tokio::spawn(async move {
                notify::ad_rewarded(&bot, &reward.account, reward.points).await;
            });
            Json(body).into_response()
        }
        Err(e) => {
            let (status, code) = reward_error_status(&e);
            if status.is_server_error() {
                error!("Failed to redeem ad session: {}", e);
            }
            (status, Json(json!({ "ok": false, "error": code }))).into_response()
        }
    }
}

/// HTTP status and error code for a failed redeem.
fn reward_error_status(e: &RewardError) -> (StatusCode, &'static str) {
    match e {
        RewardError::SessionExpired => (StatusCode::GONE, "expired"),
        RewardError::SessionTooEarly { .. } => (
            StatusCode::from_u16(425).unwrap_or(StatusCode::TOO_MANY_REQUESTS),
            "too_early",
        ),
        RewardError::NotRegistered => (StatusCode::NOT_FOUND, "not_registered"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    }
}

/// JS string literal (quoted and escaped).
fn js_string(s: &str) -> String {
    serde_json::to_string(s)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/")
}

pub fn render_watch_page(page: &WatchPage, lang: &str) -> String {
    let text = |key: &str| get_text(lang, &format!("web.{key}"));
    let reward_url = format!("/reward?token={}", page.token);

    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
  <style>
    body {{ font-family: sans-serif; text-align: center; padding: 24px; }}
    #status {{ font-size: 1.2em; margin-top: 24px; }}
  </style>
</head>
<body>
  <h2>{heading}</h2>
  <div id="status">{loading}</div>
  <script src="{script_url}"></script>
  <script>
    (function () {{
      var status = document.getElementById("status");
      var messages = {{
        rewarded: {rewarded},
        failed: {failed},
        too_early: {too_early},
        expired: {expired}
      }};
      Promise.resolve()
        .then(function () {{ return window[{show_fn}](); }})
        .then(function () {{ return fetch({reward_url}); }})
        .then(function (res) {{ return res.json(); }})
        .then(function (data) {{
          if (data.ok) {{
            status.textContent = messages.rewarded.replace("{{points}}", data.points);
          }} else {{
            status.textContent = messages[data.error] || messages.failed;
          }}
        }})
        .catch(function () {{ status.textContent = messages.failed; }});
    }})();
  </script>
</body>
</html>
"#,
        lang = lang,
        title = html_escape(&text("title")),
        heading = html_escape(&text("heading")),
        loading = html_escape(&text("loading")),
        script_url = html_escape(&page.script_url),
        rewarded = js_string(&text("rewarded")),
        failed = js_string(&text("failed")),
        too_early = js_string(&text("too_early")),
        expired = js_string(&text("expired")),
        show_fn = js_string(&page.show_fn),
        reward_url = js_string(&reward_url),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn page() -> WatchPage {
        WatchPage {
            script_url: "https://ad.example/sdk.js?a=1&b=2".to_string(),
            show_fn: "showGiga".to_string(),
            token: "abc123".to_string(),
        }
    }

    #[test]
    fn test_render_watch_page() {
        let html = render_watch_page(&page(), "en");
        assert!(html.contains(r#"<script src="https://ad.example/sdk.js?a=1&amp;b=2"></script>"#));
        assert!(html.contains(r#"window["showGiga"]()"#));
        assert!(html.contains(r#"fetch("/reward?token=abc123")"#));
        assert!(html.contains(&get_text("en", "web.heading")));
        assert!(html.contains(r#"replace("{points}", data.points)"#));
    }

    #[test]
    fn test_js_string_cannot_close_script() {
        let escaped = js_string("</script><script>alert(1)</script>");
        assert!(!escaped.contains("</script>"));
        assert!(escaped.starts_with('"') && escaped.ends_with('"'));
    }

    #[test]
    fn test_reward_error_status() {
        assert_eq!(reward_error_status(&RewardError::SessionExpired).0, StatusCode::GONE);
        assert_eq!(
            reward_error_status(&RewardError::SessionTooEarly {
                wait: Duration::from_secs(3)
            })
            .0
            .as_u16(),
            425
        );
        assert_eq!(
            reward_error_status(&RewardError::NotRegistered).0,
            StatusCode::NOT_FOUND
        );
    }
}
