//! Admin panel: stats, users, withdrawals, ads and quizzes.
//!
//! Every route requires `?key=<ADMIN_KEY>`. Actions are plain HTML form
//! posts that redirect back to the panel.

use axum::extract::{Path, Query, State};
use axum::response::{Html, Redirect};
use axum::Form;
use serde::Deserialize;
use tracing::info;
use url::Url;

use super::{WebError, WebState};
use crate::bot::notify;
use crate::database::models::ad::is_js_identifier;
use crate::database::{Ad, Quiz, UserAccount, WithdrawListing, WithdrawRequest};
use crate::utils::{format_points, format_timestamp, html_escape};

/// Users shown on the panel.
const USERS_SHOWN: i64 = 200;
/// Withdrawals shown on the panel.
const WITHDRAWALS_SHOWN: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    pub key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectForm {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct AdForm {
    pub title: String,
    pub script_url: String,
    pub show_fn: String,
    pub reward: String,
}

#[derive(Debug, Deserialize)]
pub struct QuizForm {
    pub question: String,
    /// One option per line.
    pub options: String,
    /// 1-based number of the correct option.
    pub answer: String,
    #[serde(default)]
    pub reward: String,
}

/// Stats block of the panel.
#[derive(Debug, Clone, Default)]
pub struct PanelStats {
    pub users: u64,
    pub points: i64,
    pub pending: u64,
}

/// Data rendered by the panel.
#[derive(Debug, Clone, Default)]
pub struct PanelView {
    pub key: String,
    pub stats: PanelStats,
    pub users: Vec<UserAccount>,
    pub withdrawals: Vec<WithdrawRequest>,
    pub ads: Vec<Ad>,
    pub quizzes: Vec<Quiz>,
}

/// Check the admin key; returns it for building links.
pub(super) fn authorize(state: &WebState, query: &KeyQuery) -> Result<String, WebError> {
    match query.key.as_deref() {
        Some(key) if key == state.app.config.admin_key => Ok(key.to_string()),
        _ => Err(WebError::Unauthorized),
    }
}

/// Panel URL with the key, jumping to a section.
fn panel_url(key: &str, section: &str) -> String {
    let key: String = url::form_urlencoded::byte_serialize(key.as_bytes()).collect();
    format!("/admin?key={key}#{section}")
}

/// `GET /admin?key=`
pub async fn panel(
    State(state): State<WebState>,
    Query(query): Query<KeyQuery>,
) -> Result<Html<String>, WebError> {
    let key = authorize(&state, &query)?;
    let app = &state.app;

    let stats = PanelStats {
        users: app.users.count().await?,
        points: app.users.total_points().await?,
        pending: app.withdrawals.count_pending().await?,
    };

    // Every pending request (oldest first), then the recent processed ones
    let mut withdrawals = app.withdrawals.list(WithdrawListing::Pending, None).await?;
    withdrawals.extend(
        app.withdrawals
            .list(WithdrawListing::Processed, Some(WITHDRAWALS_SHOWN))
            .await?,
    );

    let view = PanelView {
        key,
        stats,
        users: app.users.list(Some(USERS_SHOWN)).await?,
        withdrawals,
        ads: app.ads.list().await?,
        quizzes: app.quizzes.list().await?,
    };
    Ok(Html(render_panel(&view)))
}

/// `POST /admin/withdrawals/:id/approve?key=`
pub async fn approve_withdraw(
    State(state): State<WebState>,
    Path(id): Path<i64>,
    Query(query): Query<KeyQuery>,
) -> Result<Redirect, WebError> {
    let key = authorize(&state, &query)?;

    match state.app.ledger.approve(id).await? {
        Some(request) => notify::withdraw_resolved(&state.bot, &state.app, &request).await,
        None => return Err(unresolved(&state, id).await),
    }
    Ok(Redirect::to(&panel_url(&key, "withdrawals")))
}

/// `POST /admin/withdrawals/:id/reject?key=`
pub async fn reject_withdraw(
    State(state): State<WebState>,
    Path(id): Path<i64>,
    Query(query): Query<KeyQuery>,
    Form(form): Form<RejectForm>,
) -> Result<Redirect, WebError> {
    let key = authorize(&state, &query)?;
    let reason = Some(form.reason.trim().to_string()).filter(|r| !r.is_empty());

    match state.app.ledger.reject(id, reason).await? {
        Some(request) => notify::withdraw_resolved(&state.bot, &state.app, &request).await,
        None => return Err(unresolved(&state, id).await),
    }
    Ok(Redirect::to(&panel_url(&key, "withdrawals")))
}

/// Why a withdraw action matched nothing.
async fn unresolved(state: &WebState, id: i64) -> WebError {
    match state.app.withdrawals.get(id).await {
        Ok(Some(request)) => WebError::BadRequest(format!(
            "Withdraw #{} was already {}",
            id,
            request.status.as_str()
        )),
        Ok(None) => WebError::NotFound(format!("Withdraw #{id} not found")),
        Err(e) => e.into(),
    }
}

/// Validated ad form: `(title, script_url, show_fn, reward)`.
pub fn parse_ad_form(form: &AdForm, default_reward: i64) -> Result<(String, String, String, i64), WebError> {
    let title = form.title.trim();
    if title.is_empty() {
        return Err(WebError::BadRequest("Title is required".to_string()));
    }

    let script_url = form.script_url.trim();
    match Url::parse(script_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => return Err(WebError::BadRequest("Script URL must be an http(s) URL".to_string())),
    }

    let show_fn = form.show_fn.trim();
    if !is_js_identifier(show_fn) {
        return Err(WebError::BadRequest("Show function must be a JS identifier".to_string()));
    }

    let reward = parse_reward(&form.reward, default_reward)?;
    Ok((title.to_string(), script_url.to_string(), show_fn.to_string(), reward))
}

fn parse_reward(raw: &str, default: i64) -> Result<i64, WebError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(default);
    }
    raw.parse::<i64>()
        .ok()
        .filter(|r| *r >= 0)
        .ok_or_else(|| WebError::BadRequest("Reward must be a non-negative number".to_string()))
}

/// `POST /admin/ads?key=`
pub async fn create_ad(
    State(state): State<WebState>,
    Query(query): Query<KeyQuery>,
    Form(form): Form<AdForm>,
) -> Result<Redirect, WebError> {
    let key = authorize(&state, &query)?;
    let (title, script_url, show_fn, reward) = parse_ad_form(&form, state.app.rewards().ad)?;

    let ad = state.app.ads.create(title, script_url, show_fn, reward).await?;
    info!("Admin added ad #{} ({})", ad.ad_id, ad.title);
    Ok(Redirect::to(&panel_url(&key, "ads")))
}

/// `POST /admin/ads/:id/toggle?key=`
pub async fn toggle_ad(
    State(state): State<WebState>,
    Path(id): Path<i64>,
    Query(query): Query<KeyQuery>,
) -> Result<Redirect, WebError> {
    let key = authorize(&state, &query)?;
    let active = state
        .app
        .ads
        .toggle(id)
        .await?
        .ok_or_else(|| WebError::NotFound(format!("Ad #{id} not found")))?;
    info!("Admin set ad #{} active={}", id, active);
    Ok(Redirect::to(&panel_url(&key, "ads")))
}

/// `POST /admin/ads/:id/delete?key=`
pub async fn delete_ad(
    State(state): State<WebState>,
    Path(id): Path<i64>,
    Query(query): Query<KeyQuery>,
) -> Result<Redirect, WebError> {
    let key = authorize(&state, &query)?;
    if !state.app.ads.delete(id).await? {
        return Err(WebError::NotFound(format!("Ad #{id} not found")));
    }
    info!("Admin deleted ad #{}", id);
    Ok(Redirect::to(&panel_url(&key, "ads")))
}

/// Validated quiz form: `(question, options, answer index, reward)`.
pub fn parse_quiz_form(form: &QuizForm, default_reward: i64) -> Result<(String, Vec<String>, i32, i64), WebError> {
    let options: Vec<String> = form
        .options
        .lines()
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect();

    let answer = form
        .answer
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|a| *a >= 1)
        .ok_or_else(|| WebError::BadRequest("Answer must be the option number (1, 2, ...)".to_string()))?;

    let reward = parse_reward(&form.reward, default_reward)?;
    Ok((form.question.trim().to_string(), options, answer - 1, reward))
}

/// `POST /admin/quizzes?key=`
pub async fn create_quiz(
    State(state): State<WebState>,
    Query(query): Query<KeyQuery>,
    Form(form): Form<QuizForm>,
) -> Result<Redirect, WebError> {
    let key = authorize(&state, &query)?;
    let (question, options, answer, reward) = parse_quiz_form(&form, state.app.rewards().quiz)?;

    let quiz = state
        .app
        .quizzes
        .create(question, options, answer, reward)
        .await?
        .ok_or_else(|| WebError::BadRequest("Quiz needs a question, 2-6 options and a valid answer".to_string()))?;
    info!("Admin added quiz #{}", quiz.quiz_id);
    Ok(Redirect::to(&panel_url(&key, "quizzes")))
}

/// `POST /admin/quizzes/:id/delete?key=`
pub async fn delete_quiz(
    State(state): State<WebState>,
    Path(id): Path<i64>,
    Query(query): Query<KeyQuery>,
) -> Result<Redirect, WebError> {
    let key = authorize(&state, &query)?;
    if !state.app.quizzes.delete(id).await? {
        return Err(WebError::NotFound(format!("Quiz #{id} not found")));
    }
    info!("Admin deleted quiz #{}", id);
    Ok(Redirect::to(&panel_url(&key, "quizzes")))
}

/// Form action URL with the key in the query string.
fn action_url(key: &str, path: &str) -> String {
    let key: String = url::form_urlencoded::byte_serialize(key.as_bytes()).collect();
    html_escape(&format!("{path}?key={key}"))
}

pub fn render_panel(view: &PanelView) -> String {
    let key = &view.key;
    let mut html = String::with_capacity(16 * 1024);

    html.push_str(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Admin Panel</title>
  <style>
    body { font-family: sans-serif; margin: 0; }
    .content { padding: 20px; margin-bottom: 60px; }
    table { border-collapse: collapse; width: 100%; margin-bottom: 12px; }
    th, td { border: 1px solid #ddd; padding: 6px; text-align: left; }
    form.inline { display: inline; }
    .tabbar { position: fixed; bottom: 0; left: 0; right: 0; display: flex; background: #333; }
    .tabbar a { flex: 1; padding: 10px; color: #fff; text-align: center; text-decoration: none; }
  </style>
</head>
<body>
<div class="content">
"#,
    );

    // Stats
    html.push_str(&format!(
        r#"<h2 id="stats">📈 Stats</h2>
<p>Users: <b>{}</b> | Total points: <b>{}</b> | Pending withdrawals: <b>{}</b></p>
<p><a href="{}">users.csv</a> | <a href="{}">withdrawals.csv</a></p>
"#,
        view.stats.users,
        format_points(view.stats.points, "id"),
        view.stats.pending,
        action_url(key, "/admin/export/users.csv"),
        action_url(key, "/admin/export/withdrawals.csv"),
    ));

    // Users
    html.push_str("<h2 id=\"users\">👤 Users</h2>\n<table>\n<tr><th>ID</th><th>Name</th><th>Points</th><th>Referrals</th><th>Joined</th></tr>\n");
    for user in &view.users {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            user.user_id,
            html_escape(&user.display_name()),
            format_points(user.points, "id"),
            user.referral_count,
            format_timestamp(user.created_at),
        ));
    }
    html.push_str("</table>\n");

    // Withdrawals
    html.push_str("<h2 id=\"withdrawals\">💸 Withdrawals</h2>\n<table>\n<tr><th>#</th><th>User</th><th>Amount</th><th>Destination</th><th>Status</th><th>Created</th><th></th></tr>\n");
    for w in &view.withdrawals {
        let actions = if w.is_pending() {
            format!(
                r#"<form class="inline" method="post" action="{}"><button>Approve</button></form>
<form class="inline" method="post" action="{}"><input name="reason" placeholder="reason"><button>Reject</button></form>"#,
                action_url(key, &format!("/admin/withdrawals/{}/approve", w.request_id)),
                action_url(key, &format!("/admin/withdrawals/{}/reject", w.request_id)),
            )
        } else {
            w.note.as_deref().map(html_escape).unwrap_or_default()
        };
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            w.request_id,
            w.user_id,
            format_points(w.amount, "id"),
            html_escape(w.destination.as_deref().unwrap_or("-")),
            w.status.as_str(),
            format_timestamp(w.created_at),
            actions,
        ));
    }
    html.push_str("</table>\n");

    // Ads
    html.push_str("<h2 id=\"ads\">🎬 Ads</h2>\n<table>\n<tr><th>#</th><th>Title</th><th>Script</th><th>Function</th><th>Reward</th><th>Views</th><th>Active</th><th></th></tr>\n");
    for ad in &view.ads {
        html.push_str(&format!(
            r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><form class="inline" method="post" action="{}"><button>Toggle</button></form> <form class="inline" method="post" action="{}"><button>Delete</button></form></td></tr>
"#,
            ad.ad_id,
            html_escape(&ad.title),
            html_escape(&ad.script_url),
            html_escape(&ad.show_fn),
            ad.reward,
            ad.views,
            if ad.active { "yes" } else { "no" },
            action_url(key, &format!("/admin/ads/{}/toggle", ad.ad_id)),
            action_url(key, &format!("/admin/ads/{}/delete", ad.ad_id)),
        ));
    }
    html.push_str(&format!(
        r#"</table>
<form method="post" action="{}">
  <input name="title" placeholder="Title" required>
  <input name="script_url" placeholder="https://.../sdk.js" required>
  <input name="show_fn" placeholder="showAd" required>
  <input name="reward" placeholder="Reward" type="number" min="0">
  <button>Add ad</button>
</form>
"#,
        action_url(key, "/admin/ads"),
    ));

    // Quizzes
    html.push_str("<h2 id=\"quizzes\">🧠 Quizzes</h2>\n<table>\n<tr><th>#</th><th>Question</th><th>Options</th><th>Reward</th><th></th></tr>\n");
    for quiz in &view.quizzes {
        let options: Vec<String> = quiz
            .options
            .iter()
            .enumerate()
            .map(|(i, o)| {
                let o = html_escape(o);
                if quiz.is_correct(i) { format!("<b>{o}</b>") } else { o }
            })
            .collect();
        html.push_str(&format!(
            r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><form class="inline" method="post" action="{}"><button>Delete</button></form></td></tr>
"#,
            quiz.quiz_id,
            html_escape(&quiz.question),
            options.join(" / "),
            quiz.reward,
            action_url(key, &format!("/admin/quizzes/{}/delete", quiz.quiz_id)),
        ));
    }
    html.push_str(&format!(
        r#"</table>
<form method="post" action="{}">
  <input name="question" placeholder="Question" required><br>
  <textarea name="options" rows="4" placeholder="One option per line" required></textarea><br>
  <input name="answer" placeholder="Correct option number" type="number" min="1" required>
  <input name="reward" placeholder="Reward" type="number" min="0">
  <button>Add quiz</button>
</form>
"#,
        action_url(key, "/admin/quizzes"),
    ));

    html.push_str(
        r##"</div>
<div class="tabbar">
  <a href="#stats">Stats</a>
  <a href="#users">Users</a>
  <a href="#withdrawals">Withdrawals</a>
  <a href="#ads">Ads</a>
  <a href="#quizzes">Quizzes</a>
</div>
</body>
</html>
"##,
    );
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ad_form(script_url: &str, show_fn: &str, reward: &str) -> AdForm {
        AdForm {
            title: "Giga".to_string(),
            script_url: script_url.to_string(),
            show_fn: show_fn.to_string(),
            reward: reward.to_string(),
        }
    }

    #[test]
    fn test_parse_ad_form() {
        let (_, _, show_fn, reward) =
            parse_ad_form(&ad_form("https://ad.example/s.js", "showGiga", ""), 10).unwrap();
        assert_eq!(show_fn, "showGiga");
        assert_eq!(reward, 10);

        assert!(parse_ad_form(&ad_form("javascript:alert(1)", "showGiga", "5"), 10).is_err());
        assert!(parse_ad_form(&ad_form("https://ad.example/s.js", "alert(1)", "5"), 10).is_err());
        assert!(parse_ad_form(&ad_form("https://ad.example/s.js", "show", "-1"), 10).is_err());
    }

    #[test]
    fn test_parse_quiz_form() {
        let form = QuizForm {
            question: " 2 + 2? ".to_string(),
            options: "3\r\n4\n\n5".to_string(),
            answer: "2".to_string(),
            reward: "".to_string(),
        };
        let (question, options, answer, reward) = parse_quiz_form(&form, 15).unwrap();
        assert_eq!(question, "2 + 2?");
        assert_eq!(options, vec!["3", "4", "5"]);
        assert_eq!(answer, 1);
        assert_eq!(reward, 15);

        let bad = QuizForm {
            answer: "0".to_string(),
            ..form
        };
        assert!(parse_quiz_form(&bad, 15).is_err());
    }

    #[test]
    fn test_panel_url_encodes_key() {
        assert_eq!(panel_url("a&b c", "ads"), "/admin?key=a%26b+c#ads");
    }

    #[test]
    fn test_render_panel_escapes_values() {
        let user = UserAccount {
            user_id: 5,
            username: None,
            first_name: "<b>x</b>".to_string(),
            lang: None,
            points: 1500,
            history: Vec::new(),
            referred_by: None,
            referral_count: 2,
            last_daily: None,
            last_spin: None,
            last_quiz: None,
            created_at: 0,
        };
        let view = PanelView {
            key: "k\"ey".to_string(),
            users: vec![user],
            withdrawals: vec![WithdrawRequest::new(9, 5, 200, Some("<dana>".into()), 0)],
            ..Default::default()
        };

        let html = render_panel(&view);
        assert!(html.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(html.contains("&lt;dana&gt;"));
        assert!(html.contains("/admin/withdrawals/9/approve?key=k%22ey"));
        assert!(!html.contains("<b>x</b>"));
        assert!(html.contains("1.500"));
    }
}
