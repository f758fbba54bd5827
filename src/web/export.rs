//! CSV exports for the admin panel.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use super::admin::{authorize, KeyQuery};
use super::{WebError, WebState};
use crate::database::{UserAccount, WithdrawListing, WithdrawRequest};
use crate::utils::csv_field;

/// `GET /admin/export/users.csv?key=`
pub async fn users_csv(
    State(state): State<WebState>,
    Query(query): Query<KeyQuery>,
) -> Result<Response, WebError> {
    authorize(&state, &query)?;
    let users = state.app.users.list(None).await?;
    Ok(csv_response("users.csv", users_to_csv(&users)))
}

/// `GET /admin/export/withdrawals.csv?key=`
pub async fn withdrawals_csv(
    State(state): State<WebState>,
    Query(query): Query<KeyQuery>,
) -> Result<Response, WebError> {
    authorize(&state, &query)?;
    let requests = state.app.withdrawals.list(WithdrawListing::All, None).await?;
    Ok(csv_response("withdrawals.csv", withdrawals_to_csv(&requests)))
}

fn csv_response(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

fn csv_row(fields: &[String]) -> String {
    let mut row = fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",");
    row.push_str("\r\n");
    row
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

pub fn users_to_csv(users: &[UserAccount]) -> String {
    let mut out = csv_row(&[
        "user_id".into(),
        "username".into(),
        "first_name".into(),
        "lang".into(),
        "points".into(),
        "referral_count".into(),
        "referred_by".into(),
        "created_at".into(),
    ]);
    for user in users {
        out.push_str(&csv_row(&[
            user.user_id.to_string(),
            opt(&user.username),
            user.first_name.clone(),
            opt(&user.lang),
            user.points.to_string(),
            user.referral_count.to_string(),
            opt(&user.referred_by),
            user.created_at.to_string(),
        ]));
    }
    out
}

pub fn withdrawals_to_csv(requests: &[WithdrawRequest]) -> String {
    let mut out = csv_row(&[
        "request_id".into(),
        "user_id".into(),
        "amount".into(),
        "destination".into(),
        "status".into(),
        "note".into(),
        "created_at".into(),
        "processed_at".into(),
    ]);
    for request in requests {
        out.push_str(&csv_row(&[
            request.request_id.to_string(),
            request.user_id.to_string(),
            request.amount.to_string(),
            opt(&request.destination),
            request.status.as_str().to_string(),
            opt(&request.note),
            request.created_at.to_string(),
            opt(&request.processed_at),
        ]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::WithdrawStatus;

    #[test]
    fn test_withdrawals_csv_quotes_fields() {
        let mut request = WithdrawRequest::new(4, 77, 300, Some("BCA, 123 \"main\"".into()), 1_700_000_000);
        request.status = WithdrawStatus::Rejected;
        request.note = Some("line\nbreak".into());
        request.processed_at = Some(1_700_000_100);

        let csv = withdrawals_to_csv(&[request]);
        let mut lines = csv.split("\r\n");
        assert_eq!(
            lines.next(),
            Some("request_id,user_id,amount,destination,status,note,created_at,processed_at")
        );
        assert_eq!(
            lines.next(),
            Some("4,77,300,\"BCA, 123 \"\"main\"\"\",rejected,\"line\nbreak\",1700000000,1700000100")
        );
    }

    #[test]
    fn test_users_csv_header_only_when_empty() {
        assert_eq!(
            users_to_csv(&[]),
            "user_id,username,first_name,lang,points,referral_count,referred_by,created_at\r\n"
        );
    }
}
