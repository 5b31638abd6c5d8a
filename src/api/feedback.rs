/// Feedback endpoints
use crate::{
    api::extract::ApiJson,
    auth::AdminAuth,
    context::AppContext,
    error::{CmsError, CmsResult},
    feedback::{Feedback, MarkReadOutcome, SubmitFeedback},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// Build feedback routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/feedback", post(submit_feedback))
        .route("/api/feedback/:id/mark-read/:token", get(mark_read_link))
        .route("/api/admin/feedback", get(list_feedback))
        .route(
            "/api/admin/feedback/:id",
            get(get_feedback).delete(delete_feedback),
        )
        .route("/api/admin/feedback/:id/read", put(mark_read))
}

#[derive(Debug, Serialize)]
struct SubmitFeedbackResponse {
    id: String,
    message: &'static str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListFeedbackQuery {
    unread: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackListResponse {
    feedback: Vec<Feedback>,
    unread_count: i64,
}

#[derive(Debug, Serialize)]
struct MarkReadResponse {
    id: String,
    status: MarkReadOutcome,
}

#[derive(Debug, Serialize)]
struct DeleteFeedbackResponse {
    id: String,
    deleted: bool,
}

/// Public submission
async fn submit_feedback(
    State(ctx): State<AppContext>,
    ApiJson(req): ApiJson<SubmitFeedback>,
) -> CmsResult<(StatusCode, Json<SubmitFeedbackResponse>)> {
    let feedback = ctx.feedback_manager.submit(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitFeedbackResponse {
            id: feedback.id,
            message: "Thank you for your feedback",
        }),
    ))
}

/// Target of the link in the notification email
async fn mark_read_link(
    State(ctx): State<AppContext>,
    Path((id, token)): Path<(String, String)>,
) -> (StatusCode, Html<String>) {
    match ctx.feedback_manager.mark_read_with_token(&id, &token).await {
        Ok(MarkReadOutcome::Marked) => (
            StatusCode::OK,
            Html(page(
                "Feedback marked as read",
                "The feedback has been marked as read.",
            )),
        ),
        Ok(MarkReadOutcome::AlreadyRead) => (
            StatusCode::OK,
            Html(page(
                "Already read",
                "This feedback was already marked as read.",
            )),
        ),
        Err(CmsError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Html(page(
                "Link not valid",
                "This link does not match any feedback. It may have been deleted.",
            )),
        ),
        Err(e) => {
            tracing::error!("Mark-read link for feedback {} failed: {}", id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(page(
                    "Something went wrong",
                    "The feedback could not be updated. Please try again later.",
                )),
            )
        }
    }
}

async fn list_feedback(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
    Query(query): Query<ListFeedbackQuery>,
) -> CmsResult<Json<FeedbackListResponse>> {
    let feedback = ctx
        .feedback_manager
        .list(query.unread.unwrap_or(false))
        .await?;
    let unread_count = ctx.feedback_manager.count_unread().await?;

    Ok(Json(FeedbackListResponse {
        feedback,
        unread_count,
    }))
}

async fn get_feedback(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
    Path(id): Path<String>,
) -> CmsResult<Json<Feedback>> {
    ctx.feedback_manager
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| CmsError::NotFound(format!("Feedback {} not found", id)))
}

async fn mark_read(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
    Path(id): Path<String>,
) -> CmsResult<Json<MarkReadResponse>> {
    let status = ctx.feedback_manager.mark_read(&id).await?;
    Ok(Json(MarkReadResponse { id, status }))
}

async fn delete_feedback(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
    Path(id): Path<String>,
) -> CmsResult<Json<DeleteFeedbackResponse>> {
    ctx.feedback_manager.delete(&id).await?;
    Ok(Json(DeleteFeedbackResponse { id, deleted: true }))
}

/// Minimal standalone HTML page
fn page(title: &str, message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; display: flex; justify-content: center; padding-top: 15vh; color: #222; }}
main {{ max-width: 32rem; text-align: center; }}
</style>
</head>
<body>
<main>
<h1>{title}</h1>
<p>{message}</p>
</main>
</body>
</html>
"#
    )
}
