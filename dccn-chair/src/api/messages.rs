//! Mailing lists and group message composition
//!
//! Messages are rendered per recipient and stored; nothing is sent from here.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use dccn_common::db::{self, messages::{EmailMessage, GroupMessage}};
use dccn_common::mailing::render::recipients_by_ids;
use dccn_common::mailing::{compose, MailingList, MessageKind, Recipients, RenderedEmail};
use dccn_common::Error;

use super::extract::{Json, Path};
use super::{snapshot, Chair};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct MailingListItem {
    pub name: &'static str,
    pub details: &'static str,
    pub kind: MessageKind,
    pub size: usize,
}

/// GET /api/conferences/:conf_id/mailing-lists
pub async fn list_mailing_lists(
    State(state): State<AppState>,
    chair: Chair,
) -> ApiResult<Json<Vec<MailingListItem>>> {
    let snapshot = snapshot(&state, &chair).await?;
    let lists = MailingList::ALL
        .iter()
        .map(|list| MailingListItem {
            name: list.name(),
            details: list.details(),
            kind: list.kind(),
            size: list.resolve(&snapshot).object_ids().len(),
        })
        .collect();
    Ok(Json(lists))
}

#[derive(Debug, Serialize)]
pub struct RecipientUser {
    pub id: i64,
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct RecipientsResponse {
    pub name: &'static str,
    pub kind: MessageKind,
    /// Ids of users or submissions, depending on `kind`
    pub objects: Vec<i64>,
    /// Distinct users receiving mail
    pub users: Vec<RecipientUser>,
}

/// GET /api/conferences/:conf_id/mailing-lists/:name/recipients
pub async fn list_recipients(
    State(state): State<AppState>,
    chair: Chair,
    Path((_, name)): Path<(i64, String)>,
) -> ApiResult<Json<RecipientsResponse>> {
    let list: MailingList = name.parse()?;
    let snapshot = snapshot(&state, &chair).await?;
    let recipients = list.resolve(&snapshot);
    Ok(Json(RecipientsResponse {
        name: list.name(),
        kind: list.kind(),
        objects: recipients.object_ids(),
        users: recipients
            .users()
            .into_iter()
            .map(|u| RecipientUser {
                id: u.id(),
                full_name: u.full_name(),
                email: u.user.email.clone(),
            })
            .collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub kind: MessageKind,
    pub subject: String,
    pub body: String,
    pub recipient_id: i64,
}

/// POST /api/conferences/:conf_id/messages/preview
///
/// Renders the message for one user or submission; a submission yields one
/// copy per author.
pub async fn preview_message(
    State(state): State<AppState>,
    chair: Chair,
    Json(req): Json<PreviewRequest>,
) -> ApiResult<Json<Vec<RenderedEmail>>> {
    let snapshot = snapshot(&state, &chair).await?;
    let recipients = recipients_by_ids(&snapshot, req.kind, &[req.recipient_id])?;
    Ok(Json(compose(&req.subject, &req.body, &snapshot, &recipients)?))
}

/// Body of a new group message: either a mailing list or explicit ids
#[derive(Debug, Deserialize)]
pub struct ComposeRequest {
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub mailing_list: Option<String>,
    #[serde(default)]
    pub kind: Option<MessageKind>,
    #[serde(default)]
    pub recipients: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct ComposeResponse {
    pub id: Uuid,
    pub kind: MessageKind,
    pub recipients: Vec<i64>,
    pub num_emails: usize,
}

/// POST /api/conferences/:conf_id/messages
pub async fn create_message(
    State(state): State<AppState>,
    chair: Chair,
    Json(req): Json<ComposeRequest>,
) -> ApiResult<(StatusCode, Json<ComposeResponse>)> {
    if req.subject.trim().is_empty() {
        return Err(ApiError::BadRequest("message subject is empty".to_string()));
    }

    let mut tx = state.db.begin().await?;
    let snapshot = db::snapshot::load_snapshot_with(&mut tx, chair.conference_id).await?;
    let recipients: Recipients<'_> = match (&req.mailing_list, req.kind) {
        (Some(name), _) => name.parse::<MailingList>()?.resolve(&snapshot),
        (None, Some(kind)) => recipients_by_ids(&snapshot, kind, &req.recipients)?,
        (None, None) => {
            return Err(ApiError::BadRequest(
                "either mailing_list or kind with recipients is required".to_string(),
            ))
        }
    };

    let emails = compose(&req.subject, &req.body, &snapshot, &recipients)?;
    let message = GroupMessage::new(
        chair.conference_id,
        recipients.kind(),
        req.subject.as_str(),
        req.body.as_str(),
        recipients.object_ids(),
        Some(chair.user_id),
    );
    db::messages::insert_group_message(&mut tx, &message, &emails).await?;
    tx.commit().await?;

    info!(
        message_id = %message.id,
        chair = chair.user_id,
        emails = emails.len(),
        "Group message stored"
    );
    Ok((
        StatusCode::CREATED,
        Json(ComposeResponse {
            id: message.id,
            kind: message.kind,
            recipients: message.recipients,
            num_emails: emails.len(),
        }),
    ))
}

/// GET /api/conferences/:conf_id/messages
pub async fn list_messages(State(state): State<AppState>, chair: Chair) -> ApiResult<Json<Vec<GroupMessage>>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(
        db::messages::list_group_messages(&mut conn, chair.conference_id).await?,
    ))
}

#[derive(Debug, Serialize)]
pub struct MessageDetails {
    #[serde(flatten)]
    pub message: GroupMessage,
    pub emails: Vec<EmailMessage>,
}

/// GET /api/conferences/:conf_id/messages/:id
pub async fn get_message(
    State(state): State<AppState>,
    chair: Chair,
    Path((_, id)): Path<(i64, Uuid)>,
) -> ApiResult<Json<MessageDetails>> {
    let mut conn = state.db.acquire().await?;
    let message = db::messages::get_group_message(&mut conn, id).await?;
    if message.conference_id != chair.conference_id {
        return Err(Error::NotFound(format!("message {}", id)).into());
    }
    let emails = db::messages::list_email_messages(&mut conn, id).await?;
    Ok(Json(MessageDetails { message, emails }))
}

pub fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/api/conferences/:conf_id/mailing-lists", get(list_mailing_lists))
        .route(
            "/api/conferences/:conf_id/mailing-lists/:name/recipients",
            get(list_recipients),
        )
        .route(
            "/api/conferences/:conf_id/messages",
            get(list_messages).post(create_message),
        )
        .route(
            "/api/conferences/:conf_id/messages/preview",
            post(preview_message),
        )
        .route("/api/conferences/:conf_id/messages/:id", get(get_message))
}
