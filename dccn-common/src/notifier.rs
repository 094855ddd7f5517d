//! Background listener rendering system notifications
//!
//! Subscribes to the event bus and, for every status change that has a
//! system notification enabled in the config, renders the notification for
//! the authors of the submission and stores it as a group message.

use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::NotificationsConfig;
use crate::db::{self, messages::GroupMessage};
use crate::events::DccnEvent;
use crate::mailing::{compose, Recipients, SystemNotification};
use crate::model::SubmissionStatus;
use crate::{Error, Result};

/// Runs until the event bus is dropped
pub async fn run_notification_listener(
    mut rx: broadcast::Receiver<DccnEvent>,
    pool: SqlitePool,
    config: NotificationsConfig,
) {
    debug!("Notification listener started");

    loop {
        match rx.recv().await {
            Ok(DccnEvent::SubmissionStatusChanged {
                conference_id,
                submission_id,
                new_status,
                ..
            }) => {
                if let Err(e) =
                    notify_status_change(&pool, &config, conference_id, submission_id, new_status).await
                {
                    warn!(submission_id, "Failed to render status notification: {}", e);
                }
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Notification listener lagged, {} events skipped", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("Event bus closed, notification listener stopping");
                break;
            }
        }
    }
}

/// Render and store the notification for a submission that entered
/// `new_status`; returns the stored message, if any was due
pub async fn notify_status_change(
    pool: &SqlitePool,
    config: &NotificationsConfig,
    conference_id: i64,
    submission_id: i64,
    new_status: SubmissionStatus,
) -> Result<Option<GroupMessage>> {
    let Some(notification) = SystemNotification::for_status(new_status) else {
        return Ok(None);
    };
    if !notification.is_enabled(config) {
        debug!(?notification, "Notification disabled in config");
        return Ok(None);
    }

    let mut tx = pool.begin().await?;
    let snapshot = db::snapshot::load_snapshot_with(&mut tx, conference_id).await?;
    let sub = snapshot
        .submission(submission_id)
        .ok_or_else(|| Error::not_found("submission", submission_id))?;

    let recipients = Recipients::Submissions(vec![sub]);
    let emails = compose(notification.subject(), notification.body(), &snapshot, &recipients)?;
    let message = GroupMessage::new(
        conference_id,
        notification.kind(),
        notification.subject(),
        notification.body(),
        vec![submission_id],
        None,
    );
    db::messages::insert_group_message(&mut tx, &message, &emails).await?;
    tx.commit().await?;

    info!(
        submission_id,
        ?notification,
        recipients = emails.len(),
        "Status notification rendered"
    );
    Ok(Some(message))
}
