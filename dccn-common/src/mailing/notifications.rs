//! System notifications sent to authors on status changes

use serde::Serialize;

use super::MessageKind;
use crate::config::NotificationsConfig;
use crate::model::SubmissionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemNotification {
    AssignStatusReview,
    AssignStatusSubmit,
}

impl SystemNotification {
    /// Notification for a status a submission just entered
    pub fn for_status(status: SubmissionStatus) -> Option<Self> {
        match status {
            SubmissionStatus::UnderReview => Some(SystemNotification::AssignStatusReview),
            SubmissionStatus::Submitted => Some(SystemNotification::AssignStatusSubmit),
            _ => None,
        }
    }

    pub fn is_enabled(&self, config: &NotificationsConfig) -> bool {
        match self {
            SystemNotification::AssignStatusReview => config.submission_status_review,
            SystemNotification::AssignStatusSubmit => config.submission_status_submit,
        }
    }

    pub fn kind(&self) -> MessageKind {
        MessageKind::Submission
    }

    pub fn subject(&self) -> &'static str {
        match self {
            SystemNotification::AssignStatusReview => "Submission #{{ paper_id }} is under review",
            SystemNotification::AssignStatusSubmit => {
                "Submission #{{ paper_id }} is in draft editing state"
            }
        }
    }

    pub fn body(&self) -> &'static str {
        match self {
            SystemNotification::AssignStatusReview => {
                "Dear {{ username }},\n\n\
                 your submission #{{ paper_id }} **\"{{ paper_title }}\"** is assigned for the review.\n\n\
                 Reviews are expected to be ready at **{{ rev_end_date }}**."
            }
            SystemNotification::AssignStatusSubmit => {
                "Dear {{ username }},\n\n\
                 your submission #{{ paper_id }} **\"{{ paper_title }}\"** is in draft editing state.\n\n\
                 At this point you can modify review manuscript, title and other data if you need."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailing::render::{render, Context};

    #[test]
    fn test_for_status() {
        assert_eq!(
            SystemNotification::for_status(SubmissionStatus::UnderReview),
            Some(SystemNotification::AssignStatusReview)
        );
        assert_eq!(
            SystemNotification::for_status(SubmissionStatus::Submitted),
            Some(SystemNotification::AssignStatusSubmit)
        );
        assert_eq!(SystemNotification::for_status(SubmissionStatus::Accepted), None);
    }

    #[test]
    fn test_disabled_by_config() {
        let config = NotificationsConfig {
            submission_status_review: false,
            submission_status_submit: true,
        };
        assert!(!SystemNotification::AssignStatusReview.is_enabled(&config));
        assert!(SystemNotification::AssignStatusSubmit.is_enabled(&config));
    }

    #[test]
    fn test_default_body_renders() {
        let ctx: Context = [("username", "Anna"), ("paper_id", "3"), ("paper_title", "Queues")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let body = render(SystemNotification::AssignStatusSubmit.body(), &ctx);
        assert!(body.starts_with("Dear Anna,\n\nyour submission #3 **\"Queues\"** is in draft"));
    }
}
