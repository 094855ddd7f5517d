//! Mass mail composition
//!
//! Chairs address messages either to users or to submissions (in which case
//! every author of each submission gets a copy). Subjects and bodies are
//! `{{ variable }}` templates filled per recipient. Messages are rendered and
//! stored; delivery is out of scope.

pub mod lists;
pub mod notifications;
pub mod render;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

pub use lists::{MailingList, Recipients};
pub use notifications::SystemNotification;
pub use render::{compose, Context, RenderedEmail};

/// What the recipients of a group message are
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Submission,
}

impl MessageKind {
    pub fn code(&self) -> &'static str {
        match self {
            MessageKind::User => "user",
            MessageKind::Submission => "submission",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for MessageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(MessageKind::User),
            "submission" => Ok(MessageKind::Submission),
            other => Err(Error::InvalidInput(format!("unknown message kind: {}", other))),
        }
    }
}
