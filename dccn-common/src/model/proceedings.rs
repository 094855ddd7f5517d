//! Camera-ready packages and their artifacts

use serde::{Deserialize, Serialize};

use super::{DecisionKind, SubmissionStatus};

/// Final-manuscript processing for one (submission, proceedings type) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraReady {
    pub id: i64,
    pub submission_id: i64,
    pub proc_type_id: i64,
    pub volume_id: Option<i64>,
    pub active: bool,
}

impl CameraReady {
    /// Active iff the paper is accepted (or further along) by an ACCEPT
    /// decision that publishes it in this proceedings type
    pub fn should_be_active(
        proc_type_id: i64,
        status: SubmissionStatus,
        decision: Option<DecisionKind>,
        allowed_proceedings: &[i64],
    ) -> bool {
        status.is_camera_ready_status()
            && decision == Some(DecisionKind::Accept)
            && allowed_proceedings.contains(&proc_type_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: i64,
    pub camera_ready_id: i64,
    pub descriptor_id: i64,
    pub file_name: Option<String>,
}

impl Artifact {
    pub fn has_file(&self) -> bool {
        self.file_name.as_deref().map(|f| !f.is_empty()).unwrap_or(false)
    }
}

/// Author access to an artifact upload slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ArtifactAccess {
    /// Upload and replace allowed
    Rw,
    /// Download only
    Ro,
    /// Hidden
    No,
}

impl ArtifactAccess {
    pub fn for_status(camera_ready_active: bool, status: SubmissionStatus) -> Self {
        if !camera_ready_active {
            return ArtifactAccess::No;
        }
        match status {
            SubmissionStatus::Accepted => ArtifactAccess::Rw,
            SubmissionStatus::InPrint | SubmissionStatus::Published => ArtifactAccess::Ro,
            _ => ArtifactAccess::No,
        }
    }
}
