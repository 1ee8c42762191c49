//! Errors that end a merge request. The `Display` text of each variant is the
//! exact reason shown to the user after the `Error: ` prefix.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("No image provided (URL or file)")]
    MissingImage,

    #[error("Provided image is not a supported image type")]
    UnsupportedImage,

    #[error("No pose file provided (URL or file)")]
    MissingPose,

    #[error("Pose file must have .pose extension")]
    InvalidExtension,

    #[error("Pose file appears to be an image; expected JSON .pose")]
    PoseIsImage,

    #[error("Pose file is not valid JSON")]
    InvalidJson,

    /// A URL input could not be retrieved
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
}

pub type Result<T> = std::result::Result<T, MergeError>;
