//! Pose files: JSON objects describing keypoint data, conventionally named
//! `*.pose`. A merged pose file carries its image under [`IMAGE_KEY`].

use crate::error::{MergeError, Result};
use crate::raster::{self, ImagePayload};
use serde_json::{Map, Value};

/// The top-level key the base64 image is stored under
pub const IMAGE_KEY: &str = "Base64Image";

/// Required filename suffix, compared case-insensitively
pub const POSE_EXTENSION: &str = ".pose";

/// Download name used when the pose source supplied no filename
pub const DEFAULT_POSE_FILENAME: &str = "updated.pose";

/// A validated pose file
#[derive(Debug, Clone, PartialEq)]
pub struct PoseDocument {
    filename: String,
    fields: Map<String, Value>,
}

/// A serialized pose file ready to be downloaded
#[derive(Debug, Clone, PartialEq)]
pub struct MergedPose {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// Resolve the download name, falling back to [`DEFAULT_POSE_FILENAME`]
pub fn resolve_filename(filename: Option<String>) -> String {
    filename
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_POSE_FILENAME.to_string())
}

/// True if `filename` ends in `.pose`, ignoring ASCII case
pub fn has_pose_extension(filename: &str) -> bool {
    filename
        .len()
        .checked_sub(POSE_EXTENSION.len())
        .and_then(|start| filename.get(start..))
        .map_or(false, |ext| ext.eq_ignore_ascii_case(POSE_EXTENSION))
}

impl PoseDocument {
    /// Validate and parse a pose file.
    ///
    /// Checks run in a fixed order: extension, then "is this secretly an
    /// image", then JSON. The first failing check decides the error.
    pub fn parse(filename: Option<String>, bytes: &[u8]) -> Result<Self> {
        let filename = resolve_filename(filename);

        if !has_pose_extension(&filename) {
            return Err(MergeError::InvalidExtension);
        }

        if raster::is_image(bytes) {
            return Err(MergeError::PoseIsImage);
        }

        let text = std::str::from_utf8(bytes).map_err(|_| MergeError::InvalidJson)?;
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(fields)) => Ok(PoseDocument { filename, fields }),
            _ => Err(MergeError::InvalidJson),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Store the image under [`IMAGE_KEY`], replacing any previous image
    pub fn embed(&mut self, image: &ImagePayload) {
        self.fields
            .insert(IMAGE_KEY.to_string(), Value::String(image.to_base64()));
    }

    /// Serialize with two-space indentation
    pub fn into_merged(self) -> Result<MergedPose> {
        let bytes = serde_json::to_vec_pretty(&self.fields).map_err(|_| MergeError::InvalidJson)?;
        Ok(MergedPose {
            bytes,
            filename: self.filename,
        })
    }
}
