use super::WebError;
use crate::pipeline::{Source, Upload};
use actix_multipart::Multipart;
use anyhow::anyhow;
use futures::TryStreamExt;
use tracing::debug;

pub const IMAGE_URL: &str = "image_url";
pub const IMAGE_FILE: &str = "image_file";
pub const POSE_URL: &str = "pose_url";
pub const POSE_FILE: &str = "pose_file";

/// The fields of a `/process` form submission
#[derive(Debug, Default)]
pub struct ProcessForm {
    pub image_url: Option<String>,
    pub image_file: Option<Upload>,
    pub pose_url: Option<String>,
    pub pose_file: Option<Upload>,
}

impl ProcessForm {
    /// Drain a multipart body. Unknown fields are read and dropped; any field
    /// larger than `max_bytes` fails the whole request
    pub async fn read(mut payload: Multipart, max_bytes: usize) -> Result<Self, WebError> {
        let mut form = ProcessForm::default();

        while let Some(mut field) = payload.try_next().await? {
            let (name, filename) = {
                let disposition = field.content_disposition();
                (
                    disposition.get_name().unwrap_or_default().to_string(),
                    disposition.get_filename().map(str::to_string),
                )
            };

            let mut bytes: Vec<u8> = Vec::new();
            while let Some(chunk) = field.try_next().await? {
                if bytes.len() + chunk.len() > max_bytes {
                    return Err(anyhow!("{name} exceeds the upload limit of {max_bytes} bytes").into());
                }
                bytes.extend_from_slice(&chunk);
            }

            match name.as_str() {
                IMAGE_URL => form.image_url = Some(String::from_utf8_lossy(&bytes).into_owned()),
                POSE_URL => form.pose_url = Some(String::from_utf8_lossy(&bytes).into_owned()),
                IMAGE_FILE => form.image_file = Some(Upload { filename, bytes }),
                POSE_FILE => form.pose_file = Some(Upload { filename, bytes }),
                _ => debug!("ignoring form field {name:?}"),
            }
        }

        Ok(form)
    }

    /// The image and pose sources, in that order
    pub fn into_sources(self) -> (Option<Source>, Option<Source>) {
        (
            Source::select(self.image_file, self.image_url.as_deref()),
            Source::select(self.pose_file, self.pose_url.as_deref()),
        )
    }
}
