//! The merge pipeline: resolve both inputs, validate them, and embed the image
//! into the pose file.

use crate::error::{MergeError, Result};
use crate::fetch::Fetch;
use crate::pose::{MergedPose, PoseDocument};
use crate::raster::ImagePayload;
use tracing::debug;

/// A file received in the request body
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

/// Where one input comes from
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Upload(Upload),
    Url(String),
}

impl Source {
    /// Pick the upload if it carries a filename, else a non-blank URL
    pub fn select(upload: Option<Upload>, url: Option<&str>) -> Option<Source> {
        let url = url.map(str::trim).filter(|url| !url.is_empty());
        match (upload, url) {
            (Some(upload), _) if upload.filename.as_deref().map_or(false, |n| !n.is_empty()) => {
                Some(Source::Upload(upload))
            }
            (_, Some(url)) => Some(Source::Url(url.to_string())),
            _ => None,
        }
    }

    /// Read the bytes, fetching them if this is a URL. Returns the filename
    /// the source suggests along with the bytes
    async fn resolve<F: Fetch + ?Sized>(self, fetcher: &F) -> Result<(Vec<u8>, Option<String>)> {
        match self {
            Source::Upload(upload) => Ok((upload.bytes, upload.filename)),
            Source::Url(url) => {
                let fetched = fetcher.fetch(&url).await?;
                Ok((fetched.bytes, Some(fetched.filename)))
            }
        }
    }
}

/// Validate `image` and embed it into `pose`.
///
/// The image is resolved and validated before the pose source is touched, so
/// a bad image never causes the pose URL to be fetched.
pub async fn merge<F: Fetch + ?Sized>(
    fetcher: &F,
    image: Option<Source>,
    pose: Option<Source>,
) -> Result<MergedPose> {
    let (image_bytes, _) = image.ok_or(MergeError::MissingImage)?.resolve(fetcher).await?;
    let image = ImagePayload::new(image_bytes)?;
    debug!("image validated: {image:?}");

    let (pose_bytes, pose_filename) = pose.ok_or(MergeError::MissingPose)?.resolve(fetcher).await?;
    let mut pose = PoseDocument::parse(pose_filename, &pose_bytes)?;
    pose.embed(&image);

    pose.into_merged()
}
