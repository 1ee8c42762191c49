pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod pose;
pub mod raster;
pub mod server;

pub use error::MergeError;
pub use pipeline::{merge, Source, Upload};
pub use pose::MergedPose;
