//! Images Module
//!
//! The upload and list paths plus the file-name allow-list.

mod file_name;
mod service;

pub use file_name::{FileName, FileNameError, MAX_FILE_NAME_LEN};
pub use service::{ImageError, ImageService};
