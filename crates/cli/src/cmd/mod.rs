mod build;
mod info;
mod languages;
mod matrix;
mod sign;
mod upload;

pub use build::{BuildArgs, cmd_build};
pub use info::cmd_info;
pub use languages::cmd_languages;
pub use matrix::cmd_matrix;
pub use sign::{SignArgs, cmd_sign};
pub use upload::{UploadArgs, cmd_upload};
