pub mod editor;
pub mod image_upload;
pub mod metrics;
