//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the application core and an
//! external system. Implementations live in `src/adapters/`.

pub mod asset_uploader;
pub mod krea_api;

pub use asset_uploader::AssetUploader;
pub use krea_api::KreaApi;
