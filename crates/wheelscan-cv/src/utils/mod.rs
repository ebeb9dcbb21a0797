//! Utility modules

pub mod draw;
pub mod image;

pub use draw::annotate;
pub use self::image::ImageUtils;
