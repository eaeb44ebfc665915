pub mod digest;
pub mod message;
pub mod payload;

pub use digest::build_digest;
pub use message::{RenderError, render};
pub use payload::NotificationKind;
