pub mod client;
pub mod html;
pub mod message;
pub mod mode;

pub use client::{ChatClient, ChatError};
pub use html::{contains_html, extract_html, Segment};
pub use message::{validate_image, Message, Role, IMAGE_MARKER};
pub use mode::ChatMode;
