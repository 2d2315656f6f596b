use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::db::MessageRow;
use crate::error::AppError;

/// Appended to image-bearing messages when they are sent to a text-only model.
pub const IMAGE_MARKER: &str = " [Image attached]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(AppError::Internal(format!("unknown message role {:?}", other))),
        }
    }
}

/// One entry of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    Text {
        role: Role,
        content: String,
    },
    /// `image` is the base64 payload of a PNG or JPEG.
    ImageAnnotated {
        role: Role,
        content: String,
        image: String,
    },
}

impl Message {
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Message::Text {
            role,
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Message::Text { role, .. } | Message::ImageAnnotated { role, .. } => *role,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::Text { content, .. } | Message::ImageAnnotated { content, .. } => content,
        }
    }

    pub fn image(&self) -> Option<&str> {
        match self {
            Message::Text { .. } => None,
            Message::ImageAnnotated { image, .. } => Some(image),
        }
    }

    /// The text the completion endpoint sees for this message.
    pub fn api_content(&self) -> Cow<'_, str> {
        match self {
            Message::Text { content, .. } => Cow::Borrowed(content),
            Message::ImageAnnotated { content, .. } => {
                Cow::Owned(format!("{}{}", content, IMAGE_MARKER))
            }
        }
    }
}

impl TryFrom<MessageRow> for Message {
    type Error = AppError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let role = row.role.parse()?;
        Ok(match row.image {
            Some(image) => Message::ImageAnnotated {
                role,
                content: row.content,
                image,
            },
            None => Message::Text {
                role,
                content: row.content,
            },
        })
    }
}

/// Decode a base64 image upload and check it is a PNG or JPEG.
pub fn validate_image(encoded: &str) -> Result<String, AppError> {
    let encoded = encoded.trim();
    let bytes = base64_simd::STANDARD
        .decode_to_vec(encoded)
        .map_err(|_| AppError::validation("image is not valid base64"))?;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G'];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];

    if bytes.starts_with(PNG) || bytes.starts_with(JPEG) {
        Ok(encoded.to_string())
    } else {
        Err(AppError::validation("image must be a PNG or JPEG"))
    }
}
