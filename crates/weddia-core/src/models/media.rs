use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text")]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    /// Derive the media type from a declared MIME type. Video MIME types map
    /// to `Video`, everything else in the allowlist is an image.
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.starts_with("video/") {
            MediaType::Video
        } else {
            MediaType::Image
        }
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MediaType::Image => write!(f, "image"),
            MediaType::Video => write!(f, "video"),
        }
    }
}

impl FromStr for MediaType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaType::Image),
            "video" => Ok(MediaType::Video),
            _ => Err(anyhow::anyhow!("Invalid media type: {}", s)),
        }
    }
}

/// One row per successfully processed file. Created only after
/// optimize+promote succeeds; never created for failed files.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Media {
    pub id: Uuid,
    pub wedding_id: Uuid,
    pub posted_user_name: String,
    pub url: String,
    pub media_type: MediaType,
    pub posted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_derivation_from_mime() {
        assert_eq!(MediaType::from_content_type("video/mp4"), MediaType::Video);
        assert_eq!(
            MediaType::from_content_type("video/quicktime"),
            MediaType::Video
        );
        assert_eq!(MediaType::from_content_type("image/jpeg"), MediaType::Image);
        assert_eq!(MediaType::from_content_type("image/gif"), MediaType::Image);
    }

    #[test]
    fn media_type_round_trips_as_text() {
        assert_eq!(MediaType::Image.to_string(), "image");
        assert_eq!("video".parse::<MediaType>().unwrap(), MediaType::Video);
        assert!("audio".parse::<MediaType>().is_err());
    }
}
