//! Message boundary with the embedded video player runtime.

use serde::{Deserialize, Serialize};

use crate::format::vimeo_id;

/// Messages posted by the player. Tags follow the player script's camelCase names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlayerEvent {
    Loaded { duration: f64 },
    #[serde(rename = "timeupdate")]
    TimeUpdate { seconds: f64 },
    /// Percentage already derived by the player script.
    Progress { percent: f64 },
    VideoEnded,
    Play,
    Pause,
}

impl PlayerEvent {
    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum PlayerCommand {
    /// (Re)load the source from the beginning.
    Load { source: PlayerSource },
    SeekTo { seconds: f64 },
    Play,
    Pause,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSource {
    pub url: String,
    pub vimeo_id: Option<String>,
}

impl PlayerSource {
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let vimeo_id = vimeo_id(&url);
        Self { url, vimeo_id }
    }

    /// Embeddable player URL with controls enabled and autoplay off.
    pub fn embed_url(&self) -> String {
        match &self.vimeo_id {
            Some(id) => format!(
                "https://player.vimeo.com/video/{}?api=1&autoplay=0&muted=0&controls=1",
                id
            ),
            None => self.url.clone(),
        }
    }
}
