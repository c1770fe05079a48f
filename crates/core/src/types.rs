use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Key of a remote video record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub u64);

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for VideoId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// The backend spells its status flags as `1`, `"1"` or `true` depending on the endpoint.
pub fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(n)) => n == 1,
        Some(Flag::Text(s)) => matches!(s.trim(), "1" | "true"),
        None => false,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(deserialize_with = "deserialize_flag", default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<LoginData>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginData {
    pub user_id: u64,
    pub name: String,
    pub email: String,
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

/// Shape shared by the password endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(deserialize_with = "deserialize_flag", default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Standard `{ status, message, data }` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(deserialize_with = "deserialize_flag", default)]
    pub status: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateProfileRequest {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdatedProfile {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchasedPlan {
    #[serde(deserialize_with = "deserialize_flag", default)]
    pub status: bool,
    #[serde(default)]
    pub message: String,
    pub subscription: Option<Subscription>,
    pub subscription_image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoCategory {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoCategoriesResponse {
    #[serde(deserialize_with = "deserialize_flag", default)]
    pub status: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Vec<VideoCategory>,
    #[serde(default)]
    pub iso: Vec<VideoCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRequest {
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Video {
    pub id: VideoId,
    pub video_title: String,
    #[serde(default)]
    pub description: String,
    pub video_url: String,
    #[serde(default)]
    pub video_thumbnail: String,
    #[serde(default)]
    pub assign_date: String,
    #[serde(deserialize_with = "deserialize_flag", default)]
    pub is_completed: bool,
    pub completed_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoPage {
    pub current_page: u32,
    pub last_page: u32,
    #[serde(default)]
    pub data: Vec<Video>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoIdRequest {
    pub video_id: VideoId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoDetail {
    pub id: VideoId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub key_points: String,
    #[serde(default)]
    pub faqs: Vec<serde_json::Value>,
    #[serde(deserialize_with = "deserialize_flag", default)]
    pub is_completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchedStatus {
    pub video_id: VideoId,
    #[serde(default)]
    pub video_title: String,
    #[serde(deserialize_with = "deserialize_flag", default)]
    pub is_completed: bool,
    #[serde(rename = "completed_At", alias = "completed_at", default)]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateResponse {
    #[serde(deserialize_with = "deserialize_flag", default)]
    pub status: bool,
    #[serde(default)]
    pub message: String,
    pub file_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Certificate {
    pub file_url: String,
    pub message: String,
}
