//! Remote REST API: service trait and the reqwest-backed client.

pub mod client;

pub use client::ApiClient;

use std::{fmt::Debug, path::Path};

use async_trait::async_trait;

use crate::{
    error::Result,
    types::{
        Certificate, ChangePasswordRequest, LoginData, PurchasedPlan, UpdateProfileRequest,
        UpdatedProfile, UserProfile, VideoCategoriesResponse, VideoDetail, VideoId, VideoPage,
        WatchedStatus,
    },
};

/// Operations consumed from the backend.
#[async_trait]
pub trait ApiService: Send + Sync + Debug {
    /// Install or clear the bearer token used by authenticated calls.
    async fn set_access_token(&self, token: Option<String>);

    async fn has_access_token(&self) -> bool;

    async fn login(&self, email: &str, password: &str) -> Result<LoginData>;

    /// Returns the backend's confirmation message.
    async fn forgot_password(&self, email: &str) -> Result<String>;

    async fn change_password(&self, request: &ChangePasswordRequest) -> Result<String>;

    async fn user_details(&self) -> Result<UserProfile>;

    async fn update_profile(&self, request: &UpdateProfileRequest) -> Result<UpdatedProfile>;

    async fn purchased_plan(&self) -> Result<PurchasedPlan>;

    async fn video_categories(&self) -> Result<VideoCategoriesResponse>;

    async fn videos_by_category(&self, category: &str, page: u32) -> Result<VideoPage>;

    async fn video_detail(&self, video: VideoId) -> Result<VideoDetail>;

    async fn watched_status(&self, video: VideoId) -> Result<WatchedStatus>;

    /// Tell the backend the video was watched and understood.
    async fn report_watched(&self, video: VideoId) -> Result<WatchedStatus>;

    async fn generate_certificate(&self, category: &str) -> Result<Certificate>;

    /// Stream a file served by the backend (e.g. a certificate PDF) to `dest`.
    /// Returns the number of bytes written.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}
