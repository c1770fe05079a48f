#![allow(dead_code)]

use std::{
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use tokio::{sync::Notify, time::timeout};
use vidzpro_core::{
    ApiService, Result, SessionHandle, SessionOutput, SessionSnapshot, VidzproError,
    types::{
        Certificate, ChangePasswordRequest, LoginData, PurchasedPlan, UpdateProfileRequest,
        UpdatedProfile, UserProfile, VideoCategoriesResponse, VideoDetail, VideoId, VideoPage,
        WatchedStatus,
    },
};

#[derive(Debug, Default)]
pub struct StubState {
    pub token: Option<String>,
    pub detail: Option<VideoDetail>,
    /// `None` makes the watched-status lookup fail like a network error.
    pub watched: Option<WatchedStatus>,
    pub report_failures: u32,
    pub report_unauthenticated: bool,
    pub report_calls: u32,
    /// When set, report calls wait for this before answering.
    pub report_release: Option<Arc<Notify>>,
    pub pages: Vec<VideoPage>,
    pub page_requests: Vec<u32>,
    pub login: Option<LoginData>,
}

#[derive(Debug, Default)]
pub struct StubApi {
    pub state: Mutex<StubState>,
}

fn offline(endpoint: &str) -> VidzproError {
    VidzproError::Http {
        endpoint: endpoint.to_string(),
        status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
        body: "offline".to_string(),
    }
}

impl StubApi {
    pub fn with_video(detail: VideoDetail, watched: Option<WatchedStatus>) -> Self {
        let api = Self::default();
        {
            let mut state = api.state.lock().unwrap();
            state.detail = Some(detail);
            state.watched = watched;
        }
        api
    }

    pub fn report_calls(&self) -> u32 {
        self.state.lock().unwrap().report_calls
    }
}

pub fn detail(id: u64, is_completed: bool) -> VideoDetail {
    VideoDetail {
        id: VideoId(id),
        title: format!("Video {id}"),
        description: String::new(),
        url: format!("https://vimeo.com/{}", 1000 + id),
        key_points: "<p>1. Stay safe</p>".to_string(),
        faqs: Vec::new(),
        is_completed,
    }
}

pub fn watched(id: u64, is_completed: bool) -> WatchedStatus {
    WatchedStatus {
        video_id: VideoId(id),
        video_title: format!("Video {id}"),
        is_completed,
        completed_at: is_completed.then(|| "2025-03-01 10:00:00".to_string()),
    }
}

#[async_trait]
impl ApiService for StubApi {
    async fn set_access_token(&self, token: Option<String>) {
        self.state.lock().unwrap().token = token;
    }

    async fn has_access_token(&self) -> bool {
        self.state.lock().unwrap().token.is_some()
    }

    async fn login(&self, email: &str, _password: &str) -> Result<LoginData> {
        let login = self.state.lock().unwrap().login.clone();
        login.ok_or_else(|| VidzproError::Rejected {
            endpoint: "login".into(),
            message: format!("Invalid credentials for {email}"),
        })
    }

    async fn forgot_password(&self, email: &str) -> Result<String> {
        Ok(format!("Reset link sent to {email}"))
    }

    async fn change_password(&self, _request: &ChangePasswordRequest) -> Result<String> {
        Ok("Password changed successfully".into())
    }

    async fn user_details(&self) -> Result<UserProfile> {
        Err(offline("user-details"))
    }

    async fn update_profile(&self, request: &UpdateProfileRequest) -> Result<UpdatedProfile> {
        Ok(UpdatedProfile {
            id: 1,
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            name: format!("{} {}", request.first_name, request.last_name),
            phone: Some(request.phone.clone()),
        })
    }

    async fn purchased_plan(&self) -> Result<PurchasedPlan> {
        Err(offline("user/purchased-plan"))
    }

    async fn video_categories(&self) -> Result<VideoCategoriesResponse> {
        Err(offline("get-video-categories"))
    }

    async fn videos_by_category(&self, _category: &str, page: u32) -> Result<VideoPage> {
        let mut state = self.state.lock().unwrap();
        state.page_requests.push(page);
        state
            .pages
            .iter()
            .find(|p| p.current_page == page)
            .cloned()
            .ok_or_else(|| offline("videos-by-category"))
    }

    async fn video_detail(&self, video: VideoId) -> Result<VideoDetail> {
        self.state
            .lock()
            .unwrap()
            .detail
            .clone()
            .filter(|d| d.id == video)
            .ok_or_else(|| VidzproError::Rejected {
                endpoint: "videos".into(),
                message: "Video fetch failed".into(),
            })
    }

    async fn watched_status(&self, _video: VideoId) -> Result<WatchedStatus> {
        self.state
            .lock()
            .unwrap()
            .watched
            .clone()
            .ok_or_else(|| offline("videos-watched-status"))
    }

    async fn report_watched(&self, video: VideoId) -> Result<WatchedStatus> {
        let release = {
            let mut state = self.state.lock().unwrap();
            state.report_calls += 1;
            state.report_release.clone()
        };
        if let Some(release) = release {
            release.notified().await;
        }

        let mut state = self.state.lock().unwrap();
        if state.report_unauthenticated {
            return Err(VidzproError::Unauthenticated {
                reason: "Unauthorized - please login again".into(),
            });
        }
        if state.report_failures > 0 {
            state.report_failures -= 1;
            return Err(offline("videos-watched-status"));
        }
        Ok(watched(video.0, true))
    }

    async fn generate_certificate(&self, category: &str) -> Result<Certificate> {
        Ok(Certificate {
            file_url: format!("https://files.example.com/{category}.pdf"),
            message: "Certificate generated".into(),
        })
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let body = format!("%PDF stub for {url}");
        tokio::fs::write(dest, body.as_bytes()).await?;
        Ok(body.len() as u64)
    }
}

pub async fn wait_for_output<F>(handle: &mut SessionHandle, pred: F) -> SessionOutput
where
    F: Fn(&SessionOutput) -> bool,
{
    timeout(Duration::from_secs(2), async {
        loop {
            let output = handle.next_output().await.expect("session outputs closed");
            if pred(&output) {
                return output;
            }
        }
    })
    .await
    .expect("expected session output never arrived")
}

pub async fn wait_for_snapshot<F>(handle: &SessionHandle, pred: F) -> SessionSnapshot
where
    F: Fn(&SessionSnapshot) -> bool,
{
    timeout(Duration::from_secs(2), async {
        loop {
            let snapshot = handle.next_snapshot().await;
            if pred(&snapshot) {
                return snapshot;
            }
        }
    })
    .await
    .expect("expected session snapshot never arrived")
}
