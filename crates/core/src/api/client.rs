use std::{fmt, path::Path, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tokio::{fs, io::AsyncWriteExt, sync::RwLock};
use tracing::{debug, info, warn};

use crate::{
    api::ApiService,
    config::ApiConfig,
    error::{Result, VidzproError},
    types::{
        CategoryRequest, Certificate, CertificateResponse, ChangePasswordRequest, EmailRequest,
        Envelope, LoginData, LoginRequest, LoginResponse, MessageResponse, PurchasedPlan,
        UpdateProfileRequest, UpdatedProfile, UserProfile, VideoCategoriesResponse, VideoDetail,
        VideoId, VideoIdRequest, VideoPage, WatchedStatus,
    },
};

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// HTTP client for the vidzpro backend. Cheap to clone; clones share the token.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field(
                "has_token",
                &self.token.try_read().map(|t| t.is_some()).unwrap_or(false),
            )
            .finish()
    }
}

/// Add a scheme when missing and drop trailing slashes.
fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    let normalized = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    if normalized != raw {
        debug!(from = raw, to = %normalized, "normalized base URL");
    }
    normalized
}

fn envelope_data<T>(endpoint: &str, envelope: Envelope<T>) -> Result<T> {
    if !envelope.status {
        return Err(rejected(endpoint, envelope.message));
    }
    envelope.data.ok_or_else(|| VidzproError::MalformedResponse {
        endpoint: endpoint.to_string(),
        reason: "response has no data".to_string(),
    })
}

fn rejected(endpoint: &str, message: String) -> VidzproError {
    let message = if message.trim().is_empty() {
        GENERIC_FAILURE.to_string()
    } else {
        message
    };
    VidzproError::Rejected {
        endpoint: endpoint.to_string(),
        message,
    }
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = normalize_base_url(&config.base_url);
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!(%base_url, "creating API client");

        Ok(Self {
            client,
            base_url,
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    fn post_json<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> RequestBuilder {
        self.client
            .post(self.build_url(endpoint))
            .header("Accept", "application/json")
            .json(body)
    }

    async fn authorize(&self, endpoint: &str, request: RequestBuilder) -> Result<RequestBuilder> {
        match self.token.read().await.as_deref() {
            Some(token) => Ok(request.bearer_auth(token)),
            None => {
                warn!(endpoint, "no access token for authenticated request");
                Err(VidzproError::Unauthenticated {
                    reason: "Token not found. Please login again.".to_string(),
                })
            }
        }
    }

    async fn execute<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
        authenticated: bool,
    ) -> Result<R> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED && authenticated {
            *self.token.write().await = None;
            return Err(VidzproError::Unauthenticated {
                reason: "Unauthorized - please login again".to_string(),
            });
        }

        let body = response.bytes().await?;

        if !status.is_success() {
            // Unauthenticated endpoints report bad credentials as a normal error body.
            if let Ok(parsed) = serde_json::from_slice::<MessageResponse>(&body)
                && !parsed.message.is_empty()
                && status.is_client_error()
            {
                return Err(rejected(endpoint, parsed.message));
            }
            return Err(VidzproError::Http {
                endpoint: endpoint.to_string(),
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        serde_json::from_slice(&body).map_err(|e| {
            warn!(endpoint, error = %e, "could not decode response");
            VidzproError::MalformedResponse {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
        })
    }

    async fn post_public<B, R>(&self, endpoint: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!(endpoint, "POST");
        self.execute(endpoint, self.post_json(endpoint, body), false)
            .await
    }

    async fn post_authed<B, R>(&self, endpoint: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!(endpoint, "POST (authenticated)");
        let request = self.authorize(endpoint, self.post_json(endpoint, body)).await?;
        self.execute(endpoint, request, true).await
    }
}

#[async_trait]
impl ApiService for ApiClient {
    async fn set_access_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    async fn has_access_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginData> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.post_public("login", &request).await?;
        match response.data {
            Some(data) if response.success => Ok(data),
            _ => Err(rejected("login", response.message)),
        }
    }

    async fn forgot_password(&self, email: &str) -> Result<String> {
        let request = EmailRequest {
            email: email.to_string(),
        };
        let response: MessageResponse = self.post_public("forgot-password", &request).await?;
        if response.success {
            Ok(response.message)
        } else {
            Err(rejected("forgot-password", response.message))
        }
    }

    async fn change_password(&self, request: &ChangePasswordRequest) -> Result<String> {
        let response: MessageResponse = self.post_authed("change-password", request).await?;
        if response.success {
            Ok(response.message)
        } else {
            Err(rejected("change-password", response.message))
        }
    }

    async fn user_details(&self) -> Result<UserProfile> {
        let envelope: Envelope<UserProfile> =
            self.post_authed("user-details", &serde_json::json!({})).await?;
        envelope_data("user-details", envelope)
    }

    async fn update_profile(&self, request: &UpdateProfileRequest) -> Result<UpdatedProfile> {
        let envelope: Envelope<UpdatedProfile> = self.post_authed("user/update", request).await?;
        envelope_data("user/update", envelope)
    }

    async fn purchased_plan(&self) -> Result<PurchasedPlan> {
        let plan: PurchasedPlan = self
            .post_authed("user/purchased-plan", &serde_json::json!({}))
            .await?;
        if plan.status {
            Ok(plan)
        } else {
            Err(rejected("user/purchased-plan", plan.message))
        }
    }

    async fn video_categories(&self) -> Result<VideoCategoriesResponse> {
        let response: VideoCategoriesResponse = self
            .post_authed("get-video-categories", &serde_json::json!({}))
            .await?;
        if response.status {
            Ok(response)
        } else {
            Err(rejected("get-video-categories", response.message))
        }
    }

    async fn videos_by_category(&self, category: &str, page: u32) -> Result<VideoPage> {
        let endpoint = "videos-by-category";
        let body = CategoryRequest {
            category: category.to_string(),
        };
        let request = self
            .post_json(endpoint, &body)
            .query(&[("page", page.max(1))]);
        let request = self.authorize(endpoint, request).await?;
        debug!(endpoint, category, page, "POST (authenticated)");
        let envelope: Envelope<VideoPage> = self.execute(endpoint, request, true).await?;
        envelope_data(endpoint, envelope)
    }

    async fn video_detail(&self, video: VideoId) -> Result<VideoDetail> {
        let envelope: Envelope<VideoDetail> = self
            .post_authed("videos", &VideoIdRequest { video_id: video })
            .await?;
        envelope_data("videos", envelope)
    }

    async fn watched_status(&self, video: VideoId) -> Result<WatchedStatus> {
        let envelope: Envelope<WatchedStatus> = self
            .post_authed("videos-watched-status", &VideoIdRequest { video_id: video })
            .await?;
        envelope_data("videos-watched-status", envelope)
    }

    async fn report_watched(&self, video: VideoId) -> Result<WatchedStatus> {
        // The backend records completion on the same endpoint that reports it.
        info!(%video, "reporting video as watched");
        self.watched_status(video).await
    }

    async fn generate_certificate(&self, category: &str) -> Result<Certificate> {
        let endpoint = "generate-certificate";
        let response: CertificateResponse = self
            .post_authed(
                endpoint,
                &CategoryRequest {
                    category: category.to_string(),
                },
            )
            .await?;
        if !response.status {
            return Err(rejected(endpoint, response.message));
        }
        match response.file_url {
            Some(file_url) => Ok(Certificate {
                file_url,
                message: response.message,
            }),
            None => Err(VidzproError::MalformedResponse {
                endpoint: endpoint.to_string(),
                reason: "certificate has no file_url".to_string(),
            }),
        }
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VidzproError::Http {
                endpoint: url.to_string(),
                status,
                body,
            });
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }
        // Only a complete download is renamed onto `dest`.
        let partial = dest.with_extension("part");
        let mut file = fs::File::create(&partial).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);
        fs::rename(&partial, dest).await?;

        info!(url, path = %dest.display(), bytes = written, "file downloaded");
        Ok(written)
    }
}
