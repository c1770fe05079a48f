//! Sign-in, sign-out and account forms.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    api::ApiService,
    error::{Result, VidzproError},
    storage::{ACCESS_TOKEN_KEY, KeyValueStore},
    types::{ChangePasswordRequest, LoginData, UpdateProfileRequest, UpdatedProfile},
};

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(VidzproError::validation(
            "credentials",
            "Please enter both email and password.",
        ));
    }
    Ok(())
}

pub fn validate_password_change(request: &ChangePasswordRequest) -> Result<()> {
    if request.current_password.trim().is_empty() {
        return Err(VidzproError::validation(
            "current_password",
            "Current password is required",
        ));
    }
    if request.new_password.trim().is_empty() {
        return Err(VidzproError::validation(
            "new_password",
            "New password is required",
        ));
    }
    if request.new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(VidzproError::validation(
            "new_password",
            format!("New password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if request.confirm_password.trim().is_empty() {
        return Err(VidzproError::validation(
            "confirm_password",
            "Please confirm your new password",
        ));
    }
    if request.new_password != request.confirm_password {
        return Err(VidzproError::validation(
            "confirm_password",
            "Passwords do not match",
        ));
    }
    Ok(())
}

pub fn validate_profile(request: &UpdateProfileRequest) -> Result<()> {
    if request.first_name.trim().is_empty() {
        return Err(VidzproError::validation("first_name", "First name is required"));
    }
    if request.last_name.trim().is_empty() {
        return Err(VidzproError::validation("last_name", "Last name is required"));
    }
    Ok(())
}

/// Keeps the client's bearer token and the persisted token in step.
#[derive(Debug)]
pub struct AuthService<A: ?Sized, S: ?Sized> {
    api: Arc<A>,
    store: Arc<S>,
}

impl<A, S> AuthService<A, S>
where
    A: ApiService + ?Sized,
    S: KeyValueStore + ?Sized,
{
    pub fn new(api: Arc<A>, store: Arc<S>) -> Self {
        Self { api, store }
    }

    /// Install a previously stored token. Returns whether one was found.
    pub async fn restore(&self) -> bool {
        match self.store.get(ACCESS_TOKEN_KEY).await {
            Ok(Some(token)) if !token.is_empty() => {
                self.api.set_access_token(Some(token)).await;
                true
            }
            Ok(_) => false,
            Err(e) => {
                warn!(error = %e, "could not read stored access token");
                false
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginData> {
        validate_credentials(email, password)?;
        let data = self.api.login(email.trim(), password).await?;

        self.api
            .set_access_token(Some(data.access_token.clone()))
            .await;
        if let Err(e) = self.store.set(ACCESS_TOKEN_KEY, &data.access_token).await {
            warn!(error = %e, "signed in but token could not be persisted");
        }
        info!(user_id = data.user_id, "signed in");
        Ok(data)
    }

    pub async fn logout(&self) -> Result<()> {
        self.api.set_access_token(None).await;
        self.store.remove(ACCESS_TOKEN_KEY).await?;
        info!("signed out");
        Ok(())
    }

    pub async fn forgot_password(&self, email: &str) -> Result<String> {
        let email = email.trim();
        if email.is_empty() {
            return Err(VidzproError::validation("email", "Please enter your email"));
        }
        self.api.forgot_password(email).await
    }

    pub async fn change_password(&self, request: &ChangePasswordRequest) -> Result<String> {
        validate_password_change(request)?;
        self.api.change_password(request).await
    }

    pub async fn update_profile(&self, request: &UpdateProfileRequest) -> Result<UpdatedProfile> {
        validate_profile(request)?;
        self.api.update_profile(request).await
    }
}
