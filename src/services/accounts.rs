//! Registration, login and profile lookup.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::NewUser;
use crate::services::auth::{hash_password, verify_password, AuthError, AuthService};
use crate::services::views::UserProfile;
use crate::store::{StoreError, UserStore};
use crate::{Result, ShopError};

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "password must have at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

impl RegisterRequest {
    /// Trims the name and canonicalizes the email. The password is kept as typed.
    pub fn normalized(self) -> Self {
        Self { name: self.name.trim().to_string(), email: normalize_email(&self.email), password: self.password }
    }
}

impl LoginRequest {
    pub fn normalized(self) -> Self {
        Self { email: normalize_email(&self.email), password: self.password }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

pub struct AccountService<'a> {
    users: &'a dyn UserStore,
    auth: &'a AuthService,
}

impl<'a> AccountService<'a> {
    pub fn new(users: &'a dyn UserStore, auth: &'a AuthService) -> Self {
        Self { users, auth }
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<TokenResponse> {
        let request = request.normalized();
        request.validate()?;
        let password_hash = hash_password(&request.password)?;
        let new_user = NewUser { name: request.name, email: request.email, password_hash };

        let user = self.users.create(new_user).await.map_err(|e| match e {
            StoreError::Duplicate(_) => ShopError::Conflict("email already registered".into()),
            other => other.into(),
        })?;
        info!(user_id = %user.id, "User registered");

        Ok(TokenResponse { token: self.auth.issue(user.id)? })
    }

    /// Unknown email and wrong password fail with the same error.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<TokenResponse> {
        let request = request.normalized();
        request.validate()?;
        let user = self
            .users
            .find_by_email(&request.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(&request.password, &user.password_hash)?;

        Ok(TokenResponse { token: self.auth.issue(user.id)? })
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| ShopError::NotFound(format!("user {user_id}")))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
