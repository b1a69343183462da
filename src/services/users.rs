//! Identity and policy: registration, login, token checks and the
//! system admission gate

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use subtle::ConstantTimeEq;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{normalize_email, Action, Principal, RegisterUser, Role, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// System-level gate checked on every request before any identity check
    pub fn admit(&self, presented_key: Option<&str>) -> AppResult<()> {
        let Some(key) = presented_key.filter(|k| !k.is_empty()) else {
            return Err(AppError::Authentication("API key missing or invalid".to_string()));
        };
        if bool::from(key.as_bytes().ct_eq(self.config.api_key.as_bytes())) {
            Ok(())
        } else {
            Err(AppError::Authentication("API key missing or invalid".to_string()))
        }
    }

    /// Create a member account
    pub async fn register(&self, request: &RegisterUser) -> AppResult<User> {
        let email = normalize_email(&request.email);
        let name = request.name.trim();
        if name.is_empty() || email.is_empty() || request.password.is_empty() {
            return Err(AppError::Validation("Name, email and password are required".to_string()));
        }
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self
            .repository
            .bounded(self.repository.users.find_by_email(&email))
            .await?
            .is_some()
        {
            return Err(AppError::EmailTaken);
        }

        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email,
            password_hash: self.hash_password(&request.password)?,
            role: Role::Member,
            nim: non_blank(&request.nim),
            department: non_blank(&request.department),
            created_at: Utc::now(),
        };

        // The store's unique constraint still answers EmailTaken if a
        // concurrent registration slipped past the lookup above
        self.repository
            .bounded(self.repository.users.insert(&user))
            .await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Verify credentials and issue a session token
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AppError::Validation("Email and password are required".to_string()));
        }

        let user = self
            .repository
            .bounded(self.repository.users.find_by_email(&email))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.create_token_for_user(&user)?;
        tracing::info!(user_id = %user.id, "user logged in");
        Ok((token, user))
    }

    /// Validate a session token and, when `required` is set, the role it carries
    pub fn authorize(&self, token: &str, required: Option<Role>) -> AppResult<Principal> {
        let claims = UserClaims::from_token(token, &self.config.jwt_secret)?;
        if let Some(role) = required {
            if claims.role != role {
                return Err(AppError::Authorization(format!("{} role required", role)));
            }
        }
        Ok(claims.into())
    }

    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        UserClaims::new(
            user.id,
            user.role,
            Utc::now().timestamp(),
            self.config.jwt_expiration_hours,
        )
        .create_token(&self.config.jwt_secret)
        .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    /// All accounts (admin only)
    pub async fn list_users(&self, principal: &Principal) -> AppResult<Vec<User>> {
        principal.require(Action::ManageUsers)?;
        self.repository
            .bounded(self.repository.users.find_all())
            .await
    }

    /// Change a user's role (admin only)
    pub async fn update_role(&self, principal: &Principal, user_id: Uuid, role: &str) -> AppResult<User> {
        principal.require(Action::ManageUsers)?;
        let role: Role = role
            .parse()
            .map_err(|_| AppError::Validation("Role must be 'admin' or 'member'".to_string()))?;

        let user = self
            .repository
            .bounded(self.repository.users.update_role(user_id, role))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        tracing::info!(user_id = %user.id, role = %user.role, by = %principal.user_id, "role updated");
        Ok(user)
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
