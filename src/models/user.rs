//! User model, roles, session claims and the authorization policy

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// Issuer embedded in and required from every session token
pub const TOKEN_ISSUER: &str = "lendings-server";

/// User roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }

    /// Action-to-role matrix. Ownership of the data an action touches
    /// ("own data only") is checked separately, see [`Principal::can_act_for`].
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::ViewItems | Action::Borrow | Action::Return | Action::ViewOwnHistory => true,
            Action::ManageItems
            | Action::ViewAllLendings
            | Action::ManageUsers
            | Action::Reconcile => *self == Role::Admin,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

// SQLx conversion for Role (stored as text)
impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Operations gated by the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ViewItems,
    ManageItems,
    Borrow,
    Return,
    ViewOwnHistory,
    ViewAllLendings,
    ManageUsers,
    Reconcile,
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Always trimmed and lowercase
    pub email: String,
    /// Argon2 hash, never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    /// Student number
    pub nim: Option<String>,
    pub department: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Self-registration request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterUser {
    pub name: String,
    pub email: String,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: String,
    pub nim: Option<String>,
    pub department: Option<String>,
}

/// Lowercase and trim an email so lookups and uniqueness are case-insensitive
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Change role request (admin only)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRole {
    /// `admin` or `member`
    pub role: String,
}

/// JWT claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: Uuid,
    pub role: Role,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    pub fn new(user_id: Uuid, role: Role, issued_at: i64, ttl_hours: u64) -> Self {
        Self {
            sub: user_id,
            role,
            iss: TOKEN_ISSUER.to_string(),
            exp: issued_at + (ttl_hours as i64 * 3600),
            iat: issued_at,
        }
    }

    /// Create a new signed (HS256) token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Verify signature, issuer and expiry
    pub fn from_token(token: &str, secret: &str) -> Result<Self, AppError> {
        use jsonwebtoken::{decode, errors::ErrorKind, DecodingKey, Validation};

        let mut validation = Validation::default();
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.leeway = 0;

        decode::<Self>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::InvalidToken,
            })
    }
}

/// Authorization result threaded explicitly into every guarded operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

impl From<UserClaims> for Principal {
    fn from(claims: UserClaims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require(&self, action: Action) -> Result<(), AppError> {
        if self.role.allows(action) {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Administrator privileges required".to_string(),
            ))
        }
    }

    /// Admins act on anyone's data, members only on their own
    pub fn can_act_for(&self, owner: Uuid) -> bool {
        self.is_admin() || self.user_id == owner
    }
}
