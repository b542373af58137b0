use bson::DateTime;
use bson::oid::ObjectId;
use chrono::Utc;
use database::mongodb::Entity;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Page size used when the caller asks for none.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Upper bound on page size unless configured otherwise.
pub const MAX_PAGE_SIZE: u64 = 100;

/// User document as stored in the `users` collection.
///
/// `id` and both timestamps are assigned by the repository; values set here
/// are ignored on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub name: String,
    /// Argon2 PHC string
    #[serde(rename = "pass")]
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<DateTime>,
    #[serde(
        rename = "updated_created",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub date_updated: Option<DateTime>,
}

impl Entity for User {}

impl User {
    pub fn new(email: impl Into<String>, name: impl Into<String>, password_hash: String) -> Self {
        Self {
            id: None,
            email: email.into(),
            name: name.into(),
            password_hash,
            date_created: None,
            date_updated: None,
        }
    }

    /// Hex identity, empty until the user has been stored.
    pub fn id_hex(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }

    pub(crate) fn apply_update(&mut self, input: UpdateUser, password_hash: Option<String>) {
        if let Some(email) = input.email {
            self.email = email;
        }
        if let Some(name) = input.name {
            self.name = name;
        }
        if let Some(hash) = password_hash {
            self.password_hash = hash;
        }
    }
}

/// User as returned to HTTP callers. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    /// 24-character hex identity
    #[schema(example = "65f1c0a2b4d3e2f1a0b9c8d7")]
    pub id: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    pub date_created: Option<chrono::DateTime<Utc>>,
    pub date_updated: Option<chrono::DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id_hex(),
            email: user.email,
            name: user.name,
            date_created: user.date_created.map(DateTime::to_chrono),
            date_updated: user.date_updated.map(DateTime::to_chrono),
        }
    }
}

/// Body of `POST /users`.
///
/// A missing password is replaced by a generated one.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewUser {
    #[validate(email(message = "must be a valid email address"))]
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[validate(length(min = 8, max = 128, message = "must be between 8 and 128 characters"))]
    #[serde(default)]
    pub password: Option<String>,
}

/// Body of `PUT /users/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(email(message = "must be a valid email address"))]
    #[serde(default)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    #[serde(default)]
    pub name: Option<String>,
    #[validate(length(min = 8, max = 128, message = "must be between 8 and 128 characters"))]
    #[serde(default)]
    pub password: Option<String>,
}

/// Query string of `GET /users`. Out-of-range values are normalized, not rejected.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// 1-based page number (default 1)
    pub page: Option<i64>,
    /// Page size (default 10, capped at the configured maximum)
    pub limit: Option<i64>,
}

/// Page and size after normalization, plus the collection total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
}

impl Pagination {
    /// `page < 1` becomes 1, `limit < 1` becomes [`DEFAULT_PAGE_SIZE`] and
    /// `limit > max` becomes `max`.
    pub fn normalize(page: i64, limit: i64, max: u64) -> Self {
        let max = max.max(1);
        let page = u64::try_from(page).ok().filter(|p| *p >= 1).unwrap_or(1);
        let limit = u64::try_from(limit)
            .ok()
            .filter(|l| *l >= 1)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(max);

        Self {
            page,
            limit,
            total: 0,
        }
    }
}

/// Response of `GET /users`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserPage {
    pub data: Vec<UserResponse>,
    pub pagination: Pagination,
}
