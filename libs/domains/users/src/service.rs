use argon2::{
    Argon2,
    password_hash::{
        PasswordHasher, SaltString,
        rand_core::{OsRng, RngCore},
    },
};
use database::OperationContext;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::error::{UserError, UserResult};
use crate::models::{MAX_PAGE_SIZE, NewUser, Pagination, UpdateUser, User};
use crate::repository::UserRepository;

const PASSWORD_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const GENERATED_PASSWORD_LEN: usize = 12;

/// Service layer for User business logic
///
/// Email uniqueness is a read-then-insert check. Two concurrent creates with
/// the same email can both pass it; a unique index on `email` is the only
/// store-side guard.
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
    max_page_size: u64,
}

impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            max_page_size: self.max_page_size,
        }
    }
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
            max_page_size: MAX_PAGE_SIZE,
        }
    }

    /// Caps `limit` in [`UserService::list`]
    pub fn with_max_page_size(mut self, max_page_size: u64) -> Self {
        self.max_page_size = max_page_size.max(1);
        self
    }

    pub fn max_page_size(&self) -> u64 {
        self.max_page_size
    }

    pub async fn get_by_id(&self, ctx: &OperationContext, id: &str) -> UserResult<User> {
        self.repository.find_by_id(ctx, id).await
    }

    pub async fn get_by_email(&self, ctx: &OperationContext, email: &str) -> UserResult<User> {
        self.repository.find_by_email(ctx, email.trim()).await
    }

    /// One page of users plus the collection total.
    ///
    /// Page and limit are normalized first, so `list(ctx, 0, -5)` reads page 1
    /// with 10 entries.
    #[instrument(skip(self, ctx))]
    pub async fn list(
        &self,
        ctx: &OperationContext,
        page: i64,
        limit: i64,
    ) -> UserResult<(Vec<User>, Pagination)> {
        let mut pagination = Pagination::normalize(page, limit, self.max_page_size);

        let users = self
            .repository
            .find_all(ctx, pagination.page, pagination.limit)
            .await?;
        pagination.total = self.repository.count(ctx).await?;

        Ok((users, pagination))
    }

    /// Creates a user and returns it as stored.
    ///
    /// Fails with `DuplicateEmail` when the pre-check finds the email taken.
    /// Without a password a random one is generated; either way only the
    /// argon2 hash is persisted. Once the insert succeeds no further store
    /// call is made.
    #[instrument(skip(self, ctx, input), fields(email = %input.email))]
    pub async fn create(&self, ctx: &OperationContext, mut input: NewUser) -> UserResult<User> {
        input.email = input.email.trim().to_string();
        input.validate()?;

        self.ensure_email_available(ctx, &input.email).await?;

        let password = match input.password {
            Some(password) => password,
            None => generate_password(),
        };
        let password_hash = hash_password(&password)?;

        let user = self
            .repository
            .create(ctx, &User::new(input.email, input.name, password_hash))
            .await?;
        info!(user_id = %user.id_hex(), "User created");

        Ok(user)
    }

    /// Applies the present fields of `input` and returns the stored user.
    #[instrument(skip(self, ctx, input))]
    pub async fn update(
        &self,
        ctx: &OperationContext,
        id: &str,
        mut input: UpdateUser,
    ) -> UserResult<User> {
        if let Some(email) = input.email.as_mut() {
            *email = email.trim().to_string();
        }
        input.validate()?;

        let mut user = self.repository.find_by_id(ctx, id).await?;
        if let Some(email) = input.email.as_deref() {
            if email != user.email {
                self.ensure_email_available(ctx, email).await?;
            }
        }

        let password_hash = match input.password.as_deref() {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        user.apply_update(input, password_hash);
        self.repository.update(ctx, id, &user).await?;
        info!(user_id = %id, "User updated");

        self.repository.find_by_id(ctx, id).await
    }

    pub async fn delete(&self, ctx: &OperationContext, id: &str) -> UserResult<()> {
        self.repository.delete(ctx, id).await
    }

    pub async fn count(&self, ctx: &OperationContext) -> UserResult<u64> {
        self.repository.count(ctx).await
    }

    /// `NotFound` from the lookup means the email is free; any other error aborts.
    async fn ensure_email_available(&self, ctx: &OperationContext, email: &str) -> UserResult<()> {
        match self.repository.find_by_email(ctx, email).await {
            Ok(_) => Err(UserError::DuplicateEmail(email.to_string())),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Argon2id with a fresh random salt, as a PHC string.
pub fn hash_password(password: &str) -> UserResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash(e.to_string()))
}

/// Uniform over [`PASSWORD_CHARSET`]; bytes past the last full multiple of
/// the charset size are rejected.
fn generate_password() -> String {
    let accept_below = 256 - (256 % PASSWORD_CHARSET.len());
    let mut password = String::with_capacity(GENERATED_PASSWORD_LEN);
    let mut buf = [0u8; 32];

    while password.len() < GENERATED_PASSWORD_LEN {
        OsRng.fill_bytes(&mut buf);
        for byte in buf.iter().map(|b| usize::from(*b)) {
            if byte < accept_below && password.len() < GENERATED_PASSWORD_LEN {
                password.push(char::from(PASSWORD_CHARSET[byte % PASSWORD_CHARSET.len()]));
            }
        }
    }

    password
}
