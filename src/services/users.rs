//! Account management and authentication service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    config::UsersConfig,
    error::{AppError, AppResult},
    models::user::{RegisterForm, User},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: UsersConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: UsersConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate a user by email and password.
    ///
    /// Unknown email and wrong password fail with the same message so the
    /// response cannot be used to enumerate accounts.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<User> {
        let user = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Incorrect email or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication(
                "Incorrect email or password".to_string(),
            ));
        }

        Ok(user)
    }

    /// Register a new account.
    ///
    /// Administrator rights are never self-service: the flag is set only
    /// when the email is on the configured allow-list.
    pub async fn register(&self, form: &RegisterForm) -> AppResult<User> {
        if self.repository.users.email_exists(&form.email).await? {
            return Err(AppError::Conflict(format!(
                "Email {} is already registered",
                form.email
            )));
        }

        let password_hash = self.hash_password(&form.password)?;
        let is_admin = self.is_allow_listed(&form.email);

        self.repository
            .users
            .create(&form.name, &form.email, &password_hash, is_admin)
            .await
    }

    /// Promote already-registered users on the admin allow-list.
    ///
    /// Run at startup so that adding an email to the list and redeploying is
    /// the out-of-band promotion step.
    pub async fn sync_admins(&self) -> AppResult<()> {
        for email in &self.config.admin_emails {
            if self.repository.users.set_admin(email, true).await? > 0 {
                tracing::info!("Granted administrator rights to {}", email);
            }
        }
        Ok(())
    }

    fn is_allow_listed(&self, email: &str) -> bool {
        self.config
            .admin_emails
            .iter()
            .any(|e| e.eq_ignore_ascii_case(email))
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password with argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

        Ok(hash.to_string())
    }
}
