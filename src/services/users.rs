//! User account workflows: registration, authentication, profile changes,
//! activation and admin access

use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{
        validate_email_value, validate_password, AccountAction, ActivationRequest,
        AdminAccessRequest, AdminPermission, CreateUser, LoginRequest, UpdateEmail,
        UpdatePassword, UpdateUser, UpdateUsername, User, UserClaims, UserPublic,
    },
    repository::Repository,
    services::{security, sessions::SessionsService},
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
    sessions: SessionsService,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig, sessions: SessionsService) -> Self {
        Self {
            repository,
            config,
            sessions,
        }
    }

    /// Authenticate by email and password, issue a JWT and record the
    /// backing session
    pub async fn authenticate(&self, request: &LoginRequest) -> AppResult<(String, User)> {
        request.validate()?;

        let user = self
            .repository
            .users
            .find_active_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        // Check password
        if !security::verify_password(&user.password, &request.password)? {
            return Err(AppError::Authentication(
                "Invalid email or password".to_string(),
            ));
        }

        let claims = UserClaims::new(&user, self.config.jwt_expiration_hours);
        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        self.sessions.record_login(&claims).await?;
        tracing::info!(user_id = %user.id, "User logged in");

        Ok((token, user))
    }

    /// Register a new user. Every field check runs before any persistence
    /// work; email and username must be free among all accounts, active
    /// or not.
    pub async fn create_user(&self, request: CreateUser) -> AppResult<UserPublic> {
        request.validate()?;
        let record = request.to_record()?;
        validate_password(&request.password)?;

        if self
            .repository
            .users
            .email_exists(&record.email, None)
            .await?
        {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }
        if self
            .repository
            .users
            .username_exists(&record.username, None)
            .await?
        {
            return Err(AppError::Conflict("Username already in use".to_string()));
        }

        let password_hash = security::hash_password(&request.password)?;
        let user = self.repository.users.create(&record, &password_hash).await?;
        tracing::info!(user_id = %user.id, "User created");

        Ok(user.into())
    }

    /// Update profile fields. Absent or blank fields keep their stored
    /// values; a present password is re-validated and re-hashed.
    pub async fn update_user(&self, id: Uuid, request: UpdateUser) -> AppResult<UserPublic> {
        request.validate()?;
        let changes = request.to_changes()?;

        let password_hash = match request.password.as_deref().map(str::trim) {
            Some(password) if !password.is_empty() => {
                validate_password(password)?;
                Some(security::hash_password(password)?)
            }
            _ => None,
        };

        let user = self.repository.users.get_by_id(id).await?;

        if let Some(ref username) = changes.username {
            if self
                .repository
                .users
                .username_exists(username, Some(id))
                .await?
            {
                return Err(AppError::Conflict("Username already in use".to_string()));
            }
        }

        if changes.is_empty() && password_hash.is_none() {
            return Ok(user.into());
        }

        let updated = self.repository.users.update(id, &changes, password_hash).await?;

        Ok(updated.into())
    }

    /// Change the account email. The stored email must match the claimed
    /// old value; changing to the current email is a no-op success.
    pub async fn update_email(&self, id: Uuid, request: UpdateEmail) -> AppResult<UserPublic> {
        request.validate()?;
        let old_email = validate_email_value(&request.old_email)?;
        let new_email = validate_email_value(&request.new_email)?;

        let user = self.repository.users.get_by_id(id).await?;

        if !user.email.eq_ignore_ascii_case(&old_email) {
            return Err(AppError::Mismatch(
                "Email does not match the current account email".to_string(),
            ));
        }
        if user.email.eq_ignore_ascii_case(&new_email) {
            return Ok(user.into());
        }

        if self
            .repository
            .users
            .email_exists(&new_email, Some(id))
            .await?
        {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }

        let updated = self.repository.users.update_email(id, &new_email).await?;
        tracing::info!(user_id = %updated.id, "Email updated");

        Ok(updated.into())
    }

    /// Change the account username; same contract as the email change
    pub async fn update_username(
        &self,
        id: Uuid,
        request: UpdateUsername,
    ) -> AppResult<UserPublic> {
        request.validate()?;

        let user = self.repository.users.get_by_id(id).await?;

        if !user
            .username
            .eq_ignore_ascii_case(request.old_username.trim())
        {
            return Err(AppError::Mismatch(
                "Username does not match the current account username".to_string(),
            ));
        }

        let new_username = request.new_username.trim();
        if user.username.eq_ignore_ascii_case(new_username) {
            return Ok(user.into());
        }

        if self
            .repository
            .users
            .username_exists(new_username, Some(id))
            .await?
        {
            return Err(AppError::Conflict("Username already in use".to_string()));
        }

        let updated = self
            .repository
            .users
            .update_username(id, new_username)
            .await?;
        tracing::info!(user_id = %updated.id, "Username updated");

        Ok(updated.into())
    }

    /// Change the password. The old password is verified against the
    /// stored hash before the new one replaces it.
    pub async fn update_password(
        &self,
        id: Uuid,
        request: UpdatePassword,
    ) -> AppResult<UserPublic> {
        request.validate()?;
        validate_password(&request.old_password)?;
        validate_password(&request.new_password)?;

        let user = self.repository.users.get_by_id(id).await?;

        if !security::verify_password(&user.password, &request.old_password)? {
            return Err(AppError::Mismatch(
                "Old password does not match".to_string(),
            ));
        }

        let password_hash = security::hash_password(&request.new_password)?;
        let updated = self
            .repository
            .users
            .update_password(id, &password_hash)
            .await?;
        tracing::info!(user_id = %updated.id, "Password updated");

        Ok(updated.into())
    }

    /// Activate or deactivate an account by email. Non-admins may only
    /// target their own account. The post-state is confirmed by re-reading
    /// the record; deactivation also revokes the oldest live session so
    /// the account cannot keep using an issued token.
    pub async fn set_activation(
        &self,
        acting: &UserClaims,
        request: ActivationRequest,
    ) -> AppResult<UserPublic> {
        request.validate()?;
        let email = validate_email_value(&request.email)?;

        if !acting.is_admin && !acting.sub.eq_ignore_ascii_case(&email) {
            return Err(AppError::Forbidden(
                "Cannot change the activation state of another account".to_string(),
            ));
        }

        tracing::info!(
            target = %email,
            action = %request.action,
            actor = %acting.sub,
            "Account activation change requested"
        );

        let activate = request.action == AccountAction::Activate;
        self.repository
            .users
            .set_active_by_email(&email, activate)
            .await?;

        // Confirm the write before reporting success
        let user = self
            .repository
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with email {} not found", email)))?;

        if user.is_active != activate {
            return Err(AppError::Internal(format!(
                "Account {} could not be confirmed",
                request.action
            )));
        }

        if !activate {
            self.revoke_first_session(&user).await;
        }

        Ok(user.into())
    }

    /// Grant or revoke admin access on an active account. The permission
    /// name is matched case-insensitively; the post-state is confirmed by
    /// re-reading the record.
    pub async fn admin_access(
        &self,
        target_email: &str,
        request: AdminAccessRequest,
    ) -> AppResult<UserPublic> {
        let email = validate_email_value(target_email)?;
        let permission: AdminPermission =
            request.permission.parse().map_err(AppError::Validation)?;

        let target = self
            .repository
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with email {} not found", email)))?;

        if !target.is_active {
            return Err(AppError::Precondition(
                "Cannot change admin access of an inactive account".to_string(),
            ));
        }

        self.repository
            .users
            .set_admin_by_email(&email, permission.grants_admin())
            .await?;

        // Confirm the write before reporting success
        let user = self
            .repository
            .users
            .find_by_email(&email)
            .await?
            .filter(|u| u.is_admin == permission.grants_admin())
            .ok_or_else(|| {
                AppError::Internal("Admin access change could not be confirmed".to_string())
            })?;

        tracing::info!(user_id = %user.id, permission = %permission, "Admin access changed");

        Ok(user.into())
    }

    /// List all active users
    pub async fn get_all_users(&self) -> AppResult<Vec<UserPublic>> {
        let users = self.repository.users.list_active().await?;
        Ok(users.into_iter().map(UserPublic::from).collect())
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<UserPublic> {
        Ok(self.repository.users.get_by_id(id).await?.into())
    }

    /// Get user by email, regardless of active state
    pub async fn get_by_email(&self, email: &str) -> AppResult<UserPublic> {
        self.repository
            .users
            .find_by_email(email)
            .await?
            .map(UserPublic::from)
            .ok_or_else(|| AppError::NotFound(format!("User with email {} not found", email)))
    }

    /// Get user by username
    pub async fn get_by_username(&self, username: &str) -> AppResult<UserPublic> {
        self.repository
            .users
            .find_by_username(username)
            .await?
            .map(UserPublic::from)
            .ok_or_else(|| {
                AppError::NotFound(format!("User with username {} not found", username))
            })
    }

    /// Revoke the oldest live session, best-effort: a failure here must
    /// not undo the already-confirmed deactivation.
    async fn revoke_first_session(&self, user: &User) {
        match self.sessions.active_sessions_for_user(user.id).await {
            Ok(sessions) => {
                if let Some(session) = sessions.first() {
                    if let Err(e) = self.sessions.revoke_token(session).await {
                        tracing::error!(
                            user_id = %user.id,
                            error = %e,
                            "Failed to revoke session after deactivation"
                        );
                    }
                }
            }
            Err(e) => {
                tracing::error!(
                    user_id = %user.id,
                    error = %e,
                    "Failed to list sessions after deactivation"
                );
            }
        }
    }
}
