//! User model, request types and field validation

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

pub const MIN_EMAIL_LENGTH: usize = 5;
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 30;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MIN_PHONE_NUMBER_LENGTH: usize = 8;
pub const MAX_PHONE_NUMBER_LENGTH: usize = 15;

/// Username charset, compiled once at first use
pub static USERNAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("username pattern is valid")
});

/// Full user model from database. Never serialized directly; the API
/// surface exposes `UserPublic` instead.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    /// Hashed password (argon2)
    pub password: String,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
}

/// Public user projection, without the password hash
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserPublic {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        UserPublic {
            id: user.id,
            email: user.email,
            username: user.username,
            phone_number: user.phone_number,
            date_of_birth: user.date_of_birth,
            is_active: user.is_active,
            is_admin: user.is_admin,
            created_at: user.created_at,
            last_updated_at: user.last_updated_at,
        }
    }
}

/// Persistable shell for a new user; the password hash travels separately
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

/// Partial-field diff for profile updates; the optional re-hashed password
/// travels separately
#[derive(Debug, Default, Clone)]
pub struct UserChanges {
    pub username: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.phone_number.is_none() && self.date_of_birth.is_none()
    }
}

/// Registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(email(message = "Invalid email format"))]
    #[validate(length(min = 5, max = 254, message = "Email must be 5-254 characters"))]
    pub email: String,
    #[validate(length(min = 3, max = 30, message = "Username must be 3-30 characters"))]
    #[validate(regex(
        path = *USERNAME_PATTERN,
        message = "Username may only contain letters, digits, '.', '_' and '-'"
    ))]
    pub username: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub phone_number: Option<String>,
    /// Accepted formats: YYYY-MM-DD, DD-MM-YYYY, DD/MM/YYYY, RFC 3339
    pub date_of_birth: Option<String>,
}

impl CreateUser {
    /// Convert the request into a persistable shell. Field-level checks
    /// (blankness, bounds, date normalization) all run before any
    /// persistence work.
    pub fn to_record(&self) -> AppResult<NewUser> {
        Ok(NewUser {
            email: validate_email_value(&self.email)?,
            username: validate_username_value(&self.username)?,
            phone_number: validate_phone_number(self.phone_number.as_deref())?,
            date_of_birth: self
                .date_of_birth
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(parse_date_of_birth)
                .transpose()?,
        })
    }
}

/// Profile update request; absent or blank fields keep their stored values.
/// Email changes go through the dedicated email workflow.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(length(max = 30, message = "Username must be at most 30 characters"))]
    pub username: Option<String>,
    pub password: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<String>,
}

impl UpdateUser {
    /// Validate every present non-blank field and build the field diff.
    pub fn to_changes(&self) -> AppResult<UserChanges> {
        let mut changes = UserChanges::default();
        if let Some(username) = non_blank(self.username.as_deref()) {
            changes.username = Some(validate_username_value(username)?);
        }
        if let Some(phone) = non_blank(self.phone_number.as_deref()) {
            changes.phone_number = validate_phone_number(Some(phone))?;
        }
        if let Some(dob) = non_blank(self.date_of_birth.as_deref()) {
            changes.date_of_birth = Some(parse_date_of_birth(dob)?);
        }
        Ok(changes)
    }
}

/// Email change request; the stored email must match `old_email`
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateEmail {
    #[validate(length(min = 5, max = 254, message = "Email must be 5-254 characters"))]
    pub old_email: String,
    #[validate(email(message = "Invalid email format"))]
    #[validate(length(min = 5, max = 254, message = "Email must be 5-254 characters"))]
    pub new_email: String,
}

/// Username change request; the stored username must match `old_username`
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUsername {
    #[validate(length(min = 3, max = 30, message = "Username must be 3-30 characters"))]
    pub old_username: String,
    #[validate(length(min = 3, max = 30, message = "Username must be 3-30 characters"))]
    #[validate(regex(
        path = *USERNAME_PATTERN,
        message = "Username may only contain letters, digits, '.', '_' and '-'"
    ))]
    pub new_username: String,
}

/// Password change request; the old password is verified against the
/// stored hash before the new one replaces it
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePassword {
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub old_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Account activation state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountAction {
    Activate,
    Deactivate,
}

impl AccountAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountAction::Activate => "activate",
            AccountAction::Deactivate => "deactivate",
        }
    }
}

impl std::fmt::Display for AccountAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Activation request; non-admins may only target their own email
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ActivationRequest {
    #[validate(length(min = 5, max = 254, message = "Email must be 5-254 characters"))]
    pub email: String,
    pub action: AccountAction,
}

/// Admin-access toggle request; the permission name is matched
/// case-insensitively
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminAccessRequest {
    pub permission: String,
}

/// Admin permission names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AdminPermission {
    Grant,
    Revoke,
}

impl AdminPermission {
    /// Whether the resulting admin flag should be set
    pub fn grants_admin(&self) -> bool {
        matches!(self, AdminPermission::Grant)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdminPermission::Grant => "grant",
            AdminPermission::Revoke => "revoke",
        }
    }
}

impl std::fmt::Display for AdminPermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AdminPermission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grant" => Ok(AdminPermission::Grant),
            "revoke" => Ok(AdminPermission::Revoke),
            _ => Err(format!("Invalid admin permission: {}", s)),
        }
    }
}

/// Login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub user: UserPublic,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// User email
    pub sub: String,
    pub user_id: Uuid,
    pub username: String,
    pub is_admin: bool,
    /// Token identifier, recorded per session and used for revocation
    pub jti: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Build claims for a freshly authenticated user
    pub fn new(user: &User, lifetime_hours: i64) -> Self {
        let now = Utc::now();
        UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
            jti: Uuid::new_v4(),
            exp: (now + Duration::hours(lifetime_hours)).timestamp(),
            iat: now.timestamp(),
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.iat, 0).single().unwrap_or_else(Utc::now)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_else(Utc::now)
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Administrator privileges required".to_string(),
            ))
        }
    }
}

/// Trim and bound-check an email value
pub fn validate_email_value(email: &str) -> AppResult<String> {
    let trimmed = email.trim();
    if trimmed.len() < MIN_EMAIL_LENGTH || trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(AppError::Validation(format!(
            "Email must be {}-{} characters",
            MIN_EMAIL_LENGTH, MAX_EMAIL_LENGTH
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim, bound-check and charset-check a username value
pub fn validate_username_value(username: &str) -> AppResult<String> {
    let trimmed = username.trim();
    if trimmed.len() < MIN_USERNAME_LENGTH || trimmed.len() > MAX_USERNAME_LENGTH {
        return Err(AppError::Validation(format!(
            "Username must be {}-{} characters",
            MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH
        )));
    }
    if !USERNAME_PATTERN.is_match(trimmed) {
        return Err(AppError::Validation(
            "Username may only contain letters, digits, '.', '_' and '-'".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Bound-check an optional phone number; blank input counts as absent
pub fn validate_phone_number(phone: Option<&str>) -> AppResult<Option<String>> {
    let Some(phone) = non_blank(phone) else {
        return Ok(None);
    };
    if phone.len() < MIN_PHONE_NUMBER_LENGTH || phone.len() > MAX_PHONE_NUMBER_LENGTH {
        return Err(AppError::Validation(format!(
            "Phone number must be {}-{} characters",
            MIN_PHONE_NUMBER_LENGTH, MAX_PHONE_NUMBER_LENGTH
        )));
    }
    Ok(Some(phone.to_string()))
}

/// Enforce the password length floor
pub fn validate_password(password: &str) -> AppResult<()> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Normalize a date of birth from the accepted input formats
pub fn parse_date_of_birth(value: &str) -> AppResult<NaiveDate> {
    let trimmed = value.trim();
    for format in ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(datetime.date_naive());
    }
    Err(AppError::Validation(format!(
        "Invalid date of birth: {}",
        value
    )))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "reader@example.com".to_string(),
            username: "reader".to_string(),
            password: "$argon2id$stub".to_string(),
            phone_number: Some("0612345678".to_string()),
            date_of_birth: None,
            is_active: true,
            is_admin: false,
            created_at: Utc::now(),
            last_updated_at: None,
        }
    }

    #[test]
    fn phone_number_bounds_are_inclusive() {
        assert!(validate_phone_number(Some("1234567")).is_err());
        assert!(validate_phone_number(Some("12345678")).is_ok());
        assert!(validate_phone_number(Some("123456789012345")).is_ok());
        assert!(validate_phone_number(Some("1234567890123456")).is_err());
    }

    #[test]
    fn blank_phone_number_counts_as_absent() {
        assert_eq!(validate_phone_number(None).unwrap(), None);
        assert_eq!(validate_phone_number(Some("   ")).unwrap(), None);
    }

    #[test]
    fn password_length_floor() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
    }

    #[test]
    fn date_of_birth_accepts_known_formats() {
        let expected = NaiveDate::from_ymd_opt(1990, 3, 14).unwrap();
        assert_eq!(parse_date_of_birth("1990-03-14").unwrap(), expected);
        assert_eq!(parse_date_of_birth("14-03-1990").unwrap(), expected);
        assert_eq!(parse_date_of_birth("14/03/1990").unwrap(), expected);
        assert_eq!(
            parse_date_of_birth("1990-03-14T08:30:00Z").unwrap(),
            expected
        );
    }

    #[test]
    fn date_of_birth_rejects_garbage() {
        assert!(parse_date_of_birth("14th of March").is_err());
        assert!(parse_date_of_birth("1990/03/14").is_err());
    }

    #[test]
    fn admin_permission_parses_case_insensitively() {
        assert_eq!("grant".parse::<AdminPermission>(), Ok(AdminPermission::Grant));
        assert_eq!("GRANT".parse::<AdminPermission>(), Ok(AdminPermission::Grant));
        assert_eq!("Revoke".parse::<AdminPermission>(), Ok(AdminPermission::Revoke));
        assert!("promote".parse::<AdminPermission>().is_err());
    }

    #[test]
    fn username_charset_is_enforced() {
        assert!(validate_username_value("jane.doe-42").is_ok());
        assert!(validate_username_value("jane doe").is_err());
        assert!(validate_username_value("jd").is_err());
    }

    #[test]
    fn update_request_skips_blank_fields() {
        let request = UpdateUser {
            username: Some("   ".to_string()),
            password: None,
            phone_number: Some("0612345678".to_string()),
            date_of_birth: None,
        };

        let changes = request.to_changes().unwrap();
        assert!(changes.username.is_none());
        assert_eq!(changes.phone_number.as_deref(), Some("0612345678"));
        assert!(changes.date_of_birth.is_none());
    }

    #[test]
    fn claims_round_trip_through_a_token() {
        let user = sample_user();
        let claims = UserClaims::new(&user, 1);
        let token = claims.create_token("test-secret").unwrap();
        let parsed = UserClaims::from_token(&token, "test-secret").unwrap();

        assert_eq!(parsed.sub, user.email);
        assert_eq!(parsed.user_id, user.id);
        assert_eq!(parsed.jti, claims.jti);
        assert!(!parsed.is_admin);
    }

    #[test]
    fn expired_token_is_rejected() {
        let user = sample_user();
        let mut claims = UserClaims::new(&user, 1);
        claims.iat = (Utc::now() - Duration::hours(2)).timestamp();
        claims.exp = (Utc::now() - Duration::hours(1)).timestamp();

        let token = claims.create_token("test-secret").unwrap();
        assert!(UserClaims::from_token(&token, "test-secret").is_err());
    }

    #[test]
    fn require_admin_rejects_regular_users() {
        let user = sample_user();
        let claims = UserClaims::new(&user, 1);
        assert!(claims.require_admin().is_err());
    }
}
