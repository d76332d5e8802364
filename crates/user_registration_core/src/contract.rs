use serde::{Deserialize, Serialize};

pub const USER_STATUS_ACTIVE: &str = "active";
pub const USER_CREATED_MESSAGE: &str = "User created successfully";
pub const USERS_TABLE_ENV_VAR: &str = "USERS_TABLE_NAME";
pub const MISSING_TABLE_ERROR: &str = "USERS_TABLE_NAME environment variable not set";

/// Incoming registration payload. Missing JSON keys deserialize to their
/// empty/None defaults so absence and emptiness validate the same way.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrationRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistrationCreatedResponse {
    pub message: String,
    pub user: crate::record::UserRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Checks the two required fields. Name is checked before phone number, so
/// a request missing both reports the name error. The comparison is against
/// the empty string only; whitespace-only values pass.
pub fn validate_request(request: &RegistrationRequest) -> Result<(), ValidationError> {
    if request.name.is_empty() {
        return Err(ValidationError::new("name is required"));
    }

    if request.phone_number.is_empty() {
        return Err(ValidationError::new("phone_number is required"));
    }

    Ok(())
}
