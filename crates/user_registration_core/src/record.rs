use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contract::{RegistrationRequest, USER_STATUS_ACTIVE};

/// A single typed scalar in the persisted item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Number(i64),
}

/// Flat field-to-scalar mapping handed to the persistence seam.
pub type UserItem = BTreeMap<String, FieldValue>;

/// The persisted representation of a registered user. Created exactly once
/// per successful request and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    pub status: String,
    pub created_at: String,
}

impl UserRecord {
    /// Builds a record with a freshly generated UUID v4 identifier and the
    /// current UTC instant.
    pub fn new(request: &RegistrationRequest) -> Self {
        Self::with_identity(
            request,
            Uuid::new_v4().to_string(),
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        )
    }

    /// Deterministic constructor with the identity injected. An empty email
    /// and a non-positive age are treated as not provided, so the serialized
    /// response and the persisted item always agree.
    pub fn with_identity(
        request: &RegistrationRequest,
        id: impl Into<String>,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: request.name.clone(),
            phone_number: request.phone_number.clone(),
            email: request.email.clone().filter(|email| !email.is_empty()),
            age: request.age.filter(|age| *age > 0),
            status: USER_STATUS_ACTIVE.to_string(),
            created_at: created_at.into(),
        }
    }

    /// The flat insert-or-replace item keyed by `id`.
    pub fn to_item(&self) -> UserItem {
        let mut item = UserItem::from([
            ("id".to_string(), FieldValue::Text(self.id.clone())),
            ("name".to_string(), FieldValue::Text(self.name.clone())),
            (
                "phone_number".to_string(),
                FieldValue::Text(self.phone_number.clone()),
            ),
            ("status".to_string(), FieldValue::Text(self.status.clone())),
            (
                "created_at".to_string(),
                FieldValue::Text(self.created_at.clone()),
            ),
        ]);

        if let Some(email) = &self.email {
            item.insert("email".to_string(), FieldValue::Text(email.clone()));
        }

        if let Some(age) = self.age {
            item.insert("age".to_string(), FieldValue::Number(age));
        }

        item
    }
}
