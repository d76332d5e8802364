use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use user_registration_core::contract::{
    validate_request, RegistrationCreatedResponse, RegistrationRequest, MISSING_TABLE_ERROR,
    USER_CREATED_MESSAGE,
};
use user_registration_core::record::UserRecord;

use crate::adapters::user_store::UserStore;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

/// Runs one registration through validation, record construction, and the
/// single store write. Every outcome is encoded as a response; the caller
/// never sees a hard failure.
pub fn handle_register_event(
    event: Value,
    table_name: Option<&str>,
    store: &dyn UserStore,
) -> ApiGatewayResponse {
    let started_at = Instant::now();

    let payload = match normalize_invocation_event(event) {
        Ok(value) => value,
        Err(message) => return validation_error_response(&message),
    };

    let request = match serde_json::from_value::<RegistrationRequest>(payload) {
        Ok(value) => value,
        Err(error) => return validation_error_response(&format!("Malformed request: {error}")),
    };

    if let Err(error) = validate_request(&request) {
        return validation_error_response(error.message());
    }

    let user = UserRecord::new(&request);
    log_register_info(
        "registration_received",
        json!({
            "user_id": user.id.clone(),
            "has_email": user.email.is_some(),
            "has_age": user.age.is_some(),
        }),
    );

    let table_name = match table_name {
        Some(value) if !value.is_empty() => value,
        _ => return error_response(500, MISSING_TABLE_ERROR),
    };

    if let Err(error) = store.put_user(table_name, &user.to_item()) {
        log_register_error(
            "registration_failed",
            json!({
                "user_id": user.id.clone(),
                "table_name": table_name,
                "duration_ms": started_at.elapsed().as_millis(),
                "error": error.clone(),
            }),
        );
        return error_response(500, &format!("failed to save user: {error}"));
    }

    log_register_info(
        "user_created",
        json!({
            "user_id": user.id.clone(),
            "table_name": table_name,
            "duration_ms": started_at.elapsed().as_millis(),
        }),
    );

    success_response(
        201,
        RegistrationCreatedResponse {
            message: USER_CREATED_MESSAGE.to_string(),
            user,
        },
    )
}

/// Accepts either a direct invocation payload or an API Gateway proxy event
/// carrying the payload under `body` as an object, a JSON string, or null.
fn normalize_invocation_event(event: Value) -> Result<Value, String> {
    let Some(object) = event.as_object() else {
        return Err("Request payload must be a JSON object".to_string());
    };

    let Some(body) = object.get("body") else {
        return Ok(event);
    };

    match body {
        Value::Null => Ok(json!({})),
        Value::Object(_) => Ok(body.clone()),
        Value::String(text) => {
            serde_json::from_str(text).map_err(|error| format!("Malformed JSON body: {error}"))
        }
        _ => Err("Request body must be a JSON object".to_string()),
    }
}

fn validation_error_response(message: &str) -> ApiGatewayResponse {
    error_response(400, message)
}

fn success_response(status_code: u16, payload: impl Serialize) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code,
        headers: json!({"Content-Type": "application/json"}),
        body: serde_json::to_string(&payload).expect("response payload should serialize"),
    }
}

fn error_response(status_code: u16, message: &str) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code,
        headers: json!({"Content-Type": "application/json"}),
        body: json!({ "error": message }).to_string(),
    }
}

fn log_register_info(event: &str, details: Value) {
    eprintln!(
        "{}",
        json!({
            "component": "register_handler",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

fn log_register_error(event: &str, details: Value) {
    eprintln!(
        "{}",
        json!({
            "component": "register_handler",
            "level": "error",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::DateTime;
    use user_registration_core::record::{FieldValue, UserItem};

    use super::*;

    struct RecordingStore {
        writes: Mutex<Vec<(String, UserItem)>>,
    }

    impl RecordingStore {
        fn new() -> Self {
            Self {
                writes: Mutex::new(Vec::new()),
            }
        }

        fn writes(&self) -> Vec<(String, UserItem)> {
            self.writes.lock().expect("poisoned mutex").clone()
        }
    }

    impl UserStore for RecordingStore {
        fn put_user(&self, table_name: &str, item: &UserItem) -> Result<(), String> {
            self.writes
                .lock()
                .expect("poisoned mutex")
                .push((table_name.to_string(), item.clone()));
            Ok(())
        }
    }

    struct FailingStore;

    impl UserStore for FailingStore {
        fn put_user(&self, _table_name: &str, _item: &UserItem) -> Result<(), String> {
            Err("simulated write failure".to_string())
        }
    }

    fn sample_event() -> Value {
        json!({
            "name": "Ana",
            "phone_number": "+5511999999999",
        })
    }

    fn body_json(response: &ApiGatewayResponse) -> Value {
        serde_json::from_str(&response.body).expect("response body should parse")
    }

    #[test]
    fn rejects_missing_name_without_writing() {
        let store = RecordingStore::new();
        let response = handle_register_event(
            json!({"phone_number": "+5511999999999"}),
            Some("users-test"),
            &store,
        );

        assert_eq!(response.status_code, 400);
        assert_eq!(response.body, r#"{"error":"name is required"}"#);
        assert!(store.writes().is_empty());
    }

    #[test]
    fn rejects_missing_phone_number_without_writing() {
        let store = RecordingStore::new();
        let response =
            handle_register_event(json!({"name": "Ana"}), Some("users-test"), &store);

        assert_eq!(response.status_code, 400);
        assert_eq!(response.body, r#"{"error":"phone_number is required"}"#);
        assert!(store.writes().is_empty());
    }

    #[test]
    fn reports_name_error_when_both_required_fields_missing() {
        let store = RecordingStore::new();
        let response = handle_register_event(json!({}), Some("users-test"), &store);

        assert_eq!(response.status_code, 400);
        assert_eq!(body_json(&response)["error"], "name is required");
    }

    #[test]
    fn rejects_non_object_payload() {
        let store = RecordingStore::new();
        let response = handle_register_event(json!("not an object"), Some("users-test"), &store);

        assert_eq!(response.status_code, 400);
        assert_eq!(
            body_json(&response)["error"],
            "Request payload must be a JSON object"
        );
        assert!(store.writes().is_empty());
    }

    #[test]
    fn rejects_type_malformed_request() {
        let store = RecordingStore::new();
        let response = handle_register_event(
            json!({"name": "Ana", "phone_number": "+55", "age": "thirty"}),
            Some("users-test"),
            &store,
        );

        assert_eq!(response.status_code, 400);
        assert!(body_json(&response)["error"]
            .as_str()
            .expect("error should be a string")
            .starts_with("Malformed request:"));
        assert!(store.writes().is_empty());
    }

    #[test]
    fn missing_table_configuration_yields_fixed_error_without_writing() {
        let store = RecordingStore::new();

        for table_name in [None, Some("")] {
            let response = handle_register_event(sample_event(), table_name, &store);

            assert_eq!(response.status_code, 500);
            assert_eq!(
                response.body,
                r#"{"error":"USERS_TABLE_NAME environment variable not set"}"#
            );
        }

        assert!(store.writes().is_empty());
    }

    #[test]
    fn creates_user_and_persists_record() {
        let store = RecordingStore::new();
        let response = handle_register_event(
            json!({
                "name": "Ana",
                "phone_number": "+5511999999999",
                "email": "ana@example.com",
                "age": 30,
            }),
            Some("users-test"),
            &store,
        );

        assert_eq!(response.status_code, 201);
        assert_eq!(response.headers, json!({"Content-Type": "application/json"}));

        let body = body_json(&response);
        assert_eq!(body["message"], "User created successfully");
        assert_eq!(body["user"]["name"], "Ana");
        assert_eq!(body["user"]["phone_number"], "+5511999999999");
        assert_eq!(body["user"]["email"], "ana@example.com");
        assert_eq!(body["user"]["age"], 30);
        assert_eq!(body["user"]["status"], "active");

        let user_id = body["user"]["id"].as_str().expect("id should be a string");
        assert_eq!(user_id.len(), 36);

        let created_at = body["user"]["created_at"]
            .as_str()
            .expect("created_at should be a string");
        assert!(created_at.ends_with('Z'));
        DateTime::parse_from_rfc3339(created_at).expect("created_at should parse");

        let writes = store.writes();
        assert_eq!(writes.len(), 1);
        let (table_name, item) = &writes[0];
        assert_eq!(table_name, "users-test");
        assert_eq!(
            item.get("id"),
            Some(&FieldValue::Text(user_id.to_string()))
        );
        assert_eq!(item.get("age"), Some(&FieldValue::Number(30)));
        assert_eq!(
            item.get("email"),
            Some(&FieldValue::Text("ana@example.com".to_string()))
        );
    }

    #[test]
    fn omits_optional_fields_when_not_provided() {
        let store = RecordingStore::new();
        let response = handle_register_event(sample_event(), Some("users-test"), &store);

        assert_eq!(response.status_code, 201);
        let user = &body_json(&response)["user"];
        let keys = user.as_object().expect("user should be an object");
        assert!(!keys.contains_key("email"));
        assert!(!keys.contains_key("age"));

        let (_, item) = &store.writes()[0];
        assert!(!item.contains_key("email"));
        assert!(!item.contains_key("age"));
    }

    #[test]
    fn treats_empty_email_and_non_positive_age_as_absent() {
        let store = RecordingStore::new();
        let response = handle_register_event(
            json!({
                "name": "Ana",
                "phone_number": "+5511999999999",
                "email": "",
                "age": 0,
            }),
            Some("users-test"),
            &store,
        );

        assert_eq!(response.status_code, 201);
        let user = &body_json(&response)["user"];
        let keys = user.as_object().expect("user should be an object");
        assert!(!keys.contains_key("email"));
        assert!(!keys.contains_key("age"));
    }

    #[test]
    fn generates_distinct_identifiers_across_requests() {
        let store = RecordingStore::new();
        let first = handle_register_event(sample_event(), Some("users-test"), &store);
        let second = handle_register_event(sample_event(), Some("users-test"), &store);

        assert_ne!(body_json(&first)["user"]["id"], body_json(&second)["user"]["id"]);
    }

    #[test]
    fn persistence_failure_surfaces_store_error() {
        let response = handle_register_event(sample_event(), Some("users-test"), &FailingStore);

        assert_eq!(response.status_code, 500);
        let error = body_json(&response)["error"]
            .as_str()
            .expect("error should be a string")
            .to_string();
        assert!(error.starts_with("failed to save user: "));
        assert!(error.contains("simulated write failure"));
    }

    #[test]
    fn unwraps_api_gateway_proxy_body() {
        let store = RecordingStore::new();
        let response = handle_register_event(
            json!({"body": "{\"name\":\"Ana\",\"phone_number\":\"+5511999999999\"}"}),
            Some("users-test"),
            &store,
        );

        assert_eq!(response.status_code, 201);
        assert_eq!(store.writes().len(), 1);
    }

    #[test]
    fn rejects_malformed_proxy_body() {
        let store = RecordingStore::new();
        let response =
            handle_register_event(json!({"body": "{not json"}), Some("users-test"), &store);

        assert_eq!(response.status_code, 400);
        assert!(store.writes().is_empty());
    }
}
