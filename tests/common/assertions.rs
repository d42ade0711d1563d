//! Assertion helpers for tests.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use super::app::TestResponse;

/// Assert response has expected status code
pub fn assert_status(response: &TestResponse, expected: StatusCode) {
    assert_eq!(
        response.status, expected,
        "Expected status {}, got {}. Body: {}",
        expected,
        response.status,
        response.text()
    );
}

/// Assert response is OK (200)
pub fn assert_ok(response: &TestResponse) {
    assert_status(response, StatusCode::OK);
}

/// Assert an error response carries the JSON `{status, error}` body
pub fn assert_json_error(response: &TestResponse, expected: StatusCode) {
    assert_status(response, expected);
    let json: serde_json::Value = response.json();
    assert_eq!(
        json["status"].as_u64(),
        Some(expected.as_u16() as u64),
        "Expected JSON status {}. Full response: {}",
        expected.as_u16(),
        serde_json::to_string_pretty(&json).unwrap()
    );
    assert!(json["error"].is_string(), "Expected an error message");
}

/// Assert the presentation JSON shows no background
pub fn assert_no_background(presentation: &serde_json::Value) {
    assert!(presentation["imageUrl"].is_null(), "{presentation}");
    assert!(presentation["backgroundSize"].is_null(), "{presentation}");
    assert!(presentation["backgroundColor"].is_null(), "{presentation}");
    assert_eq!(presentation["darkBackground"], false);
}

/// Assert `icon` is a base64 data URL with the given MIME type and return the payload
pub fn assert_data_url(icon: &serde_json::Value, mime: &str) -> String {
    let icon = icon.as_str().expect("Expected icon data URL");
    let prefix = format!("data:{mime};base64,");
    assert!(
        icon.starts_with(&prefix),
        "Expected {prefix}..., got {icon}"
    );
    icon[prefix.len()..].to_string()
}
