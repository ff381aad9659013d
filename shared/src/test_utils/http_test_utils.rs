use axum::response::Response;
use http_body_util::BodyExt;

/// Collects a response body and parses it as JSON. Empty bodies become `null`.
pub async fn response_to_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("response body is readable")
        .to_bytes();

    if bytes.is_empty() {
        return serde_json::Value::Null;
    }

    serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
    })
}
