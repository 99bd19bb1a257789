//! Low-level authenticated transport against one Compass base URL.

use std::path::Path;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::types::{ApiEnvelope, extract_file_id, extract_upload_url};
use crate::error::{CompassError, CompassResult};
use crate::models::Credentials;

/// Endpoint issuing one-time upload URLs.
const FILE_GET_URL_ENDPOINT: &str = "file/getUrl";

/// Authenticated client bound to one credential set.
///
/// Owned by the factory pool; one instance per credential triple for the
/// process lifetime.
pub struct CompassClient {
    http: reqwest::Client,
    credentials: Credentials,
}

impl CompassClient {
    pub(crate) fn new(credentials: Credentials) -> CompassResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(credentials.timeout())
            .build()
            .map_err(|e| CompassError::transport("Compass: failed to build HTTP client", e))?;

        Ok(Self { http, credentials })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Posts `payload` as JSON to `endpoint` and unwraps the API envelope.
    ///
    /// Returns the `response` object of an `"ok"` envelope (empty map when
    /// absent). A non-`"ok"` status becomes an API error carrying the
    /// upstream message, error code, and raw response; connection, timeout,
    /// HTTP-status, and body-decode failures become transport errors.
    pub async fn post_json<T>(&self, endpoint: &str, payload: &T) -> CompassResult<Map<String, Value>>
    where
        T: Serialize + ?Sized,
    {
        let url = format!(
            "{}{}",
            self.credentials.base_url(),
            endpoint.trim_start_matches('/')
        );
        debug!(%url, "posting to Compass API");

        let response = self
            .http
            .post(&url)
            .header(
                AUTHORIZATION,
                format!("bearer={}", self.credentials.token()),
            )
            .header(ACCEPT, "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| CompassError::transport("[Compass] HTTP error", e))?
            .error_for_status()
            .map_err(|e| CompassError::transport("[Compass] HTTP error", e))?;

        let envelope: ApiEnvelope = response
            .json()
            .await
            .map_err(|e| CompassError::transport("[Compass] HTTP error", e))?;

        if envelope.is_ok() {
            return Ok(envelope.into_response());
        }

        let response = envelope.into_response();
        let message = response
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string();
        let error_code = response.get("error_code").and_then(Value::as_i64);

        Err(CompassError::api(
            format!("Compass API error: {message}"),
            error_code,
            response,
        ))
    }

    /// Uploads a local file and returns its Compass file identifier.
    ///
    /// Two steps: fetch a one-time upload URL through the JSON API, then
    /// multipart-POST the file bytes directly to that URL, outside the JSON
    /// envelope and without auth headers.
    pub async fn upload_file(&self, path: &Path) -> CompassResult<String> {
        let meta = self.post_json(FILE_GET_URL_ENDPOINT, &Map::new()).await?;

        let upload_url = extract_upload_url(&meta).ok_or_else(|| {
            CompassError::api("Compass: upload URL not received", None, Map::new())
        })?;

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            CompassError::transport(
                format!("Compass: failed to read file {}", path.display()),
                e,
            )
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        debug!(%upload_url, file = %file_name, "uploading file to Compass");

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        let body = self
            .http
            .post(&upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CompassError::transport("[Compass] HTTP error", e))?
            .error_for_status()
            .map_err(|e| CompassError::transport("[Compass] HTTP error", e))?
            .text()
            .await
            .map_err(|e| CompassError::transport("[Compass] HTTP error", e))?;

        // The upload host answers outside the status envelope and is not
        // guaranteed to return JSON at all.
        let json: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
        extract_file_id(&json).ok_or_else(|| {
            CompassError::api("Compass: file_id missing after upload", None, Map::new())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write as _;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> CompassClient {
        let credentials = Credentials::new(
            "test-token",
            server.uri(),
            Some(Duration::from_secs(5)),
        )
        .unwrap();
        CompassClient::new(credentials).unwrap()
    }

    #[tokio::test]
    async fn test_post_json_ok_returns_response_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/user/send"))
            .and(header("Authorization", "bearer=test-token"))
            .and(header("Accept", "application/json"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(json!({"user_id": 123})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "response": {"message_id": "msg-1"},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let response = client
            .post_json("user/send", &json!({"user_id": 123}))
            .await
            .unwrap();

        assert_eq!(response.get("message_id"), Some(&json!("msg-1")));
    }

    #[tokio::test]
    async fn test_post_json_strips_leading_slash() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/group/send"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let response = client.post_json("/group/send", &json!({})).await.unwrap();
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_post_json_non_ok_becomes_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "error",
                "response": {"message": "invalid token", "error_code": 401},
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.post_json("user/send", &json!({})).await.unwrap_err();

        assert_eq!(err.to_string(), "Compass API error: invalid token");
        assert_eq!(err.error_code(), Some(401));
        assert_eq!(
            err.response().and_then(|r| r.get("message")),
            Some(&json!("invalid token"))
        );
    }

    #[tokio::test]
    async fn test_post_json_non_ok_without_details() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "fail"})))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.post_json("user/send", &json!({})).await.unwrap_err();

        assert_eq!(err.to_string(), "Compass API error: Unknown error");
        assert_eq!(err.error_code(), None);
        assert_eq!(err.response().map(|r| r.is_empty()), Some(true));
    }

    #[tokio::test]
    async fn test_post_json_http_status_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.post_json("user/send", &json!({})).await.unwrap_err();
        assert!(matches!(err, CompassError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_post_json_non_json_body_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.post_json("user/send", &json!({})).await.unwrap_err();
        assert!(matches!(err, CompassError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_post_json_connection_refused_is_transport_error() {
        let credentials = Credentials::new(
            "test-token",
            "http://127.0.0.1:1/",
            Some(Duration::from_secs(1)),
        )
        .unwrap();
        let client = CompassClient::new(credentials).unwrap();

        let err = client.post_json("user/send", &json!({})).await.unwrap_err();
        assert!(matches!(err, CompassError::Transport { .. }));
    }

    fn temp_attachment(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[tokio::test]
    async fn test_upload_file_happy_path() {
        let server = MockServer::start().await;
        let upload_url = format!("{}/storage/put", server.uri());

        Mock::given(method("POST"))
            .and(path("/file/getUrl"))
            .and(body_json(json!({})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "response": {"url": upload_url},
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/storage/put"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"file_id": "file-xyz"})))
            .expect(1)
            .mount(&server)
            .await;

        let attachment = temp_attachment(b"report body");
        let client = client_for(&server).await;
        let file_id = client.upload_file(attachment.path()).await.unwrap();
        assert_eq!(file_id, "file-xyz");

        // The multipart POST must go out raw: no bearer auth, and the part
        // carries the base filename.
        let requests = server.received_requests().await.unwrap();
        let upload = requests
            .iter()
            .find(|r| r.url.path() == "/storage/put")
            .unwrap();
        assert!(!upload.headers.contains_key("Authorization"));
        let raw = String::from_utf8_lossy(&upload.body);
        assert!(raw.contains("name=\"file\""));
        let expected_name = attachment.path().file_name().unwrap().to_string_lossy();
        assert!(raw.contains(expected_name.as_ref()));
        assert!(raw.contains("report body"));
    }

    #[tokio::test]
    async fn test_upload_file_accepts_nested_file_id() {
        let server = MockServer::start().await;
        let upload_url = format!("{}/storage/put", server.uri());

        Mock::given(method("POST"))
            .and(path("/file/getUrl"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                // legacy hosts answer with upload_url instead of url
                "response": {"upload_url": upload_url},
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/storage/put"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": {"file_id": "file-nested"},
            })))
            .mount(&server)
            .await;

        let attachment = temp_attachment(b"x");
        let client = client_for(&server).await;
        let file_id = client.upload_file(attachment.path()).await.unwrap();
        assert_eq!(file_id, "file-nested");
    }

    #[tokio::test]
    async fn test_upload_file_without_url_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/file/getUrl"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "response": {},
            })))
            .mount(&server)
            .await;

        let attachment = temp_attachment(b"x");
        let client = client_for(&server).await;
        let err = client.upload_file(attachment.path()).await.unwrap_err();
        assert_eq!(err.to_string(), "Compass: upload URL not received");
    }

    #[tokio::test]
    async fn test_upload_file_without_file_id_fails() {
        let server = MockServer::start().await;
        let upload_url = format!("{}/storage/put", server.uri());

        Mock::given(method("POST"))
            .and(path("/file/getUrl"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "response": {"url": upload_url},
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/storage/put"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let attachment = temp_attachment(b"x");
        let client = client_for(&server).await;
        let err = client.upload_file(attachment.path()).await.unwrap_err();
        assert_eq!(err.to_string(), "Compass: file_id missing after upload");
    }

    #[tokio::test]
    async fn test_upload_file_missing_local_file() {
        let server = MockServer::start().await;
        let upload_url = format!("{}/storage/put", server.uri());

        Mock::given(method("POST"))
            .and(path("/file/getUrl"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "response": {"url": upload_url},
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .upload_file(Path::new("/nonexistent/report.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, CompassError::Transport { .. }));
    }
}
