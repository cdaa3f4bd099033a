//! HTTP client for the Just-Magic task API.
//!
//! Every call is a multipart POST to a single endpoint carrying `action` and
//! `apikey` plus action-specific fields. All failures come back as
//! [`ToolError`] values; nothing here panics.

use reqwest::multipart::Form;
use seomagic_config::RemoteConfig;
use seomagic_core::error::{ErrorKind, ToolError};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::builder::RemoteTask;
use crate::catalog::{LIST_LIMIT, LIST_OFFSET};
use crate::payload::{TableResult, decode_table};

/// Rows returned when `get_task` is asked for a `csv` export.
const CSV_PREVIEW_ROWS: usize = 100;

/// The outcome of a task submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// Present for real submissions that the remote side accepted.
    pub task_id: Option<u64>,
    pub dry_run: bool,
    /// The remote response as received.
    pub response: Value,
}

impl Submission {
    /// The result shown to the model. A dry run only quotes a price, so any
    /// `tid` the remote side echoes is removed.
    pub fn into_result(self) -> Value {
        let mut response = self.response;
        if self.dry_run {
            if let Some(map) = response.as_object_mut() {
                map.remove("tid");
            }
        }
        response
    }
}

pub struct TaskApiClient {
    api_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl TaskApiClient {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "HTTP client builder failed; task API calls have no timeout");
                reqwest::Client::new()
            });
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Build a client from config. `None` when no API key is configured.
    pub fn from_config(config: &RemoteConfig) -> Option<Self> {
        let key = config.api_key.as_deref().filter(|k| !k.is_empty())?;
        Some(Self::new(
            config.api_url.clone(),
            key,
            Duration::from_secs(config.timeout_secs),
        ))
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn post(&self, action: &str, fields: &[(&str, String)]) -> Result<reqwest::Response, ToolError> {
        let mut form = Form::new()
            .text("action", action.to_string())
            .text("apikey", self.api_key.clone());
        for (name, value) in fields {
            form = form.text(name.to_string(), value.clone());
        }

        debug!(action, fields = fields.len(), "Calling task API");
        let response = self
            .client
            .post(&self.api_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(action, error = %e, "Task API request failed");
                ToolError::request(format!("task API request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::request(format!(
                "task API returned HTTP {}",
                status.as_u16()
            )));
        }
        Ok(response)
    }

    async fn request_json(&self, action: &str, fields: &[(&str, String)]) -> Result<Value, ToolError> {
        let response = self.post(action, fields).await?;
        let value: Value = response
            .json()
            .await
            .map_err(|e| ToolError::request(format!("task API sent invalid JSON: {e}")))?;
        check_remote_error(value)
    }

    /// Account information: balance and limits.
    pub async fn info(&self) -> Result<Value, ToolError> {
        self.request_json("info", &[]).await
    }

    /// A page of recent tasks. The limit is clamped to [1, 100].
    pub async fn list_tasks(&self, limit: i64, offset: i64) -> Result<Value, ToolError> {
        let fields = [
            ("limit", LIST_LIMIT.clamp(limit).to_string()),
            ("offset", LIST_OFFSET.clamp(offset).to_string()),
        ];
        self.request_json("list_tasks", &fields).await
    }

    /// Task status (`info`), a result export (`xlsx`) or a table preview (`csv`).
    ///
    /// `csv` goes through [`fetch_table`](Self::fetch_table) and returns the
    /// first rows. Binary exports cannot be relayed to the model, so a
    /// non-JSON body is summarized by its size.
    pub async fn get_task(&self, tid: i64, mode: &str) -> Result<Value, ToolError> {
        if mode == "csv" {
            return self
                .fetch_table(tid, CSV_PREVIEW_ROWS)
                .await
                .map(|table| table.to_json());
        }

        let fields = [("tid", tid.to_string()), ("mode", mode.to_string())];
        let response = self.post("get_task", &fields).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ToolError::request(format!("failed to read task API response: {e}")))?;

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => check_remote_error(value),
            Err(_) => Ok(serde_json::json!({
                "err": 0,
                "tid": tid,
                "mode": mode,
                "size_bytes": bytes.len(),
            })),
        }
    }

    /// Submit a task. Dry runs never yield a task id.
    pub async fn submit(&self, task: &RemoteTask) -> Result<Submission, ToolError> {
        let mut fields: Vec<(&str, String)> = Vec::with_capacity(task.fields.len() + 2);
        fields.push(("task", task.mnemonic.to_string()));
        fields.extend(task.fields.iter().map(|(n, v)| (*n, v.clone())));
        if task.dry_run {
            fields.push(("justask", "1".to_string()));
        }

        let response = self.request_json("put_task", &fields).await?;
        let task_id = if task.dry_run {
            None
        } else {
            task_id(&response)
        };
        debug!(task = task.mnemonic, dry_run = task.dry_run, ?task_id, "Task submitted");

        Ok(Submission {
            task_id,
            dry_run: task.dry_run,
            response,
        })
    }

    /// Download a finished task's result table.
    pub async fn fetch_table(&self, tid: i64, max_rows: usize) -> Result<TableResult, ToolError> {
        let fields = [
            ("tid", tid.to_string()),
            ("mode", "csv".to_string()),
            ("system", "unix".to_string()),
        ];
        let response = self.post("get_task", &fields).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ToolError::no_data(format!("failed to read result body: {e}")))?;
        decode_table(&bytes, max_rows)
    }
}

/// Turn a truthy `err` field into an `api_error`.
fn check_remote_error(value: Value) -> Result<Value, ToolError> {
    let failed = match value.get("err") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(Value::String(s)) => !s.is_empty() && s != "0",
        Some(_) => true,
    };
    if !failed {
        return Ok(value);
    }

    let message = value
        .get("errtxt")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("task API error {}", value["err"]));
    Err(ToolError::new(ErrorKind::ApiError, message))
}

fn task_id(response: &Value) -> Option<u64> {
    match response.get("tid")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> TaskApiClient {
        TaskApiClient::new(server.uri(), "test-key", Duration::from_secs(5))
    }

    #[test]
    fn dry_run_submission_drops_tid() {
        let dry = Submission {
            task_id: None,
            dry_run: true,
            response: serde_json::json!({"err": 0, "tid": 7, "price": 2.0}),
        };
        assert_eq!(dry.into_result(), serde_json::json!({"err": 0, "price": 2.0}));

        let real = Submission {
            task_id: Some(7),
            dry_run: false,
            response: serde_json::json!({"err": 0, "tid": 7}),
        };
        assert_eq!(real.into_result()["tid"], 7);
    }

    fn field(name: &str, value: &str) -> String {
        format!("name=\"{name}\"\r\n\r\n{value}\r\n")
    }

    #[tokio::test]
    async fn submit_returns_task_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains(field("action", "put_task")))
            .and(body_string_contains(field("apikey", "test-key")))
            .and(body_string_contains(field("task", "grp_onl")))
            .and(body_string_contains(field("ya_lr", "213")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"err": 0, "tid": 4821})))
            .expect(1)
            .mount(&server)
            .await;

        let task = RemoteTask {
            mnemonic: "grp_onl",
            fields: vec![("data", "a\nb".into()), ("ya_lr", "213".into())],
            dry_run: false,
        };
        let submission = client_for(&server).submit(&task).await.unwrap();
        assert_eq!(submission.task_id, Some(4821));
        assert!(!submission.dry_run);
    }

    #[tokio::test]
    async fn dry_run_sends_justask_and_has_no_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains(field("justask", "1")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"err": 0, "tid": 99, "price": 12.5})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let task = RemoteTask {
            mnemonic: "wsfreq",
            fields: vec![("data", "q".into())],
            dry_run: true,
        };
        let submission = client_for(&server).submit(&task).await.unwrap();
        assert_eq!(submission.task_id, None);
        assert_eq!(submission.response["price"], 12.5);
    }

    #[tokio::test]
    async fn list_tasks_clamps_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains(field("action", "list_tasks")))
            .and(body_string_contains(field("limit", "100")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"err": 0, "tasks": []})))
            .expect(1)
            .mount(&server)
            .await;

        let value = client_for(&server).list_tasks(500, 0).await.unwrap();
        assert!(value["tasks"].is_array());
    }

    #[tokio::test]
    async fn remote_error_becomes_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"err": 3, "errtxt": "Insufficient funds"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).info().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ApiError);
        assert_eq!(err.message, "Insufficient funds");
    }

    #[tokio::test]
    async fn non_json_is_request_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).info().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::RequestError);
    }

    #[tokio::test]
    async fn http_failure_is_request_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = client_for(&server).list_tasks(10, 0).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::RequestError);
        assert!(err.message.contains("502"));
    }

    #[tokio::test]
    async fn unreachable_host_is_request_error() {
        let client = TaskApiClient::new("http://127.0.0.1:9", "k", Duration::from_secs(2));
        let err = client.info().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::RequestError);
    }

    #[tokio::test]
    async fn fetch_table_with_garbage_is_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains(field("mode", "csv")))
            .and(body_string_contains(field("system", "unix")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0x00, 0xfe, 0x80]))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_table(5, 100).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoData);
    }

    #[tokio::test]
    async fn get_task_binary_export_is_summarized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains(field("mode", "xlsx")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x50, 0x4b, 0x03, 0x04, 0x00]))
            .mount(&server)
            .await;

        let value = client_for(&server).get_task(5, "xlsx").await.unwrap();
        assert_eq!(value["size_bytes"], 5);
        assert_eq!(value["mode"], "xlsx");
    }

    #[test]
    fn from_config_requires_key() {
        let mut config = RemoteConfig::default();
        assert!(TaskApiClient::from_config(&config).is_none());
        config.api_key = Some(String::new());
        assert!(TaskApiClient::from_config(&config).is_none());
        config.api_key = Some("k".into());
        assert!(TaskApiClient::from_config(&config).is_some());
    }

    #[test]
    fn remote_error_detection() {
        assert!(check_remote_error(serde_json::json!({"err": 0})).is_ok());
        assert!(check_remote_error(serde_json::json!({"err": ""})).is_ok());
        assert!(check_remote_error(serde_json::json!({"tasks": []})).is_ok());
        assert!(check_remote_error(serde_json::json!({"err": "bad_key"})).is_err());
    }
}
