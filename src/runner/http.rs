//! HTTP-based task runner client.

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::ApiError;
use crate::runner::{Runner, RunnerEvent, TaskContext, TaskHandle};

const PROVIDER: &str = "runner";

pub struct HttpRunner {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpRunner {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token,
            client: reqwest::Client::new(),
        }
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn map_status(&self, status: reqwest::StatusCode, body: String) -> ApiError {
        match status.as_u16() {
            401 => ApiError::Unauthorized { provider: PROVIDER },
            _ => ApiError::Http {
                provider: PROVIDER,
                status: status.as_u16(),
                message: body,
            },
        }
    }
}

#[derive(Deserialize)]
struct CreateTaskResponse {
    task_id: String,
    #[serde(default)]
    estimated_duration_secs: Option<u64>,
}

#[async_trait]
impl Runner for HttpRunner {
    async fn create_task(&self, prompt: &str, context: &TaskContext) -> Result<TaskHandle, ApiError> {
        let body = serde_json::json!({
            "prompt": prompt,
            "context": context,
        });

        let response = self
            .authed(self.client.post(format!("{}/tasks", self.base_url)).json(&body))
            .send()
            .await
            .map_err(|e| ApiError::Network { provider: PROVIDER, message: e.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(self.map_status(status, text));
        }

        let parsed: CreateTaskResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Network { provider: PROVIDER, message: e.to_string() })?;

        Ok(TaskHandle {
            task_id: parsed.task_id,
            estimated_duration_secs: parsed.estimated_duration_secs,
        })
    }

    async fn cancel_task(&self, task_id: &str) -> Result<(), ApiError> {
        let response = self
            .authed(self.client.post(format!("{}/tasks/{}/cancel", self.base_url, task_id)))
            .send()
            .await
            .map_err(|e| ApiError::Network { provider: PROVIDER, message: e.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(self.map_status(status, text));
        }
        Ok(())
    }

    async fn poll_status(&self, task_id: &str) -> Option<RunnerEvent> {
        let response = self
            .authed(self.client.get(format!("{}/tasks/{}", self.base_url, task_id)))
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            return None;
        }

        response.json::<RunnerEvent>().await.ok()
    }
}
