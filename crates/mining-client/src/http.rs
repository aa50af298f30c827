//! REST implementation of the mining backend

use crate::backend::MiningBackend;
use crate::types::{
    ActivityRecord, ActivitySubmission, BatchRecordResult, MiningStats, RecordOutcome,
};
use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// HTTP client for the mining API
#[derive(Clone)]
pub struct HttpMiningBackend {
    base_url: String,
    client: reqwest::Client,
    auth_token: Option<String>,
}

impl HttpMiningBackend {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            auth_token: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> anyhow::Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "POST");
        let response = self
            .authorize(self.client.post(&url))
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {path}"))?;
        Self::read_json(path, response).await
    }

    async fn get_json(&self, path: &str, user_id: &str) -> anyhow::Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET");
        let response = self
            .authorize(self.client.get(&url).query(&[("user_id", user_id)]))
            .send()
            .await
            .with_context(|| format!("GET {path}"))?;
        Self::read_json(path, response).await
    }

    async fn read_json(path: &str, response: reqwest::Response) -> anyhow::Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("{path} returned {status}: {body}");
        }
        response
            .json::<Value>()
            .await
            .with_context(|| format!("{path} returned a non-JSON body"))
    }
}

fn success_flag(value: &Value) -> bool {
    value.get("success").and_then(Value::as_bool).unwrap_or(false)
}

#[async_trait]
impl MiningBackend for HttpMiningBackend {
    async fn start_mining(&self, user_id: &str) -> anyhow::Result<bool> {
        let resp = self
            .post_json("/api/mining/start/", &json!({ "user_id": user_id }))
            .await?;
        Ok(success_flag(&resp))
    }

    async fn stop_mining(&self, user_id: &str) -> anyhow::Result<bool> {
        let resp = self
            .post_json("/api/mining/stop/", &json!({ "user_id": user_id }))
            .await?;
        Ok(success_flag(&resp))
    }

    async fn record_activity(
        &self,
        user_id: &str,
        activity: &ActivitySubmission,
    ) -> anyhow::Result<RecordOutcome> {
        let resp = self
            .post_json(
                "/api/mining/activity/",
                &json!({
                    "user_id": user_id,
                    "activity_type": activity.activity,
                    "points": activity.points,
                    "tokens": activity.tokens,
                }),
            )
            .await?;

        if !success_flag(&resp) {
            return Ok(RecordOutcome::Rejected);
        }
        // The echoed record is informational; an unexpected shape is not a failure
        let record = resp
            .get("activity")
            .cloned()
            .and_then(|v| serde_json::from_value::<ActivityRecord>(v).ok());
        Ok(RecordOutcome::Accepted(record))
    }

    async fn batch_record_activities(
        &self,
        user_id: &str,
        activities: &[ActivitySubmission],
    ) -> anyhow::Result<BatchRecordResult> {
        let resp = self
            .post_json(
                "/api/mining/activity/batch/",
                &json!({ "user_id": user_id, "activities": activities }),
            )
            .await?;
        Ok(serde_json::from_value(resp)?)
    }

    async fn get_mining_stats(&self, user_id: &str) -> anyhow::Result<MiningStats> {
        let resp = self.get_json("/api/mining/stats/", user_id).await?;
        Ok(MiningStats::from_value(&resp)?)
    }

    async fn check_mining_status(&self, user_id: &str) -> anyhow::Result<bool> {
        let resp = self.get_json("/api/mining/status/", user_id).await?;
        match resp.get("is_mining") {
            Some(Value::Bool(is_mining)) => Ok(*is_mining),
            Some(other) => {
                anyhow::bail!("/api/mining/status/ returned non-boolean is_mining: {other}")
            }
            None => anyhow::bail!("/api/mining/status/ response is missing is_mining"),
        }
    }

    async fn send_heartbeat(&self, user_id: &str) -> anyhow::Result<bool> {
        let resp = self
            .post_json("/api/mining/heartbeat/", &json!({ "user_id": user_id }))
            .await?;
        Ok(success_flag(&resp))
    }
}
