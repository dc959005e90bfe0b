use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::models::{Activity, BalanceResponse, CreatedActivity, ErrorBody, NewActivity};

/// The four calls the activity page makes against the backend.
pub trait Backend {
    fn list_activities(&self) -> impl Future<Output = Result<Vec<Activity>, ApiError>>;

    fn balance(&self, wallet_address: &str) -> impl Future<Output = Result<Option<f64>, ApiError>>;

    fn create_activity(
        &self,
        activity: &NewActivity,
    ) -> impl Future<Output = Result<Activity, ApiError>>;

    fn delete_activity(&self, id: &str) -> impl Future<Output = Result<(), ApiError>>;
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: &str, token: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Backend for ApiClient {
    async fn list_activities(&self) -> Result<Vec<Activity>, ApiError> {
        let response = self
            .http
            .get(self.url("/api/activities"))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let body: Value = response.json().await?;
        decode_activity_list(body)
    }

    async fn balance(&self, wallet_address: &str) -> Result<Option<f64>, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("/api/balance/{wallet_address}")))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let body = response.text().await?;
        decode_balance(&body)
    }

    async fn create_activity(&self, activity: &NewActivity) -> Result<Activity, ApiError> {
        let response = self
            .http
            .post(self.url("/api/activity"))
            .bearer_auth(&self.token)
            .json(activity)
            .send()
            .await?;

        let body = successful_body(response).await?;
        let created: CreatedActivity = serde_json::from_str(&body)?;
        Ok(created.activity)
    }

    async fn delete_activity(&self, id: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.url(&format!("/api/activity/{id}")))
            .bearer_auth(&self.token)
            .send()
            .await?;

        successful_body(response).await?;
        Ok(())
    }
}

async fn successful_body(response: Response) -> Result<String, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    check_status(status, body)
}

/// A non-array list body is an empty list.
fn decode_activity_list(body: Value) -> Result<Vec<Activity>, ApiError> {
    match body {
        Value::Array(_) => Ok(serde_json::from_value(body)?),
        other => {
            debug!(body = %other, "activity list response was not an array");
            Ok(Vec::new())
        }
    }
}

// The balance body is read whatever the status.
fn decode_balance(body: &str) -> Result<Option<f64>, ApiError> {
    let parsed: BalanceResponse = serde_json::from_str(body)?;
    Ok(parsed.total_token)
}

fn check_status(status: StatusCode, body: String) -> Result<String, ApiError> {
    if status.is_success() {
        return Ok(body);
    }

    let message = error_message(&body);
    warn!(status = status.as_u16(), message = ?message, "request rejected");
    Err(ApiError::Rejected {
        status: status.as_u16(),
        message,
    })
}

pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .filter(|message| !message.is_empty())
}
