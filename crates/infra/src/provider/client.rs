//! Meeting provider API client.

use std::sync::Arc;

use async_trait::async_trait;
use classline_core::MeetingProvider;
use classline_domain::constants::RECURRENCE_END_TIMES;
use classline_domain::{
    ClasslineError, ProvisionedMeeting, RecurringMeetingRequest, Result,
};
use reqwest::{Method, Response, StatusCode};
use tracing::{debug, instrument, warn};

use super::token::TokenCache;
use super::types::{
    provider_weekday, CreateMeetingBody, MeetingResponse, RecurrenceBody,
    MEETING_TYPE_RECURRING_FIXED, RECURRENCE_TYPE_WEEKLY,
};
use crate::errors::InfraError;
use crate::http::HttpClient;

/// REST client implementing the `MeetingProvider` port.
///
/// Transport-level retries live in [`HttpClient`]; this layer adds the
/// single token-refresh retry on 401 and maps provider rejections onto
/// domain errors.
pub struct MeetingApiClient {
    http: HttpClient,
    tokens: Arc<TokenCache>,
    api_base_url: String,
    timezone: String,
}

impl MeetingApiClient {
    pub fn new(
        http: HttpClient,
        tokens: Arc<TokenCache>,
        api_base_url: impl Into<String>,
        timezone: impl Into<String>,
    ) -> Self {
        Self { http, tokens, api_base_url: api_base_url.into(), timezone: timezone.into() }
    }

    fn build_body(&self, request: &RecurringMeetingRequest) -> CreateMeetingBody {
        CreateMeetingBody {
            topic: request.topic.clone(),
            meeting_type: MEETING_TYPE_RECURRING_FIXED,
            start_time: request.first_start.format("%Y-%m-%dT%H:%M:%S").to_string(),
            duration: request.duration_minutes,
            timezone: self.timezone.clone(),
            recurrence: RecurrenceBody {
                recurrence_type: RECURRENCE_TYPE_WEEKLY,
                repeat_interval: 1,
                weekly_days: provider_weekday(request.weekday).to_string(),
                end_times: RECURRENCE_END_TIMES,
            },
        }
    }

    async fn post_meeting(
        &self,
        host: &str,
        body: &CreateMeetingBody,
        token: &str,
    ) -> Result<Response> {
        let url = format!("{}/users/{}/meetings", self.api_base_url.trim_end_matches('/'), host);
        let builder = self.http.request(Method::POST, &url).bearer_auth(token).json(body);
        self.http.send(builder).await
    }
}

#[async_trait]
impl MeetingProvider for MeetingApiClient {
    #[instrument(skip(self, request), fields(host = %request.host_identity, topic = %request.topic))]
    async fn create_recurring_meeting(
        &self,
        request: &RecurringMeetingRequest,
    ) -> Result<ProvisionedMeeting> {
        let body = self.build_body(request);

        let token = self.tokens.get().await?;
        let mut response = self.post_meeting(&request.host_identity, &body, &token).await?;

        // A 401 means the cached lease was revoked server-side; refresh
        // exactly once and replay.
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(host = %request.host_identity, "provider rejected token, refreshing lease");
            self.tokens.invalidate().await;
            let token = self.tokens.get().await?;
            response = self.post_meeting(&request.host_identity, &body, &token).await?;
        }

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClasslineError::Auth(format!(
                "provider rejected refreshed credentials for host {}",
                request.host_identity
            )));
        }

        if status.is_client_error() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ClasslineError::Validation(format!(
                "provider rejected meeting request ({status}): {detail}"
            )));
        }

        if !status.is_success() {
            return Err(ClasslineError::Provider(format!(
                "provider returned {status} creating meeting for host {}",
                request.host_identity
            )));
        }

        let parsed: MeetingResponse =
            response.json().await.map_err(|err| ClasslineError::from(InfraError::from(err)))?;

        debug!(meeting_id = parsed.id, "recurring meeting created");

        Ok(ProvisionedMeeting {
            external_meeting_id: parsed.id.to_string(),
            join_url: parsed.join_url,
            first_start: request.first_start,
            provider_status: parsed.status.unwrap_or_else(|| "created".to_string()),
        })
    }
}
