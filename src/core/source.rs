use std::future::Future;

use reqwest::header::ACCEPT;
use reqwest::Client;
use tracing::{debug, info};

use crate::core::endpoints::{Endpoints, JobAction};
use crate::core::error::StatusError;
use crate::core::snapshot::{parse_status_body, StatusSnapshot};

/// Where the widget gets its snapshots from.
pub trait StatusSource: Send + Sync + 'static {
    /// `Ok(None)` means the server answered without data.
    fn fetch_status(
        &self,
    ) -> impl Future<Output = Result<Option<StatusSnapshot>, StatusError>> + Send;
}

/// Status and action endpoints over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStatusSource {
    client: Client,
    endpoints: Endpoints,
}

impl HttpStatusSource {
    pub fn new(endpoints: Endpoints) -> Result<Self, StatusError> {
        let client = Client::builder()
            .user_agent(concat!("bulkexport-status/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StatusError::request(&endpoints.status, e))?;
        Ok(Self { client, endpoints })
    }

    /// POSTs one of the job control actions. Any 2xx reply counts as accepted.
    pub async fn post_action(&self, action: JobAction) -> Result<(), StatusError> {
        let url = self.endpoints.action(action);
        let resp = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| StatusError::request(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StatusError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        info!(event = "status.action.sent", action = action.name(), url);
        Ok(())
    }
}

impl StatusSource for HttpStatusSource {
    async fn fetch_status(&self) -> Result<Option<StatusSnapshot>, StatusError> {
        let url = &self.endpoints.status;
        let resp = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| StatusError::request(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StatusError::HttpStatus {
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(|e| StatusError::request(url, e))?;
        debug!(event = "status.fetch.received", bytes = body.len());
        Ok(parse_status_body(&body)?)
    }
}
