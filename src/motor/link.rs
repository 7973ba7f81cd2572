// HTTP command link to the rover controller
//
// Wire format: POST <controller>/command/
//   Content-type: application/x-www-form-urlencoded
//   0=<v0>&1=<v1>&2=<v2>&3=<v3>

use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use crate::config::{ConfigError, DriveConfig};
use crate::messages::WheelCommand;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Error types for the command link
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid command endpoint: {0}")]
    Endpoint(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Controller at {url} answered {status}")]
    Status { url: Url, status: StatusCode },
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Posts wheel commands to the rover controller
#[derive(Debug, Clone)]
pub struct CommandLink {
    client: Client,
    endpoint: Url,
}

impl CommandLink {
    /// Build the HTTP client for the configured controller
    pub fn new(config: &DriveConfig) -> Result<Self> {
        let endpoint = config.command_url()?;
        let client = Client::builder()
            .no_proxy()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send one command and wait for the controller's answer
    pub async fn send(&self, command: &WheelCommand) -> Result<()> {
        let body = command.to_form_body();
        debug!("POST {} {}", self.endpoint, body);

        let resp = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: self.endpoint.clone(),
                status,
            });
        }
        Ok(())
    }
}
