//! # HTTP Adapter
//!
//! reqwest-backed implementation of the three server-facing ports.
//!
//! | Port | Request |
//! |------|---------|
//! | `HealthProbe` | `GET {health_path}?_=<millis>` with `Cache-Control: no-cache` |
//! | `VoteGateway` | `POST {vote_path}?token=<token>`, form body `vote=<choice>` |
//! | `IncidentSink` | `POST {incident_path}`, JSON `{kind, detail, token_hash}` |

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::Client;

use crate::adapters::time::SystemTimeSource;
use crate::config::TerminalConfig;
use crate::domain::{
    truncate_detail, BallotError, DeliveryFailure, DeliveryReceipt, IncidentReport, VoteChoice,
    VotingToken,
};
use crate::ports::{HealthProbe, IncidentSink, TimeSource, VoteGateway};

/// Terminal HTTP client.
#[derive(Clone)]
pub struct HttpTerminalClient {
    client: Client,
    vote_url: String,
    health_url: String,
    incident_url: String,
}

impl HttpTerminalClient {
    /// Build a client with the configured transport timeouts.
    pub fn new(config: &TerminalConfig) -> Result<Self, BallotError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| BallotError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            vote_url: config.endpoint(&config.vote_path),
            health_url: config.endpoint(&config.health_path),
            incident_url: config.endpoint(&config.incident_path),
        })
    }
}

fn transport(e: reqwest::Error) -> DeliveryFailure {
    let detail = if e.is_timeout() {
        format!("timeout: {e}")
    } else if e.is_connect() {
        format!("connect: {e}")
    } else {
        e.to_string()
    };
    DeliveryFailure::Transport(truncate_detail(&detail))
}

async fn rejected(response: reqwest::Response) -> DeliveryFailure {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    DeliveryFailure::Rejected {
        status,
        body: truncate_detail(body.trim()),
    }
}

#[async_trait]
impl VoteGateway for HttpTerminalClient {
    async fn submit_vote(
        &self,
        token: &VotingToken,
        choice: VoteChoice,
    ) -> Result<DeliveryReceipt, DeliveryFailure> {
        let response = self
            .client
            .post(&self.vote_url)
            .query(&[("token", token.as_str())])
            .form(&[("vote", choice.as_str())])
            .send()
            .await
            .map_err(transport)?;

        if response.status().is_success() {
            Ok(DeliveryReceipt {
                status: response.status().as_u16(),
            })
        } else {
            Err(rejected(response).await)
        }
    }
}

#[async_trait]
impl HealthProbe for HttpTerminalClient {
    async fn probe(&self) -> bool {
        let buster = SystemTimeSource.now().as_millis().to_string();
        match self
            .client
            .get(&self.health_url)
            .query(&[("_", buster.as_str())])
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await
        {
            // Any HTTP answer proves reachability.
            Ok(_) => true,
            Err(e) => {
                tracing::trace!(error = %e, "[bt] probe unreachable");
                false
            }
        }
    }
}

#[async_trait]
impl IncidentSink for HttpTerminalClient {
    async fn send(&self, report: &IncidentReport) -> Result<(), DeliveryFailure> {
        let response = self
            .client
            .post(&self.incident_url)
            .json(report)
            .send()
            .await
            .map_err(transport)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(rejected(response).await)
        }
    }
}
