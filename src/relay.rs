//! HTTP relay for clients that cannot fetch the feed directly (browsers
//! blocked by cross-origin rules, networks that filter the source).
//!
//! `GET /relay/document` performs the upstream request and answers 200 with
//! the raw body, or 502 with a plain-text reason.

use crate::transport::relay::RELAY_DOCUMENT_PATH;
use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use reqwest::header::ACCEPT;
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info, instrument};

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub source_url: String,
    pub timeout: Duration,
}

pub struct RelayState {
    client: Client,
    config: RelayConfig,
}

impl RelayState {
    pub fn new(config: RelayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build upstream HTTP client")?;
        Ok(Self { client, config })
    }

    async fn fetch_upstream(&self) -> Result<String, String> {
        let response = self
            .client
            .get(&self.config.source_url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| format!("upstream request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("upstream returned HTTP {}", status));
        }

        response
            .text()
            .await
            .map_err(|e| format!("failed to read upstream body: {}", e))
    }
}

#[instrument(skip(state))]
async fn relay_document(state: web::Data<RelayState>) -> HttpResponse {
    match state.fetch_upstream().await {
        Ok(body) => {
            info!(bytes = body.len(), "Relayed prompt document");
            HttpResponse::Ok().content_type("text/plain; charset=utf-8").body(body)
        }
        Err(reason) => {
            error!(reason = %reason, url = %state.config.source_url, "Relay fetch failed");
            HttpResponse::BadGateway()
                .content_type("text/plain; charset=utf-8")
                .body(reason)
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(RELAY_DOCUMENT_PATH, web::get().to(relay_document));
}

/// Runs the relay until the process is stopped.
pub async fn serve(config: RelayConfig, port: u16) -> Result<()> {
    let state = web::Data::new(RelayState::new(config)?);
    let addr = format!("127.0.0.1:{}", port);
    info!(address = %addr, "Starting prompt relay");

    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind(&addr)
        .with_context(|| format!("Failed to bind relay to {}", addr))?
        .run()
        .await
        .context("Relay server failed")
}
