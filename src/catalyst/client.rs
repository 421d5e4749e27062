use anyhow::Result;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;

use super::types::*;

const AUTH_PATH: &str = "/dna/system/api/v1/auth/token";

/// Catalyst Center (DNA Center) API client
pub struct CatalystClient {
    base_url: String,
    username: String,
    password: String,
    client: Client,
    token: Mutex<Option<String>>,
}

impl CatalystClient {
    pub fn new(base_url: String, username: String, password: String, verify_ssl: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .danger_accept_invalid_certs(!verify_ssl)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
            password,
            client,
            token: Mutex::new(None),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn authenticate(&self) -> Result<String> {
        let resp = self
            .client
            .post(self.api_url(AUTH_PATH))
            .basic_auth(&self.username, Some(&self.password))
            .header("Content-Type", "application/json")
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Catalyst Center auth failed {}: {}", status, body));
        }

        let auth: AuthToken = resp.json().await?;
        tracing::info!("Authenticated to Catalyst Center at {}", self.base_url);
        Ok(auth.token)
    }

    /// Cached token, authenticating on first use
    async fn token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }
        let token = self.authenticate().await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    async fn refresh_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        let token = self.authenticate().await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    /// Send a request with the auth token, re-authenticating once if it was rejected
    async fn send<F>(&self, build: F) -> Result<Response>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let token = self.token().await?;
        let resp = build(&token).send().await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return check(resp).await;
        }

        tracing::debug!("Catalyst Center token rejected, re-authenticating");
        let token = self.refresh_token().await?;
        let resp = build(&token).send().await?;
        check(resp).await
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.api_url(path);
        let resp = self
            .send(|token| {
                self.client
                    .get(&url)
                    .header("X-Auth-Token", token)
                    .header("Accept", "application/json")
            })
            .await?;
        Ok(resp.json().await?)
    }

    // --- Inventory ---

    pub async fn get_devices(&self) -> Result<Vec<NetworkDevice>> {
        let devices: Envelope<Vec<NetworkDevice>> =
            self.get("/dna/intent/api/v1/network-device").await?;
        tracing::info!("Retrieved {} devices", devices.response.len());
        Ok(devices.response)
    }

    pub async fn get_sites(&self) -> Result<Vec<Site>> {
        let sites: Envelope<Vec<Site>> = self.get("/dna/intent/api/v1/site").await?;
        tracing::info!("Retrieved {} sites", sites.response.len());
        Ok(sites.response)
    }

    pub async fn get_network_health(&self) -> Result<Value> {
        let health: Envelope<Value> = self.get("/dna/intent/api/v1/network-health").await?;
        Ok(health.response)
    }

    // --- Template programmer ---

    /// Configuration templates known to the controller (returned unwrapped)
    pub async fn get_templates(&self) -> Result<Vec<Value>> {
        let templates: Vec<Value> = self
            .get("/dna/intent/api/v1/template-programmer/template")
            .await?;
        tracing::info!("Retrieved {} controller templates", templates.len());
        Ok(templates)
    }

    pub async fn deploy_template(&self, req: &DeployRequest) -> Result<Value> {
        let url = self.api_url("/dna/intent/api/v1/template-programmer/template/deploy");
        let body = TemplateDeployment::from(req);
        let resp = self
            .send(|token| {
                self.client
                    .post(&url)
                    .header("X-Auth-Token", token)
                    .json(&body)
            })
            .await?;

        tracing::info!("Template {} deployment initiated", req.template_id);
        Ok(resp.json().await?)
    }
}

async fn check(resp: Response) -> Result<Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    Err(anyhow::anyhow!("Catalyst Center API error {}: {}", status, body))
}
