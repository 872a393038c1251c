//! reqwest client for the DigitalOcean v2 REST API.

use super::types::*;
use super::{ApiError, ApiResult, CloudApi};
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Production API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.digitalocean.com";

/// Connection settings shared by every client built from one config.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub api_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("{}/{}", crate::SERVER_NAME, crate::SERVER_VERSION),
        }
    }
}

/// Error body returned by the API on non-2xx responses.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ErrorBody {
    id: String,
    message: String,
}

// ── Client ──────────────────────────────────────────────────────────

/// Authenticated DigitalOcean client.
#[derive(Debug, Clone)]
pub struct DigitalOceanClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl DigitalOceanClient {
    /// Builds the pooled reqwest client that per-token clients share.
    pub fn http_client(options: &ClientOptions) -> ApiResult<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.as_str())
            .build()?)
    }

    /// Builds a client around an existing reqwest client (shared pool).
    pub fn with_client(client: reqwest::Client, token: &str, api_url: &str) -> Self {
        Self {
            client,
            base_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// Absolute URIs are reduced to their path and query, so requests
    /// only ever reach the configured API host.
    fn url(&self, path: &str) -> String {
        let path = match reqwest::Url::parse(path) {
            Ok(parsed) if parsed.has_host() => match parsed.query() {
                Some(query) => format!("{}?{}", parsed.path(), query),
                None => parsed.path().to_string(),
            },
            _ => path.to_string(),
        };
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Sends one request and returns the raw response on 2xx.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> ApiResult<reqwest::Response> {
        let url = self.url(path);
        log::debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .bearer_auth(&self.token)
            .header("content-type", "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(status_error(method.as_str(), &url, status.as_u16(), &text));
        }
        Ok(response)
    }

    /// Sends a request and decodes the named field of the response envelope.
    async fn call<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
        field: &str,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.send(method, path, query, body).await?;
        let envelope: Value = response.json().await?;
        unwrap_field(envelope, field)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        field: &str,
    ) -> ApiResult<T> {
        self.call::<T, ()>(Method::GET, path, query, None, field).await
    }

    async fn delete(&self, path: &str, query: &[(&str, String)]) -> ApiResult<()> {
        self.send::<()>(Method::DELETE, path, query, None).await?;
        Ok(())
    }
}

/// Maps a non-2xx response into [`ApiError::Status`].
fn status_error(method: &str, url: &str, status: u16, body: &str) -> ApiError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = if parsed.message.is_empty() {
        body.trim().to_string()
    } else {
        parsed.message
    };
    ApiError::Status {
        method: method.to_string(),
        url: url.to_string(),
        status,
        id: parsed.id,
        message,
    }
}

/// Extracts `field` from a response envelope such as `{"droplet": {...}}`.
fn unwrap_field<T: DeserializeOwned>(mut envelope: Value, field: &str) -> ApiResult<T> {
    let inner = envelope
        .get_mut(field)
        .map(Value::take)
        .ok_or_else(|| ApiError::Decode(format!("missing '{}' in response", field)))?;
    serde_json::from_value(inner).map_err(|e| ApiError::Decode(e.to_string()))
}

fn image_filter_query(filter: ImageFilter) -> Option<(&'static str, &'static str)> {
    match filter {
        ImageFilter::All => None,
        ImageFilter::Distribution => Some(("type", "distribution")),
        ImageFilter::Application => Some(("type", "application")),
        ImageFilter::User => Some(("private", "true")),
    }
}

fn with_paging(opts: &ListOptions, extra: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
    let mut query = extra.to_vec();
    query.extend(opts.query());
    query
}

// ── CloudApi ────────────────────────────────────────────────────────

#[async_trait]
impl CloudApi for DigitalOceanClient {
    async fn create_droplet(&self, req: &DropletCreateRequest) -> ApiResult<Droplet> {
        self.call(Method::POST, "/v2/droplets", &[], Some(req), "droplet")
            .await
    }

    async fn create_droplets(&self, req: &DropletMultiCreateRequest) -> ApiResult<Vec<Droplet>> {
        self.call(Method::POST, "/v2/droplets", &[], Some(req), "droplets")
            .await
    }

    async fn get_droplet(&self, id: i64) -> ApiResult<Droplet> {
        self.get(&format!("/v2/droplets/{}", id), &[], "droplet")
            .await
    }

    async fn delete_droplet(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("/v2/droplets/{}", id), &[]).await
    }

    async fn delete_droplets_by_tag(&self, tag: &str) -> ApiResult<()> {
        self.delete("/v2/droplets", &[("tag_name", tag.to_string())])
            .await
    }

    async fn list_droplets(&self, opts: &ListOptions) -> ApiResult<Vec<Droplet>> {
        self.get("/v2/droplets", &opts.query(), "droplets").await
    }

    async fn list_gpu_droplets(&self, opts: &ListOptions) -> ApiResult<Vec<Droplet>> {
        let query = with_paging(opts, &[("type", "gpus".to_string())]);
        self.get("/v2/droplets", &query, "droplets").await
    }

    async fn list_droplets_by_name(
        &self,
        name: &str,
        opts: &ListOptions,
    ) -> ApiResult<Vec<Droplet>> {
        let query = with_paging(opts, &[("name", name.to_string())]);
        self.get("/v2/droplets", &query, "droplets").await
    }

    async fn list_droplets_by_tag(&self, tag: &str, opts: &ListOptions) -> ApiResult<Vec<Droplet>> {
        let query = with_paging(opts, &[("tag_name", tag.to_string())]);
        self.get("/v2/droplets", &query, "droplets").await
    }

    async fn droplet_neighbors(&self, id: i64) -> ApiResult<Vec<Droplet>> {
        self.get(&format!("/v2/droplets/{}/neighbors", id), &[], "droplets")
            .await
    }

    async fn droplet_kernels(&self, id: i64, opts: &ListOptions) -> ApiResult<Vec<Kernel>> {
        self.get(&format!("/v2/droplets/{}/kernels", id), &opts.query(), "kernels")
            .await
    }

    async fn droplet_snapshots(&self, id: i64, opts: &ListOptions) -> ApiResult<Vec<Image>> {
        self.get(
            &format!("/v2/droplets/{}/snapshots", id),
            &opts.query(),
            "snapshots",
        )
        .await
    }

    async fn droplet_backups(&self, id: i64, opts: &ListOptions) -> ApiResult<Vec<Image>> {
        self.get(&format!("/v2/droplets/{}/backups", id), &opts.query(), "backups")
            .await
    }

    async fn droplet_actions(&self, id: i64, opts: &ListOptions) -> ApiResult<Vec<Action>> {
        self.get(&format!("/v2/droplets/{}/actions", id), &opts.query(), "actions")
            .await
    }

    async fn droplet_associated_resources(&self, id: i64) -> ApiResult<AssociatedResources> {
        let path = format!("/v2/droplets/{}/destroy_with_associated_resources", id);
        let response = self.send::<()>(Method::GET, &path, &[], None).await?;
        Ok(response.json().await?)
    }

    async fn droplet_backup_policy(&self, id: i64) -> ApiResult<DropletBackupPolicy> {
        self.get(&format!("/v2/droplets/{}/backups/policy", id), &[], "policy")
            .await
    }

    async fn list_backup_policies(&self, opts: &ListOptions) -> ApiResult<BackupPolicies> {
        self.get("/v2/droplets/backups/policies", &opts.query(), "policies")
            .await
    }

    async fn list_supported_backup_policies(&self) -> ApiResult<Vec<SupportedBackupPolicy>> {
        self.get(
            "/v2/droplets/backups/supported_policies",
            &[],
            "supported_policies",
        )
        .await
    }

    async fn droplet_action(&self, droplet_id: i64, req: &ActionRequest) -> ApiResult<Action> {
        let path = format!("/v2/droplets/{}/actions", droplet_id);
        self.call(Method::POST, &path, &[], Some(req), "action")
            .await
    }

    async fn droplet_action_by_tag(
        &self,
        tag: &str,
        req: &ActionRequest,
    ) -> ApiResult<Vec<Action>> {
        let query = [("tag_name", tag.to_string())];
        self.call(Method::POST, "/v2/droplets/actions", &query, Some(req), "actions")
            .await
    }

    async fn get_droplet_action(&self, droplet_id: i64, action_id: i64) -> ApiResult<Action> {
        let path = format!("/v2/droplets/{}/actions/{}", droplet_id, action_id);
        self.get(&path, &[], "action").await
    }

    async fn get_action_by_uri(&self, uri: &str) -> ApiResult<Action> {
        self.get(uri, &[], "action").await
    }

    async fn list_images(&self, filter: ImageFilter, opts: &ListOptions) -> ApiResult<Vec<Image>> {
        let extra: Vec<(&'static str, String)> = image_filter_query(filter)
            .map(|(k, v)| vec![(k, v.to_string())])
            .unwrap_or_default();
        let query = with_paging(opts, &extra);
        self.get("/v2/images", &query, "images").await
    }

    async fn get_image(&self, id: i64) -> ApiResult<Image> {
        self.get(&format!("/v2/images/{}", id), &[], "image").await
    }

    async fn update_image(&self, id: i64, req: &ImageUpdateRequest) -> ApiResult<Image> {
        let path = format!("/v2/images/{}", id);
        self.call(Method::PUT, &path, &[], Some(req), "image").await
    }

    async fn delete_image(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("/v2/images/{}", id), &[]).await
    }

    async fn image_action(&self, image_id: i64, req: &ActionRequest) -> ApiResult<Action> {
        let path = format!("/v2/images/{}/actions", image_id);
        self.call(Method::POST, &path, &[], Some(req), "action")
            .await
    }

    async fn get_image_action(&self, image_id: i64, action_id: i64) -> ApiResult<Action> {
        let path = format!("/v2/images/{}/actions/{}", image_id, action_id);
        self.get(&path, &[], "action").await
    }
}

// ── Tests ───────────────────────────────────────────────────────────
