//! Upstream boundary between the tool layer and DigitalOcean.
//!
//! Tool handlers call [`CloudApi`] instead of an HTTP client directly,
//! so the whole tool surface can be exercised against [`mock::MockCloudApi`].

pub mod factory;
pub mod http;
#[cfg(any(test, feature = "test-harness"))]
pub mod mock;
pub mod types;

use async_trait::async_trait;
use types::*;

/// Result type for upstream calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors from the upstream API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{method} {url}: {status} {id}: {message}")]
    Status {
        method: String,
        url: String,
        status: u16,
        id: String,
        message: String,
    },
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("{0}")]
    Other(String),
}

/// One method per upstream capability used by the tool handlers.
#[async_trait]
pub trait CloudApi: Send + Sync {
    // Droplets
    async fn create_droplet(&self, req: &DropletCreateRequest) -> ApiResult<Droplet>;
    async fn create_droplets(&self, req: &DropletMultiCreateRequest) -> ApiResult<Vec<Droplet>>;
    async fn get_droplet(&self, id: i64) -> ApiResult<Droplet>;
    async fn delete_droplet(&self, id: i64) -> ApiResult<()>;
    async fn delete_droplets_by_tag(&self, tag: &str) -> ApiResult<()>;
    async fn list_droplets(&self, opts: &ListOptions) -> ApiResult<Vec<Droplet>>;
    async fn list_gpu_droplets(&self, opts: &ListOptions) -> ApiResult<Vec<Droplet>>;
    async fn list_droplets_by_name(&self, name: &str, opts: &ListOptions)
        -> ApiResult<Vec<Droplet>>;
    async fn list_droplets_by_tag(&self, tag: &str, opts: &ListOptions) -> ApiResult<Vec<Droplet>>;
    async fn droplet_neighbors(&self, id: i64) -> ApiResult<Vec<Droplet>>;
    async fn droplet_kernels(&self, id: i64, opts: &ListOptions) -> ApiResult<Vec<Kernel>>;
    async fn droplet_snapshots(&self, id: i64, opts: &ListOptions) -> ApiResult<Vec<Image>>;
    async fn droplet_backups(&self, id: i64, opts: &ListOptions) -> ApiResult<Vec<Image>>;
    async fn droplet_actions(&self, id: i64, opts: &ListOptions) -> ApiResult<Vec<Action>>;
    async fn droplet_associated_resources(&self, id: i64) -> ApiResult<AssociatedResources>;
    async fn droplet_backup_policy(&self, id: i64) -> ApiResult<DropletBackupPolicy>;
    async fn list_backup_policies(&self, opts: &ListOptions) -> ApiResult<BackupPolicies>;
    async fn list_supported_backup_policies(&self) -> ApiResult<Vec<SupportedBackupPolicy>>;

    // Droplet actions
    async fn droplet_action(&self, droplet_id: i64, req: &ActionRequest) -> ApiResult<Action>;
    async fn droplet_action_by_tag(&self, tag: &str, req: &ActionRequest)
        -> ApiResult<Vec<Action>>;
    async fn get_droplet_action(&self, droplet_id: i64, action_id: i64) -> ApiResult<Action>;
    async fn get_action_by_uri(&self, uri: &str) -> ApiResult<Action>;

    // Images
    async fn list_images(&self, filter: ImageFilter, opts: &ListOptions) -> ApiResult<Vec<Image>>;
    async fn get_image(&self, id: i64) -> ApiResult<Image>;
    async fn update_image(&self, id: i64, req: &ImageUpdateRequest) -> ApiResult<Image>;
    async fn delete_image(&self, id: i64) -> ApiResult<()>;

    // Image actions
    async fn image_action(&self, image_id: i64, req: &ActionRequest) -> ApiResult<Action>;
    async fn get_image_action(&self, image_id: i64, action_id: i64) -> ApiResult<Action>;
}
