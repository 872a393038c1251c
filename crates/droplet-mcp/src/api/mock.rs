//! In-memory [`CloudApi`] for tests.
//!
//! Records every call, serves a small seeded inventory and can be told
//! to fail the next calls.

use super::factory::{ClientError, ClientFactory};
use super::types::*;
use super::{ApiError, ApiResult, CloudApi};
use crate::tools::ToolContext;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

/// First ID handed out by `create_droplet`.
pub const FIRST_CREATED_ID: i64 = 123;

/// One recorded upstream call.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub method: &'static str,
    pub params: Value,
}

pub struct MockCloudApi {
    pub droplets: Mutex<Vec<Droplet>>,
    pub images: Mutex<Vec<Image>>,
    calls: Mutex<Vec<MockCall>>,
    failure: Mutex<Option<String>>,
    next_id: AtomicI64,
}

impl Default for MockCloudApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCloudApi {
    pub fn new() -> Self {
        Self {
            droplets: Mutex::new(vec![Droplet {
                id: 1,
                name: "web-1".to_string(),
                memory: 1024,
                vcpus: 1,
                disk: 25,
                region: Some(Region {
                    slug: "nyc3".to_string(),
                    name: "New York 3".to_string(),
                    ..Default::default()
                }),
                size_slug: "s-1vcpu-1gb".to_string(),
                status: "active".to_string(),
                tags: vec!["web".to_string()],
                created_at: "2024-01-01T00:00:00Z".to_string(),
                disk_info: vec![DiskInfo {
                    kind: "local".to_string(),
                    size: Amount {
                        amount: 25,
                        unit: "gib".to_string(),
                    },
                }],
                ..Default::default()
            }]),
            images: Mutex::new(vec![
                Image {
                    id: 1,
                    name: "22.04 (LTS) x64".to_string(),
                    kind: "base".to_string(),
                    distribution: "Ubuntu".to_string(),
                    slug: Some("ubuntu-22-04-x64".to_string()),
                    public: true,
                    regions: vec!["nyc3".to_string()],
                    min_disk_size: 7,
                    ..Default::default()
                },
                Image {
                    id: 2,
                    name: "Docker on Ubuntu".to_string(),
                    kind: "application".to_string(),
                    distribution: "Ubuntu".to_string(),
                    slug: Some("docker-20-04".to_string()),
                    public: true,
                    ..Default::default()
                },
                Image {
                    id: 3,
                    name: "web-1-snapshot".to_string(),
                    kind: "snapshot".to_string(),
                    distribution: "Ubuntu".to_string(),
                    public: false,
                    ..Default::default()
                },
            ]),
            calls: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            next_id: AtomicI64::new(FIRST_CREATED_ID),
        }
    }

    /// Makes every following call fail with `message`.
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<MockCall> {
        self.calls.lock().unwrap().last().cloned()
    }

    fn record(&self, method: &'static str, params: Value) -> ApiResult<()> {
        self.calls.lock().unwrap().push(MockCall { method, params });
        match self.failure.lock().unwrap().as_ref() {
            Some(message) => Err(ApiError::Other(message.clone())),
            None => Ok(()),
        }
    }

    fn not_found(kind: &str, id: i64) -> ApiError {
        ApiError::Status {
            method: "GET".to_string(),
            url: format!("mock://{}/{}", kind, id),
            status: 404,
            id: "not_found".to_string(),
            message: "The resource you were accessing could not be found.".to_string(),
        }
    }

    fn new_droplet(&self, name: &str, region: &str, size: &str, tags: &[String]) -> Droplet {
        let droplet = Droplet {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: name.to_string(),
            region: Some(Region {
                slug: region.to_string(),
                ..Default::default()
            }),
            size_slug: size.to_string(),
            status: "new".to_string(),
            tags: tags.to_vec(),
            ..Default::default()
        };
        self.droplets.lock().unwrap().push(droplet.clone());
        droplet
    }

    fn action(id: i64, kind: &str, status: &str, resource_id: i64, resource_type: &str) -> Action {
        Action {
            id,
            status: status.to_string(),
            kind: kind.to_string(),
            resource_id,
            resource_type: resource_type.to_string(),
            ..Default::default()
        }
    }

    fn find_droplets(&self, pred: impl Fn(&Droplet) -> bool) -> Vec<Droplet> {
        self.droplets
            .lock()
            .unwrap()
            .iter()
            .filter(|d| pred(d))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CloudApi for MockCloudApi {
    async fn create_droplet(&self, req: &DropletCreateRequest) -> ApiResult<Droplet> {
        self.record("create_droplet", serde_json::to_value(req).unwrap())?;
        Ok(self.new_droplet(&req.name, &req.region, &req.size, &req.tags))
    }

    async fn create_droplets(&self, req: &DropletMultiCreateRequest) -> ApiResult<Vec<Droplet>> {
        self.record("create_droplets", serde_json::to_value(req).unwrap())?;
        Ok(req
            .names
            .iter()
            .map(|name| self.new_droplet(name, &req.region, &req.size, &req.tags))
            .collect())
    }

    async fn get_droplet(&self, id: i64) -> ApiResult<Droplet> {
        self.record("get_droplet", json!({"id": id}))?;
        self.find_droplets(|d| d.id == id)
            .into_iter()
            .next()
            .ok_or_else(|| Self::not_found("droplets", id))
    }

    async fn delete_droplet(&self, id: i64) -> ApiResult<()> {
        self.record("delete_droplet", json!({"id": id}))?;
        self.droplets.lock().unwrap().retain(|d| d.id != id);
        Ok(())
    }

    async fn delete_droplets_by_tag(&self, tag: &str) -> ApiResult<()> {
        self.record("delete_droplets_by_tag", json!({"tag": tag}))?;
        self.droplets
            .lock()
            .unwrap()
            .retain(|d| !d.tags.iter().any(|t| t == tag));
        Ok(())
    }

    async fn list_droplets(&self, opts: &ListOptions) -> ApiResult<Vec<Droplet>> {
        self.record("list_droplets", json!(opts))?;
        Ok(self.find_droplets(|_| true))
    }

    async fn list_gpu_droplets(&self, opts: &ListOptions) -> ApiResult<Vec<Droplet>> {
        self.record("list_gpu_droplets", json!(opts))?;
        Ok(self.find_droplets(|d| d.size_slug.starts_with("gpu-")))
    }

    async fn list_droplets_by_name(
        &self,
        name: &str,
        opts: &ListOptions,
    ) -> ApiResult<Vec<Droplet>> {
        self.record(
            "list_droplets_by_name",
            json!({"name": name, "page": opts.page, "per_page": opts.per_page}),
        )?;
        Ok(self.find_droplets(|d| d.name == name))
    }

    async fn list_droplets_by_tag(&self, tag: &str, opts: &ListOptions) -> ApiResult<Vec<Droplet>> {
        self.record(
            "list_droplets_by_tag",
            json!({"tag": tag, "page": opts.page, "per_page": opts.per_page}),
        )?;
        Ok(self.find_droplets(|d| d.tags.iter().any(|t| t == tag)))
    }

    async fn droplet_neighbors(&self, id: i64) -> ApiResult<Vec<Droplet>> {
        self.record("droplet_neighbors", json!({"id": id}))?;
        Ok(self.find_droplets(|d| d.id != id))
    }

    async fn droplet_kernels(&self, id: i64, opts: &ListOptions) -> ApiResult<Vec<Kernel>> {
        self.record(
            "droplet_kernels",
            json!({"id": id, "page": opts.page, "per_page": opts.per_page}),
        )?;
        Ok(vec![Kernel {
            id: 231,
            name: "DigitalOcean GrubLoader v0.2 (20160714)".to_string(),
            version: "2016.07.13-DigitalOcean_loader_Ubuntu".to_string(),
        }])
    }

    async fn droplet_snapshots(&self, id: i64, opts: &ListOptions) -> ApiResult<Vec<Image>> {
        self.record(
            "droplet_snapshots",
            json!({"id": id, "page": opts.page, "per_page": opts.per_page}),
        )?;
        Ok(self
            .images
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.kind == "snapshot")
            .cloned()
            .collect())
    }

    async fn droplet_backups(&self, id: i64, opts: &ListOptions) -> ApiResult<Vec<Image>> {
        self.record(
            "droplet_backups",
            json!({"id": id, "page": opts.page, "per_page": opts.per_page}),
        )?;
        Ok(Vec::new())
    }

    async fn droplet_actions(&self, id: i64, opts: &ListOptions) -> ApiResult<Vec<Action>> {
        self.record(
            "droplet_actions",
            json!({"id": id, "page": opts.page, "per_page": opts.per_page}),
        )?;
        Ok(vec![Self::action(1, "create", "completed", id, "droplet")])
    }

    async fn droplet_associated_resources(&self, id: i64) -> ApiResult<AssociatedResources> {
        self.record("droplet_associated_resources", json!({"id": id}))?;
        Ok(AssociatedResources {
            snapshots: vec![AssociatedResource {
                id: "3".to_string(),
                name: "web-1-snapshot".to_string(),
                cost: "0.05".to_string(),
            }],
            ..Default::default()
        })
    }

    async fn droplet_backup_policy(&self, id: i64) -> ApiResult<DropletBackupPolicy> {
        self.record("droplet_backup_policy", json!({"id": id}))?;
        Ok(DropletBackupPolicy {
            droplet_id: id,
            backup_enabled: true,
            backup_policy: Some(BackupPolicyConfig {
                plan: "weekly".to_string(),
                weekday: "SUN".to_string(),
                hour: 20,
                window_length_hours: 4,
                retention_period_days: 28,
            }),
            next_backup_window: None,
        })
    }

    async fn list_backup_policies(&self, opts: &ListOptions) -> ApiResult<BackupPolicies> {
        self.record("list_backup_policies", json!(opts))?;
        Ok(self
            .find_droplets(|_| true)
            .into_iter()
            .map(|d| {
                (
                    d.id,
                    DropletBackupPolicy {
                        droplet_id: d.id,
                        ..Default::default()
                    },
                )
            })
            .collect())
    }

    async fn list_supported_backup_policies(&self) -> ApiResult<Vec<SupportedBackupPolicy>> {
        self.record("list_supported_backup_policies", Value::Null)?;
        Ok(vec![
            SupportedBackupPolicy {
                name: "weekly".to_string(),
                possible_window_starts: vec![0, 4, 8, 12, 16, 20],
                window_length_hours: 4,
                retention_period_days: 28,
                possible_days: vec!["SUN".to_string(), "MON".to_string()],
            },
            SupportedBackupPolicy {
                name: "daily".to_string(),
                possible_window_starts: vec![0, 4, 8, 12, 16, 20],
                window_length_hours: 4,
                retention_period_days: 7,
                possible_days: Vec::new(),
            },
        ])
    }

    async fn droplet_action(&self, droplet_id: i64, req: &ActionRequest) -> ApiResult<Action> {
        self.record(
            "droplet_action",
            json!({"droplet_id": droplet_id, "request": req}),
        )?;
        Ok(Self::action(
            1000,
            req.kind,
            "in-progress",
            droplet_id,
            "droplet",
        ))
    }

    async fn droplet_action_by_tag(
        &self,
        tag: &str,
        req: &ActionRequest,
    ) -> ApiResult<Vec<Action>> {
        self.record("droplet_action_by_tag", json!({"tag": tag, "request": req}))?;
        Ok(self
            .find_droplets(|d| d.tags.iter().any(|t| t == tag))
            .iter()
            .enumerate()
            .map(|(i, d)| Self::action(2000 + i as i64, req.kind, "in-progress", d.id, "droplet"))
            .collect())
    }

    async fn get_droplet_action(&self, droplet_id: i64, action_id: i64) -> ApiResult<Action> {
        self.record(
            "get_droplet_action",
            json!({"droplet_id": droplet_id, "action_id": action_id}),
        )?;
        Ok(Self::action(action_id, "reboot", "completed", droplet_id, "droplet"))
    }

    async fn get_action_by_uri(&self, uri: &str) -> ApiResult<Action> {
        self.record("get_action_by_uri", json!({"uri": uri}))?;
        let id = uri
            .rsplit('/')
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        Ok(Self::action(id, "power_on", "completed", 0, "droplet"))
    }

    async fn list_images(&self, filter: ImageFilter, opts: &ListOptions) -> ApiResult<Vec<Image>> {
        self.record(
            "list_images",
            json!({"filter": format!("{:?}", filter), "page": opts.page, "per_page": opts.per_page}),
        )?;
        Ok(self
            .images
            .lock()
            .unwrap()
            .iter()
            .filter(|i| match filter {
                ImageFilter::All => true,
                ImageFilter::Distribution => i.public && i.kind == "base",
                ImageFilter::Application => i.public && i.kind == "application",
                ImageFilter::User => !i.public,
            })
            .cloned()
            .collect())
    }

    async fn get_image(&self, id: i64) -> ApiResult<Image> {
        self.record("get_image", json!({"id": id}))?;
        self.images
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| Self::not_found("images", id))
    }

    async fn update_image(&self, id: i64, req: &ImageUpdateRequest) -> ApiResult<Image> {
        self.record("update_image", json!({"id": id, "name": req.name}))?;
        let mut images = self.images.lock().unwrap();
        let image = images
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| Self::not_found("images", id))?;
        image.name = req.name.clone();
        Ok(image.clone())
    }

    async fn delete_image(&self, id: i64) -> ApiResult<()> {
        self.record("delete_image", json!({"id": id}))?;
        self.images.lock().unwrap().retain(|i| i.id != id);
        Ok(())
    }

    async fn image_action(&self, image_id: i64, req: &ActionRequest) -> ApiResult<Action> {
        self.record("image_action", json!({"image_id": image_id, "request": req}))?;
        let mut action = Self::action(3000, req.kind, "in-progress", image_id, "image");
        if let Some(region) = req.params.get("region").and_then(Value::as_str) {
            action.region_slug = region.to_string();
        }
        Ok(action)
    }

    async fn get_image_action(&self, image_id: i64, action_id: i64) -> ApiResult<Action> {
        self.record(
            "get_image_action",
            json!({"image_id": image_id, "action_id": action_id}),
        )?;
        Ok(Self::action(action_id, "transfer", "completed", image_id, "image"))
    }
}

/// Factory whose every call fails, for exercising hard dispatch errors.
pub struct FailingClientFactory;

#[async_trait]
impl ClientFactory for FailingClientFactory {
    async fn client(&self, _ctx: &ToolContext) -> Result<Arc<dyn CloudApi>, ClientError> {
        Err(ClientError::MissingToken)
    }
}
