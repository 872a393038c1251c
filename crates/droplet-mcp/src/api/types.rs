//! DigitalOcean v2 domain types.
//!
//! Field names follow the API's JSON wire format. Every response type
//! tolerates missing fields so partial payloads still decode.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default page requested by paginated tools.
pub const DEFAULT_PAGE: i64 = 1;

/// Default page size requested by paginated tools.
pub const DEFAULT_PER_PAGE: i64 = 50;

// ── Pagination ──────────────────────────────────────────────────────

/// Page selection for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    pub page: i64,
    pub per_page: i64,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl ListOptions {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self { page, per_page }
    }

    /// Query pairs understood by every list endpoint.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ]
    }
}

// ── Droplets ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Region {
    pub slug: String,
    pub name: String,
    pub sizes: Vec<String>,
    pub available: bool,
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Size {
    pub slug: String,
    pub memory: i64,
    pub vcpus: i64,
    pub disk: i64,
    pub price_monthly: f64,
    pub price_hourly: f64,
    pub regions: Vec<String>,
    pub available: bool,
    pub transfer: f64,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkV4 {
    pub ip_address: String,
    pub netmask: String,
    pub gateway: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkV6 {
    pub ip_address: String,
    pub netmask: i64,
    pub gateway: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Networks {
    pub v4: Vec<NetworkV4>,
    pub v6: Vec<NetworkV6>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Kernel {
    pub id: i64,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupWindow {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Amount {
    pub amount: i64,
    pub unit: String,
}

/// One disk attached to a droplet (`local` or `scratch`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub size: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuInfo {
    pub count: i64,
    pub model: String,
    pub vram: Amount,
}

/// A droplet as returned by `GET /v2/droplets/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Droplet {
    pub id: i64,
    pub name: String,
    pub memory: i64,
    pub vcpus: i64,
    pub disk: i64,
    pub region: Option<Region>,
    pub image: Option<Image>,
    pub size: Option<Size>,
    pub size_slug: String,
    pub backup_ids: Vec<i64>,
    pub next_backup_window: Option<BackupWindow>,
    pub snapshot_ids: Vec<i64>,
    pub features: Vec<String>,
    pub locked: bool,
    pub status: String,
    pub networks: Option<Networks>,
    pub created_at: String,
    pub kernel: Option<Kernel>,
    pub tags: Vec<String>,
    pub volume_ids: Vec<String>,
    pub vpc_uuid: String,
    pub disk_info: Vec<DiskInfo>,
    pub gpu_info: Option<GpuInfo>,
}

/// The subset of droplet fields returned by list-style tools. Disk and
/// GPU details are left to `droplet-get`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropletSummary {
    pub id: i64,
    pub name: String,
    pub memory: i64,
    pub vcpus: i64,
    pub disk: i64,
    pub region: Option<Region>,
    pub image: Option<Image>,
    pub size: Option<Size>,
    pub size_slug: String,
    pub backup_ids: Vec<i64>,
    pub next_backup_window: Option<BackupWindow>,
    pub snapshot_ids: Vec<i64>,
    pub features: Vec<String>,
    pub locked: bool,
    pub status: String,
    pub networks: Option<Networks>,
    pub created_at: String,
    pub kernel: Option<Kernel>,
    pub tags: Vec<String>,
    pub volume_ids: Vec<String>,
    pub vpc_uuid: String,
}

impl From<Droplet> for DropletSummary {
    fn from(d: Droplet) -> Self {
        Self {
            id: d.id,
            name: d.name,
            memory: d.memory,
            vcpus: d.vcpus,
            disk: d.disk,
            region: d.region,
            image: d.image,
            size: d.size,
            size_slug: d.size_slug,
            backup_ids: d.backup_ids,
            next_backup_window: d.next_backup_window,
            snapshot_ids: d.snapshot_ids,
            features: d.features,
            locked: d.locked,
            status: d.status,
            networks: d.networks,
            created_at: d.created_at,
            kernel: d.kernel,
            tags: d.tags,
            volume_ids: d.volume_ids,
            vpc_uuid: d.vpc_uuid,
        }
    }
}

// ── Droplet creation ────────────────────────────────────────────────

/// Image reference for droplet creation: numeric ID or slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DropletCreateImage {
    Id(i64),
    Slug(String),
}

/// SSH key reference for droplet creation: numeric ID or fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DropletCreateSshKey {
    Id(i64),
    Fingerprint(String),
}

/// Volume to attach at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropletCreateVolume {
    pub id: String,
}

/// Backup schedule requested alongside backups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupPolicyRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropletCreateRequest {
    pub name: String,
    pub region: String,
    pub size: String,
    pub image: DropletCreateImage,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ssh_keys: Vec<DropletCreateSshKey>,
    #[serde(default)]
    pub backups: bool,
    #[serde(default)]
    pub ipv6: bool,
    #[serde(default)]
    pub monitoring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<DropletCreateVolume>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_droplet_agent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_policy: Option<BackupPolicyRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropletMultiCreateRequest {
    pub names: Vec<String>,
    pub region: String,
    pub size: String,
    pub image: DropletCreateImage,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ssh_keys: Vec<DropletCreateSshKey>,
    #[serde(default)]
    pub backups: bool,
    #[serde(default)]
    pub ipv6: bool,
    #[serde(default)]
    pub monitoring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<DropletCreateVolume>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_droplet_agent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_policy: Option<BackupPolicyRequest>,
}

// ── Backups ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupPolicyConfig {
    pub plan: String,
    pub weekday: String,
    pub hour: i64,
    pub window_length_hours: i64,
    pub retention_period_days: i64,
}

/// Backup settings of one droplet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropletBackupPolicy {
    pub droplet_id: i64,
    pub backup_enabled: bool,
    pub backup_policy: Option<BackupPolicyConfig>,
    pub next_backup_window: Option<BackupWindow>,
}

/// A backup plan offered by the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportedBackupPolicy {
    pub name: String,
    pub possible_window_starts: Vec<i64>,
    pub window_length_hours: i64,
    pub retention_period_days: i64,
    pub possible_days: Vec<String>,
}

/// Backup policies keyed by droplet ID.
pub type BackupPolicies = BTreeMap<i64, DropletBackupPolicy>;

// ── Associated resources ────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociatedResource {
    pub id: String,
    pub name: String,
    pub cost: String,
}

/// Resources that can be destroyed together with a droplet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociatedResources {
    pub reserved_ips: Vec<AssociatedResource>,
    pub floating_ips: Vec<AssociatedResource>,
    pub snapshots: Vec<AssociatedResource>,
    pub volumes: Vec<AssociatedResource>,
    pub volume_snapshots: Vec<AssociatedResource>,
}

// ── Actions ─────────────────────────────────────────────────────────

/// An asynchronous operation tracked by the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Action {
    pub id: i64,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub resource_id: i64,
    pub resource_type: String,
    pub region_slug: String,
}

/// Body for `POST .../actions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRequest {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl ActionRequest {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            params: serde_json::Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }
}

// ── Images ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub distribution: String,
    pub slug: Option<String>,
    pub public: bool,
    pub regions: Vec<String>,
    pub min_disk_size: i64,
    pub size_gigabytes: f64,
    pub created_at: String,
    pub description: String,
    pub tags: Vec<String>,
    pub status: String,
    pub error_message: String,
}

/// The subset of image fields returned by `image-list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub id: i64,
    pub name: String,
    pub slug: Option<String>,
    pub distribution: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub public: bool,
    pub regions: Vec<String>,
    pub created_at: String,
    pub min_disk_size: i64,
}

impl From<Image> for ImageSummary {
    fn from(i: Image) -> Self {
        Self {
            id: i.id,
            name: i.name,
            slug: i.slug,
            distribution: i.distribution,
            kind: i.kind,
            public: i.public,
            regions: i.regions,
            created_at: i.created_at,
            min_disk_size: i.min_disk_size,
        }
    }
}

/// Image category filter for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFilter {
    All,
    Distribution,
    Application,
    User,
}

impl ImageFilter {
    /// Maps the `Type` tool argument; unknown values list everything.
    pub fn parse(value: &str) -> Self {
        match value {
            "distribution" => Self::Distribution,
            "application" => Self::Application,
            "user" => Self::User,
            _ => Self::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUpdateRequest {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_options_default_is_first_page_of_fifty() {
        let opts = ListOptions::default();
        assert_eq!(opts, ListOptions::new(1, 50));
        assert_eq!(
            opts.query(),
            vec![("page", "1".to_string()), ("per_page", "50".to_string())]
        );
    }

    #[test]
    fn droplet_decodes_partial_payload() {
        let droplet: Droplet = serde_json::from_value(json!({
            "id": 3164444,
            "name": "example.com",
            "region": {"slug": "nyc3", "name": "New York 3"},
            "networks": {"v4": [{"ip_address": "104.236.32.182", "type": "public"}]}
        }))
        .unwrap();
        assert_eq!(droplet.id, 3164444);
        assert_eq!(droplet.region.as_ref().unwrap().slug, "nyc3");
        assert_eq!(droplet.networks.unwrap().v4[0].kind, "public");
        assert!(droplet.tags.is_empty());
    }

    #[test]
    fn summary_drops_disk_and_gpu_details() {
        let droplet: Droplet = serde_json::from_value(json!({
            "id": 9,
            "name": "gpu-1",
            "disk_info": [{"type": "scratch", "size": {"amount": 720, "unit": "gib"}}],
            "gpu_info": {"count": 1, "model": "nvidia_h100", "vram": {"amount": 80, "unit": "gib"}}
        }))
        .unwrap();
        assert_eq!(droplet.disk_info[0].size.amount, 720);
        assert_eq!(droplet.gpu_info.as_ref().unwrap().model, "nvidia_h100");

        let summary = serde_json::to_value(DropletSummary::from(droplet)).unwrap();
        assert_eq!(summary["name"], "gpu-1");
        assert!(summary.get("disk_info").is_none());
        assert!(summary.get("gpu_info").is_none());
    }

    #[test]
    fn droplet_pretty_json_round_trips() {
        let droplet = Droplet {
            id: 123,
            name: "web-1".to_string(),
            memory: 1024,
            vcpus: 1,
            tags: vec!["prod".to_string()],
            kernel: Some(Kernel {
                id: 7,
                name: "linux".to_string(),
                version: "6.1".to_string(),
            }),
            next_backup_window: Some(BackupWindow {
                start: Some("2024-01-01T00:00:00Z".to_string()),
                end: None,
            }),
            ..Default::default()
        };
        let text = serde_json::to_string_pretty(&droplet).unwrap();
        let parsed: Droplet = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, droplet);
    }

    #[test]
    fn create_request_serializes_untagged_refs() {
        let req = DropletCreateRequest {
            name: "test".to_string(),
            region: "nyc1".to_string(),
            size: "s-1vcpu-1gb".to_string(),
            image: DropletCreateImage::Id(456),
            ssh_keys: vec![
                DropletCreateSshKey::Id(1),
                DropletCreateSshKey::Fingerprint("aa:bb".to_string()),
            ],
            backups: false,
            ipv6: false,
            monitoring: true,
            user_data: None,
            volumes: vec![],
            tags: vec![],
            vpc_uuid: None,
            with_droplet_agent: None,
            backup_policy: None,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["image"], 456);
        assert_eq!(value["ssh_keys"], json!([1, "aa:bb"]));
        assert!(value.get("tags").is_none());
        assert!(value.get("backup_policy").is_none());
    }

    #[test]
    fn action_request_flattens_params() {
        let req = ActionRequest::new("snapshot").with("name", "nightly");
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value, json!({"type": "snapshot", "name": "nightly"}));
    }

    #[test]
    fn image_filter_parse() {
        assert_eq!(ImageFilter::parse("distribution"), ImageFilter::Distribution);
        assert_eq!(ImageFilter::parse("application"), ImageFilter::Application);
        assert_eq!(ImageFilter::parse("user"), ImageFilter::User);
        assert_eq!(ImageFilter::parse(""), ImageFilter::All);
        assert_eq!(ImageFilter::parse("snapshot"), ImageFilter::All);
    }

    #[test]
    fn backup_policies_decode_with_numeric_keys() {
        let policies: BackupPolicies = serde_json::from_value(json!({
            "123": {"droplet_id": 123, "backup_enabled": true}
        }))
        .unwrap();
        assert!(policies[&123].backup_enabled);
    }
}
