//! Droplet lifecycle and inventory tools.

use super::args::Arguments;
use super::config::{id_arg, paging_args, tag_arg, ArgumentConfig, ArgumentKind, ToolConfig};
use super::dispatch::{ToolContext, ToolError, ToolOutput};
use crate::api::types::*;
use crate::api::CloudApi;
use futures::future::BoxFuture;
use futures::FutureExt;

type HandlerFuture<'a> = BoxFuture<'a, Result<ToolOutput, ToolError>>;

const NAMES_ERROR: &str = "Names must be a non-empty array of strings";

/// Page size used when listing kernels.
const KERNELS_PER_PAGE: i64 = 100;

pub fn tools() -> Vec<ToolConfig> {
    use ArgumentKind::*;

    vec![
        ToolConfig::new("droplet-create", "Create a new droplet", create)
            .arg(ArgumentConfig::required("Name", String, "Name of the droplet"))
            .args(create_args("droplet")),
        ToolConfig::new(
            "droplet-create-multiple",
            "Create multiple droplets with the same configuration.",
            create_multiple,
        )
        .arg(ArgumentConfig::required("Names", Array, "Array of droplet names"))
        .args(create_args("droplets")),
        ToolConfig::new("droplet-delete", "Delete a droplet", delete)
            .arg(id_arg("ID of the droplet to delete"))
            .destructive(),
        ToolConfig::new(
            "droplet-delete-by-tag",
            "Delete all droplets that share a specific tag.",
            delete_by_tag,
        )
        .arg(tag_arg("Tag of the droplets to delete"))
        .destructive(),
        ToolConfig::new("droplet-get", "Get a droplet by its ID", get).arg(id_arg("Droplet ID")),
        ToolConfig::new(
            "droplet-list",
            "List all droplets for the user. Supports pagination.",
            list,
        )
        .args(paging_args()),
        ToolConfig::new(
            "droplet-list-gpus",
            "List droplets that have GPUs attached. Supports pagination.",
            list_gpus,
        )
        .args(paging_args()),
        ToolConfig::new(
            "droplet-list-by-name",
            "List droplets filtered by an exact name. Supports pagination.",
            list_by_name,
        )
        .arg(ArgumentConfig::required(
            "Name",
            String,
            "Exact droplet name (case-insensitive)",
        ))
        .args(paging_args()),
        ToolConfig::new(
            "droplet-list-by-tag",
            "List droplets that share a given tag. Supports pagination.",
            list_by_tag,
        )
        .arg(tag_arg("Tag of the droplets"))
        .args(paging_args()),
        ToolConfig::new(
            "droplet-neighbors",
            "List droplets that share the same physical host as the provided droplet",
            neighbors,
        )
        .arg(id_arg("ID of the droplet")),
        ToolConfig::new("droplet-kernels", "Get available kernels for a droplet", kernels)
            .arg(id_arg("ID of the droplet")),
        ToolConfig::new(
            "droplet-snapshots",
            "List snapshots for a specific droplet. Supports pagination.",
            snapshots,
        )
        .arg(id_arg("Droplet ID"))
        .args(paging_args()),
        ToolConfig::new(
            "droplet-backups",
            "List backups for a specific droplet. Supports pagination.",
            backups,
        )
        .arg(id_arg("Droplet ID"))
        .args(paging_args()),
        ToolConfig::new(
            "droplet-actions-list",
            "List all actions for a specific droplet. Supports pagination.",
            actions_list,
        )
        .arg(id_arg("Droplet ID"))
        .args(paging_args()),
        ToolConfig::new(
            "droplet-action",
            "Get a droplet action by droplet ID and action ID",
            action,
        )
        .arg(ArgumentConfig::required("DropletID", Number, "Droplet ID"))
        .arg(ArgumentConfig::required("ActionID", Number, "Action ID")),
        ToolConfig::new(
            "droplet-associated-resources",
            "List resources associated with a droplet that would be deleted if the droplet is removed.",
            associated_resources,
        )
        .arg(id_arg("Droplet ID")),
        ToolConfig::new(
            "droplet-backup-policy-get",
            "Get the backup policy for a specific droplet.",
            backup_policy_get,
        )
        .arg(id_arg("Droplet ID")),
        ToolConfig::new(
            "droplet-backup-policies-list",
            "List all backup policies. Supports pagination.",
            backup_policies_list,
        )
        .args(paging_args()),
        ToolConfig::new(
            "droplet-backup-policies-supported",
            "List supported backup policy options.",
            backup_policies_supported,
        ),
        ToolConfig::new(
            "droplet-enable-private-net",
            "Enable private networking on a droplet",
            enable_private_net,
        )
        .arg(id_arg("ID of the droplet")),
    ]
}

/// Arguments shared by single and multiple droplet creation.
fn create_args(noun: &'static str) -> Vec<ArgumentConfig> {
    use ArgumentKind::*;

    let (vpc, user_data, volumes, ssh_keys, tags) = if noun == "droplets" {
        (
            "VPC UUID to place the droplets into",
            "Cloud-init user data to pass to droplets",
            "Array of volume IDs to attach to the droplets",
            "Array of SSH key IDs or fingerprints to add to the droplets",
            "Array of tag names to apply to the droplets",
        )
    } else {
        (
            "VPC UUID to place the droplet into",
            "Cloud-init user data to pass to droplet",
            "Array of volume IDs to attach to the droplet",
            "Array of SSH key IDs (numbers) or fingerprints (strings) to add to the droplet",
            "Array of tag names to apply to the droplet",
        )
    };

    vec![
        ArgumentConfig::required("Size", String, "Slug of the droplet size (e.g., s-1vcpu-1gb)"),
        ArgumentConfig::required("ImageID", Number, "ID of the image to use"),
        ArgumentConfig::required("Region", String, "Slug of the region (e.g., nyc3)"),
        ArgumentConfig::optional("Backup", Boolean, "Whether to enable backups").with_default(false),
        ArgumentConfig::optional("Monitoring", Boolean, "Whether to enable monitoring")
            .with_default(false),
        ArgumentConfig::optional("IPv6", Boolean, "Enable IPv6 networking").with_default(false),
        ArgumentConfig::optional("VPCUUID", String, vpc),
        ArgumentConfig::optional("UserData", String, user_data),
        ArgumentConfig::optional("Volumes", Array, volumes),
        ArgumentConfig::optional("WithDropletAgent", Boolean, "Whether to enable the droplet agent")
            .with_default(false),
        ArgumentConfig::optional(
            "BackupPolicy",
            String,
            "JSON encoded DropletBackupPolicyRequest (optional)",
        ),
        ArgumentConfig::optional("SSHKeys", Array, ssh_keys),
        ArgumentConfig::optional("Tags", Array, tags),
    ]
}

/// Creation settings common to both request shapes.
struct CreateSettings {
    region: String,
    size: String,
    image: DropletCreateImage,
    ssh_keys: Vec<DropletCreateSshKey>,
    backups: bool,
    ipv6: bool,
    monitoring: bool,
    user_data: Option<String>,
    volumes: Vec<DropletCreateVolume>,
    tags: Vec<String>,
    vpc_uuid: Option<String>,
    with_droplet_agent: Option<bool>,
    backup_policy: Option<BackupPolicyRequest>,
}

impl CreateSettings {
    fn from_args(args: &Arguments) -> Result<Self, ToolError> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        Ok(Self {
            region: args.string("Region")?,
            size: args.string("Size")?,
            image: DropletCreateImage::Id(args.id("ImageID")?),
            ssh_keys: args.ssh_keys("SSHKeys")?,
            backups: args.bool_or("Backup", false)?,
            ipv6: args.bool_or("IPv6", false)?,
            monitoring: args.bool_or("Monitoring", false)?,
            user_data: non_empty(args.opt_string("UserData")?),
            volumes: args
                .string_list("Volumes")?
                .into_iter()
                .map(|id| DropletCreateVolume { id })
                .collect(),
            tags: args.tags("Tags")?,
            vpc_uuid: non_empty(args.opt_string("VPCUUID")?),
            with_droplet_agent: args.opt_bool("WithDropletAgent")?,
            backup_policy: args.backup_policy("BackupPolicy")?,
        })
    }

    fn single(self, name: String) -> DropletCreateRequest {
        DropletCreateRequest {
            name,
            region: self.region,
            size: self.size,
            image: self.image,
            ssh_keys: self.ssh_keys,
            backups: self.backups,
            ipv6: self.ipv6,
            monitoring: self.monitoring,
            user_data: self.user_data,
            volumes: self.volumes,
            tags: self.tags,
            vpc_uuid: self.vpc_uuid,
            with_droplet_agent: self.with_droplet_agent,
            backup_policy: self.backup_policy,
        }
    }

    fn multiple(self, names: Vec<String>) -> DropletMultiCreateRequest {
        DropletMultiCreateRequest {
            names,
            region: self.region,
            size: self.size,
            image: self.image,
            ssh_keys: self.ssh_keys,
            backups: self.backups,
            ipv6: self.ipv6,
            monitoring: self.monitoring,
            user_data: self.user_data,
            volumes: self.volumes,
            tags: self.tags,
            vpc_uuid: self.vpc_uuid,
            with_droplet_agent: self.with_droplet_agent,
            backup_policy: self.backup_policy,
        }
    }
}

fn summaries(droplets: Vec<Droplet>) -> Result<ToolOutput, ToolError> {
    let summaries: Vec<DropletSummary> = droplets.into_iter().map(Into::into).collect();
    ToolOutput::json(&summaries)
}

// ── Handlers ────────────────────────────────────────────────────────

fn create<'a>(_: &'a ToolContext, api: &'a dyn CloudApi, args: &'a Arguments) -> HandlerFuture<'a> {
    async move {
        let name = args.string("Name")?;
        let req = CreateSettings::from_args(args)?.single(name);
        let droplet = api.create_droplet(&req).await?;
        log::info!("created droplet {} ({})", droplet.id, droplet.name);
        ToolOutput::json(&droplet)
    }
    .boxed()
}

fn create_multiple<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    async move {
        let names = match args.string_list("Names") {
            Ok(names) if !names.is_empty() => names,
            _ => return Err(ToolError::Invalid(NAMES_ERROR.to_string())),
        };
        let req = CreateSettings::from_args(args)?.multiple(names);
        let droplets = api.create_droplets(&req).await?;
        log::info!("created {} droplet(s)", droplets.len());
        ToolOutput::json(&droplets)
    }
    .boxed()
}

fn delete<'a>(_: &'a ToolContext, api: &'a dyn CloudApi, args: &'a Arguments) -> HandlerFuture<'a> {
    async move {
        let id = args.id("ID")?;
        api.delete_droplet(id).await?;
        log::info!("deleted droplet {}", id);
        Ok(ToolOutput::text("Droplet deleted successfully"))
    }
    .boxed()
}

fn delete_by_tag<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    async move {
        let tag = args.string("Tag")?;
        api.delete_droplets_by_tag(&tag).await?;
        log::info!("deleted droplets tagged {:?}", tag);
        Ok(ToolOutput::text(format!(
            "Droplets with tag {:?} deleted successfully",
            tag
        )))
    }
    .boxed()
}

fn get<'a>(_: &'a ToolContext, api: &'a dyn CloudApi, args: &'a Arguments) -> HandlerFuture<'a> {
    async move { ToolOutput::json(&api.get_droplet(args.id("ID")?).await?) }.boxed()
}

fn list<'a>(_: &'a ToolContext, api: &'a dyn CloudApi, args: &'a Arguments) -> HandlerFuture<'a> {
    async move { summaries(api.list_droplets(&args.list_options()).await?) }.boxed()
}

fn list_gpus<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    async move { summaries(api.list_gpu_droplets(&args.list_options()).await?) }.boxed()
}

fn list_by_name<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    async move {
        let name = args.string("Name")?;
        summaries(api.list_droplets_by_name(&name, &args.list_options()).await?)
    }
    .boxed()
}

fn list_by_tag<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    async move {
        let tag = args.string("Tag")?;
        summaries(api.list_droplets_by_tag(&tag, &args.list_options()).await?)
    }
    .boxed()
}

fn neighbors<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    async move { ToolOutput::json(&api.droplet_neighbors(args.id("ID")?).await?) }.boxed()
}

fn kernels<'a>(_: &'a ToolContext, api: &'a dyn CloudApi, args: &'a Arguments) -> HandlerFuture<'a> {
    async move {
        let opts = ListOptions::new(DEFAULT_PAGE, KERNELS_PER_PAGE);
        ToolOutput::json(&api.droplet_kernels(args.id("ID")?, &opts).await?)
    }
    .boxed()
}

fn snapshots<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    async move {
        let id = args.id("ID")?;
        ToolOutput::json(&api.droplet_snapshots(id, &args.list_options()).await?)
    }
    .boxed()
}

fn backups<'a>(_: &'a ToolContext, api: &'a dyn CloudApi, args: &'a Arguments) -> HandlerFuture<'a> {
    async move {
        let id = args.id("ID")?;
        ToolOutput::json(&api.droplet_backups(id, &args.list_options()).await?)
    }
    .boxed()
}

fn actions_list<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    async move {
        let id = args.id("ID")?;
        ToolOutput::json(&api.droplet_actions(id, &args.list_options()).await?)
    }
    .boxed()
}

fn action<'a>(_: &'a ToolContext, api: &'a dyn CloudApi, args: &'a Arguments) -> HandlerFuture<'a> {
    async move {
        let droplet_id = args.id("DropletID")?;
        let action_id = args.id("ActionID")?;
        ToolOutput::json(&api.get_droplet_action(droplet_id, action_id).await?)
    }
    .boxed()
}

fn associated_resources<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    async move { ToolOutput::json(&api.droplet_associated_resources(args.id("ID")?).await?) }
        .boxed()
}

fn backup_policy_get<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    async move { ToolOutput::json(&api.droplet_backup_policy(args.id("ID")?).await?) }.boxed()
}

fn backup_policies_list<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    async move { ToolOutput::json(&api.list_backup_policies(&args.list_options()).await?) }.boxed()
}

fn backup_policies_supported<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    _: &'a Arguments,
) -> HandlerFuture<'a> {
    async move { ToolOutput::json(&api.list_supported_backup_policies().await?) }.boxed()
}

fn enable_private_net<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    async move {
        let req = ActionRequest::new("enable_private_networking");
        ToolOutput::json(&api.droplet_action(args.id("ID")?, &req).await?)
    }
    .boxed()
}
