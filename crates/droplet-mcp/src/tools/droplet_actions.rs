//! Power, backup and snapshot actions on droplets, by ID or by tag.

use super::args::Arguments;
use super::config::{id_arg, tag_arg, ArgumentConfig, ArgumentKind, ToolConfig};
use super::dispatch::{ToolContext, ToolError, ToolOutput};
use crate::api::types::ActionRequest;
use crate::api::CloudApi;
use futures::future::BoxFuture;
use futures::FutureExt;

type HandlerFuture<'a> = BoxFuture<'a, Result<ToolOutput, ToolError>>;

pub fn tools() -> Vec<ToolConfig> {
    let policy_arg = || {
        ArgumentConfig::required(
            "PolicyJSON",
            ArgumentKind::String,
            "JSON encoded DropletBackupPolicyRequest",
        )
    };

    vec![
        ToolConfig::new("droplet-reboot", "Reboot a droplet", reboot)
            .arg(id_arg("ID of the droplet to reboot")),
        ToolConfig::new("droplet-power-cycle", "Power cycle a droplet", power_cycle)
            .arg(id_arg("ID of the droplet to power cycle")),
        ToolConfig::new("droplet-power-on", "Power on a droplet", power_on)
            .arg(id_arg("ID of the droplet to power on")),
        ToolConfig::new("droplet-power-off", "Power off a droplet", power_off)
            .arg(id_arg("ID of the droplet to power off")),
        ToolConfig::new(
            "droplet-enable-backups-with-policy",
            "Enable backups on a droplet with a backup policy",
            enable_backups_with_policy,
        )
        .arg(id_arg("ID of the droplet"))
        .arg(policy_arg()),
        ToolConfig::new(
            "droplet-change-backup-policy",
            "Change the backup policy of a droplet",
            change_backup_policy,
        )
        .arg(id_arg("ID of the droplet"))
        .arg(policy_arg()),
        ToolConfig::new(
            "droplet-action-by-uri",
            "Get a droplet action by its URI",
            action_by_uri,
        )
        .arg(ArgumentConfig::required(
            "URI",
            ArgumentKind::String,
            "Action URI (e.g., /v2/droplets/123/actions/456)",
        )),
        ToolConfig::new(
            "droplet-power-cycle-by-tag",
            "Power cycle all droplets with a tag",
            power_cycle_by_tag,
        )
        .arg(tag_arg("Tag of the droplets")),
        ToolConfig::new(
            "droplet-power-on-by-tag",
            "Power on all droplets with a tag",
            power_on_by_tag,
        )
        .arg(tag_arg("Tag of the droplets")),
        ToolConfig::new(
            "droplet-power-off-by-tag",
            "Power off all droplets with a tag",
            power_off_by_tag,
        )
        .arg(tag_arg("Tag of the droplets")),
        ToolConfig::new(
            "droplet-shutdown-by-tag",
            "Shut down all droplets with a tag",
            shutdown_by_tag,
        )
        .arg(tag_arg("Tag of the droplets")),
        ToolConfig::new(
            "droplet-enable-backups-by-tag",
            "Enable backups on all droplets with a tag",
            enable_backups_by_tag,
        )
        .arg(tag_arg("Tag of the droplets")),
        ToolConfig::new(
            "droplet-disable-backups-by-tag",
            "Disable backups on all droplets with a tag",
            disable_backups_by_tag,
        )
        .arg(tag_arg("Tag of the droplets")),
        ToolConfig::new(
            "droplet-snapshot-by-tag",
            "Take a snapshot of all droplets with a tag",
            snapshot_by_tag,
        )
        .arg(tag_arg("Tag of the droplets"))
        .arg(ArgumentConfig::required(
            "Name",
            ArgumentKind::String,
            "Name of the snapshot",
        )),
        ToolConfig::new(
            "droplet-enable-ipv6-by-tag",
            "Enable IPv6 on all droplets with a tag",
            enable_ipv6_by_tag,
        )
        .arg(tag_arg("Tag of the droplets")),
        ToolConfig::new(
            "droplet-enable-private-net-by-tag",
            "Enable private networking on all droplets with a tag",
            enable_private_net_by_tag,
        )
        .arg(tag_arg("Tag of the droplets")),
    ]
}

async fn on_droplet(
    api: &dyn CloudApi,
    args: &Arguments,
    req: ActionRequest,
) -> Result<ToolOutput, ToolError> {
    let id = args.id("ID")?;
    let action = api.droplet_action(id, &req).await?;
    log::info!("droplet {}: {} ({})", id, action.kind, action.status);
    ToolOutput::json(&action)
}

async fn on_tag(
    api: &dyn CloudApi,
    args: &Arguments,
    req: ActionRequest,
) -> Result<ToolOutput, ToolError> {
    let tag = args.string("Tag")?;
    let actions = api.droplet_action_by_tag(&tag, &req).await?;
    log::info!("tag {:?}: {} started on {} droplet(s)", tag, req.kind, actions.len());
    ToolOutput::json(&actions)
}

/// Action carrying the parsed `PolicyJSON` argument.
fn with_policy(kind: &'static str, args: &Arguments) -> Result<ActionRequest, ToolError> {
    let policy = args
        .backup_policy("PolicyJSON")?
        .ok_or_else(|| ToolError::MissingArgument("PolicyJSON".to_string()))?;
    Ok(ActionRequest::new(kind).with("backup_policy", serde_json::to_value(policy)?))
}

// ── By ID ───────────────────────────────────────────────────────────

fn reboot<'a>(_: &'a ToolContext, api: &'a dyn CloudApi, args: &'a Arguments) -> HandlerFuture<'a> {
    on_droplet(api, args, ActionRequest::new("reboot")).boxed()
}

fn power_cycle<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    on_droplet(api, args, ActionRequest::new("power_cycle")).boxed()
}

fn power_on<'a>(_: &'a ToolContext, api: &'a dyn CloudApi, args: &'a Arguments) -> HandlerFuture<'a> {
    on_droplet(api, args, ActionRequest::new("power_on")).boxed()
}

fn power_off<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    on_droplet(api, args, ActionRequest::new("power_off")).boxed()
}

fn enable_backups_with_policy<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    async move { on_droplet(api, args, with_policy("enable_backups", args)?).await }.boxed()
}

fn change_backup_policy<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    async move { on_droplet(api, args, with_policy("change_backup_policy", args)?).await }.boxed()
}

fn action_by_uri<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    async move { ToolOutput::json(&api.get_action_by_uri(&args.string("URI")?).await?) }.boxed()
}

// ── By tag ──────────────────────────────────────────────────────────

fn power_cycle_by_tag<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    on_tag(api, args, ActionRequest::new("power_cycle")).boxed()
}

fn power_on_by_tag<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    on_tag(api, args, ActionRequest::new("power_on")).boxed()
}

fn power_off_by_tag<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    on_tag(api, args, ActionRequest::new("power_off")).boxed()
}

fn shutdown_by_tag<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    on_tag(api, args, ActionRequest::new("shutdown")).boxed()
}

fn enable_backups_by_tag<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    on_tag(api, args, ActionRequest::new("enable_backups")).boxed()
}

fn disable_backups_by_tag<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    on_tag(api, args, ActionRequest::new("disable_backups")).boxed()
}

fn snapshot_by_tag<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    async move {
        let req = ActionRequest::new("snapshot").with("name", args.string("Name")?);
        on_tag(api, args, req).await
    }
    .boxed()
}

fn enable_ipv6_by_tag<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    on_tag(api, args, ActionRequest::new("enable_ipv6")).boxed()
}

fn enable_private_net_by_tag<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    on_tag(api, args, ActionRequest::new("enable_private_networking")).boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::factory::StaticClientFactory;
    use crate::api::mock::MockCloudApi;
    use crate::api::types::Action;
    use crate::tools::dispatch::{dispatch, ToolResult};
    use serde_json::{json, Value};
    use std::sync::Arc;

    async fn call(mock: &Arc<MockCloudApi>, name: &str, args: Value) -> ToolResult {
        let tools = tools();
        let tool = tools.iter().find(|t| t.name == name).unwrap();
        let factory = StaticClientFactory::new(mock.clone());
        dispatch(tool, &factory, &ToolContext::default(), &Arguments::from_value(args))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn id_actions_send_their_type() {
        let cases = [
            ("droplet-reboot", "reboot"),
            ("droplet-power-cycle", "power_cycle"),
            ("droplet-power-on", "power_on"),
            ("droplet-power-off", "power_off"),
        ];
        for (tool, kind) in cases {
            let mock = Arc::new(MockCloudApi::new());
            let result = call(&mock, tool, json!({"ID": 123.0})).await;
            assert!(!result.is_error, "{}: {}", tool, result.text);
            let action: Action = serde_json::from_str(&result.text).unwrap();
            assert_eq!(action.kind, kind);
            assert_eq!(action.resource_id, 123);
            let params = mock.last_call().unwrap().params;
            assert_eq!(params["request"], json!({"type": kind}));
        }
    }

    #[tokio::test]
    async fn tag_actions_send_their_type() {
        let cases = [
            ("droplet-power-cycle-by-tag", "power_cycle"),
            ("droplet-power-on-by-tag", "power_on"),
            ("droplet-power-off-by-tag", "power_off"),
            ("droplet-shutdown-by-tag", "shutdown"),
            ("droplet-enable-backups-by-tag", "enable_backups"),
            ("droplet-disable-backups-by-tag", "disable_backups"),
            ("droplet-enable-ipv6-by-tag", "enable_ipv6"),
            ("droplet-enable-private-net-by-tag", "enable_private_networking"),
        ];
        for (tool, kind) in cases {
            let mock = Arc::new(MockCloudApi::new());
            let result = call(&mock, tool, json!({"Tag": "web"})).await;
            assert!(!result.is_error, "{}: {}", tool, result.text);
            let actions: Vec<Action> = serde_json::from_str(&result.text).unwrap();
            assert_eq!(actions.len(), 1);
            assert_eq!(actions[0].kind, kind);
            assert_eq!(mock.last_call().unwrap().params["tag"], "web");
        }
    }

    #[tokio::test]
    async fn snapshot_by_tag_sends_name() {
        let mock = Arc::new(MockCloudApi::new());
        let result = call(
            &mock,
            "droplet-snapshot-by-tag",
            json!({"Tag": "web", "Name": "snap-by-tag"}),
        )
        .await;
        assert!(!result.is_error);
        let params = mock.last_call().unwrap().params;
        assert_eq!(params["request"], json!({"type": "snapshot", "name": "snap-by-tag"}));

        let result = call(&mock, "droplet-snapshot-by-tag", json!({"Tag": "web"})).await;
        assert_eq!(result.text, "missing required argument: Name");
    }

    #[tokio::test]
    async fn backup_policy_actions_embed_policy() {
        let policy = r#"{"plan":"weekly","weekday":"SUN","hour":4}"#;
        for (tool, kind) in [
            ("droplet-enable-backups-with-policy", "enable_backups"),
            ("droplet-change-backup-policy", "change_backup_policy"),
        ] {
            let mock = Arc::new(MockCloudApi::new());
            let result = call(&mock, tool, json!({"ID": 123, "PolicyJSON": policy})).await;
            assert!(!result.is_error, "{}: {}", tool, result.text);
            let params = mock.last_call().unwrap().params;
            assert_eq!(
                params["request"],
                json!({
                    "type": kind,
                    "backup_policy": {"plan": "weekly", "weekday": "SUN", "hour": 4}
                })
            );
        }
    }

    #[tokio::test]
    async fn backup_policy_actions_require_policy() {
        let mock = Arc::new(MockCloudApi::new());
        let result = call(&mock, "droplet-change-backup-policy", json!({"ID": 123})).await;
        assert_eq!(result.text, "missing required argument: PolicyJSON");

        let result = call(
            &mock,
            "droplet-enable-backups-with-policy",
            json!({"ID": 123, "PolicyJSON": "not json"}),
        )
        .await;
        assert!(result.is_error);
        assert!(result.text.starts_with("invalid backup policy json: "));

        let result = call(
            &mock,
            "droplet-enable-backups-with-policy",
            json!({"ID": 123, "PolicyJSON": ""}),
        )
        .await;
        assert_eq!(result.text, "missing required argument: PolicyJSON");
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn action_by_uri() {
        let mock = Arc::new(MockCloudApi::new());
        let result = call(
            &mock,
            "droplet-action-by-uri",
            json!({"URI": "/v2/droplets/123/actions/55555"}),
        )
        .await;
        let action: Action = serde_json::from_str(&result.text).unwrap();
        assert_eq!(action.id, 55555);

        let result = call(&mock, "droplet-action-by-uri", json!({})).await;
        assert_eq!(result.text, "missing required argument: URI");
    }

    #[tokio::test]
    async fn stub_errors_are_faults() {
        for tool in tools() {
            let mock = Arc::new(MockCloudApi::new());
            mock.fail_with("api unavailable");
            let result = call(
                &mock,
                tool.name,
                json!({"ID": 456, "Tag": "fail-tag", "Name": "fail", "URI": "/v2/x/1",
                       "PolicyJSON": "{\"plan\":\"daily\"}"}),
            )
            .await;
            assert!(result.is_error, "{}", tool.name);
            assert_eq!(result.text, "api error: api unavailable");
        }
    }
}
