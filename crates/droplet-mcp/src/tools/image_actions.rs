//! Image actions: region transfer, conversion to snapshot, action lookup.

use super::args::Arguments;
use super::config::{id_arg, ArgumentConfig, ArgumentKind, ToolConfig};
use super::dispatch::{ToolContext, ToolError, ToolOutput};
use crate::api::types::ActionRequest;
use crate::api::CloudApi;
use futures::future::BoxFuture;
use futures::FutureExt;

type HandlerFuture<'a> = BoxFuture<'a, Result<ToolOutput, ToolError>>;

pub fn tools() -> Vec<ToolConfig> {
    vec![
        ToolConfig::new("image-transfer", "Transfer an image to another region", transfer)
            .arg(id_arg("ID of the image to transfer"))
            .arg(ArgumentConfig::required(
                "Region",
                ArgumentKind::String,
                "Slug of the destination region (e.g., nyc3)",
            )),
        ToolConfig::new(
            "image-convert-to-snapshot",
            "Convert an image (such as a backup) to a snapshot",
            convert,
        )
        .arg(id_arg("ID of the image to convert")),
        ToolConfig::new(
            "image-action-get",
            "Get an image action by image ID and action ID",
            action_get,
        )
        .arg(ArgumentConfig::required("ImageID", ArgumentKind::Number, "Image ID"))
        .arg(ArgumentConfig::required("ActionID", ArgumentKind::Number, "Action ID")),
    ]
}

fn transfer<'a>(_: &'a ToolContext, api: &'a dyn CloudApi, args: &'a Arguments) -> HandlerFuture<'a> {
    async move {
        let id = args.id("ID")?;
        let req = ActionRequest::new("transfer").with("region", args.string("Region")?);
        ToolOutput::json(&api.image_action(id, &req).await?)
    }
    .boxed()
}

fn convert<'a>(_: &'a ToolContext, api: &'a dyn CloudApi, args: &'a Arguments) -> HandlerFuture<'a> {
    async move {
        let req = ActionRequest::new("convert");
        ToolOutput::json(&api.image_action(args.id("ID")?, &req).await?)
    }
    .boxed()
}

fn action_get<'a>(
    _: &'a ToolContext,
    api: &'a dyn CloudApi,
    args: &'a Arguments,
) -> HandlerFuture<'a> {
    async move {
        let image_id = args.id("ImageID")?;
        let action_id = args.id("ActionID")?;
        ToolOutput::json(&api.get_image_action(image_id, action_id).await?)
    }
    .boxed()
}
