//! Image listing and management tools.

use super::args::Arguments;
use super::config::{id_arg, paging_args, ArgumentConfig, ArgumentKind, ToolConfig};
use super::dispatch::{ToolContext, ToolError, ToolOutput};
use crate::api::types::{ImageFilter, ImageSummary, ImageUpdateRequest};
use crate::api::CloudApi;
use futures::future::BoxFuture;
use futures::FutureExt;

type HandlerFuture<'a> = BoxFuture<'a, Result<ToolOutput, ToolError>>;

pub fn tools() -> Vec<ToolConfig> {
    vec![
        ToolConfig::new(
            "image-list",
            "List available images (snapshots, backups, distributions, applications).",
            list,
        )
        .args(paging_args())
        .arg(ArgumentConfig::optional(
            "Type",
            ArgumentKind::String,
            "Filter by type: 'distribution', 'application', 'user' (snapshots/backups). If omitted, lists all.",
        )),
        ToolConfig::new("image-get", "Get a specific image by its numeric ID.", get)
            .arg(id_arg("Image ID")),
        ToolConfig::new("image-update", "Update an image's name.", update)
            .arg(id_arg("Image ID"))
            .arg(ArgumentConfig::required(
                "Name",
                ArgumentKind::String,
                "New name for the image",
            )),
        ToolConfig::new("image-delete", "Delete an image or snapshot.", delete)
            .arg(id_arg("ID of the image to delete"))
            .destructive(),
    ]
}

fn list<'a>(_: &'a ToolContext, api: &'a dyn CloudApi, args: &'a Arguments) -> HandlerFuture<'a> {
    async move {
        let filter = args
            .opt_string("Type")?
            .map(|t| ImageFilter::parse(&t))
            .unwrap_or(ImageFilter::All);
        let images = api.list_images(filter, &args.list_options()).await?;
        let summaries: Vec<ImageSummary> = images.into_iter().map(Into::into).collect();
        ToolOutput::json(&summaries)
    }
    .boxed()
}

fn get<'a>(_: &'a ToolContext, api: &'a dyn CloudApi, args: &'a Arguments) -> HandlerFuture<'a> {
    async move { ToolOutput::json(&api.get_image(args.id("ID")?).await?) }.boxed()
}

fn update<'a>(_: &'a ToolContext, api: &'a dyn CloudApi, args: &'a Arguments) -> HandlerFuture<'a> {
    async move {
        let id = args.id("ID")?;
        let req = ImageUpdateRequest {
            name: args.string("Name")?,
        };
        ToolOutput::json(&api.update_image(id, &req).await?)
    }
    .boxed()
}

fn delete<'a>(_: &'a ToolContext, api: &'a dyn CloudApi, args: &'a Arguments) -> HandlerFuture<'a> {
    async move {
        let id = args.id("ID")?;
        api.delete_image(id).await?;
        log::info!("deleted image {}", id);
        Ok(ToolOutput::text("Image deleted successfully"))
    }
    .boxed()
}
