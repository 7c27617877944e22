use super::*;
use crate::context::{AppContext, VerbosityLevel};
use crate::format::{self, TabledRenderer};
use libhold::Storage;

/// Handle the images command
pub fn handle_images(ctx: &AppContext, options: &ImagesOptions) {
    if let Err(e) = options.validate() {
        format::error(ctx, &e.to_string());
        std::process::exit(1);
    }

    format::print(
        ctx,
        VerbosityLevel::Verbose,
        &format!(
            "Reading images from {} ({})",
            ctx.storage.graph_root.display(),
            ctx.storage.driver
        ),
    );
    if let Some(filter) = &options.filter {
        format::print(
            ctx,
            VerbosityLevel::Verbose,
            &format!("Applying filter: {}", filter),
        );
    }
    match describe_id_mappings(&ctx.storage) {
        Ok(lines) => {
            for line in lines {
                format::print(ctx, VerbosityLevel::Verbose, &format!("Remapping {}", line));
            }
        }
        Err(e) => format::warning(ctx, &e.to_string()),
    }
    if !ctx.storage.graph_root.is_dir() {
        format::warning(
            ctx,
            &format!(
                "storage root {} does not exist",
                ctx.storage.graph_root.display()
            ),
        );
    }

    let storage = Storage::open(ctx.storage.clone());
    let renderer = TabledRenderer::new(format::should_color(ctx));
    match render_images(&storage, &renderer, &ctx.config.headers, options) {
        Ok(output) => print!("{}", output),
        Err(e) => {
            format::error(ctx, &e.to_string());
            std::process::exit(1);
        }
    }
}
