use crate::format::{Renderer, Template};
use libhold::config::Headers;
use libhold::{HoldError, ImageStore, ListOptions, ListRequest, Result, StorageOptions, list_images};

pub mod handlers;

/// Flags and argument of `hold images`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImagesOptions {
    /// Only list images with a matching name
    pub name: Option<String>,
    pub all: bool,
    pub digests: bool,
    pub filter: Option<String>,
    pub format: Option<String>,
    pub json: bool,
    pub noheading: bool,
    pub no_trunc: bool,
    pub quiet: bool,
}

impl ImagesOptions {
    /// Rejects flag combinations before any storage access.
    pub fn validate(&self) -> Result<()> {
        if self.quiet && self.format.is_some() {
            return Err(HoldError::usage("quiet and format are mutually exclusive"));
        }
        self.request().validate()?;
        if let Some(format) = &self.format {
            Template::parse(format)?;
        }
        Ok(())
    }

    pub fn request(&self) -> ListRequest {
        ListRequest {
            name: self.name.clone(),
            filter: self.filter.clone(),
            options: ListOptions {
                all: self.all,
                truncate: !self.no_trunc,
                quiet: self.quiet,
            },
        }
    }

    /// Template for table output; `read_only` adds the R/O column to the default table.
    pub fn template(&self, read_only: bool) -> Result<Template> {
        if let Some(format) = &self.format {
            return Template::parse(format);
        }
        if self.quiet {
            return Ok(Template::quiet());
        }
        Ok(Template::default_table(self.digests, read_only))
    }
}

/// One line per UID/GID remapping range of the store.
pub fn describe_id_mappings(storage: &StorageOptions) -> Result<Vec<String>> {
    let (uids, gids) = storage.runtime_id_mappings()?;
    let uids = uids.iter().map(|m| ("UID", m.container_id(), m.host_id(), m.size()));
    let gids = gids.iter().map(|m| ("GID", m.container_id(), m.host_id(), m.size()));
    Ok(uids
        .chain(gids)
        .map(|(kind, container, host, size)| {
            format!("{} {} -> {} ({} ids)", kind, container, host, size)
        })
        .collect())
}

/// Lists images from a store and renders them.
pub fn render_images<S, R>(
    store: &S,
    renderer: &R,
    headers: &Headers,
    options: &ImagesOptions,
) -> Result<String>
where
    S: ImageStore + ?Sized,
    R: Renderer + ?Sized,
{
    options.validate()?;
    let listing = list_images(store, &options.request())?;
    tracing::info!(
        "listed {} images as {} rows",
        listing.images.len(),
        listing.rows.len()
    );

    if options.json {
        return renderer.render_json(&listing.images);
    }
    let template = options.template(listing.has_read_only())?;
    Ok(renderer.render_table(&listing.rows, &template, headers, !options.noheading))
}
