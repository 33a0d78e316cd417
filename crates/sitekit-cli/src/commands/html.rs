// Print the HTML of a front-end page

use sitekit_data::subscribe_until;
use sitekit_stores::{SiteStore, CORE_SITE};
use tracing::info;

use super::Command;
use crate::{
    context::AppContext,
    error::{CliError, CliResult},
};

/// Resolve `getHTMLForURL` and print the body
pub struct HtmlCommand {
    pub url: String,
}

impl HtmlCommand {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Resolve the page and return its HTML
    pub async fn resolve(&self, ctx: &AppContext) -> CliResult<String> {
        let store = ctx.registry.select::<SiteStore>(CORE_SITE)?;

        if let Some(html) = store.get_html_for_url(&self.url) {
            return Ok(html);
        }
        subscribe_until(
            &*store,
            || store.has_finished_resolution_get_html_for_url(&self.url),
            ctx.resolve_timeout(),
        )
        .await?;

        if let Some(error) = store.get_error_for_html_for_url(&self.url) {
            return Err(error.into());
        }
        let html = store.get_html_for_url(&self.url).unwrap_or_default();
        info!(url = %self.url, bytes = html.len(), "Fetched HTML");
        Ok(html)
    }
}

#[async_trait::async_trait]
impl Command for HtmlCommand {
    async fn execute(&self, ctx: &AppContext) -> CliResult<()> {
        let html = self.resolve(ctx).await?;
        if html.is_empty() {
            return Err(CliError::InvalidArgument {
                message: format!("{} returned an empty document", self.url),
            });
        }
        println!("{}", html);
        Ok(())
    }
}
