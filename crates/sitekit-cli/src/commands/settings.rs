// Show or update module settings

use sitekit_data::{subscribe_until, StoreError};
use sitekit_stores::{
    subscribe_with_google::SLUG, SubscribeWithGoogleSettings, SubscribeWithGoogleSettingsExt,
    SubscribeWithGoogleStore, MODULES_SUBSCRIBE_WITH_GOOGLE,
};
use tracing::info;

use super::Command;
use crate::{
    context::AppContext,
    error::{CliError, CliResult},
    output::OutputStyle,
};

/// Field edits to submit; all empty means read-only
#[derive(Debug, Clone, Default)]
pub struct SettingsEdits {
    pub publication_id: Option<String>,
    pub products: Option<String>,
    pub revenue_model: Option<String>,
}

impl SettingsEdits {
    pub fn is_empty(&self) -> bool {
        self.publication_id.is_none() && self.products.is_none() && self.revenue_model.is_none()
    }
}

pub struct SettingsCommand {
    pub module: String,
    pub edits: SettingsEdits,
}

impl SettingsCommand {
    pub fn new(module: impl Into<String>, edits: SettingsEdits) -> Self {
        Self {
            module: module.into(),
            edits,
        }
    }

    /// Load the settings, apply and submit any edits, and return the result
    pub async fn run(&self, ctx: &AppContext) -> CliResult<SubscribeWithGoogleSettings> {
        if self.module != SLUG {
            return Err(CliError::InvalidArgument {
                message: format!("unsupported module '{}' (available: {})", self.module, SLUG),
            });
        }
        let store = ctx
            .registry
            .select::<SubscribeWithGoogleStore>(MODULES_SUBSCRIBE_WITH_GOOGLE)?;

        store.get_settings();
        subscribe_until(
            &*store,
            || store.has_finished_resolution_get_settings(),
            ctx.resolve_timeout(),
        )
        .await?;
        if let Some(error) = store.get_error() {
            return Err(error.into());
        }

        if !self.edits.is_empty() {
            if let Some(publication_id) = &self.edits.publication_id {
                store.set_publication_id(publication_id.as_str());
            }
            if let Some(products) = &self.edits.products {
                store.set_products(products.as_str());
            }
            if let Some(revenue_model) = &self.edits.revenue_model {
                store.set_revenue_model(revenue_model.as_str());
            }

            store
                .validate_can_submit_changes()
                .map_err(StoreError::from)?;
            if let Some(error) = store.submit_changes().await?.error {
                return Err(error.into());
            }
            info!(module = SLUG, "Settings saved");
        }

        Ok(store.settings_ref().unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl Command for SettingsCommand {
    async fn execute(&self, ctx: &AppContext) -> CliResult<()> {
        let settings = self.run(ctx).await?;
        let style = OutputStyle::default();
        if !self.edits.is_empty() {
            println!("{}", style.success("Settings saved"));
        }
        println!("{}", style.json(&serde_json::to_value(settings)?)?);
        Ok(())
    }
}
