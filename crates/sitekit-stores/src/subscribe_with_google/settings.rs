//! `modules/subscribe-with-google` settings

use serde::{Deserialize, Serialize};
use sitekit_data::{invariant, InvariantViolation, SettingsModule, SettingsStore};

use super::validation::{is_valid_products, is_valid_publication_id, is_valid_revenue_model};

pub const INVARIANT_INVALID_PUBLICATION_ID: &str = "a valid publicationID is required";
pub const INVARIANT_INVALID_PRODUCTS: &str = "a valid products string is required";
pub const INVARIANT_INVALID_REVENUE_MODEL: &str = "a valid revenue model is required";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscribeWithGoogleSettings {
    #[serde(rename = "publicationID")]
    pub publication_id: Option<String>,
    /// Newline-separated product names
    pub products: Option<String>,
    #[serde(rename = "revenueModel")]
    pub revenue_model: Option<String>,
}

/// The Subscribe with Google module
#[derive(Debug, Clone, Copy, Default)]
pub struct SubscribeWithGoogle;

impl SettingsModule for SubscribeWithGoogle {
    type Settings = SubscribeWithGoogleSettings;

    fn slug(&self) -> &str {
        super::SLUG
    }

    fn validate_can_submit_changes(
        &self,
        settings: &SubscribeWithGoogleSettings,
    ) -> Result<(), InvariantViolation> {
        invariant(
            settings
                .publication_id
                .as_deref()
                .is_some_and(is_valid_publication_id),
            INVARIANT_INVALID_PUBLICATION_ID,
        )?;
        invariant(
            settings.products.as_deref().is_some_and(is_valid_products),
            INVARIANT_INVALID_PRODUCTS,
        )?;
        invariant(
            settings
                .revenue_model
                .as_deref()
                .is_some_and(is_valid_revenue_model),
            INVARIANT_INVALID_REVENUE_MODEL,
        )
    }
}

/// Per-field selectors and setters. Selectors read the local settings and
/// do not trigger a fetch.
pub trait SubscribeWithGoogleSettingsExt {
    fn publication_id(&self) -> Option<String>;
    fn set_publication_id(&self, publication_id: impl Into<String>);
    fn products(&self) -> Option<String>;
    fn set_products(&self, products: impl Into<String>);
    fn revenue_model(&self) -> Option<String>;
    fn set_revenue_model(&self, revenue_model: impl Into<String>);
}

impl SubscribeWithGoogleSettingsExt for SettingsStore<SubscribeWithGoogle> {
    fn publication_id(&self) -> Option<String> {
        self.settings_ref().and_then(|s| s.publication_id)
    }

    fn set_publication_id(&self, publication_id: impl Into<String>) {
        let publication_id = publication_id.into();
        self.set_settings(|s| s.publication_id = Some(publication_id));
    }

    fn products(&self) -> Option<String> {
        self.settings_ref().and_then(|s| s.products)
    }

    fn set_products(&self, products: impl Into<String>) {
        let products = products.into();
        self.set_settings(|s| s.products = Some(products));
    }

    fn revenue_model(&self) -> Option<String> {
        self.settings_ref().and_then(|s| s.revenue_model)
    }

    fn set_revenue_model(&self, revenue_model: impl Into<String>) {
        let revenue_model = revenue_model.into();
        self.set_settings(|s| s.revenue_model = Some(revenue_model));
    }
}
