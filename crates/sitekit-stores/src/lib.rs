//! Concrete Site Kit stores
//!
//! - `core/site`: raw HTML of front-end pages
//! - `modules/subscribe-with-google`: module settings with field validation

pub mod site;
pub mod subscribe_with_google;

use std::sync::Arc;

use sitekit_api::ApiClient;
use sitekit_data::{Registry, Result};

pub use site::{SiteStore, CORE_SITE};
pub use subscribe_with_google::{
    SubscribeWithGoogle, SubscribeWithGoogleSettings, SubscribeWithGoogleSettingsExt,
    SubscribeWithGoogleStore, MODULES_SUBSCRIBE_WITH_GOOGLE,
};

/// Register every store of this crate on `registry`
pub fn register_stores(registry: &Registry, client: Arc<ApiClient>) -> Result<()> {
    SiteStore::register(registry, Arc::clone(&client))?;
    subscribe_with_google::register(registry, client)?;
    Ok(())
}
