//! Subscribe with Google module store

pub mod settings;
pub mod validation;

use std::sync::Arc;

use sitekit_api::ApiClient;
use sitekit_data::{Registry, Result, SettingsStore};

pub use settings::{
    SubscribeWithGoogle, SubscribeWithGoogleSettings, SubscribeWithGoogleSettingsExt,
    INVARIANT_INVALID_PRODUCTS, INVARIANT_INVALID_PUBLICATION_ID, INVARIANT_INVALID_REVENUE_MODEL,
};

pub const SLUG: &str = "subscribe-with-google";
pub const MODULES_SUBSCRIBE_WITH_GOOGLE: &str = "modules/subscribe-with-google";

pub type SubscribeWithGoogleStore = SettingsStore<SubscribeWithGoogle>;

/// Create the settings store and register it under
/// [`MODULES_SUBSCRIBE_WITH_GOOGLE`]
pub fn register(registry: &Registry, client: Arc<ApiClient>) -> Result<Arc<SubscribeWithGoogleStore>> {
    let store = SettingsStore::new(SubscribeWithGoogle, client);
    registry.register_store(MODULES_SUBSCRIBE_WITH_GOOGLE, Arc::clone(&store))?;
    Ok(store)
}
