//! Fetch and settings stores wired to a real client and a mock REST server

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sitekit_api::{ApiClient, ApiConfig, ApiError, GetOptions, QueryParams, Route};
use sitekit_data::{
    subscribe_until, FetchResource, FetchStore, Registry, SettingsModule, SettingsStore, Store,
    StoreCore, SubmitStatus,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ACCOUNTS_PATH: &str = "/google-site-kit/v1/modules/tagmanager/data/accounts";
const SETTINGS_PATH: &str = "/google-site-kit/v1/modules/tagmanager/data/settings";

fn client_for(server: &MockServer) -> Arc<ApiClient> {
    Arc::new(ApiClient::new(ApiConfig::default().with_base_url(server.uri())).unwrap())
}

#[derive(Clone, Serialize)]
struct AccountParams {
    page: u32,
}

struct Accounts {
    client: Arc<ApiClient>,
}

#[async_trait]
impl FetchResource for Accounts {
    type Args = (u32,);
    type Params = AccountParams;
    type Response = Vec<String>;

    fn base_name(&self) -> &'static str {
        "getAccounts"
    }

    fn args_to_params(&self, args: &(u32,)) -> AccountParams {
        AccountParams { page: args.0 }
    }

    async fn fetch(&self, params: &AccountParams) -> Result<Vec<String>, ApiError> {
        let mut query = QueryParams::new();
        query.insert("page".into(), json!(params.page));
        self.client
            .get(
                &Route::new("modules", "tagmanager", "accounts"),
                &query,
                GetOptions::default(),
            )
            .await
    }
}

struct AccountsStore {
    core: Arc<StoreCore>,
    accounts: Arc<FetchStore<Accounts>>,
}

impl Store for AccountsStore {
    fn core(&self) -> &Arc<StoreCore> {
        &self.core
    }
}

#[tokio::test]
async fn registered_fetch_store_resolves_through_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ACCOUNTS_PATH))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["acc-1", "acc-2"])))
        .expect(1)
        .mount(&server)
        .await;

    let core = StoreCore::new("modules/tagmanager");
    let accounts = FetchStore::new(
        Arc::clone(&core),
        Accounts {
            client: client_for(&server),
        },
    );
    let registry = Registry::new();
    registry
        .register_store("modules/tagmanager", Arc::new(AccountsStore { core, accounts }))
        .unwrap();

    let store = registry.select::<AccountsStore>("modules/tagmanager").unwrap();
    assert_eq!(store.accounts.get(&(1,)), None);

    let accounts = Arc::clone(&store.accounts);
    subscribe_until(
        &*store,
        || accounts.has_finished_resolution(&(1,)),
        Duration::from_secs(2),
    )
    .await
    .unwrap();

    assert_eq!(
        store.accounts.get(&(1,)),
        Some(vec!["acc-1".to_string(), "acc-2".to_string()])
    );
}

#[tokio::test]
async fn server_error_is_captured_per_signature() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ACCOUNTS_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": "forbidden",
            "message": "Insufficient permissions",
            "data": {"status": 403}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let core = StoreCore::new("modules/tagmanager");
    let accounts = FetchStore::new(
        Arc::clone(&core),
        Accounts {
            client: client_for(&server),
        },
    );

    let outcome = accounts.fetch(&(2,)).await.unwrap();
    let error = outcome.error.unwrap();
    assert_eq!(error.code, "forbidden");
    assert_eq!(error.status(), Some(403));
    assert_eq!(accounts.error(&(2,)), Some(error));
    assert_eq!(accounts.error(&(3,)), None);
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct TagManagerSettings {
    #[serde(rename = "containerID")]
    container_id: Option<String>,
}

struct TagManager;

impl SettingsModule for TagManager {
    type Settings = TagManagerSettings;

    fn slug(&self) -> &str {
        "tagmanager"
    }
}

#[tokio::test]
async fn submit_invalidates_module_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ACCOUNTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["acc-1"])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SETTINGS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"containerID": "GTM-1"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SETTINGS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"containerID": "GTM-2"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let accounts = Accounts {
        client: Arc::clone(&client),
    };
    let _ = accounts.fetch(&AccountParams { page: 1 }).await.unwrap();
    let _ = accounts.fetch(&AccountParams { page: 1 }).await.unwrap();

    let store = SettingsStore::new(TagManager, Arc::clone(&client));
    store.fetch_get_settings().await.unwrap();
    store.set_settings(|s| s.container_id = Some("GTM-2".into()));

    let result = store.submit_changes().await.unwrap();
    assert!(result.error.is_none());
    assert_eq!(store.submit_status(), SubmitStatus::Saved);
    assert_eq!(
        store.saved_settings().and_then(|s| s.container_id),
        Some("GTM-2".to_string())
    );

    // The cached accounts read was evicted along with the module family.
    let _ = accounts.fetch(&AccountParams { page: 1 }).await.unwrap();
}
