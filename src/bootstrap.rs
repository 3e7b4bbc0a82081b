//! Application wiring

use datashop_config::{validate_config, AppConfig};
use datashop_fulfillment::FulfillmentOrchestrator;
use datashop_routing::SupplierRouter;
use datashop_store::{OrderStore, PackageStore, SettingStore, SqliteStore};
use datashop_suppliers::{DataXpressClient, HubnetClient, SupplierAdapter};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// The wired application: everything a web or admin layer needs.
pub struct App {
    pub router: Arc<SupplierRouter>,
    pub orchestrator: Arc<FulfillmentOrchestrator>,
    pub packages: Arc<dyn PackageStore>,
    pub orders: Arc<dyn OrderStore>,
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; `try_init` so tests that build the app
/// repeatedly do not panic on the second call.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("info,datashop={default_level}")));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Construct one adapter per configured supplier.
pub fn build_adapters(config: &AppConfig) -> Vec<Arc<dyn SupplierAdapter>> {
    let timeout = Duration::from_millis(config.suppliers.request_timeout_ms);

    vec![
        Arc::new(DataXpressClient::new(
            config.suppliers.dataxpress.base_url.clone(),
            config.suppliers.dataxpress.api_key.clone(),
            timeout,
        )),
        Arc::new(HubnetClient::new(
            config.suppliers.hubnet.base_url.clone(),
            config.suppliers.hubnet.api_key.clone(),
            config.suppliers.hubnet.network.clone(),
            timeout,
        )),
    ]
}

/// Wire the router and orchestrator over the given stores.
pub fn wire(
    config: &AppConfig,
    packages: Arc<dyn PackageStore>,
    orders: Arc<dyn OrderStore>,
    settings: Arc<dyn SettingStore>,
) -> App {
    let mut router = SupplierRouter::new(settings, config.suppliers.default_supplier);
    for adapter in build_adapters(config) {
        router = router.register(adapter);
    }
    let router = Arc::new(router);

    let orchestrator = Arc::new(FulfillmentOrchestrator::new(
        orders.clone(),
        packages.clone(),
        router.clone(),
    ));

    App {
        router,
        orchestrator,
        packages,
        orders,
    }
}

/// Build the full application against the configured SQLite database.
pub async fn build(config: &AppConfig) -> anyhow::Result<App> {
    validate_config(config)?;

    let store = Arc::new(SqliteStore::connect(&config.database.url).await?);
    Ok(wire(
        config,
        store.clone(),
        store.clone(),
        store,
    ))
}
