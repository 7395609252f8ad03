//! App state type

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

use fleetbase_types::deployment_adapter::DeploymentRefAdapter;
use fleetbase_types::meta_adapter::MetaAdapter;

use crate::catalog::CatalogService;
use crate::composition::CompositionService;
use crate::prelude::*;
use crate::query::MAX_PAGE_LIMIT;
use crate::settings::{ConfigKeyRegistry, FrozenConfigKeyRegistry, SettingsService};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_TENANT_CACHE_SIZE: usize = 1024;

pub struct AppState {
	pub opts: AppBuilderOpts,

	pub meta_adapter: Arc<dyn MetaAdapter>,
	pub deployment_refs: Arc<dyn DeploymentRefAdapter>,

	// Configuration subsystem
	pub settings: Arc<SettingsService>,
	pub settings_registry: Arc<FrozenConfigKeyRegistry>,

	// Type catalog and composition
	pub catalog: Arc<CatalogService>,
	pub composition: Arc<CompositionService>,

	pub tenants: TenantCache,
}

impl AppState {
	/// Wire the services around the given adapters.
	///
	/// Registers the built-in configuration keys; a broken key catalog fails
	/// here with `Error::ConfigError`.
	pub fn new(
		opts: AppBuilderOpts,
		meta_adapter: Arc<dyn MetaAdapter>,
		deployment_refs: Arc<dyn DeploymentRefAdapter>,
	) -> FbResult<App> {
		let mut registry = ConfigKeyRegistry::new();
		crate::register_settings(&mut registry)?;
		let settings_registry = Arc::new(registry.freeze());

		let settings = Arc::new(SettingsService::new(settings_registry.clone(), meta_adapter.clone()));
		let catalog = Arc::new(CatalogService::new(
			meta_adapter.clone(),
			deployment_refs.clone(),
			opts.max_page_limit,
		));
		let composition =
			Arc::new(CompositionService::new(meta_adapter.clone(), deployment_refs.clone()));
		let tenants = TenantCache::new(opts.tenant_cache_size);

		Ok(Arc::new(AppState {
			opts,
			meta_adapter,
			deployment_refs,
			settings,
			settings_registry,
			catalog,
			composition,
			tenants,
		}))
	}
}

pub type App = Arc<AppState>;

#[derive(Debug, Clone)]
pub struct AppBuilderOpts {
	pub listen: Box<str>,
	/// Upper bound of the `limit` list parameter
	pub max_page_limit: u32,
	/// Register unknown tenant names on first use instead of rejecting them
	pub auto_register_tenants: bool,
	pub tenant_cache_size: usize,
}

impl Default for AppBuilderOpts {
	fn default() -> Self {
		Self {
			listen: "127.0.0.1:8080".into(),
			max_page_limit: MAX_PAGE_LIMIT,
			auto_register_tenants: true,
			tenant_cache_size: DEFAULT_TENANT_CACHE_SIZE,
		}
	}
}

/// LRU cache of tenant name to TnId. The mapping never changes once created.
pub struct TenantCache {
	cache: Mutex<LruCache<Box<str>, TnId>>,
}

impl TenantCache {
	pub fn new(capacity: usize) -> Self {
		let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
		Self { cache: Mutex::new(LruCache::new(capacity)) }
	}

	pub fn get(&self, tenant: &str) -> Option<TnId> {
		self.cache.lock().get(tenant).copied()
	}

	pub fn put(&self, tenant: &str, tn_id: TnId) {
		self.cache.lock().put(tenant.into(), tn_id);
	}
}

// vim: ts=4
