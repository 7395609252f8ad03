//! App builder - constructs and runs the Fleetbase application

use axum::Router;
use std::sync::Arc;

use fleetbase_core::app::{AppBuilderOpts, AppState, VERSION};
use fleetbase_types::deployment_adapter::DeploymentRefAdapter;
use fleetbase_types::meta_adapter::MetaAdapter;

use crate::prelude::*;
use crate::routes;

pub use fleetbase_core::app::App;

pub struct Adapters {
	pub meta_adapter: Option<Arc<dyn MetaAdapter>>,
	pub deployment_refs: Option<Arc<dyn DeploymentRefAdapter>>,
}

pub struct AppBuilder {
	opts: AppBuilderOpts,
	adapters: Adapters,
}

impl AppBuilder {
	pub fn new() -> Self {
		AppBuilder {
			opts: AppBuilderOpts::default(),
			adapters: Adapters { meta_adapter: None, deployment_refs: None },
		}
	}

	// Opts
	pub fn listen(&mut self, listen: impl Into<Box<str>>) -> &mut Self {
		self.opts.listen = listen.into();
		self
	}

	pub fn max_page_limit(&mut self, max_page_limit: u32) -> &mut Self {
		self.opts.max_page_limit = max_page_limit;
		self
	}

	pub fn auto_register_tenants(&mut self, auto_register: bool) -> &mut Self {
		self.opts.auto_register_tenants = auto_register;
		self
	}

	pub fn tenant_cache_size(&mut self, size: usize) -> &mut Self {
		self.opts.tenant_cache_size = size;
		self
	}

	// Adapters
	pub fn meta_adapter(&mut self, meta_adapter: Arc<dyn MetaAdapter>) -> &mut Self {
		self.adapters.meta_adapter = Some(meta_adapter);
		self
	}

	pub fn deployment_refs(&mut self, deployment_refs: Arc<dyn DeploymentRefAdapter>) -> &mut Self {
		self.adapters.deployment_refs = Some(deployment_refs);
		self
	}

	/// Wire the app state and its router without binding a socket
	pub fn build(self) -> FbResult<(App, Router)> {
		let Some(meta_adapter) = self.adapters.meta_adapter else {
			error!("FATAL: No meta adapter configured");
			return Err(Error::ConfigError("No meta adapter configured".to_string()));
		};
		let Some(deployment_refs) = self.adapters.deployment_refs else {
			error!("FATAL: No deployment reference adapter configured");
			return Err(Error::ConfigError("No deployment reference adapter configured".to_string()));
		};
		if self.opts.max_page_limit == 0 {
			error!("FATAL: max_page_limit must be at least 1");
			return Err(Error::ConfigError("max_page_limit must be at least 1".to_string()));
		}

		let app = AppState::new(self.opts, meta_adapter, deployment_refs).map_err(|e| {
			error!("FATAL: Cannot initialize configuration registry: {}", e);
			e
		})?;
		info!("Registered {} configuration keys", app.settings_registry.len());

		let router = routes::init(app.clone());
		Ok((app, router))
	}

	pub async fn run(self) -> FbResult<()> {
		init_logging();
		info!("Fleetbase V{}", VERSION);

		let (app, router) = self.build()?;

		let listener = tokio::net::TcpListener::bind(app.opts.listen.as_ref()).await.map_err(|e| {
			error!("FATAL: Cannot listen on {}: {}", app.opts.listen, e);
			e
		})?;
		info!("Listening on HTTP {}", app.opts.listen);
		axum::serve(listener, router).await?;

		Ok(())
	}
}

impl Default for AppBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Install the global subscriber, `RUST_LOG` overrides the `info` default.
/// A second call is a no-op.
pub fn init_logging() {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		//.with_span_events(tracing_subscriber::fmt::format::FmtSpan::ACTIVE)
		.try_init();
}

// vim: ts=4
