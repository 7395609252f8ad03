use std::{env, path, sync::Arc};

use fleetbase::error::FbResult;
use fleetbase_meta_adapter_sqlite::MetaAdapterSqlite;

pub struct Config {
	pub listen: String,
	pub db_dir: path::PathBuf,
	pub max_page_limit: Option<u32>,
}

impl Config {
	fn from_env() -> Self {
		Config {
			listen: env::var("LISTEN").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
			db_dir: path::PathBuf::from(env::var("DB_DIR").unwrap_or_else(|_| "./data".to_string())),
			max_page_limit: env::var("MAX_PAGE_LIMIT").ok().and_then(|v| v.parse().ok()),
		}
	}
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> FbResult<()> {
	let config = Config::from_env();
	fleetbase::app::init_logging();

	let meta_adapter = Arc::new(MetaAdapterSqlite::new(&config.db_dir).await.map_err(|e| {
		tracing::error!("FATAL: Cannot open database in {}: {}", config.db_dir.display(), e);
		e
	})?);

	let mut builder = fleetbase::AppBuilder::new();
	builder
		.listen(config.listen)
		.meta_adapter(meta_adapter.clone())
		.deployment_refs(meta_adapter);
	if let Some(max_page_limit) = config.max_page_limit {
		builder.max_page_limit(max_page_limit);
	}
	builder.run().await
}

// vim: ts=4
