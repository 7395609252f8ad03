//! Paged catalog listings against the SQLite adapter

#![allow(clippy::expect_used)]

use std::collections::HashSet;
use std::sync::Arc;

use fleetbase_core::catalog::CatalogService;
use fleetbase_core::query::ListParams;
use fleetbase_meta_adapter_sqlite::MetaAdapterSqlite;
use fleetbase_types::error::Error;
use fleetbase_types::meta_adapter::CreateModuleType;
use fleetbase_types::types::TnId;
use tempfile::TempDir;

async fn create_catalog(max_page_limit: u32) -> (CatalogService, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter =
		Arc::new(MetaAdapterSqlite::new(temp_dir.path()).await.expect("Failed to create adapter"));
	(CatalogService::new(adapter.clone(), adapter, max_page_limit), temp_dir)
}

async fn seed(catalog: &CatalogService, tn_id: TnId, count: u32) {
	let types: Vec<CreateModuleType> = (0..count)
		.map(|i| CreateModuleType {
			key: format!("type-{:02}", i).into(),
			name: format!("Type {:02}", i).into(),
			description: None,
			colour: None,
			// Many equal values, so the id tie-break matters
			max_assignments: i % 3 + 1,
		})
		.collect();
	catalog.create_module_types(tn_id, &types).await.expect("seed");
}

#[tokio::test]
async fn test_windows_concatenate_without_gaps() {
	let (catalog, _temp) = create_catalog(500).await;
	let tn_id = TnId(1);
	seed(&catalog, tn_id, 23).await;

	let mut seen = Vec::new();
	let mut offset = 0;
	loop {
		let params = ListParams {
			offset: Some(offset),
			limit: Some(5),
			sort: Some("maxAssignments:DESC".into()),
			q: None,
		};
		let page = catalog.list_module_types(tn_id, &params).await.expect("page");
		assert_eq!(page.total, 23);
		if page.items.is_empty() {
			break;
		}
		seen.extend(page.items.iter().map(|t| t.smt_id));
		offset += 5;
	}

	assert_eq!(seen.len(), 23);
	assert_eq!(seen.iter().collect::<HashSet<_>>().len(), 23);
}

#[tokio::test]
async fn test_limit_is_clamped_to_configured_maximum() {
	let (catalog, _temp) = create_catalog(10).await;
	let tn_id = TnId(1);
	seed(&catalog, tn_id, 23).await;

	let params = ListParams { limit: Some(100), ..ListParams::default() };
	let page = catalog.list_module_types(tn_id, &params).await.expect("page");
	assert_eq!(page.limit, 10);
	assert_eq!(page.items.len(), 10);
	assert_eq!(page.total, 23);
}

#[tokio::test]
async fn test_filtered_listing() {
	let (catalog, _temp) = create_catalog(500).await;
	let tn_id = TnId(1);
	seed(&catalog, tn_id, 12).await;

	let params = ListParams {
		q: Some("maxAssignments==1;key!=type-00".into()),
		sort: Some("key:desc".into()),
		..ListParams::default()
	};
	let page = catalog.list_module_types(tn_id, &params).await.expect("page");
	let keys: Vec<&str> = page.items.iter().map(|t| &*t.key).collect();
	assert_eq!(keys, vec!["type-09", "type-06", "type-03"]);
	assert_eq!(page.total, 3);
}

#[tokio::test]
async fn test_invalid_query() {
	let (catalog, _temp) = create_catalog(500).await;
	let tn_id = TnId(1);

	let params = ListParams { q: Some("name=~x".into()), ..ListParams::default() };
	assert!(matches!(
		catalog.list_module_types(tn_id, &params).await,
		Err(Error::InvalidQuery(_))
	));
	let params = ListParams { sort: Some("maxAssignments:asc".into()), ..ListParams::default() };
	assert!(matches!(
		catalog.list_dist_types(tn_id, &params).await,
		Err(Error::InvalidQuery(_))
	));
}
