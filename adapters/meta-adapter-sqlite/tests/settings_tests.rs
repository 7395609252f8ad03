//! Configuration value storage tests

#![allow(clippy::expect_used)]

use fleetbase_meta_adapter_sqlite::MetaAdapterSqlite;
use fleetbase_types::meta_adapter::MetaAdapter;
use fleetbase_types::types::TnId;
use serde_json::json;
use tempfile::TempDir;

async fn create_test_adapter() -> (MetaAdapterSqlite, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter = MetaAdapterSqlite::new(temp_dir.path()).await.expect("Failed to create adapter");
	(adapter, temp_dir)
}

#[tokio::test]
async fn test_upsert_read_delete() {
	let (adapter, _temp) = create_test_adapter().await;
	let tn_id = TnId(1);

	assert!(adapter.read_setting(tn_id, "polling.interval").await.expect("read").is_none());

	let first =
		adapter.upsert_setting(tn_id, "polling.interval", &json!("PT1M")).await.expect("upsert");
	assert_eq!(first.value, json!("PT1M"));

	let second =
		adapter.upsert_setting(tn_id, "polling.interval", &json!("PT2M")).await.expect("upsert");
	assert_eq!(second.value, json!("PT2M"));
	assert_eq!(second.created_at, first.created_at);

	let read = adapter.read_setting(tn_id, "polling.interval").await.expect("read").expect("some");
	assert_eq!(read.value, json!("PT2M"));

	assert!(adapter.delete_setting(tn_id, "polling.interval").await.expect("delete"));
	assert!(!adapter.delete_setting(tn_id, "polling.interval").await.expect("delete again"));
}

#[tokio::test]
async fn test_settings_are_per_tenant() {
	let (adapter, _temp) = create_test_adapter().await;

	adapter.upsert_setting(TnId(1), "a", &json!(true)).await.expect("upsert");
	adapter.upsert_setting(TnId(1), "b", &json!(3)).await.expect("upsert");
	adapter.upsert_setting(TnId(2), "a", &json!(false)).await.expect("upsert");

	let one = adapter.list_settings(TnId(1)).await.expect("list");
	let keys: Vec<&str> = one.iter().map(|s| &*s.key).collect();
	assert_eq!(keys, vec!["a", "b"]);

	let two = adapter.read_setting(TnId(2), "a").await.expect("read").expect("some");
	assert_eq!(two.value, json!(false));
	assert!(adapter.read_setting(TnId(3), "a").await.expect("read").is_none());
}
