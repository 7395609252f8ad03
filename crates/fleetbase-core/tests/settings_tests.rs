//! Tenant configuration tests against the SQLite adapter

#![allow(clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use fleetbase_core::settings::{ConfigKeyRegistry, ConfigValue, SettingsService};
use fleetbase_meta_adapter_sqlite::MetaAdapterSqlite;
use fleetbase_types::error::Error;
use fleetbase_types::meta_adapter::MetaAdapter;
use fleetbase_types::types::TnId;
use serde_json::json;
use tempfile::TempDir;

async fn create_test_service() -> (SettingsService, Arc<MetaAdapterSqlite>, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter =
		Arc::new(MetaAdapterSqlite::new(temp_dir.path()).await.expect("Failed to create adapter"));

	let mut registry = ConfigKeyRegistry::new();
	fleetbase_core::register_settings(&mut registry).expect("register settings");
	let service = SettingsService::new(Arc::new(registry.freeze()), adapter.clone());

	(service, adapter, temp_dir)
}

#[tokio::test]
async fn test_defaults_are_global() {
	let (service, _adapter, _temp) = create_test_service().await;
	let tn_id = TnId(1);

	let entry = service.get(tn_id, "polling.interval").await.expect("get");
	assert!(entry.global);
	assert_eq!(entry.value, ConfigValue::Duration(Duration::from_secs(300)));
	assert!(entry.created_at.is_none());

	let all = service.list(tn_id).await.expect("list");
	assert_eq!(all.len(), 15);
	assert!(all.values().all(|e| e.global));
}

#[tokio::test]
async fn test_set_then_get() {
	let (service, _adapter, _temp) = create_test_service().await;
	let tn_id = TnId(1);

	let stored = service.set(tn_id, "polling.interval", &json!("PT1M")).await.expect("set");
	assert!(!stored.global);
	assert_eq!(stored.value, ConfigValue::Duration(Duration::from_secs(60)));

	let entry = service.get(tn_id, "polling.interval").await.expect("get");
	assert!(!entry.global);
	assert_eq!(entry.value, stored.value);
	assert_eq!(
		service.get_duration(tn_id, "polling.interval").await.expect("typed get"),
		Duration::from_secs(60)
	);
}

#[tokio::test]
async fn test_clock_form_is_stored_as_iso() {
	let (service, adapter, _temp) = create_test_service().await;
	let tn_id = TnId(1);

	service.set(tn_id, "polling.overdue.interval", &json!("00:10:00")).await.expect("set");
	let raw = adapter
		.read_setting(tn_id, "polling.overdue.interval")
		.await
		.expect("read")
		.expect("stored");
	assert_eq!(raw.value, json!("PT10M"));
}

#[tokio::test]
async fn test_wrong_type_is_not_stored() {
	let (service, _adapter, _temp) = create_test_service().await;
	let tn_id = TnId(1);

	let err = service.set(tn_id, "maintenance_window.poll_count", &json!("5")).await;
	assert!(matches!(err, Err(Error::TypeMismatch(_))));
	let err = service.set(tn_id, "polling.interval", &json!(300)).await;
	assert!(matches!(err, Err(Error::TypeMismatch(_))));

	let entry = service.get(tn_id, "maintenance_window.poll_count").await.expect("get");
	assert!(entry.global);
	assert_eq!(entry.value, ConfigValue::Int(3));
}

#[tokio::test]
async fn test_validator_rejects() {
	let (service, _adapter, _temp) = create_test_service().await;
	let tn_id = TnId(1);

	let err = service.set(tn_id, "polling.interval", &json!("PT1S")).await;
	assert!(matches!(err, Err(Error::ValidationError(_))));
	let err = service.set(tn_id, "action.cleanup.status", &json!("running")).await;
	assert!(matches!(err, Err(Error::ValidationError(_))));
	assert!(service.get(tn_id, "polling.interval").await.expect("get").global);
}

#[tokio::test]
async fn test_unknown_key() {
	let (service, _adapter, _temp) = create_test_service().await;
	let tn_id = TnId(1);

	assert!(matches!(service.get(tn_id, "no.such.key").await, Err(Error::UnknownKey(_))));
	assert!(matches!(
		service.set(tn_id, "no.such.key", &json!(true)).await,
		Err(Error::UnknownKey(_))
	));
	assert!(matches!(service.delete(tn_id, "no.such.key").await, Err(Error::UnknownKey(_))));
}

#[tokio::test]
async fn test_delete_reverts_to_default() {
	let (service, _adapter, _temp) = create_test_service().await;
	let tn_id = TnId(1);

	assert!(matches!(
		service.delete(tn_id, "rollout.approval.enabled").await,
		Err(Error::NotFound)
	));

	service.set(tn_id, "rollout.approval.enabled", &json!(true)).await.expect("set");
	assert!(service.get_bool(tn_id, "rollout.approval.enabled").await.expect("get"));

	service.delete(tn_id, "rollout.approval.enabled").await.expect("delete");
	let entry = service.get(tn_id, "rollout.approval.enabled").await.expect("get");
	assert!(entry.global);
	assert_eq!(entry.value, ConfigValue::Bool(false));
}

#[tokio::test]
async fn test_explicit_default_value_is_an_override() {
	let (service, _adapter, _temp) = create_test_service().await;
	let tn_id = TnId(1);

	service.set(tn_id, "maintenance_window.poll_count", &json!(3)).await.expect("set");
	assert!(!service.get(tn_id, "maintenance_window.poll_count").await.expect("get").global);
	service.delete(tn_id, "maintenance_window.poll_count").await.expect("delete");
}

#[tokio::test]
async fn test_tenant_isolation() {
	let (service, _adapter, _temp) = create_test_service().await;

	service.set(TnId(1), "polling.interval", &json!("PT1M")).await.expect("set");

	let other = service.get(TnId(2), "polling.interval").await.expect("get");
	assert!(other.global);
	assert_eq!(other.value, ConfigValue::Duration(Duration::from_secs(300)));
}

#[tokio::test]
async fn test_undecodable_override_falls_back_to_default() {
	let (service, adapter, _temp) = create_test_service().await;
	let tn_id = TnId(1);

	adapter.upsert_setting(tn_id, "polling.interval", &json!(42)).await.expect("raw upsert");

	let entry = service.get(tn_id, "polling.interval").await.expect("get");
	assert!(entry.global);
	assert_eq!(entry.value, ConfigValue::Duration(Duration::from_secs(300)));
}

#[tokio::test]
async fn test_typed_getter_mismatch() {
	let (service, _adapter, _temp) = create_test_service().await;
	let tn_id = TnId(1);

	assert!(matches!(
		service.get_bool(tn_id, "polling.interval").await,
		Err(Error::TypeMismatch(_))
	));
	assert_eq!(
		service.get_string(tn_id, "action.cleanup.status").await.expect("enum as string"),
		"canceled_or_error"
	);
	assert_eq!(service.get_int(tn_id, "maintenance_window.poll_count").await.expect("int"), 3);
}
