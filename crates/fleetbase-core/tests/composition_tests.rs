//! Composition manager and type catalog tests against the SQLite adapter

#![allow(clippy::expect_used, clippy::panic)]

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fleetbase_core::catalog::CatalogService;
use fleetbase_core::composition::CompositionService;
use fleetbase_core::query::MAX_PAGE_LIMIT;
use fleetbase_meta_adapter_sqlite::{MetaAdapterSqlite, RefKind};
use fleetbase_types::deployment_adapter::DeploymentRefAdapter;
use fleetbase_types::error::{Error, FbResult};
use fleetbase_types::meta_adapter::{
	CreateDistSetType, CreateModuleType, DistSetType, UpdateDistSetTypeData,
};
use fleetbase_types::types::{Patch, TnId};
use tempfile::TempDir;

/// Debug output for a failing run, `cargo test -- --nocapture`
fn setup_test_logging() {
	let _ = tracing_subscriber::fmt()
		.with_test_writer()
		.with_max_level(tracing::Level::DEBUG)
		.try_init();
}

struct Fixture {
	adapter: Arc<MetaAdapterSqlite>,
	catalog: CatalogService,
	composition: Arc<CompositionService>,
	_temp: TempDir,
}

async fn create_fixture() -> Fixture {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter =
		Arc::new(MetaAdapterSqlite::new(temp_dir.path()).await.expect("Failed to create adapter"));
	let catalog = CatalogService::new(adapter.clone(), adapter.clone(), MAX_PAGE_LIMIT);
	let composition = Arc::new(CompositionService::new(adapter.clone(), adapter.clone()));
	Fixture { adapter, catalog, composition, _temp: temp_dir }
}

fn smt(key: &str, max_assignments: u32) -> CreateModuleType {
	CreateModuleType {
		key: key.into(),
		name: key.to_uppercase().into(),
		description: None,
		colour: None,
		max_assignments,
	}
}

fn dst(key: &str) -> CreateDistSetType {
	CreateDistSetType {
		key: key.into(),
		name: key.to_uppercase().into(),
		description: None,
		colour: None,
		mandatory: Vec::new(),
		optional: Vec::new(),
	}
}

/// Creates module types firmware, app, base and one empty distribution set type
async fn scenario(f: &Fixture, tn_id: TnId) -> (i64, i64, i64, DistSetType) {
	let types = f
		.catalog
		.create_module_types(tn_id, &[smt("firmware", 1), smt("app", 10), smt("base", 1)])
		.await
		.expect("create module types");
	let dsts = f.catalog.create_dist_types(tn_id, &[dst("device")]).await.expect("create dst");
	let dst = dsts.into_iter().next().expect("one dst");
	(types[0].smt_id, types[1].smt_id, types[2].smt_id, dst)
}

fn ids(types: &[fleetbase_types::meta_adapter::ModuleType]) -> Vec<i64> {
	types.iter().map(|t| t.smt_id).collect()
}

#[tokio::test]
async fn test_firmware_app_base_scenario() {
	let f = create_fixture().await;
	let tn_id = TnId(1);
	let (firmware, app, base, dst) = scenario(&f, tn_id).await;

	f.composition.add_mandatory(tn_id, dst.dst_id, firmware).await.expect("add firmware");
	f.composition.add_optional(tn_id, dst.dst_id, app).await.expect("add app");

	assert_eq!(ids(&f.composition.list_mandatory(tn_id, dst.dst_id).await.expect("list")), vec![firmware]);
	assert_eq!(ids(&f.composition.list_optional(tn_id, dst.dst_id).await.expect("list")), vec![app]);

	let err = f.composition.add_mandatory(tn_id, dst.dst_id, app).await;
	assert!(matches!(err, Err(Error::Conflict(_))));
	assert_eq!(ids(&f.composition.list_mandatory(tn_id, dst.dst_id).await.expect("list")), vec![firmware]);
	assert_eq!(ids(&f.composition.list_optional(tn_id, dst.dst_id).await.expect("list")), vec![app]);

	f.composition.remove_optional(tn_id, dst.dst_id, app).await.expect("remove app");
	f.composition.add_mandatory(tn_id, dst.dst_id, app).await.expect("add app as mandatory");
	f.composition.add_mandatory(tn_id, dst.dst_id, base).await.expect("add base");

	let mandatory = f.composition.list_mandatory(tn_id, dst.dst_id).await.expect("list");
	let mut expected = vec![firmware, app, base];
	expected.sort_unstable();
	assert_eq!(ids(&mandatory), expected);
	assert!(f.composition.list_optional(tn_id, dst.dst_id).await.expect("list").is_empty());
}

#[tokio::test]
async fn test_add_is_idempotent() {
	let f = create_fixture().await;
	let tn_id = TnId(1);
	let (firmware, _app, _base, dst) = scenario(&f, tn_id).await;

	let first = f.composition.add_mandatory(tn_id, dst.dst_id, firmware).await.expect("add");
	let second = f.composition.add_mandatory(tn_id, dst.dst_id, firmware).await.expect("add again");
	assert_eq!(first.mandatory, second.mandatory);
	assert_eq!(first.version, second.version);
}

#[tokio::test]
async fn test_missing_entities() {
	let f = create_fixture().await;
	let tn_id = TnId(1);
	let (firmware, app, _base, dst) = scenario(&f, tn_id).await;

	assert!(matches!(
		f.composition.add_mandatory(tn_id, dst.dst_id + 100, firmware).await,
		Err(Error::NotFound)
	));
	assert!(matches!(
		f.composition.add_optional(tn_id, dst.dst_id, firmware + 100).await,
		Err(Error::NotFound)
	));
	assert!(matches!(
		f.composition.remove_mandatory(tn_id, dst.dst_id, app).await,
		Err(Error::NotFound)
	));
	assert!(matches!(
		f.composition.get_optional(tn_id, dst.dst_id, app).await,
		Err(Error::NotFound)
	));

	f.composition.add_optional(tn_id, dst.dst_id, app).await.expect("add");
	let member = f.composition.get_optional(tn_id, dst.dst_id, app).await.expect("get");
	assert_eq!(member.smt_id, app);
	assert!(matches!(
		f.composition.get_mandatory(tn_id, dst.dst_id, app).await,
		Err(Error::NotFound)
	));
}

#[tokio::test]
async fn test_locked_composition() {
	let f = create_fixture().await;
	let tn_id = TnId(1);
	let (firmware, app, _base, dst) = scenario(&f, tn_id).await;

	f.composition.add_mandatory(tn_id, dst.dst_id, firmware).await.expect("add");
	f.adapter
		.add_deployment_ref(tn_id, RefKind::DistType, dst.dst_id, "ds-1")
		.await
		.expect("record deployable set");

	assert!(matches!(
		f.composition.add_optional(tn_id, dst.dst_id, app).await,
		Err(Error::Immutable)
	));
	assert!(matches!(
		f.composition.remove_mandatory(tn_id, dst.dst_id, firmware).await,
		Err(Error::Immutable)
	));
	assert_eq!(ids(&f.composition.list_mandatory(tn_id, dst.dst_id).await.expect("list")), vec![firmware]);

	// Base fields stay editable, deletion is blocked
	let update = UpdateDistSetTypeData {
		description: Patch::Value("in the field".into()),
		..UpdateDistSetTypeData::default()
	};
	f.catalog.update_dist_type(tn_id, dst.dst_id, &update).await.expect("update base fields");
	assert!(matches!(f.catalog.delete_dist_type(tn_id, dst.dst_id).await, Err(Error::InUse(_))));

	f.adapter
		.remove_deployment_ref(tn_id, RefKind::DistType, dst.dst_id, "ds-1")
		.await
		.expect("forget deployable set");
	f.composition.add_optional(tn_id, dst.dst_id, app).await.expect("unlocked again");
}

#[tokio::test]
async fn test_module_type_delete_blocked_while_referenced() {
	let f = create_fixture().await;
	let tn_id = TnId(1);
	let (firmware, app, base, dst) = scenario(&f, tn_id).await;

	f.composition.add_mandatory(tn_id, dst.dst_id, firmware).await.expect("add");
	f.composition.add_optional(tn_id, dst.dst_id, app).await.expect("add");

	assert!(matches!(f.catalog.delete_module_type(tn_id, firmware).await, Err(Error::InUse(_))));
	assert!(matches!(f.catalog.delete_module_type(tn_id, app).await, Err(Error::InUse(_))));

	f.adapter
		.add_deployment_ref(tn_id, RefKind::ModuleType, base, "sm-1")
		.await
		.expect("record software module");
	assert!(matches!(f.catalog.delete_module_type(tn_id, base).await, Err(Error::InUse(_))));

	f.composition.remove_optional(tn_id, dst.dst_id, app).await.expect("remove");
	f.catalog.delete_module_type(tn_id, app).await.expect("delete unreferenced");
	assert!(matches!(f.catalog.get_module_type(tn_id, app).await, Err(Error::NotFound)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_opposite_adds() {
	setup_test_logging();
	let f = create_fixture().await;
	let tn_id = TnId(1);

	for round in 0..10 {
		let types = f
			.catalog
			.create_module_types(tn_id, &[smt(&format!("m{}", round), 1)])
			.await
			.expect("create module type");
		let dsts =
			f.catalog.create_dist_types(tn_id, &[dst(&format!("d{}", round))]).await.expect("dst");
		let (smt_id, dst_id) = (types[0].smt_id, dsts[0].dst_id);

		let a = {
			let composition = f.composition.clone();
			tokio::spawn(async move { composition.add_mandatory(tn_id, dst_id, smt_id).await })
		};
		let b = {
			let composition = f.composition.clone();
			tokio::spawn(async move { composition.add_optional(tn_id, dst_id, smt_id).await })
		};
		let (a, b) = (a.await.expect("join"), b.await.expect("join"));

		assert!(a.is_ok() != b.is_ok(), "exactly one add must win: {:?} / {:?}", a, b);
		let loser = if a.is_ok() { b } else { a };
		assert!(matches!(loser, Err(Error::Conflict(_))));

		let stored = f.catalog.get_dist_type(tn_id, dst_id).await.expect("read");
		assert_eq!(stored.mandatory.len() + stored.optional.len(), 1);
	}
}

#[tokio::test]
async fn test_create_with_initial_members() {
	let f = create_fixture().await;
	let tn_id = TnId(1);
	let (firmware, app, _base, _dst) = scenario(&f, tn_id).await;

	let mut req = dst("gateway");
	req.mandatory = vec![firmware];
	req.optional = vec![app];
	let created = f.catalog.create_dist_types(tn_id, &[req]).await.expect("create");
	assert_eq!(created[0].mandatory, vec![firmware]);
	assert_eq!(created[0].optional, vec![app]);

	let mut overlap = dst("overlap");
	overlap.mandatory = vec![firmware];
	overlap.optional = vec![firmware];
	assert!(matches!(f.catalog.create_dist_types(tn_id, &[overlap]).await, Err(Error::Conflict(_))));

	let mut unknown = dst("unknown");
	unknown.optional = vec![app + 1000];
	assert!(matches!(f.catalog.create_dist_types(tn_id, &[unknown]).await, Err(Error::NotFound)));
}

#[tokio::test]
async fn test_catalog_validation() {
	let f = create_fixture().await;
	let tn_id = TnId(1);

	assert!(matches!(
		f.catalog.create_module_types(tn_id, &[smt("", 1)]).await,
		Err(Error::ValidationError(_))
	));
	assert!(matches!(
		f.catalog.create_module_types(tn_id, &[smt("os", 0)]).await,
		Err(Error::ValidationError(_))
	));
	assert!(matches!(
		f.catalog.create_module_types(tn_id, &[smt("os", 1), smt("os", 2)]).await,
		Err(Error::Conflict(_))
	));

	f.catalog.create_module_types(tn_id, &[smt("os", 1)]).await.expect("create");
	assert!(matches!(
		f.catalog.create_module_types(tn_id, &[smt("os", 1)]).await,
		Err(Error::Conflict(_))
	));
}

#[tokio::test]
async fn test_tenants_do_not_share_catalog() {
	let f = create_fixture().await;
	let (firmware, _app, _base, dst) = scenario(&f, TnId(1)).await;

	assert!(matches!(f.catalog.get_dist_type(TnId(2), dst.dst_id).await, Err(Error::NotFound)));
	assert!(matches!(
		f.composition.add_mandatory(TnId(2), dst.dst_id, firmware).await,
		Err(Error::NotFound)
	));
	// Same keys are fine in another tenant
	scenario(&f, TnId(2)).await;
}

/// Answers "not in use" once, recording a deployable set reference on the
/// checked type just before returning. Later checks see the stored state.
#[derive(Debug)]
struct RefLandsAfterCheck {
	adapter: Arc<MetaAdapterSqlite>,
	fired: AtomicBool,
}

impl RefLandsAfterCheck {
	fn new(adapter: Arc<MetaAdapterSqlite>) -> Arc<Self> {
		Arc::new(Self { adapter, fired: AtomicBool::new(false) })
	}
}

#[async_trait]
impl DeploymentRefAdapter for RefLandsAfterCheck {
	async fn is_dist_type_in_use(&self, tn_id: TnId, dst_id: i64) -> FbResult<bool> {
		if self.fired.swap(true, Ordering::SeqCst) {
			return self.adapter.is_dist_type_in_use(tn_id, dst_id).await;
		}
		self.adapter.add_deployment_ref(tn_id, RefKind::DistType, dst_id, "ds-1").await?;
		Ok(false)
	}

	async fn is_module_type_in_use(&self, tn_id: TnId, smt_id: i64) -> FbResult<bool> {
		if self.fired.swap(true, Ordering::SeqCst) {
			return self.adapter.is_module_type_in_use(tn_id, smt_id).await;
		}
		self.adapter.add_deployment_ref(tn_id, RefKind::ModuleType, smt_id, "sm-1").await?;
		Ok(false)
	}
}

#[tokio::test]
async fn test_reference_recorded_during_add_locks_composition() {
	setup_test_logging();
	let f = create_fixture().await;
	let tn_id = TnId(1);
	let (firmware, _app, _base, dst) = scenario(&f, tn_id).await;

	let refs = RefLandsAfterCheck::new(f.adapter.clone());
	let composition = CompositionService::new(f.adapter.clone(), refs);
	assert!(matches!(
		composition.add_mandatory(tn_id, dst.dst_id, firmware).await,
		Err(Error::Immutable)
	));

	assert!(f.adapter.is_dist_type_in_use(tn_id, dst.dst_id).await.expect("check"));
	assert!(f.composition.list_mandatory(tn_id, dst.dst_id).await.expect("list").is_empty());
}

#[tokio::test]
async fn test_reference_recorded_during_remove_locks_composition() {
	let f = create_fixture().await;
	let tn_id = TnId(1);
	let (firmware, _app, _base, dst) = scenario(&f, tn_id).await;
	f.composition.add_mandatory(tn_id, dst.dst_id, firmware).await.expect("add");

	let refs = RefLandsAfterCheck::new(f.adapter.clone());
	let composition = CompositionService::new(f.adapter.clone(), refs);
	assert!(matches!(
		composition.remove_mandatory(tn_id, dst.dst_id, firmware).await,
		Err(Error::Immutable)
	));
	assert_eq!(ids(&f.composition.list_mandatory(tn_id, dst.dst_id).await.expect("list")), vec![firmware]);
}

#[tokio::test]
async fn test_reference_recorded_during_delete_blocks_it() {
	let f = create_fixture().await;
	let tn_id = TnId(1);
	let (_firmware, _app, base, dst) = scenario(&f, tn_id).await;

	let refs = RefLandsAfterCheck::new(f.adapter.clone());
	let catalog = CatalogService::new(f.adapter.clone(), refs, MAX_PAGE_LIMIT);
	assert!(matches!(catalog.delete_dist_type(tn_id, dst.dst_id).await, Err(Error::InUse(_))));
	f.catalog.get_dist_type(tn_id, dst.dst_id).await.expect("dst kept");

	let refs = RefLandsAfterCheck::new(f.adapter.clone());
	let catalog = CatalogService::new(f.adapter.clone(), refs, MAX_PAGE_LIMIT);
	assert!(matches!(catalog.delete_module_type(tn_id, base).await, Err(Error::InUse(_))));
	f.catalog.get_module_type(tn_id, base).await.expect("smt kept");
}
