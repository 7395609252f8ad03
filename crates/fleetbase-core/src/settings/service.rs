//! Configuration value store: typed per-tenant overrides with default fallback

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use fleetbase_types::meta_adapter::{MetaAdapter, StoredSetting};

use super::types::{ConfigEntry, ConfigKeyDefinition, ConfigValue, FrozenConfigKeyRegistry};
use crate::prelude::*;

/// Configuration service - main interface for reading and writing tenant configuration
pub struct SettingsService {
	registry: Arc<FrozenConfigKeyRegistry>,
	meta: Arc<dyn MetaAdapter>,
}

impl SettingsService {
	pub fn new(registry: Arc<FrozenConfigKeyRegistry>, meta: Arc<dyn MetaAdapter>) -> Self {
		Self { registry, meta }
	}

	/// Resolve a key for a tenant (override -> default)
	pub async fn get(&self, tn_id: TnId, key: &str) -> FbResult<ConfigEntry> {
		let def = self.registry.lookup(key)?;
		let stored = self.meta.read_setting(tn_id, key).await?;
		Ok(resolve(tn_id, def, stored.as_ref()))
	}

	/// Resolve every registered key for a tenant
	pub async fn list(&self, tn_id: TnId) -> FbResult<BTreeMap<Box<str>, ConfigEntry>> {
		let mut stored: BTreeMap<Box<str>, StoredSetting> = self
			.meta
			.list_settings(tn_id)
			.await?
			.into_iter()
			.map(|s| (s.key.clone(), s))
			.collect();

		Ok(self
			.registry
			.list()
			.map(|def| {
				let entry = resolve(tn_id, def, stored.remove(&def.key).as_ref());
				(def.key.clone(), entry)
			})
			.collect())
	}

	/// Store a tenant override after type check and validation
	pub async fn set(
		&self,
		tn_id: TnId,
		key: &str,
		candidate: &serde_json::Value,
	) -> FbResult<ConfigEntry> {
		let def = self.registry.lookup(key)?;
		let value = def.decode(candidate)?;
		def.validate(&value)?;

		let stored = self.meta.upsert_setting(tn_id, key, &value.to_json()).await?;
		info!("Configuration '{}' set for tn_id={}", key, tn_id);

		Ok(ConfigEntry {
			key: def.key.clone(),
			value,
			global: false,
			created_at: Some(stored.created_at),
			updated_at: Some(stored.updated_at),
		})
	}

	/// Remove a tenant override, reverting the key to its default
	pub async fn delete(&self, tn_id: TnId, key: &str) -> FbResult<()> {
		self.registry.lookup(key)?;
		if !self.meta.delete_setting(tn_id, key).await? {
			return Err(Error::NotFound);
		}
		info!("Configuration '{}' reset to default for tn_id={}", key, tn_id);
		Ok(())
	}

	/// Type-safe getters
	pub async fn get_bool(&self, tn_id: TnId, key: &str) -> FbResult<bool> {
		match self.get(tn_id, key).await?.value {
			ConfigValue::Bool(b) => Ok(b),
			v => Err(mismatch(key, "boolean", &v)),
		}
	}

	pub async fn get_int(&self, tn_id: TnId, key: &str) -> FbResult<i64> {
		match self.get(tn_id, key).await?.value {
			ConfigValue::Int(i) => Ok(i),
			v => Err(mismatch(key, "integer", &v)),
		}
	}

	/// Returns string and enumerated values alike
	pub async fn get_string(&self, tn_id: TnId, key: &str) -> FbResult<String> {
		match self.get(tn_id, key).await?.value {
			ConfigValue::String(s) | ConfigValue::Enum(s) => Ok(s),
			v => Err(mismatch(key, "string", &v)),
		}
	}

	pub async fn get_duration(&self, tn_id: TnId, key: &str) -> FbResult<Duration> {
		match self.get(tn_id, key).await?.value {
			ConfigValue::Duration(d) => Ok(d),
			v => Err(mismatch(key, "duration", &v)),
		}
	}
}

fn resolve(tn_id: TnId, def: &ConfigKeyDefinition, stored: Option<&StoredSetting>) -> ConfigEntry {
	if let Some(stored) = stored {
		match def.value_type.decode(&stored.value) {
			Some(value) => {
				return ConfigEntry {
					key: def.key.clone(),
					value,
					global: false,
					created_at: Some(stored.created_at),
					updated_at: Some(stored.updated_at),
				};
			}
			None => warn!(
				"Stored value of '{}' for tn_id={} does not decode as {}, using default",
				def.key,
				tn_id,
				def.value_type.name()
			),
		}
	}

	ConfigEntry {
		key: def.key.clone(),
		value: def.default.clone(),
		global: true,
		created_at: None,
		updated_at: None,
	}
}

fn mismatch(key: &str, expected: &str, got: &ConfigValue) -> Error {
	Error::TypeMismatch(format!(
		"key '{}' is not a {}, got {}",
		key,
		expected,
		got.value_type().name()
	))
}

// vim: ts=4
