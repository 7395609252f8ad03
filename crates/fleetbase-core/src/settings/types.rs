//! Configuration key definitions, typed values, and the key registry

use serde::{Serialize, Serializer};
use serde_with::skip_serializing_none;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::time::Duration;

use super::duration;
use crate::prelude::*;

/// Type alias for a configuration value validator
pub type ConfigValidator = Box<dyn Fn(&ConfigValue) -> FbResult<()> + Send + Sync>;

/// Declared type of a configuration key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
	Boolean,
	Integer,
	String,
	Duration,
	Enum,
}

impl ValueType {
	pub fn name(self) -> &'static str {
		match self {
			ValueType::Boolean => "boolean",
			ValueType::Integer => "integer",
			ValueType::String => "string",
			ValueType::Duration => "duration",
			ValueType::Enum => "enum",
		}
	}

	/// Interpret a JSON candidate as a value of this type.
	///
	/// Returns `None` on a type disagreement. No coercion between JSON types
	/// happens: `"5"` is not an integer and `1` is not a boolean.
	pub fn decode(self, candidate: &serde_json::Value) -> Option<ConfigValue> {
		use serde_json::Value;

		match (self, candidate) {
			(ValueType::Boolean, Value::Bool(b)) => Some(ConfigValue::Bool(*b)),
			(ValueType::Integer, Value::Number(n)) => n.as_i64().map(ConfigValue::Int),
			(ValueType::String, Value::String(s)) => Some(ConfigValue::String(s.clone())),
			(ValueType::Duration, Value::String(s)) => duration::parse(s).map(ConfigValue::Duration),
			(ValueType::Enum, Value::String(s)) => Some(ConfigValue::Enum(s.clone())),
			_ => None,
		}
	}
}

/// Typed configuration value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
	Bool(bool),
	Int(i64),
	String(String),
	Duration(Duration),
	Enum(String),
}

impl ConfigValue {
	pub fn value_type(&self) -> ValueType {
		match self {
			ConfigValue::Bool(_) => ValueType::Boolean,
			ConfigValue::Int(_) => ValueType::Integer,
			ConfigValue::String(_) => ValueType::String,
			ConfigValue::Duration(_) => ValueType::Duration,
			ConfigValue::Enum(_) => ValueType::Enum,
		}
	}

	/// Wire and storage representation
	pub fn to_json(&self) -> serde_json::Value {
		match self {
			ConfigValue::Bool(b) => serde_json::Value::Bool(*b),
			ConfigValue::Int(i) => serde_json::Value::from(*i),
			ConfigValue::String(s) | ConfigValue::Enum(s) => serde_json::Value::String(s.clone()),
			ConfigValue::Duration(d) => serde_json::Value::String(duration::format(*d)),
		}
	}
}

impl Serialize for ConfigValue {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			ConfigValue::Bool(b) => serializer.serialize_bool(*b),
			ConfigValue::Int(i) => serializer.serialize_i64(*i),
			ConfigValue::String(s) | ConfigValue::Enum(s) => serializer.serialize_str(s),
			ConfigValue::Duration(d) => serializer.serialize_str(&duration::format(*d)),
		}
	}
}

/// Resolved configuration value of one tenant
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEntry {
	#[serde(skip)]
	pub key: Box<str>,
	pub value: ConfigValue,
	/// True if no tenant override exists and `value` is the key's default
	#[serde(rename = "isGlobalDefault")]
	pub global: bool,
	pub created_at: Option<Timestamp>,
	#[serde(rename = "lastModifiedAt")]
	pub updated_at: Option<Timestamp>,
}

/// Configuration key definition
pub struct ConfigKeyDefinition {
	/// Dot-separated key (e.g., "polling.interval")
	pub key: Box<str>,
	pub description: Box<str>,
	pub value_type: ValueType,
	pub default: ConfigValue,
	/// Allowed variants of enumerated keys
	pub variants: Box<[Box<str>]>,
	pub validator: Option<ConfigValidator>,
}

impl Debug for ConfigKeyDefinition {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ConfigKeyDefinition")
			.field("key", &self.key)
			.field("description", &self.description)
			.field("value_type", &self.value_type)
			.field("default", &self.default)
			.field("variants", &self.variants)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl ConfigKeyDefinition {
	/// Create a builder for constructing a ConfigKeyDefinition
	pub fn builder(key: impl Into<Box<str>>, value_type: ValueType) -> ConfigKeyDefinitionBuilder {
		ConfigKeyDefinitionBuilder::new(key, value_type)
	}

	/// Decode a candidate value, failing with `TypeMismatch` on disagreement
	pub fn decode(&self, candidate: &serde_json::Value) -> FbResult<ConfigValue> {
		self.value_type.decode(candidate).ok_or_else(|| {
			Error::TypeMismatch(format!(
				"key '{}' expects a {} value, got {}",
				self.key,
				self.value_type.name(),
				json_type_name(candidate)
			))
		})
	}

	/// Run variant membership and the custom validator
	pub fn validate(&self, value: &ConfigValue) -> FbResult<()> {
		if let ConfigValue::Enum(v) = value {
			if !self.variants.iter().any(|allowed| **allowed == **v) {
				return Err(Error::ValidationError(format!(
					"'{}' is not one of [{}] for key '{}'",
					v,
					self.variants.join(", "),
					self.key
				)));
			}
		}
		if let Some(validator) = &self.validator {
			validator(value)?;
		}
		Ok(())
	}
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
	match value {
		serde_json::Value::Null => "null",
		serde_json::Value::Bool(_) => "boolean",
		serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
		serde_json::Value::Number(_) => "number",
		serde_json::Value::String(_) => "string",
		serde_json::Value::Array(_) => "array",
		serde_json::Value::Object(_) => "object",
	}
}

/// Builder for ConfigKeyDefinition with fluent API
pub struct ConfigKeyDefinitionBuilder {
	key: Box<str>,
	value_type: ValueType,
	description: Option<Box<str>>,
	default: Option<ConfigValue>,
	variants: Vec<Box<str>>,
	validator: Option<ConfigValidator>,
}

impl ConfigKeyDefinitionBuilder {
	pub fn new(key: impl Into<Box<str>>, value_type: ValueType) -> Self {
		Self {
			key: key.into(),
			value_type,
			description: None,
			default: None,
			variants: Vec::new(),
			validator: None,
		}
	}

	/// Set the description (required)
	pub fn description(mut self, description: impl Into<Box<str>>) -> Self {
		self.description = Some(description.into());
		self
	}

	/// Set the default value (required)
	pub fn default(mut self, value: ConfigValue) -> Self {
		self.default = Some(value);
		self
	}

	/// Set the allowed variants of an enumerated key
	pub fn variants<I, S>(mut self, variants: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<Box<str>>,
	{
		self.variants = variants.into_iter().map(Into::into).collect();
		self
	}

	/// Set a validation function
	pub fn validator<F>(mut self, f: F) -> Self
	where
		F: Fn(&ConfigValue) -> FbResult<()> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(f));
		self
	}

	pub fn build(self) -> FbResult<ConfigKeyDefinition> {
		let description = self
			.description
			.ok_or_else(|| Error::ConfigError(format!("Key '{}' has no description", self.key)))?;
		let default = self
			.default
			.ok_or_else(|| Error::ConfigError(format!("Key '{}' has no default", self.key)))?;

		if default.value_type() != self.value_type {
			return Err(Error::ConfigError(format!(
				"Key '{}' is declared {} but its default is {}",
				self.key,
				self.value_type.name(),
				default.value_type().name()
			)));
		}
		if self.value_type == ValueType::Enum && self.variants.is_empty() {
			return Err(Error::ConfigError(format!("Enumerated key '{}' has no variants", self.key)));
		}
		if self.value_type != ValueType::Enum && !self.variants.is_empty() {
			return Err(Error::ConfigError(format!(
				"Key '{}' declares variants but is not enumerated",
				self.key
			)));
		}

		let def = ConfigKeyDefinition {
			key: self.key,
			description,
			value_type: self.value_type,
			default,
			variants: self.variants.into_boxed_slice(),
			validator: self.validator,
		};
		def.validate(&def.default).map_err(|err| {
			Error::ConfigError(format!("Default of key '{}' is invalid: {}", def.key, err))
		})?;
		Ok(def)
	}
}

/// Mutable registry used during app initialization
#[derive(Default)]
pub struct ConfigKeyRegistry {
	definitions: BTreeMap<Box<str>, ConfigKeyDefinition>,
}

impl ConfigKeyRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a new key definition
	pub fn register(&mut self, def: ConfigKeyDefinition) -> FbResult<()> {
		if self.definitions.contains_key(&def.key) {
			return Err(Error::ConfigError(format!("Key '{}' is already registered", def.key)));
		}

		debug!("Registering configuration key: {}", def.key);
		self.definitions.insert(def.key.clone(), def);
		Ok(())
	}

	/// Freeze the registry (make it immutable)
	pub fn freeze(self) -> FrozenConfigKeyRegistry {
		info!("Freezing configuration key registry with {} definitions", self.definitions.len());
		FrozenConfigKeyRegistry { definitions: self.definitions }
	}

	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}
}

/// Immutable registry stored in AppState
pub struct FrozenConfigKeyRegistry {
	definitions: BTreeMap<Box<str>, ConfigKeyDefinition>,
}

impl FrozenConfigKeyRegistry {
	/// Look up a key definition
	pub fn lookup(&self, key: &str) -> FbResult<&ConfigKeyDefinition> {
		self.definitions.get(key).ok_or_else(|| Error::UnknownKey(key.into()))
	}

	/// List all registered keys, sorted by name
	pub fn list(&self) -> impl Iterator<Item = &ConfigKeyDefinition> {
		self.definitions.values()
	}

	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn interval_key() -> ConfigKeyDefinition {
		ConfigKeyDefinition::builder("polling.interval", ValueType::Duration)
			.description("Polling interval")
			.default(ConfigValue::Duration(Duration::from_secs(300)))
			.validator(|v| match v {
				ConfigValue::Duration(d) if d.as_secs() >= 30 => Ok(()),
				_ => Err(Error::ValidationError("too short".into())),
			})
			.build()
			.expect("valid definition")
	}

	#[test]
	fn test_decode_strict_types() {
		assert_eq!(ValueType::Boolean.decode(&json!(true)), Some(ConfigValue::Bool(true)));
		assert_eq!(ValueType::Boolean.decode(&json!(1)), None);
		assert_eq!(ValueType::Integer.decode(&json!(5)), Some(ConfigValue::Int(5)));
		assert_eq!(ValueType::Integer.decode(&json!("5")), None);
		assert_eq!(ValueType::Integer.decode(&json!(5.5)), None);
		assert_eq!(ValueType::String.decode(&json!(null)), None);
		assert_eq!(
			ValueType::Duration.decode(&json!("PT1M")),
			Some(ConfigValue::Duration(Duration::from_secs(60)))
		);
		assert_eq!(ValueType::Duration.decode(&json!("soon")), None);
	}

	#[test]
	fn test_definition_decode_reports_type_mismatch() {
		let def = interval_key();
		let err = def.decode(&json!(300)).expect_err("integer is not a duration");
		assert!(matches!(err, Error::TypeMismatch(_)));
	}

	#[test]
	fn test_validator_runs() {
		let def = interval_key();
		assert!(def.validate(&ConfigValue::Duration(Duration::from_secs(60))).is_ok());
		assert!(matches!(
			def.validate(&ConfigValue::Duration(Duration::from_secs(5))),
			Err(Error::ValidationError(_))
		));
	}

	#[test]
	fn test_enum_variants_checked() {
		let def = ConfigKeyDefinition::builder("cleanup.status", ValueType::Enum)
			.description("Statuses to clean up")
			.variants(["canceled", "error"])
			.default(ConfigValue::Enum("error".into()))
			.build()
			.expect("valid definition");
		assert!(def.validate(&ConfigValue::Enum("canceled".into())).is_ok());
		assert!(matches!(
			def.validate(&ConfigValue::Enum("running".into())),
			Err(Error::ValidationError(_))
		));
	}

	#[test]
	fn test_build_rejects_inconsistent_definitions() {
		let no_default =
			ConfigKeyDefinition::builder("a", ValueType::Boolean).description("a").build();
		assert!(matches!(no_default, Err(Error::ConfigError(_))));

		let wrong_default = ConfigKeyDefinition::builder("b", ValueType::Integer)
			.description("b")
			.default(ConfigValue::Bool(false))
			.build();
		assert!(matches!(wrong_default, Err(Error::ConfigError(_))));

		let enum_without_variants = ConfigKeyDefinition::builder("c", ValueType::Enum)
			.description("c")
			.default(ConfigValue::Enum("x".into()))
			.build();
		assert!(matches!(enum_without_variants, Err(Error::ConfigError(_))));

		let default_outside_variants = ConfigKeyDefinition::builder("d", ValueType::Enum)
			.description("d")
			.variants(["x"])
			.default(ConfigValue::Enum("y".into()))
			.build();
		assert!(matches!(default_outside_variants, Err(Error::ConfigError(_))));
	}

	#[test]
	fn test_registry_rejects_duplicates() {
		let mut registry = ConfigKeyRegistry::new();
		registry.register(interval_key()).expect("first registration");
		assert!(matches!(registry.register(interval_key()), Err(Error::ConfigError(_))));

		let frozen = registry.freeze();
		assert!(frozen.lookup("polling.interval").is_ok());
		assert!(matches!(frozen.lookup("polling.nope"), Err(Error::UnknownKey(_))));
	}

	#[test]
	fn test_duration_serializes_as_iso() {
		let value = ConfigValue::Duration(Duration::from_secs(300));
		assert_eq!(serde_json::to_value(&value).expect("serialize"), json!("PT5M"));
		assert_eq!(value.to_json(), json!("PT5M"));
	}
}

// vim: ts=4
