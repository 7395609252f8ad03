//! Built-in configuration keys

use std::time::Duration;

use crate::prelude::*;
use crate::settings::{ConfigKeyDefinition, ConfigKeyRegistry, ConfigValue, ValueType};

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Allowed values of `action.cleanup.status`
pub const CLEANUP_STATUSES: [&str; 3] = ["canceled", "error", "canceled_or_error"];

fn flag(key: &str, description: &str) -> FbResult<ConfigKeyDefinition> {
	ConfigKeyDefinition::builder(key, ValueType::Boolean)
		.description(description)
		.default(ConfigValue::Bool(false))
		.build()
}

fn text(key: &str, description: &str) -> FbResult<ConfigKeyDefinition> {
	ConfigKeyDefinition::builder(key, ValueType::String)
		.description(description)
		.default(ConfigValue::String(String::new()))
		.build()
}

fn duration_between(
	min: Duration,
	max: Duration,
) -> impl Fn(&ConfigValue) -> FbResult<()> + Send + Sync + 'static {
	move |v| {
		if let ConfigValue::Duration(d) = v {
			if *d >= min && *d <= max {
				return Ok(());
			}
		}
		Err(Error::ValidationError(format!(
			"Duration must be between {}s and {}s",
			min.as_secs(),
			max.as_secs()
		)))
	}
}

fn polling(key: &str, description: &str) -> FbResult<ConfigKeyDefinition> {
	ConfigKeyDefinition::builder(key, ValueType::Duration)
		.description(description)
		.default(ConfigValue::Duration(Duration::from_secs(5 * MINUTE)))
		.validator(duration_between(Duration::from_secs(30), Duration::from_secs(DAY)))
		.build()
}

/// Register all built-in configuration keys
pub fn register_settings(registry: &mut ConfigKeyRegistry) -> FbResult<()> {
	// Device authentication
	registry.register(flag(
		"authentication.header.enabled",
		"Authenticate targets by a certificate header set by a reverse proxy",
	)?)?;
	registry.register(text(
		"authentication.header.authority",
		"Expected issuer hash of the certificate header",
	)?)?;
	registry.register(flag(
		"authentication.targettoken.enabled",
		"Authenticate targets by their individual security token",
	)?)?;
	registry.register(flag(
		"authentication.gatewaytoken.enabled",
		"Authenticate targets by a shared gateway token",
	)?)?;
	registry.register(text("authentication.gatewaytoken.key", "The shared gateway token")?)?;

	// Polling
	registry.register(polling("polling.interval", "How often targets poll for updates")?)?;
	registry.register(polling(
		"polling.overdue.interval",
		"Grace period after which a target that missed its poll is overdue",
	)?)?;

	registry.register(
		ConfigKeyDefinition::builder("maintenance_window.poll_count", ValueType::Integer)
			.description("Polls per maintenance window")
			.default(ConfigValue::Int(3))
			.validator(|v| {
				if let ConfigValue::Int(count) = v {
					if (1..=100).contains(count) {
						return Ok(());
					}
				}
				Err(Error::ValidationError("Poll count must be between 1 and 100".into()))
			})
			.build()?,
	)?;

	// Features
	registry.register(flag(
		"anonymous.download.enabled",
		"Allow artifact downloads without authentication",
	)?)?;
	registry.register(flag(
		"repository.actions.autoclose.enabled",
		"Close running actions automatically when a new one is assigned",
	)?)?;
	registry.register(flag("rollout.approval.enabled", "Rollouts need approval before start")?)?;
	registry.register(flag(
		"multi_assignments.enabled",
		"Allow multiple parallel assignments per target",
	)?)?;

	// Action cleanup
	registry.register(flag("action.cleanup.enabled", "Delete finished actions periodically")?)?;
	registry.register(
		ConfigKeyDefinition::builder("action.cleanup.expiry", ValueType::Duration)
			.description("Age after which finished actions are deleted")
			.default(ConfigValue::Duration(Duration::from_secs(30 * DAY)))
			.validator(|v| match v {
				ConfigValue::Duration(d) if d.as_secs() >= HOUR => Ok(()),
				_ => Err(Error::ValidationError("Expiry must be at least one hour".into())),
			})
			.build()?,
	)?;
	registry.register(
		ConfigKeyDefinition::builder("action.cleanup.status", ValueType::Enum)
			.description("Which finished actions are deleted")
			.variants(CLEANUP_STATUSES)
			.default(ConfigValue::Enum("canceled_or_error".into()))
			.build()?,
	)?;

	Ok(())
}


// vim: ts=4
