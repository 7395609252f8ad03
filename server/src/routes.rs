use axum::{
	Router, middleware,
	routing::get,
};
use tower_http::trace::TraceLayer;

use fleetbase_core::middleware::request_id;

use crate::prelude::*;
use crate::{catalog, composition, settings};

fn init_api(app: App) -> Router {
	Router::new()
		// Configuration
		.route("/system/configs", get(settings::handler::list_configs))
		.route(
			"/system/configs/{key}",
			get(settings::handler::get_config)
				.put(settings::handler::put_config)
				.delete(settings::handler::delete_config),
		)
		// Software module types
		.route(
			"/softwaremoduletypes",
			get(catalog::handler::list_module_types).post(catalog::handler::post_module_types),
		)
		.route(
			"/softwaremoduletypes/{id}",
			get(catalog::handler::get_module_type)
				.put(catalog::handler::put_module_type)
				.delete(catalog::handler::delete_module_type),
		)
		// Distribution set types
		.route(
			"/distributionsettypes",
			get(catalog::handler::list_dist_types).post(catalog::handler::post_dist_types),
		)
		.route(
			"/distributionsettypes/{id}",
			get(catalog::handler::get_dist_type)
				.put(catalog::handler::put_dist_type)
				.delete(catalog::handler::delete_dist_type),
		)
		// Composition
		.route(
			"/distributionsettypes/{id}/mandatorymoduletypes",
			get(composition::handler::list_mandatory).post(composition::handler::post_mandatory),
		)
		.route(
			"/distributionsettypes/{id}/mandatorymoduletypes/{smt_id}",
			get(composition::handler::get_mandatory).delete(composition::handler::delete_mandatory),
		)
		.route(
			"/distributionsettypes/{id}/optionalmoduletypes",
			get(composition::handler::list_optional).post(composition::handler::post_optional),
		)
		.route(
			"/distributionsettypes/{id}/optionalmoduletypes/{smt_id}",
			get(composition::handler::get_optional).delete(composition::handler::delete_optional),
		)
		.with_state(app)
}

pub fn init(app: App) -> Router {
	Router::new()
		.nest("/api/v1", init_api(app))
		.route("/health", get(async || "ok\n"))
		.layer(middleware::from_fn(request_id))
		.layer(TraceLayer::new_for_http())
}

// vim: ts=4
