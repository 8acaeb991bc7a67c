//! Main entry point for the storefront service.
//!
//! This binary wires together the storefront engine (storage, identity,
//! catalog, checkout, order lifecycle) and serves the HTTP API that
//! customer, vendor, and admin clients talk to.

use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use storefront_config::Config;
use storefront_core::{StorefrontBuilder, StorefrontFactories};

mod apis;
mod server;

/// Command-line arguments for the storefront service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the storefront service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the engine with all backend implementations
/// 5. Runs the engine and API server until interrupted
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt().with_env_filter(env_filter).with_target(true).init();

	tracing::info!("Started storefront");

	// Load configuration
	let config = Config::from_file(&args.config)?;
	tracing::info!("Loaded configuration [{}]", config.storefront.name);

	// Build the engine with backend implementations
	let engine = StorefrontBuilder::new(config.clone())
		.build(StorefrontFactories {
			storage_factories: collect(storefront_storage::get_all_implementations()),
			auth_factories: collect(storefront_auth::get_all_implementations()),
		})
		.await?;
	let engine = Arc::new(engine);

	if let Some(api_config) = config.api.clone().filter(|api| api.enabled) {
		let api_engine = Arc::clone(&engine);

		// Run the engine loop and the API server concurrently
		tokio::select! {
			result = engine.run() => {
				tracing::info!("Engine finished");
				result?;
			}
			result = server::start_server(api_config, api_engine) => {
				tracing::info!("API server finished");
				result?;
			}
		}
	} else {
		tracing::info!("API disabled; running engine only");
		engine.run().await?;
	}

	tracing::info!("Stopped storefront");
	Ok(())
}

/// Turns a registry's (name, factory) list into the map the builder
/// consumes.
fn collect<F>(implementations: Vec<(&'static str, F)>) -> HashMap<String, F> {
	implementations
		.into_iter()
		.map(|(name, factory)| (name.to_string(), factory))
		.collect()
}
