//! Cassandra Connect
//!
//! Command line front end for the connection registry: lists configured
//! connection keys, resolves Astra secure connect bundles and checks
//! connections.

use clap::{Args, Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::{Environment, FromEnv};
use eyre::{Result, eyre};
use serde::Serialize;
use tracing::info;

use cassandra_connector::cluster::{Cluster, check_health_detailed};
use cassandra_connector::{
    BundleCacheConfig, BundleResolver, CloudParams, ConnectionParams, ConnectionRegistry,
    ConnectorEnv, DEFAULT_CONNECTION_KEY, HealthStatus, SessionMode,
};

#[derive(Parser)]
#[command(name = "cassandra-connect")]
#[command(about = "Resolve Astra secure connect bundles and check Cassandra connections")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List connection keys configured in the environment
    Keys,

    /// Print the local path of an Astra secure connect bundle, downloading it if needed
    Bundle(BundleArgs),

    /// Open a connection and run a health check
    Check {
        #[command(flatten)]
        target: Target,

        /// Check a fresh, untracked session
        #[arg(long)]
        new: bool,

        /// Replace the primary session before probing
        #[arg(long)]
        replace: bool,
    },

    /// Show cluster name, datacenter and release version
    Info {
        #[command(flatten)]
        target: Target,
    },
}

#[derive(Args)]
struct Target {
    /// Connection key
    #[arg(short, long, default_value = DEFAULT_CONNECTION_KEY)]
    key: String,

    /// JSON connection parameters, used when the key is not configured
    #[arg(short, long)]
    params: Option<String>,
}

impl Target {
    fn params(&self) -> Result<Option<ConnectionParams>> {
        self.params
            .as_deref()
            .map(ConnectionParams::from_json)
            .transpose()
            .map_err(Into::into)
    }
}

/// Astra parameters; falls back to the `ASTRA_DB_*` variables without a token
#[derive(Args)]
struct BundleArgs {
    /// Application token
    #[arg(long)]
    token: Option<String>,

    /// API endpoint (https://<db id>-<region>.apps.astra.datastax.com)
    #[arg(long)]
    endpoint: Option<String>,

    #[arg(long)]
    database_id: Option<String>,

    #[arg(long)]
    region: Option<String>,
}

impl BundleArgs {
    fn into_params(self) -> Result<CloudParams> {
        let Some(token) = self.token else {
            return match ConnectorEnv::from_env()?.astra {
                Some(ConnectionParams::Cloud(params)) => Ok(params),
                _ => Err(eyre!(
                    "no Astra token given and ASTRA_DB_APPLICATION_TOKEN is not set"
                )),
            };
        };

        let mut params = CloudParams::new(token);
        params.endpoint = self.endpoint;
        params.datacenter_id = self.database_id;
        params.region_name = self.region;
        Ok(params)
    }
}

#[derive(Serialize)]
struct CheckReport<'a> {
    key: &'a str,
    session: &'static str,
    #[serde(flatten)]
    health: HealthStatus,
}

fn mode_name(mode: SessionMode) -> &'static str {
    match mode {
        SessionMode::Primary => "primary",
        SessionMode::New => "new",
        SessionMode::Replace => "replaced",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let environment = Environment::from_env();
    init_tracing(&environment);

    let cli = Cli::parse();

    match cli.command {
        Commands::Keys => {
            let registry = ConnectionRegistry::from_env()?;
            for key in registry.keys() {
                println!("{}", key);
            }
        }

        Commands::Bundle(args) => {
            let resolver = BundleResolver::astra(BundleCacheConfig::from_env()?);
            let path = resolver.resolve(&args.into_params()?).await?;
            println!("{}", path.display());
        }

        Commands::Check {
            target,
            new,
            replace,
        } => {
            let mut registry = ConnectionRegistry::from_env()?;
            let handle = registry.get_connector(&target.key, target.params()?).await?;

            let mode = SessionMode::from_flags(new, replace);
            let session = handle.session_with(mode).await?;
            info!(key = %target.key, session = mode_name(mode), "Checking connection");

            let report = CheckReport {
                key: &target.key,
                session: mode_name(mode),
                health: check_health_detailed(session.as_ref()).await,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);

            // An untracked session is owned here, not by the handle
            if mode == SessionMode::New {
                handle.cluster().shutdown(session).await;
            }
            registry.shutdown().await;

            if !report.health.healthy {
                return Err(eyre!("connection '{}' is unhealthy", target.key));
            }
        }

        Commands::Info { target } => {
            let mut registry = ConnectionRegistry::from_env()?;
            let handle = registry.get_connector(&target.key, target.params()?).await?;

            let cluster_info = handle.cluster_info().await?;
            println!("{}", serde_json::to_string_pretty(&cluster_info)?);

            registry.shutdown().await;
        }
    }

    Ok(())
}
