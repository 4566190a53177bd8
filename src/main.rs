//! lb-admin: load balancer reference administration.
//!
//! Loads a domain file into the configuration store, runs one command
//! against it and prints the resulting report as JSON.
//!
//! ```text
//! lb-admin --domain domain.toml create-http-lb-ref cluster1 \
//!     --config lb-config-1 --lbpolicy round-robin --lbenableallinstances
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use lb_admin::admin::{CommandService, CreateLbRef, CreateLbRefRequest};
use lb_admin::config::load_config;
use lb_admin::observability::logging;
use lb_admin::store::ConfigStore;

#[derive(Parser)]
#[command(name = "lb-admin")]
#[command(about = "Manage load balancer references to clusters and instances", long_about = None)]
struct Cli {
    /// Domain file (TOML) describing clusters, servers and LB configs
    #[arg(short, long, default_value = "domain.toml")]
    domain: PathBuf,

    /// Print the LB configs after the command ran
    #[arg(long)]
    dump: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a cluster or standalone instance to a load balancer config
    #[command(name = "create-http-lb-ref")]
    CreateHttpLbRef(CreateHttpLbRefArgs),
}

#[derive(Args)]
struct CreateHttpLbRefArgs {
    /// Cluster or standalone instance
    target: String,

    /// LB config to add the reference to
    #[arg(long)]
    config: Option<String>,

    /// Load balancer whose LB config receives the reference
    #[arg(long)]
    lbname: Option<String>,

    #[arg(long)]
    lbpolicy: Option<String>,

    #[arg(long)]
    lbpolicymodule: Option<String>,

    #[arg(long)]
    healthcheckerurl: Option<String>,

    /// Seconds between health checks
    #[arg(long)]
    healthcheckerinterval: Option<String>,

    /// Seconds before a health check times out
    #[arg(long)]
    healthcheckertimeout: Option<String>,

    #[arg(long)]
    lbenableallinstances: bool,

    #[arg(long)]
    lbenableallapplications: bool,
}

impl From<CreateHttpLbRefArgs> for CreateLbRefRequest {
    fn from(args: CreateHttpLbRefArgs) -> Self {
        Self {
            target: args.target,
            config: args.config,
            lb_name: args.lbname,
            policy: args.lbpolicy,
            policy_module: args.lbpolicymodule,
            health_checker_url: args.healthcheckerurl,
            health_checker_interval: args.healthcheckerinterval,
            health_checker_timeout: args.healthcheckertimeout,
            enable_all_instances: args.lbenableallinstances,
            enable_all_applications: args.lbenableallapplications,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.domain)?;
    logging::init(&config.admin.log_level);

    tracing::debug!(
        domain = %cli.domain.display(),
        clusters = config.clusters.len(),
        servers = config.servers.len(),
        lb_configs = config.lb_configs.len(),
        "Domain loaded"
    );

    let store = Arc::new(ConfigStore::from_config(&config));
    let runner = CommandService::with_defaults(store.clone()).spawn();

    let report = match cli.command {
        Commands::CreateHttpLbRef(args) => {
            CreateLbRef::new(store.clone(), runner)
                .with_health_checker_defaults(config.admin.health_checker.clone())
                .execute(&args.into())
                .await
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    if cli.dump {
        println!("{}", serde_json::to_string_pretty(&store.lb_configs())?);
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
