//! Managed fusion agent - provisions managed storage offerings in-cluster

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use kube::CustomResourceExt;

use fusion_common::crd::ManagedFusionOffering;
use fusion_common::kube_utils::create_client;
use fusion_common::telemetry::{init_telemetry, LogFormat, TelemetryConfig};
use fusion_common::DEFAULT_AGENT_NAMESPACE;
use fusion_operator::controller_runner::build_offering_controller;
use fusion_operator::startup::{bootstrap_crds, ensure_offering_crd, DEFAULT_CRD_DIR};

/// Managed fusion agent - reconciles ManagedFusionOffering resources
#[derive(Parser, Debug)]
#[command(name = "fusion-agent", version, about, long_about = None)]
struct Cli {
    /// Namespace the agent watches and provisions into
    #[arg(long, global = true, env = "FUSION_NAMESPACE")]
    namespace: Option<String>,

    /// Path to a kubeconfig; in-cluster config is inferred when unset
    #[arg(long, global = true, env = "KUBECONFIG")]
    kubeconfig: Option<PathBuf>,

    /// Log line format: json or text
    #[arg(long, global = true, env = "FUSION_LOG_FORMAT", default_value_t = LogFormat::Json)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the offering controller (default mode)
    ///
    /// Installs the ManagedFusionOffering CRD, then watches offerings in the
    /// agent namespace and reconciles their Secret and StorageCluster.
    Controller,

    /// Print the ManagedFusionOffering CRD as YAML and exit
    Crd,

    /// Register the storage operator CRDs from YAML templates and exit
    Bootstrap(BootstrapArgs),
}

/// Bootstrap mode arguments
#[derive(Args, Debug)]
struct BootstrapArgs {
    /// Directory holding the CRD templates
    #[arg(long, env = "FUSION_CRD_DIR", default_value = DEFAULT_CRD_DIR)]
    crd_dir: PathBuf,
}

impl Cli {
    /// Agent namespace: flag, then `FUSION_NAMESPACE`, then `POD_NAMESPACE`
    fn agent_namespace(&self) -> String {
        self.namespace
            .clone()
            .or_else(|| std::env::var("POD_NAMESPACE").ok())
            .filter(|ns| !ns.is_empty())
            .unwrap_or_else(|| DEFAULT_AGENT_NAMESPACE.to_string())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Crd) = cli.command {
        let crd = serde_yaml::to_string(&ManagedFusionOffering::crd())
            .map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))?;
        println!("{crd}");
        return Ok(());
    }

    init_telemetry(TelemetryConfig {
        service_name: "fusion-agent".to_string(),
        format: cli.log_format,
    })?;

    let client = create_client(cli.kubeconfig.as_deref())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?;

    match cli.command {
        Some(Commands::Bootstrap(ref args)) => {
            bootstrap_crds(client, &args.crd_dir).await?;
            Ok(())
        }
        Some(Commands::Controller) | Some(Commands::Crd) | None => {
            run_controller(client, &cli.agent_namespace()).await
        }
    }
}

/// Run the offering controller until a shutdown signal arrives
async fn run_controller(client: kube::Client, namespace: &str) -> anyhow::Result<()> {
    ensure_offering_crd(&client).await?;

    tracing::info!(namespace = %namespace, "Starting fusion agent controllers");
    build_offering_controller(client, namespace).await;

    tracing::info!("Fusion agent shutting down");
    Ok(())
}
