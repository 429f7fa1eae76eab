use crate::snapshot::{Snapshot, Workload};
use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use mesh_catalog_core::{inbound::InboundMeshTrafficPolicy, ServiceAccount, DEFAULT_DNS_DOMAIN};
use mesh_catalog_k8s_index::{ClusterInfo, MeshCatalog, RouteReferences};
use std::{collections::BTreeMap, io::Write, path::PathBuf, str::FromStr, sync::Arc};
use tokio::task::JoinSet;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[clap(
    name = "mesh-catalog",
    about = "Computes inbound proxy policy from a snapshot of mesh resources"
)]
pub struct Args {
    #[clap(long, default_value = "mesh_catalog=info,warn", env = "MESH_CATALOG_LOG")]
    log_level: String,

    #[clap(long, default_value = "plain")]
    log_format: LogFormat,

    #[clap(long, default_value = DEFAULT_DNS_DOMAIN)]
    cluster_domain: String,

    /// Either `lenient`, to ignore references to missing routes, or `strict`,
    /// to fail.
    #[clap(long, default_value = "lenient")]
    route_references: RouteReferences,

    /// Limits output to the given workload identities, e.g. `ns1/sa1`.
    #[clap(long = "identity")]
    identities: Vec<ServiceAccount>,

    /// A YAML or JSON file describing the mesh.
    snapshot: PathBuf,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            cluster_domain,
            route_references,
            identities,
            snapshot,
        } = self;

        let filter = EnvFilter::try_new(&log_level)
            .with_context(|| format!("invalid log level {log_level:?}"))?;
        log_format.try_init(filter)?;

        let snapshot = Snapshot::load(&snapshot)?;
        let workloads = snapshot
            .workloads
            .iter()
            .filter(|w| identities.is_empty() || identities.contains(&w.identity))
            .cloned()
            .collect::<Vec<_>>();
        info!(workloads = workloads.len(), "Loaded snapshot");

        let catalog = Arc::new(MeshCatalog::new(
            snapshot,
            ClusterInfo {
                dns_domain: cluster_domain,
                route_references,
            },
        ));

        // Each workload's policy is computed independently, so a failure for
        // one does not prevent output for the others.
        let mut tasks = JoinSet::new();
        for Workload { identity, services } in workloads {
            let catalog = catalog.clone();
            tasks.spawn_blocking(move || {
                let policy = catalog.inbound_mesh_traffic_policy(&identity, &services);
                (identity, policy)
            });
        }

        let mut policies = BTreeMap::<String, InboundMeshTrafficPolicy>::new();
        let mut failed = 0usize;
        while let Some(res) = tasks.join_next().await {
            let (identity, policy) = res?;
            match policy {
                Ok(policy) => {
                    policies.insert(identity.to_string(), policy);
                }
                Err(error) => {
                    error!(%identity, %error, "Failed to compute inbound policy");
                    failed += 1;
                }
            }
        }

        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &policies)?;
        writeln!(stdout)?;

        if failed > 0 {
            bail!("failed to compute inbound policy for {failed} workload(s)");
        }
        Ok(())
    }
}

// === impl LogFormat ===

impl LogFormat {
    /// Installs a global subscriber that writes to stderr.
    pub fn try_init(self, filter: EnvFilter) -> Result<()> {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);
        match self {
            Self::Plain => builder.try_init(),
            Self::Json => builder.json().try_init(),
        }
        .map_err(|e| anyhow!(e))
    }
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "plain" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            s => bail!("invalid log format {s:?}: expected 'plain' or 'json'"),
        }
    }
}
