// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use clap::Parser;
use kube::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use opsetup::acs::secured_cluster::{install_secured_clusters, select_targets};
use opsetup::acs::{self, add_layered_product_namespaces, client_from_state, install_central};
use opsetup::cli::{AcsCommand, Cli, Commands};
use opsetup::config::Settings;
use opsetup::kubernetes::{connect, wait_for_resource};
use opsetup::state::StateStore;
use opsetup::{apps, certs, compliance, keycloak, rhoai, rhtas, setup};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    // Initialize tracing, RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .init();

    let store = StateStore::new(
        cli.state
            .clone()
            .or_else(|| settings.state_file.clone())
            .unwrap_or_else(StateStore::default_path),
    );
    info!("Using state file {}", store.path().display());

    run(cli, &settings, &store).await
}

async fn client(cli: &Cli) -> Result<Client> {
    connect(cli.context.as_deref())
        .await
        .context("Failed to connect to the cluster")
}

async fn run(cli: Cli, settings: &Settings, store: &StateStore) -> Result<()> {
    match &cli.command {
        Commands::Setup(args) => {
            let client = client(&cli).await?;
            let summary = setup::run_setup(&client, settings, store, args.skip_flags()).await?;
            if let Some(report) = summary.apps.filter(|r| !r.is_success()) {
                warn!("{} demo application(s) failed", report.failed.len());
            }
        }
        Commands::Acs(command) => run_acs(&cli, command, settings, store).await?,
        Commands::Keycloak => {
            keycloak::install_keycloak(&client(&cli).await?, settings, store).await?;
        }
        Commands::Rhtas => {
            rhtas::install_rhtas(&client(&cli).await?, settings, store).await?;
        }
        Commands::Rhoai => rhoai::install_rhoai(&client(&cli).await?, settings).await?,
        Commands::Certs => certs::install_certs(&client(&cli).await?, settings).await?,
        Commands::Compliance => {
            compliance::install_compliance(&client(&cli).await?, settings, store).await?;
        }
        Commands::Apps(args) => {
            let report = apps::install_apps(
                &client(&cli).await?,
                settings,
                args.dir.as_deref(),
                args.namespace.as_deref(),
            )
            .await?;
            for failed in &report.failed {
                warn!("Not ready: {}", failed);
            }
        }
        Commands::Wait(args) => {
            let client = client(&cli).await?;
            let report = wait_for_resource(
                &client,
                &args.target(),
                &args.probe(),
                &args.expected,
                &args.options(settings.waits.standard()),
            )
            .await?;
            info!("{} after {} poll(s)", report.value, report.polls);
        }
        Commands::Env => {
            let state = store.load()?.with_env_overrides();
            for line in state.export_lines() {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

async fn run_acs(
    cli: &Cli,
    command: &AcsCommand,
    settings: &Settings,
    store: &StateStore,
) -> Result<()> {
    match command {
        AcsCommand::Central => {
            install_central(&client(cli).await?, settings, store).await?;
        }
        AcsCommand::SecuredCluster { clusters } => {
            let client = client(cli).await?;
            let state = store.load()?.with_env_overrides();
            let acs = client_from_state(&state, &settings.http)?;
            let targets = select_targets(&settings.acs.clusters, clusters)?;
            let address = state.require_central_address()?;
            let secured =
                install_secured_clusters(&client, settings, &acs, &targets, address).await?;
            info!("Secured {} of {} cluster(s)", secured.len(), targets.len());
        }
        AcsCommand::Token { name } => {
            acs::token::generate_and_store(settings, store, name.as_deref()).await?;
            println!("API token stored in {}", store.path().display());
        }
        AcsCommand::AddNamespaces { namespaces } => {
            let acs = client_from_state(&store.load()?.with_env_overrides(), &settings.http)?;
            let namespaces = if namespaces.is_empty() {
                &settings.acs.layered_namespaces
            } else {
                namespaces
            };
            let rule = &settings.acs.layered_rule_name;
            let update = add_layered_product_namespaces(&acs, rule, namespaces).await?;
            println!("Namespaces added = {}", update.added);
        }
        AcsCommand::ComplianceSchedule => {
            let acs = client_from_state(&store.load()?.with_env_overrides(), &settings.http)?;
            acs::compliance::ensure_scan_schedule(&acs, &settings.compliance).await?;
        }
    }
    Ok(())
}
