///
/// This module implements the CLI interface for kb-docsync: command parsing, configuration
/// loading and dispatch into the core stages.
///
/// All domain logic (listing, diffing, registration, purging) lives in the
/// [`kb-docsync-core`] crate. This module only wires configuration and real clients to it.
///
/// ## Commands
/// - no subcommand / `sync`: list the repository, then register new documents.
/// - `list`: write the snapshot file only.
/// - `register`: register the new entries of the existing snapshot file.
/// - `purge`: delete every document in the dataset.
///
/// Run-level failures are logged, not returned: only an unloadable configuration or an
/// unbuildable HTTP client makes [`run`] fail.
///
/// [`kb-docsync-core`]: ../../kb-docsync-core/
use crate::load_config::load_config;
use crate::upload::CozeClient;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use kb_docsync_core::download::GithubTreeClient;
use kb_docsync_core::list::{generate_doc_list, ListOptions};
use kb_docsync_core::purge::batch_delete_documents;
use kb_docsync_core::register::create_documents;
use kb_docsync_core::synchronise::synchronise;
use std::path::PathBuf;

/// CLI for kb-docsync: mirror a repository's documentation into a knowledge base.
#[derive(Parser)]
#[clap(
    name = "kb-docsync",
    version,
    about = "Register a GitHub documentation tree as web documents in a Coze knowledge base"
)]
pub struct Cli {
    /// Path to an optional YAML config file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the repository tree, then register every new document
    Sync(ListArgs),
    /// List the repository tree and write the snapshot file
    List(ListArgs),
    /// Register the new entries of the existing snapshot file
    Register(DatasetArgs),
    /// Delete every document in the dataset
    Purge(DatasetArgs),
}

#[derive(Args, Default, Clone, Copy)]
pub struct ListArgs {
    /// Use the test dataset and name prefix
    #[clap(long)]
    pub test: bool,
    /// Keep documentation in every locale, not only zh-CN
    #[clap(long)]
    pub all_locales: bool,
}

impl ListArgs {
    pub fn options(&self) -> ListOptions {
        ListOptions {
            zh_only: !self.all_locales,
            is_test: self.test,
        }
    }
}

#[derive(Args, Default, Clone, Copy)]
pub struct DatasetArgs {
    /// Use the test dataset
    #[clap(long)]
    pub test: bool,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let config = load_config(cli.config.as_deref())?;
    let command = cli.command.unwrap_or(Commands::Sync(ListArgs::default()));

    match command {
        Commands::Sync(args) => {
            tracing::info!(command = "sync", "Starting synchronisation");
            let tree = GithubTreeClient::new(&config)?;
            let kb = CozeClient::new(&config)?;
            let report = synchronise(&config, &tree, &kb, args.options()).await;
            if report.listing_failed() {
                tracing::error!(command = "sync", "Synchronisation did not get past listing");
            } else {
                tracing::info!(command = "sync", ?report, "Synchronisation complete");
            }
        }
        Commands::List(args) => {
            tracing::info!(command = "list", "Generating document list");
            let tree = GithubTreeClient::new(&config)?;
            let kb = CozeClient::new(&config)?;
            if let Some(snapshot) = generate_doc_list(&config, &tree, &kb, args.options()).await {
                tracing::info!(
                    command = "list",
                    valid_path_count = snapshot.valid_path_list.len(),
                    new_path_count = snapshot.new_entry_count(),
                    "Document list written"
                );
            }
        }
        Commands::Register(args) => {
            tracing::info!(command = "register", "Registering new documents from snapshot");
            let kb = CozeClient::new(&config)?;
            match create_documents(&config, &kb, args.test).await {
                Ok(report) => {
                    tracing::info!(command = "register", ?report, "Registration complete")
                }
                Err(e) => {
                    tracing::error!(command = "register", error = %e, "Registration failed")
                }
            }
        }
        Commands::Purge(args) => {
            tracing::info!(command = "purge", "Deleting all documents");
            let kb = CozeClient::new(&config)?;
            match batch_delete_documents(&kb, config.dataset_id(args.test)).await {
                Ok(_) => tracing::info!(command = "purge", "Purge complete"),
                Err(e) => tracing::error!(command = "purge", error = %e, "Purge failed"),
            }
        }
    }

    Ok(())
}
