mod config;
mod console;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    AssumeYes, AuthProvider, ChannelNotifier, Confirmer, CurrencyFormatter, DeleteOutcome,
    FetchOutcome, FileTokenProvider, FormSchema, HttpResourceApi, ResourceApi, ResourceView,
    StaticTokenProvider, SubmitOutcome, ViewDependencies, ViewOptions,
};
use shared::domain::RecordId;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    config::{load_settings, Settings},
    console::{drain_notifications, StdinConfirmer, TextTableWidgets},
};

#[derive(Parser, Debug)]
#[command(name = "inventory-admin", about = "Inventory administration console")]
struct Cli {
    /// Config file (defaults to ./inventory-admin.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Bearer token; overrides the configured token and token file.
    #[arg(long, global = true)]
    token: Option<String>,
    #[arg(long, global = true)]
    page_size: Option<u32>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show one page of a collection.
    List {
        collection: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show a single record.
    Show { collection: String, id: i64 },
    Create {
        collection: String,
        #[command(flatten)]
        fields: FieldArgs,
    },
    Edit {
        collection: String,
        id: i64,
        #[command(flatten)]
        fields: FieldArgs,
    },
    Delete {
        collection: String,
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// List configured collections and their form fields.
    Collections,
}

#[derive(Args, Debug)]
struct FieldArgs {
    /// Field assignment, `name=value`. Repeatable.
    #[arg(long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings =
        load_settings(cli.config.as_deref(), |k| std::env::var(k).ok()).context("load settings")?;
    if let Some(url) = &cli.api_url {
        settings.api_base_url = url.clone();
    }
    if let Some(size) = cli.page_size {
        settings.page_size = size.max(1);
    }
    if let Some(token) = &cli.token {
        settings.token = Some(token.clone());
    }

    run(cli.command, &settings).await
}

async fn run(command: Command, settings: &Settings) -> Result<()> {
    let notifier = Arc::new(ChannelNotifier::default());
    let mut notifications = notifier.subscribe();
    let api: Arc<dyn ResourceApi> = Arc::new(HttpResourceApi::new(
        &settings.api_base_url,
        auth_provider(settings),
        Duration::from_secs(settings.request_timeout_secs),
    )?);
    info!(api = %settings.api_base_url, "using inventory API");

    let build_view = |collection: &str, confirmer: Arc<dyn Confirmer>| {
        let schema = schema_or_empty(settings, collection);
        ResourceView::new(
            collection,
            schema.clone(),
            ViewOptions {
                page_size: settings.page_size,
                page_window: settings.page_window,
                formatter: CurrencyFormatter::new(settings.currency_separator),
            },
            ViewDependencies {
                api: api.clone(),
                notifier: notifier.clone(),
                confirmer,
                widgets: Arc::new(TextTableWidgets::for_schema(&schema)),
            },
        )
    };

    let result: Result<()> = match command {
        Command::Collections => {
            for collection in &settings.collections {
                println!("{}", collection.name);
                for field in &collection.fields {
                    let required = if field.required { " (required)" } else { "" };
                    println!("  {:<24} {:?}{required}", field.label(), field.kind);
                }
            }
            Ok(())
        }
        Command::List { collection, page } => {
            let view = build_view(&collection, Arc::new(AssumeYes));
            let outcome = view.mount_at(page).await;
            let nav = view.list().navigation().await;
            let total = view.list().page().await.total_pages;
            view.unmount().await;
            match outcome {
                Some(FetchOutcome::Applied) => {
                    println!("Page {} of {total}  {:?}", nav.current, nav.pages);
                    Ok(())
                }
                None => Err(anyhow!("page {page} is outside 1..={total}")),
                Some(other) => Err(anyhow!("could not load {collection}: {other:?}")),
            }
        }
        Command::Show { collection, id } => match api.get(&collection, RecordId(id)).await {
            Ok(record) => {
                println!("{}", serde_json::to_string_pretty(&record)?);
                Ok(())
            }
            Err(err) => Err(err.into()),
        },
        Command::Create { collection, fields } => {
            let view = build_view(&collection, Arc::new(AssumeYes));
            view.open_create().await;
            apply_fields(&view, &fields).await?;
            submit(&view).await
        }
        Command::Edit {
            collection,
            id,
            fields,
        } => {
            let view = build_view(&collection, Arc::new(AssumeYes));
            if !view.open_edit(RecordId(id)).await {
                drain_notifications(&mut notifications);
                bail!("could not open {collection}/{id} for editing");
            }
            apply_fields(&view, &fields).await?;
            submit(&view).await
        }
        Command::Delete {
            collection,
            id,
            yes,
        } => {
            let confirmer: Arc<dyn Confirmer> = if yes {
                Arc::new(AssumeYes)
            } else {
                Arc::new(StdinConfirmer)
            };
            let view = build_view(&collection, confirmer);
            let outcome = view.delete(RecordId(id)).await;
            view.unmount().await;
            match outcome {
                DeleteOutcome::Deleted => Ok(()),
                DeleteOutcome::Declined => {
                    eprintln!("Cancelled.");
                    Ok(())
                }
                DeleteOutcome::Failed(kind) => Err(anyhow!("delete failed ({kind})")),
            }
        }
    };

    drain_notifications(&mut notifications);
    result
}

fn auth_provider(settings: &Settings) -> Arc<dyn AuthProvider> {
    match (&settings.token, &settings.token_file) {
        (Some(token), _) => Arc::new(StaticTokenProvider::new(Some(token.clone()))),
        (None, Some(path)) => Arc::new(FileTokenProvider::new(path)),
        (None, None) => Arc::new(StaticTokenProvider::missing()),
    }
}

fn schema_or_empty(settings: &Settings, collection: &str) -> FormSchema {
    settings.schema_for(collection).unwrap_or_else(|| {
        warn!(collection, "collection not configured; fields are sent as text");
        FormSchema::default()
    })
}

async fn apply_fields(view: &ResourceView, fields: &FieldArgs) -> Result<()> {
    for assignment in &fields.set {
        let (name, value) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow!("expected NAME=VALUE, got {assignment:?}"))?;
        view.set_field(name.trim(), value).await;
    }
    Ok(())
}

async fn submit(view: &ResourceView) -> Result<()> {
    let outcome = view.submit().await;
    view.unmount().await;
    match outcome {
        SubmitOutcome::Created | SubmitOutcome::Updated => Ok(()),
        SubmitOutcome::Ignored => Err(anyhow!("nothing to submit")),
        SubmitOutcome::Failed(kind) => Err(anyhow!("save failed ({kind})")),
    }
}
