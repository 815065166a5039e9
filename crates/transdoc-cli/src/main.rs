//! transdoc: command-line client for the document translation workflow.
//!
//! Configuration is read from the environment (and `.env`). See
//! `transdoc_core::Config` for the variables.

use anyhow::Context;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use transdoc_cli::{init_tracing, render_snapshot};
use transdoc_core::{
    content_kind_for, normalize_shared_key, share_link, supported_languages, upload_key_for,
    Config, SessionPhase, SessionSnapshot,
};
use transdoc_orchestrator::{OrchestratorSettings, TranslationSession};
use transdoc_storage::{create_storage, BlobStore};
use transdoc_translate::{AwsTranslateService, JobService};

#[derive(Parser)]
#[command(name = "transdoc", about = "Translate documents with Amazon Translate")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a document and translate it, following the job until it ends
    Translate {
        /// Path to the document
        file: PathBuf,
        /// Target language code, e.g. de or fr-CA
        #[arg(long)]
        to: String,
    },
    /// Show the status of a translation job
    Status {
        /// Job id returned on submission
        job_id: String,
    },
    /// List the languages offered for translation
    Languages,
    /// Print a share link for a translated document
    Link {
        /// Output key or file name under the output prefix
        key: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Languages = cli.command {
        for language in supported_languages() {
            println!("{:<4} {}", language.code, language.name);
        }
        return Ok(());
    }

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.log_format());

    match cli.command {
        Commands::Translate { file, to } => translate(&config, file, &to).await,
        Commands::Status { job_id } => status(&config, &job_id).await,
        Commands::Link { key } => {
            let frontend_url = config
                .frontend_url()
                .context("FRONTEND_URL must be set to build share links")?;
            let key = normalize_shared_key(config.output_prefix(), &key);
            println!("{}", share_link(frontend_url, &key));
            Ok(())
        }
        Commands::Languages => Ok(()),
    }
}

async fn job_service(config: &Config) -> anyhow::Result<Arc<dyn JobService>> {
    let region = config
        .effective_region()
        .context("S3_REGION or AWS_REGION must be set for Amazon Translate")?;
    let service = AwsTranslateService::new(region, config.request_timeout()).await;
    Ok(Arc::new(service))
}

async fn translate(config: &Config, file: PathBuf, target_language: &str) -> anyhow::Result<()> {
    let settings = OrchestratorSettings::from_config(config)?;
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage")?;
    let jobs = job_service(config).await?;

    let file_name = file
        .file_name()
        .and_then(|name| name.to_str())
        .context("Input path has no usable file name")?;
    let data = tokio::fs::read(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let input_key = upload_key_for(
        config.upload_prefix(),
        chrono::Utc::now().timestamp_millis(),
        file_name,
    );
    storage
        .put(
            &input_key,
            Bytes::from(data),
            content_kind_for(&input_key).content_type(),
        )
        .await
        .with_context(|| format!("Failed to upload {}", input_key))?;
    tracing::info!(key = %input_key, "Input uploaded");

    let session = TranslationSession::new(storage.clone(), jobs, settings);
    session.start(&input_key, target_language)?;

    let updates = session.observe();
    futures::pin_mut!(updates);
    let mut last: Option<SessionSnapshot> = None;

    loop {
        tokio::select! {
            update = updates.next() => match update {
                Some(snapshot) => {
                    println!("{}", render_snapshot(&snapshot));
                    last = Some(snapshot);
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Cancelling...");
                session.cancel();
            }
        }
    }

    let snapshot = last.context("Session ended without reporting a state")?;
    match snapshot.phase {
        SessionPhase::Done => {
            let result = snapshot
                .result
                .context("Session finished without a result")?;
            let url = storage
                .presigned_get_url(&result.output_key, config.presigned_url_expiry())
                .await
                .context("Failed to create download link")?;
            println!("Download: {}", url);
            if let Some(frontend_url) = config.frontend_url() {
                println!("Share: {}", share_link(frontend_url, &result.output_key));
            }
            Ok(())
        }
        SessionPhase::Failed => match snapshot.error {
            Some(error) => anyhow::bail!("{}", error),
            None => anyhow::bail!("Translation failed"),
        },
        _ => {
            println!("Cancelled");
            Ok(())
        }
    }
}

async fn status(config: &Config, job_id: &str) -> anyhow::Result<()> {
    let jobs = job_service(config).await?;
    let description = jobs
        .describe_job(job_id)
        .await
        .with_context(|| format!("Failed to describe job {}", job_id))?;

    println!("{}: {} ({})", job_id, description.mapped_status(), description.status);
    if let Some(message) = &description.failure_message {
        println!("  {}", message);
    }
    if let Some(location) = &description.output_location {
        println!("  output: {}", location);
    }
    Ok(())
}
