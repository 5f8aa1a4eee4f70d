use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use log::LevelFilter;
use scribe_core::{resolve_destination, Destination, SessionStatus};
use scribe_engine::{
    AtomicFileWriter, BlobStore, EngineHandle, IdentityAdapter, JobClient, ReqwestJobClient,
    RunningOwners, SessionController,
};
use scribe_logging::{scribe_error, scribe_info, LogDestination};

use super::auth;
use super::cli::{Commands, GenerateArgs, ScribeCli, SignInArgs};
use super::config::{load_config, AppConfig, IdentityConfig, DEFAULT_CONFIG_FILE};
use super::render;

const LOG_FILE: &str = "./scribe.log";
/// Pace of the control loop that drains engine events and redraws.
const TICK_INTERVAL: Duration = Duration::from_millis(75);

pub async fn run() -> anyhow::Result<()> {
    let cli = ScribeCli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let destination = if cli.log_file {
        LogDestination::Both
    } else {
        LogDestination::Terminal
    };
    scribe_logging::initialize(destination, level, Path::new(LOG_FILE));

    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = load_config(&config_path);
    let adapter = auth::connect(&config, config_path.clone());

    match cli.command {
        Commands::Generate(args) => generate(&config, &adapter, args).await,
        Commands::SignIn(args) => sign_in(&adapter, &config_path, args),
        Commands::SignOut => sign_out(&adapter).await,
        Commands::Route { path } => {
            let requested = Destination::from_path(&path);
            let snapshot = adapter.current();
            let resolved = resolve_destination(snapshot.identity(), requested);
            println!("{} -> {}", path, resolved.path());
            Ok(())
        }
        Commands::Cancel => {
            let snapshot = adapter.current();
            let Some(identity) = snapshot.identity() else {
                bail!("not signed in; run `scribe sign-in --uid <id>` first");
            };
            let client =
                ReqwestJobClient::new(config.client_settings(), Arc::new(BlobStore::new()));
            client.request_cancel(&identity.id).await;
            println!("Cancel request sent for {}", identity.label());
            Ok(())
        }
    }
}

async fn generate(
    config: &AppConfig,
    adapter: &IdentityAdapter,
    args: GenerateArgs,
) -> anyhow::Result<()> {
    let snapshot = adapter.current();
    if resolve_destination(snapshot.identity(), Destination::Generate) != Destination::Generate {
        bail!("not signed in; run `scribe sign-in --uid <id>` first");
    }
    let identity = snapshot
        .identity()
        .cloned()
        .context("identity vanished while routing")?;
    scribe_info!("Generating for {}", identity.label());

    let engine = EngineHandle::new(config.client_settings()).context("start engine")?;
    let mut controller = SessionController::new(identity, engine, RunningOwners::new());
    controller.submit(&args.prompt, args.variant, args.language)?;
    render::render(&controller.view());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut listening = true;
    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    while controller.status() == SessionStatus::Running {
        tokio::select! {
            result = &mut ctrl_c, if listening => {
                listening = false;
                match result {
                    Ok(()) => {
                        controller.cancel();
                    }
                    Err(err) => scribe_error!("Failed to listen for Ctrl-C: {}", err),
                }
            }
            _ = ticker.tick() => {
                controller.pump();
            }
        }
        if controller.consume_dirty() {
            render::render(&controller.view());
        }
    }

    let view = controller.view();
    match view.status {
        SessionStatus::Succeeded => {
            let artifact = view
                .result_artifact
                .context("succeeded without an artifact")?;
            let payload = controller
                .dispatcher()
                .blobs()
                .get(&artifact.url)
                .context("generated document was released before saving")?;
            let output_dir = args
                .output_dir
                .unwrap_or_else(|| config.output_dir.clone());
            let saved = AtomicFileWriter::new(output_dir)
                .write(&artifact.file_name, &payload)
                .context("save PDF")?;
            scribe_info!("Saved {:?} ({} bytes)", saved, payload.len());
            println!("{}", saved.display());
            Ok(())
        }
        SessionStatus::Cancelled => {
            println!("Generation cancelled.");
            Ok(())
        }
        SessionStatus::Failed => bail!(view
            .last_error
            .unwrap_or_else(|| "generation failed".to_string())),
        SessionStatus::Idle | SessionStatus::Running => {
            bail!("generation ended in unexpected state {:?}", view.status)
        }
    }
}

fn sign_in(
    adapter: &IdentityAdapter,
    config_path: &Path,
    args: SignInArgs,
) -> anyhow::Result<()> {
    let identity = IdentityConfig {
        uid: args.uid,
        display_name: args.name,
        email: args.email,
        photo_url: args.photo_url,
    };
    auth::sign_in(adapter, config_path, identity)?;
    if let Some(identity) = adapter.current().identity() {
        println!("Signed in as {}", identity.label());
    }
    Ok(())
}

async fn sign_out(adapter: &IdentityAdapter) -> anyhow::Result<()> {
    let Some(previous) = adapter.current().identity().cloned() else {
        println!("Not signed in.");
        return Ok(());
    };
    let _subscription = adapter.subscribe(|identity| {
        if identity.is_none() {
            println!("Signed out.");
        }
    });
    adapter
        .sign_out()
        .await
        .with_context(|| format!("sign out {}", previous.label()))?;
    Ok(())
}
