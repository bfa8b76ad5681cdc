use std::{process, sync::Arc};

use tokio::io::AsyncWriteExt;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;
use vault_copy::{
    application::{
        assets::{AssetInliner, RasterConverter},
        copy::CopyHandler,
        error::AppError,
        pipeline::DocumentRenderer,
        preview::PreviewLoop,
        render::{SettleDetector, VaultRenderer},
        vault::VaultReader,
    },
    config,
    domain::file::VaultFile,
    infra::{
        error::InfraError,
        notifier::{FilePreviewSink, StderrNotifier},
        telemetry,
        vault::FsVault,
        watcher::VaultWatcher,
    },
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command {
        config::Command::Copy(args) => run_copy(settings, *args).await,
        config::Command::Watch(args) => run_watch(settings, args).await,
    }
}

async fn run_copy(settings: config::Settings, args: config::CopyArgs) -> Result<(), AppError> {
    let vault = Arc::new(open_vault(&settings)?);

    let candidate = vault.root().join(&args.file);
    let source = if candidate.exists() {
        candidate
    } else {
        args.file.clone()
    };
    let file = VaultFile::from_path(vault.relative_path(&source)?);
    let markdown = vault.read_text(&file.path).await?;

    let handler = build_handler(Arc::clone(&vault), &settings)?;
    let html = handler
        .copy(&markdown, &file, !args.selection)
        .await
        .ok_or_else(|| AppError::CopyFailed {
            path: file.path.clone(),
        })?;

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, html.as_bytes())
                .await
                .map_err(InfraError::from)?;
            info!(
                target = "vault_copy::main",
                op = "copy",
                output = %path.display(),
                "document written"
            );
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(html.as_bytes())
                .await
                .map_err(InfraError::from)?;
            stdout.flush().await.map_err(InfraError::from)?;
        }
    }
    Ok(())
}

async fn run_watch(settings: config::Settings, args: config::WatchArgs) -> Result<(), AppError> {
    let vault = Arc::new(open_vault(&settings)?);
    let handler = Arc::new(build_handler(Arc::clone(&vault), &settings)?);
    let sink = Arc::new(FilePreviewSink::new(args.output.clone()));

    let (watcher, events) = VaultWatcher::spawn(vault.root())?;
    let preview = PreviewLoop::new(vault, handler, sink);

    info!(
        target = "vault_copy::main",
        op = "watch",
        vault = %watcher.root().display(),
        output = %args.output.display(),
        "watching vault for changes"
    );

    tokio::select! {
        _ = preview.run(events) => {}
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(InfraError::from)?;
            info!(target = "vault_copy::main", op = "watch", "shutdown requested");
        }
    }

    drop(watcher);
    Ok(())
}

fn open_vault(settings: &config::Settings) -> Result<FsVault, AppError> {
    FsVault::new(&settings.vault.root).map_err(|err| {
        AppError::from(InfraError::configuration(format!(
            "cannot open vault `{}`: {err}",
            settings.vault.root.display()
        )))
    })
}

fn build_handler(
    vault: Arc<FsVault>,
    settings: &config::Settings,
) -> Result<CopyHandler, AppError> {
    let renderer = Arc::new(VaultRenderer::new(vault.root()));
    let settle = SettleDetector::new(settings.render.settle_delay, settings.render.settle_max_wait);
    let assets = AssetInliner::new(vault, RasterConverter::new()?);
    let pipeline = DocumentRenderer::new(renderer, settle, assets);

    Ok(CopyHandler::new(
        pipeline,
        Arc::new(StderrNotifier),
        settings.export.clone(),
    ))
}
