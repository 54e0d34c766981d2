//! Headless host for the civic shell.
//!
//! Boots the shell with a configuration file (`CIVIC_SHELL_CONFIG`, plus
//! `CIVIC_SHELL_*` overrides), completes the boot phase and prints the first
//! frame as JSON. Platform wrappers replace the capabilities below with real
//! ones.
//!
//! Optional arguments are photo files to upload for the active profile.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tracing_subscriber::EnvFilter;

use civic_shell::effects::FileReadError;
use civic_shell::prelude::*;

/// Host without a capture device.
struct NoCamera;

#[async_trait]
impl CameraEffects for NoCamera {
    async fn request(&self) -> Result<Box<dyn CaptureResource>, CameraError> {
        Err(CameraError::Unavailable {
            reason: "headless host has no camera".to_string(),
        })
    }
}

/// Reads selected files from the local filesystem on the blocking pool.
struct DiskFiles;

#[async_trait]
impl FileReadEffects for DiskFiles {
    async fn read_file(&self, handle: &FileHandle) -> Result<UploadedFile, FileReadError> {
        let path = handle.name.clone();
        let read = tokio::task::spawn_blocking(move || std::fs::read(path))
            .await
            .map_err(|err| FileReadError::Io {
                reason: err.to_string(),
            })?;
        let bytes = read.map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => FileReadError::NotFound {
                name: handle.name.clone(),
            },
            _ => FileReadError::Io {
                reason: err.to_string(),
            },
        })?;
        Ok(UploadedFile::new(handle.name.clone(), None, bytes))
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config() -> anyhow::Result<ShellConfig> {
    let mut config = match std::env::var_os("CIVIC_SHELL_CONFIG") {
        Some(path) => {
            let path = PathBuf::from(path);
            ShellConfig::load_from_file(&path)
                .with_context(|| format!("loading {}", path.display()))?
        }
        None => ShellConfig::default(),
    };
    config.merge_with_env().context("applying environment overrides")?;
    config.validate().context("validating shell config")?;
    Ok(config)
}

async fn run(config: ShellConfig, uploads: Vec<String>) -> anyhow::Result<()> {
    let scheduler =
        TokioScheduler::try_current().context("shell host must run inside a tokio runtime")?;
    let effects = ShellEffects::new(Arc::new(NoCamera), Arc::new(DiskFiles), Arc::new(scheduler));
    let shell = ShellController::new(config, ViewRegistry::new(), effects)?;

    let mut updates = shell.subscribe();
    let watcher = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            tracing::debug!(
                view = %snapshot.active_view,
                profile = %snapshot.active_profile.id,
                switch = ?snapshot.switch_phase,
                camera = %snapshot.camera,
                "shell state changed"
            );
        }
    });

    shell.complete_boot();
    for name in uploads {
        if let Err(err) = shell.upload_from(Some(&FileHandle::new(name.clone()))).await {
            tracing::warn!(file = %name, code = err.code(), "upload skipped");
        }
    }

    let frame = shell.frame();
    println!("{}", serde_json::to_string_pretty(&frame)?);

    shell.shutdown();
    drop(shell);
    watcher.await.context("state watcher panicked")?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = load_config()?;
    let uploads: Vec<String> = std::env::args().skip(1).collect();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    runtime.block_on(run(config, uploads))
}
