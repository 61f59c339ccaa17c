use anyhow::Context;
use sqlx::{
    Connection,
    sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqliteSynchronous},
};
use tokio::fs as async_fs;
use tracing::debug;
use uuid::Uuid;

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

const DEFAULT_ARTIFACT_EXTENSION: &str = "bin";

pub(super) struct StoreState {
    db_file: PathBuf,
    models_dir: PathBuf,
    connect_opts: SqliteConnectOptions,
}

impl std::fmt::Debug for StoreState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreState")
            .field("db_file", &self.db_file)
            .field("models_dir", &self.models_dir)
            .finish()
    }
}

/// Keep only characters that are safe in a file name on every platform.
fn sanitize_component(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() { "unnamed".to_string() } else { cleaned }
}

impl StoreState {
    pub(super) async fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        db_file: P,
        models_dir: Q,
    ) -> anyhow::Result<Self> {
        let db_file = db_file.as_ref().to_path_buf();
        let models_dir = models_dir.as_ref().to_path_buf();

        if let Some(parent) = db_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            async_fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create database directory {:?}", parent))?;
        }
        async_fs::create_dir_all(&models_dir)
            .await
            .with_context(|| format!("Failed to create models directory {:?}", models_dir))?;

        let connect_opts = SqliteConnectOptions::new()
            .filename(&db_file)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let mut conn = SqliteConnection::connect_with(&connect_opts)
            .await
            .with_context(|| format!("Failed to open database {:?}", db_file))?;
        sqlx::migrate!("./migrations").run(&mut conn).await?;
        conn.close().await?;

        Ok(Self {
            db_file,
            models_dir,
            connect_opts,
        })
    }

    /// Open a fresh connection. Callers close it when their operation is done;
    /// nothing is pooled.
    pub(super) async fn conn(&self) -> anyhow::Result<SqliteConnection> {
        SqliteConnection::connect_with(&self.connect_opts)
            .await
            .with_context(|| format!("Failed to open database {:?}", self.db_file))
    }

    /// Write a model artifact and return its path.
    ///
    /// The name carries a random suffix so projects with the same name and
    /// creator never overwrite each other's artifact.
    pub(super) async fn store_model_artifact(
        &self,
        name: &str,
        creator: &str,
        extension: &str,
        bytes: &[u8],
    ) -> anyhow::Result<PathBuf> {
        let extension = extension.trim_start_matches('.');
        let extension = if extension.is_empty() {
            DEFAULT_ARTIFACT_EXTENSION.to_string()
        } else {
            sanitize_component(extension)
        };
        let fname = format!(
            "{}_{}_{}.{}",
            sanitize_component(name),
            sanitize_component(creator),
            Uuid::new_v4().simple(),
            extension
        );
        let dest_path = self.models_dir.join(fname);
        async_fs::write(&dest_path, bytes)
            .await
            .with_context(|| format!("Failed to write model artifact {:?}", dest_path))?;
        debug!("Stored model artifact {:?} ({} bytes)", dest_path, bytes.len());
        Ok(dest_path)
    }

    /// Remove a model artifact. A file that is already gone is not an error;
    /// returns whether a file was removed.
    pub(super) async fn delete_model_artifact(&self, path: &Path) -> anyhow::Result<bool> {
        match async_fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Model artifact {:?} already missing", path);
                Ok(false)
            }
            Err(e) => {
                Err(e).with_context(|| format!("Failed to delete model artifact {:?}", path))
            }
        }
    }
}
