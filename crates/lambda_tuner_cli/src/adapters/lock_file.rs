use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::Utc;
use lambda_tuner_core::lock::{FunctionLock, LockError};
use lambda_tuner_core::FunctionIdentity;
use serde_json::json;

/// Advisory lock files shared by tuner processes on one machine.
///
/// A lock is a file named after the function ARN, created with `create_new`.
/// A crashed process leaves its file behind; delete it by hand once the
/// function's memory size has been checked.
#[derive(Debug, Clone)]
pub struct LockFileLease {
    dir: PathBuf,
}

impl LockFileLease {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn lock_path(&self, identity: &FunctionIdentity) -> PathBuf {
        self.dir.join(format!("{}.lock", lock_file_stem(identity)))
    }
}

impl FunctionLock for LockFileLease {
    fn acquire(&self, identity: &FunctionIdentity) -> Result<(), LockError> {
        let unavailable = |message: String| LockError::Unavailable {
            function: identity.to_string(),
            message,
        };

        fs::create_dir_all(&self.dir).map_err(|error| {
            unavailable(format!(
                "failed to create lock directory {}: {error}",
                self.dir.display()
            ))
        })?;

        let path = self.lock_path(identity);
        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(error) if error.kind() == ErrorKind::AlreadyExists => {
                return Err(LockError::Held(format!(
                    "{identity} (lock file {})",
                    path.display()
                )));
            }
            Err(error) => {
                return Err(unavailable(format!(
                    "failed to create {}: {error}",
                    path.display()
                )));
            }
        };

        let record = json!({
            "function": identity.as_str(),
            "pid": std::process::id(),
            "acquired_at": Utc::now().to_rfc3339(),
        });
        if let Err(error) = serde_json::to_writer(&file, &record) {
            // a half-written lock would block every later sweep
            drop(file);
            let _ = fs::remove_file(&path);
            return Err(unavailable(format!(
                "failed to write {}: {error}",
                path.display()
            )));
        }

        tracing::debug!(path = %path.display(), "acquired sweep lock");
        Ok(())
    }

    fn release(&self, identity: &FunctionIdentity) {
        let path = self.lock_path(identity);
        if let Err(error) = fs::remove_file(&path) {
            tracing::warn!(path = %path.display(), error = %error, "failed to remove sweep lock");
        }
    }
}

fn lock_file_stem(identity: &FunctionIdentity) -> String {
    identity
        .as_str()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
