use crate::constants::session::FILE_MODE;
use crate::errors::ToolError;
use crate::stores::session_store::{SessionStore, StoredToken};
use crate::utils::fs_atomic::{atomic_write_text_file, modified_time, remove_file_if_exists};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    sid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<String>,
}

/// JSON credential file. Age comes from the file's mtime.
pub struct FileSessionStore {
    file_path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn read_file(&self) -> Result<Option<String>, ToolError> {
        match std::fs::read_to_string(&self.file_path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ToolError::internal(format!(
                "Failed to read session file {}: {}",
                self.file_path.display(),
                err
            ))),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<StoredToken>, ToolError> {
        let Some(raw) = self.read_file()? else {
            return Ok(None);
        };
        let parsed: SessionFile = serde_json::from_str(&raw).map_err(|err| {
            ToolError::internal(format!("Failed to parse session file: {}", err))
                .with_hint("Delete the session file and generate a new session.")
        })?;
        let value = parsed.sid;
        if value.is_empty() {
            return Ok(None);
        }
        let modified = modified_time(&self.file_path).map_err(|err| {
            ToolError::internal(format!("Failed to stat session file: {}", err))
        })?;
        Ok(Some(StoredToken {
            value,
            modified_at: DateTime::<Utc>::from(modified),
        }))
    }

    fn save(&self, token: &str) -> Result<StoredToken, ToolError> {
        if token.is_empty() {
            return Err(ToolError::invalid_params("Refusing to store an empty session id"));
        }
        let document = SessionFile {
            sid: token.to_string(),
            saved_at: Some(Utc::now().to_rfc3339()),
        };
        let payload = serde_json::to_string_pretty(&document)
            .map_err(|err| ToolError::internal(format!("Failed to serialize session: {}", err)))?;
        {
            let _guard = self.write_lock.lock().unwrap_or_else(|err| err.into_inner());
            atomic_write_text_file(&self.file_path, &format!("{}\n", payload), FILE_MODE)
                .map_err(|err| ToolError::internal(format!("Failed to save session: {}", err)))?;
        }
        let modified = modified_time(&self.file_path)
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        Ok(StoredToken {
            value: token.to_string(),
            modified_at: modified,
        })
    }

    fn clear(&self) -> Result<bool, ToolError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|err| err.into_inner());
        remove_file_if_exists(&self.file_path)
            .map_err(|err| ToolError::internal(format!("Failed to remove session file: {}", err)))
    }

    fn location(&self) -> String {
        self.file_path.display().to_string()
    }
}
