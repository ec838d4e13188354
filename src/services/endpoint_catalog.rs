use crate::constants::catalog::{ABSENT_MARKER, TABLE};
use crate::errors::ToolError;
use crate::services::logger::Logger;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const HTTP_VERBS: &[&str] = &["get", "post", "put", "patch", "delete", "head", "options"];

/// One documented remote operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointRecord {
    pub path: String,
    pub method: String,
    pub description: String,
    pub request_body: Option<Value>,
    pub responses: Option<Value>,
}

impl EndpointRecord {
    /// Shape handed to the agent by `query_api`.
    pub fn to_listing(&self) -> Value {
        serde_json::json!({
            "path": self.path,
            "description": self.description,
            "method": self.method,
            "request_body": self.request_body,
            "response": self.responses,
        })
    }
}

/// Read-mostly view over the SQLite endpoint table.
#[derive(Clone)]
pub struct EndpointCatalog {
    logger: Logger,
    db_path: PathBuf,
}

impl EndpointCatalog {
    pub fn new(logger: Logger, db_path: impl Into<PathBuf>) -> Self {
        Self {
            logger: logger.child("catalog"),
            db_path: db_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn open_read_only(&self) -> Result<Connection, ToolError> {
        if !self.db_path.exists() {
            return Err(ToolError::not_found(format!(
                "Endpoint catalog not found at {}",
                self.db_path.display()
            ))
            .with_hint("Set LEOSTREAM_CATALOG_PATH or build one with `catalog import`."));
        }
        Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|err| ToolError::internal(format!("Failed to open endpoint catalog: {}", err)))
    }

    fn open_writable(&self) -> Result<Connection, ToolError> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&self.db_path).map_err(|err| {
            ToolError::internal(format!("Failed to open endpoint catalog: {}", err))
        })?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {TABLE} (
                path TEXT NOT NULL,
                method TEXT NOT NULL,
                description TEXT,
                request_body TEXT,
                responses TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_{TABLE}_path ON {TABLE}(path);"
        ))?;
        Ok(conn)
    }

    /// Case-sensitive substring match on `path`. `%` and `_` are literal.
    pub fn search(&self, query: &str) -> Result<Vec<EndpointRecord>, ToolError> {
        let conn = self.open_read_only()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT path, method, description, request_body, responses
             FROM {TABLE}
             WHERE instr(path, ?1) > 0
             ORDER BY rowid"
        ))?;
        let rows = stmt.query_map(params![query], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (path, method, description, request_body, responses) = row?;
            records.push(EndpointRecord {
                request_body: self.decode_column(&path, "request_body", request_body.as_deref()),
                responses: self.decode_column(&path, "responses", responses.as_deref()),
                method: method.unwrap_or_default(),
                description: description.unwrap_or_default(),
                path,
            });
        }
        self.logger.debug(
            "Catalog search",
            Some(&serde_json::json!({ "query": query, "matches": records.len() })),
        );
        Ok(records)
    }

    fn decode_column(&self, path: &str, column: &str, raw: Option<&str>) -> Option<Value> {
        let raw = raw?;
        match decode_document(raw) {
            Ok(value) => value,
            Err(err) => {
                self.logger.warn(
                    "Catalog column is not valid JSON; returning raw text",
                    Some(&serde_json::json!({ "path": path, "column": column, "error": err })),
                );
                Some(Value::String(raw.to_string()))
            }
        }
    }

    pub fn count(&self) -> Result<usize, ToolError> {
        let conn = self.open_read_only()?;
        let count: Option<i64> = conn
            .query_row(&format!("SELECT COUNT(*) FROM {TABLE}"), [], |row| row.get(0))
            .optional()?;
        Ok(count.unwrap_or(0).max(0) as usize)
    }

    pub fn create_schema(&self) -> Result<(), ToolError> {
        self.open_writable().map(|_| ())
    }

    pub fn insert(&self, record: &EndpointRecord) -> Result<(), ToolError> {
        let conn = self.open_writable()?;
        insert_record(&conn, record)
    }

    /// Replaces the table contents with one row per path and verb of an
    /// OpenAPI document. Returns the number of rows written.
    pub fn import_openapi(&self, document: &Value) -> Result<usize, ToolError> {
        let records = records_from_openapi(document)?;
        let mut conn = self.open_writable()?;
        let tx = conn.transaction()?;
        tx.execute(&format!("DELETE FROM {TABLE}"), [])?;
        for record in &records {
            insert_record(&tx, record)?;
        }
        tx.commit()?;
        self.logger.info(
            "Catalog imported",
            Some(&serde_json::json!({
                "rows": records.len(),
                "path": self.db_path.display().to_string(),
            })),
        );
        Ok(records.len())
    }
}

fn insert_record(conn: &Connection, record: &EndpointRecord) -> Result<(), ToolError> {
    conn.execute(
        &format!(
            "INSERT INTO {TABLE} (path, method, description, request_body, responses)
             VALUES (?1, ?2, ?3, ?4, ?5)"
        ),
        params![
            record.path,
            record.method,
            record.description,
            encode_document(record.request_body.as_ref()),
            encode_document(record.responses.as_ref()),
        ],
    )?;
    Ok(())
}

/// Stored text to document. The literal `None` (or blank) means absent.
pub fn decode_document(raw: &str) -> Result<Option<Value>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == ABSENT_MARKER {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|err| err.to_string())
}

pub fn encode_document(value: Option<&Value>) -> String {
    match value {
        Some(value) if !value.is_null() => value.to_string(),
        _ => ABSENT_MARKER.to_string(),
    }
}

fn records_from_openapi(document: &Value) -> Result<Vec<EndpointRecord>, ToolError> {
    let paths = document
        .get("paths")
        .and_then(Value::as_object)
        .ok_or_else(|| ToolError::invalid_params("OpenAPI document has no 'paths' object"))?;
    let mut records = Vec::new();
    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        for verb in HTTP_VERBS {
            let Some(operation) = item.get(*verb).and_then(Value::as_object) else {
                continue;
            };
            let description = operation
                .get("summary")
                .or_else(|| operation.get("description"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            records.push(EndpointRecord {
                path: path.clone(),
                method: verb.to_uppercase(),
                description,
                request_body: operation.get("requestBody").cloned(),
                responses: operation.get("responses").cloned(),
            });
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_marker_decodes_to_none() {
        assert_eq!(decode_document("None"), Ok(None));
        assert_eq!(decode_document("  "), Ok(None));
        assert_eq!(
            decode_document("{\"type\":\"object\"}"),
            Ok(Some(serde_json::json!({"type": "object"})))
        );
        assert!(decode_document("{broken").is_err());
    }

    #[test]
    fn encode_uses_marker_for_missing_documents() {
        assert_eq!(encode_document(None), "None");
        assert_eq!(encode_document(Some(&Value::Null)), "None");
        assert_eq!(encode_document(Some(&serde_json::json!({"a": 1}))), "{\"a\":1}");
    }

    #[test]
    fn openapi_operations_become_records() {
        let doc = serde_json::json!({
            "paths": {
                "/session/login": {
                    "post": {
                        "summary": "Log in",
                        "requestBody": {"content": {}},
                        "responses": {"200": {"description": "ok"}}
                    },
                    "parameters": []
                },
                "/pools": {
                    "get": {"description": "List pools", "responses": {}}
                }
            }
        });
        let records = records_from_openapi(&doc).expect("records");
        assert_eq!(records.len(), 2);
        let login = records
            .iter()
            .find(|r| r.path == "/session/login")
            .expect("login");
        assert_eq!(login.method, "POST");
        assert_eq!(login.description, "Log in");
        assert!(login.request_body.is_some());
        let pools = records.iter().find(|r| r.path == "/pools").expect("pools");
        assert_eq!(pools.request_body, None);
    }

    #[test]
    fn openapi_without_paths_is_rejected() {
        assert!(records_from_openapi(&serde_json::json!({"openapi": "3.0.0"})).is_err());
    }
}
