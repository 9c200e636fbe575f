use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

use super::record::GeneratedImageRecord;
use super::session::SessionHistory;

pub const HISTORY_MANIFEST_FILE: &str = "history.json";

/// The per-entry "download" action: decodes the record's image into
/// `dir/mockup-studio-<id>.<ext>`.
pub fn save_record_image(record: &GeneratedImageRecord, dir: &Path) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(record.download_file_name());
    let bytes = record
        .image()
        .decode()
        .with_context(|| format!("record {} holds an undecodable image", record.id()))?;
    std::fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Writes every record's image plus a `history.json` manifest (newest first,
/// image payloads replaced by file names). Returns the manifest path.
pub fn save_history(history: &SessionHistory, dir: &Path) -> anyhow::Result<PathBuf> {
    let mut entries = Vec::with_capacity(history.len());
    for record in history.recent() {
        let path = save_record_image(record, dir)?;
        entries.push(manifest_entry(record, &path));
    }

    let mut payload = Map::new();
    payload.insert("count".to_string(), Value::Number(history.len().into()));
    payload.insert("records".to_string(), Value::Array(entries));
    payload.insert("ts".to_string(), Value::String(now_utc_iso()));

    let manifest_path = dir.join(HISTORY_MANIFEST_FILE);
    std::fs::write(
        &manifest_path,
        serde_json::to_string_pretty(&Value::Object(payload))?,
    )
    .with_context(|| format!("failed to write {}", manifest_path.display()))?;
    Ok(manifest_path)
}

fn manifest_entry(record: &GeneratedImageRecord, path: &Path) -> Value {
    let mut entry = Map::new();
    entry.insert("id".to_string(), Value::String(record.id().to_string()));
    entry.insert(
        "kind".to_string(),
        Value::String(record.kind().as_str().to_string()),
    );
    entry.insert("prompt".to_string(), Value::String(record.prompt().to_string()));
    entry.insert(
        "created_at".to_string(),
        Value::String(
            record
                .created_at()
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        ),
    );
    entry.insert(
        "mime_type".to_string(),
        Value::String(record.image().mime_type().to_string()),
    );
    entry.insert(
        "file".to_string(),
        Value::String(
            path.file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default(),
        ),
    );
    Value::Object(entry)
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
