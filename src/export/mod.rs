//! ZIP dossiers for a cat or a litter: `metadata.json` plus the attachment files found on disk.

use crate::error::AppError;
use crate::gateway::Gateway;
use crate::schema::{catalog, EntityKind};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const METADATA_FILE: &str = "metadata.json";

/// A finished archive and the file name to offer the client.
pub struct Archive {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub struct ExportService;

impl ExportService {
    /// The cat, every kitten it sired or mothered, and its attachments.
    pub async fn cat(gateway: &Gateway, cat_id: i64) -> Result<Archive, AppError> {
        let c = catalog();
        let cats = c.entity(EntityKind::Cat);
        let kittens = c.entity(EntityKind::Kitten);
        let attachments = c.entity(EntityKind::DocumentAttachment);

        let mut scope = gateway.begin().await?;
        let cat = scope
            .get_by_id(cats, cat_id)
            .await?
            .ok_or_else(|| AppError::not_found(cats.label, cat_id))?;
        let kitten_rows = scope.find_any(kittens, &["sire_id", "dam_id"], cat_id).await?;
        let attachment_rows = scope
            .find(attachments, &[("cat_id".to_string(), Value::from(cat_id))], attachments.order)
            .await?;
        scope.commit().await?;

        let metadata = json!({ "cat": cat, "kittens": kitten_rows, "attachments": attachment_rows });
        let files = read_attachment_files(&attachment_rows).await?;
        let bytes = tokio::task::spawn_blocking(move || build_archive(&metadata, &files))
            .await
            .map_err(|e| AppError::Export(e.to_string()))??;
        tracing::info!(cat_id, size = bytes.len(), "cat export built");
        Ok(Archive {
            file_name: format!("cat_{}_{}.zip", cat_id, timestamp()),
            bytes,
        })
    }

    /// The litter, its kittens, and its attachments.
    pub async fn litter(gateway: &Gateway, litter_id: i64) -> Result<Archive, AppError> {
        let c = catalog();
        let litters = c.entity(EntityKind::Litter);
        let kittens = c.entity(EntityKind::Kitten);
        let attachments = c.entity(EntityKind::DocumentAttachment);
        let by_litter = [("litter_id".to_string(), Value::from(litter_id))];

        let mut scope = gateway.begin().await?;
        let litter = scope
            .get_by_id(litters, litter_id)
            .await?
            .ok_or_else(|| AppError::not_found(litters.label, litter_id))?;
        let kitten_rows = scope.find(kittens, &by_litter, kittens.order).await?;
        let attachment_rows = scope.find(attachments, &by_litter, attachments.order).await?;
        scope.commit().await?;

        let metadata = json!({ "litter": litter, "kittens": kitten_rows, "attachments": attachment_rows });
        let files = read_attachment_files(&attachment_rows).await?;
        let bytes = tokio::task::spawn_blocking(move || build_archive(&metadata, &files))
            .await
            .map_err(|e| AppError::Export(e.to_string()))??;
        tracing::info!(litter_id, size = bytes.len(), "litter export built");
        Ok(Archive {
            file_name: format!("litter_{}_{}.zip", litter_id, timestamp()),
            bytes,
        })
    }
}

fn timestamp() -> String {
    chrono::Utc::now().format("%Y%m%d%H%M%S").to_string()
}

/// Contents of every attachment whose `file_path` exists, keyed by a unique entry name.
/// Missing files are skipped.
async fn read_attachment_files(attachments: &[Value]) -> Result<Vec<(String, Vec<u8>)>, AppError> {
    let mut used: HashSet<String> = HashSet::from([METADATA_FILE.to_string()]);
    let mut files = Vec::new();
    for attachment in attachments {
        let Some(raw) = attachment.get("file_path").and_then(Value::as_str) else { continue };
        let path = Path::new(raw);
        let bytes = match tokio::fs::read(path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = raw, "attachment file missing, skipped");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let base = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| raw.to_string());
        let name = if used.contains(&base) {
            let id = attachment.get("id").and_then(Value::as_i64).unwrap_or_default();
            format!("{}_{}", id, base)
        } else {
            base
        };
        used.insert(name.clone());
        files.push((name, bytes));
    }
    Ok(files)
}

/// Write `metadata.json` (pretty-printed) followed by each file, deflate-compressed, into memory.
pub fn build_archive(metadata: &Value, files: &[(String, Vec<u8>)]) -> Result<Vec<u8>, AppError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    let meta = serde_json::to_vec_pretty(metadata).map_err(|e| AppError::Export(e.to_string()))?;
    zip.start_file(METADATA_FILE, options)?;
    zip.write_all(&meta)?;
    for (name, bytes) in files {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(bytes)?;
    }
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn archive_holds_metadata_then_files() {
        let metadata = json!({"cat": {"id": 1, "call_name": "Luna"}, "kittens": [], "attachments": []});
        let files = vec![("pedigree.pdf".to_string(), b"%PDF".to_vec())];
        let bytes = build_archive(&metadata, &files).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        let mut meta = String::new();
        archive.by_name(METADATA_FILE).unwrap().read_to_string(&mut meta).unwrap();
        let parsed: Value = serde_json::from_str(&meta).unwrap();
        assert_eq!(parsed["cat"]["call_name"], "Luna");
        let mut pdf = Vec::new();
        archive.by_name("pedigree.pdf").unwrap().read_to_end(&mut pdf).unwrap();
        assert_eq!(pdf, b"%PDF");
    }

    #[tokio::test]
    async fn missing_files_are_skipped_and_names_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a").join("contract.pdf");
        let b = dir.path().join("b").join("contract.pdf");
        std::fs::create_dir_all(a.parent().unwrap()).unwrap();
        std::fs::create_dir_all(b.parent().unwrap()).unwrap();
        std::fs::write(&a, b"one").unwrap();
        std::fs::write(&b, b"two").unwrap();
        let rows = vec![
            json!({"id": 1, "file_path": a.to_string_lossy()}),
            json!({"id": 2, "file_path": dir.path().join("gone.pdf").to_string_lossy()}),
            json!({"id": 3, "file_path": b.to_string_lossy()}),
        ];
        let files = read_attachment_files(&rows).await.unwrap();
        let names: Vec<&str> = files.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["contract.pdf", "3_contract.pdf"]);
    }
}
