//! Artifact serialization for SemScout runs.
//!
//! Each run writes three files into the output directory:
//! - `sem_keywords_final.csv` — tabular form, nulls as empty fields
//! - `sem_keywords_final.json` — structured form, nulls as JSON `null`
//! - `manifest.json` — run metadata with SHA-256 checksums of the other two
//!
//! The CSV and JSON forms serialize the identical record set with the
//! identical field names; only the null encoding differs per format.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{info, instrument};

use semscout_shared::{FinalRecord, Result, RunManifest, SemScoutError};

/// File name of the tabular artifact.
pub const CSV_FILE_NAME: &str = "sem_keywords_final.csv";

/// File name of the structured artifact.
pub const JSON_FILE_NAME: &str = "sem_keywords_final.json";

/// File name of the run manifest.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Paths and checksums of the written record artifacts.
#[derive(Debug, Clone)]
pub struct WrittenArtifacts {
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
    pub csv_sha256: String,
    pub json_sha256: String,
}

/// Serialize `records` to both artifact forms under `output_dir`.
///
/// The directory is created if needed. Both payloads are rendered in memory
/// first so the returned checksums always match the file contents.
#[instrument(skip_all, fields(records = records.len(), dir = %output_dir.display()))]
pub fn write_records(output_dir: &Path, records: &[FinalRecord]) -> Result<WrittenArtifacts> {
    std::fs::create_dir_all(output_dir).map_err(|e| SemScoutError::io(output_dir, e))?;

    let csv_bytes = render_csv(records)?;
    let json_bytes = render_json(records)?;

    let csv_path = output_dir.join(CSV_FILE_NAME);
    std::fs::write(&csv_path, &csv_bytes).map_err(|e| SemScoutError::io(&csv_path, e))?;

    let json_path = output_dir.join(JSON_FILE_NAME);
    std::fs::write(&json_path, &json_bytes).map_err(|e| SemScoutError::io(&json_path, e))?;

    let artifacts = WrittenArtifacts {
        csv_sha256: sha256_hex(&csv_bytes),
        json_sha256: sha256_hex(&json_bytes),
        csv_path,
        json_path,
    };

    info!(
        csv = %artifacts.csv_path.display(),
        json = %artifacts.json_path.display(),
        "wrote record artifacts"
    );

    Ok(artifacts)
}

/// Write the run manifest beside the record artifacts.
pub fn write_manifest(output_dir: &Path, manifest: &RunManifest) -> Result<PathBuf> {
    let path = output_dir.join(MANIFEST_FILE_NAME);
    let json = serde_json::to_vec_pretty(manifest)
        .map_err(|e| SemScoutError::parse(format!("manifest serialization failed: {e}")))?;
    std::fs::write(&path, json).map_err(|e| SemScoutError::io(&path, e))?;

    info!(path = %path.display(), "wrote run manifest");
    Ok(path)
}

/// Render records as CSV with a header row; `None` becomes an empty field.
fn render_csv(records: &[FinalRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| SemScoutError::parse(format!("CSV serialization failed: {e}")))?;
    }
    writer
        .into_inner()
        .map_err(|e| SemScoutError::parse(format!("CSV flush failed: {e}")))
}

/// Render records as pretty-printed JSON; `None` becomes `null`.
fn render_json(records: &[FinalRecord]) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(records)
        .map_err(|e| SemScoutError::parse(format!("JSON serialization failed: {e}")))?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use semscout_shared::{CURRENT_SCHEMA_VERSION, RunId};

    use super::*;

    fn sample_records() -> Vec<FinalRecord> {
        vec![
            FinalRecord {
                keyword: "whey protein".into(),
                trends_score: Some(62.5),
                cpc_usd: Some(0.7),
            },
            FinalRecord {
                keyword: "creatine".into(),
                trends_score: Some(48.0),
                cpc_usd: None,
            },
        ]
    }

    fn temp_output_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("semscout-{label}-{}", RunId::new()))
    }

    #[test]
    fn csv_uses_empty_fields_for_null() {
        let bytes = render_csv(&sample_records()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "keyword,trends_score,cpc_usd");
        assert_eq!(lines[1], "whey protein,62.5,0.7");
        assert_eq!(lines[2], "creatine,48.0,");
    }

    #[test]
    fn json_uses_null_for_missing_values() {
        let bytes = render_json(&sample_records()).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.contains(r#""cpc_usd": null"#));
        assert!(text.contains(r#""trends_score": 62.5"#));
    }

    #[test]
    fn both_forms_carry_the_same_field_set() {
        let csv_text = String::from_utf8(render_csv(&sample_records()).unwrap()).unwrap();
        let mut header: Vec<String> = csv_text
            .lines()
            .next()
            .unwrap()
            .split(',')
            .map(String::from)
            .collect();

        let json: serde_json::Value =
            serde_json::from_slice(&render_json(&sample_records()).unwrap()).unwrap();
        let object = json[0].as_object().unwrap();
        let mut json_fields: Vec<String> = object.keys().cloned().collect();

        header.sort_unstable();
        json_fields.sort_unstable();
        assert_eq!(header, json_fields);
    }

    #[test]
    fn write_records_creates_files_with_matching_checksums() {
        let dir = temp_output_dir("write");
        let artifacts = write_records(&dir, &sample_records()).unwrap();

        let csv_bytes = std::fs::read(&artifacts.csv_path).unwrap();
        let json_bytes = std::fs::read(&artifacts.json_path).unwrap();
        assert_eq!(sha256_hex(&csv_bytes), artifacts.csv_sha256);
        assert_eq!(sha256_hex(&json_bytes), artifacts.json_sha256);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_record_set_still_produces_files() {
        let dir = temp_output_dir("empty");
        let artifacts = write_records(&dir, &[]).unwrap();

        assert!(artifacts.csv_path.exists());
        let json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&artifacts.json_path).unwrap()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn manifest_roundtrips_through_disk() {
        let dir = temp_output_dir("manifest");
        std::fs::create_dir_all(&dir).unwrap();

        let manifest = RunManifest {
            schema_version: CURRENT_SCHEMA_VERSION,
            id: RunId::new(),
            tool_version: "0.1.0".into(),
            generated_at: chrono::Utc::now(),
            geo: "IN".into(),
            seed_count: 3,
            expanded_count: 12,
            record_count: 10,
            missing_keywords: vec![],
            csv_sha256: "a".repeat(64),
            json_sha256: "b".repeat(64),
        };

        let path = write_manifest(&dir, &manifest).unwrap();
        let parsed: RunManifest =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(parsed.record_count, 10);
        assert_eq!(parsed.geo, "IN");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
