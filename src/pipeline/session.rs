use crate::pipeline::tools;
use crate::utils::Result;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

const SESSION_API: &str = "https://logan-search.org/api/download";

/// Accession list and query FASTA reconstructed from a Logan Search session.
pub struct SessionInputs {
    pub accession_file: PathBuf,
    pub query_file: PathBuf,
}

/// Materializes a session's inputs under `input_dir`. The session archive and
/// every derived file are cached: a re-run reuses whatever is already there.
pub fn resolve(session_id: &str, input_dir: &Path) -> Result<SessionInputs> {
    let accession_file = input_dir.join(format!("{}_acc.txt", session_id));
    let query_file = input_dir.join(format!("{}_query.fa", session_id));
    if accession_file.exists() && query_file.exists() {
        log::info!("Using existing session inputs for session {}", session_id);
        return Ok(SessionInputs {
            accession_file,
            query_file,
        });
    }

    let zip_path = input_dir.join(format!("{}.zip", session_id));
    if zip_path.exists() {
        log::info!("Using existing local copy of {}", zip_path.display());
    } else {
        log::info!("Downloading session data for session {}", session_id);
        download(&format!("{}/{}", SESSION_API, session_id), &zip_path)?;
    }

    let json_path = extract_session_json(&zip_path, input_dir, session_id)?;
    let text = fs::read_to_string(&json_path)
        .map_err(|e| format!("File {}: {}", json_path.display(), e))?;
    let session: Value = serde_json::from_str(&text)
        .map_err(|e| format!("Session metadata {}: {}", json_path.display(), e))?;

    log::info!("Extracting accession IDs from {}", json_path.display());
    let accessions = collect_accession_ids(&session);
    if accessions.is_empty() {
        return Err(format!(
            "Session {} contains no accession IDs",
            session_id
        ));
    }
    write_lines(&accession_file, &accessions)?;

    log::info!("Extracting query from {}", json_path.display());
    let (name, seq) = find_query(&session).ok_or_else(|| {
        format!("Session {} contains no query name/sequence", session_id)
    })?;
    let mut out = File::create(&query_file)
        .map_err(|e| format!("File {}: {}", query_file.display(), e))?;
    writeln!(out, ">{}\n{}", name, seq)
        .map_err(|e| format!("File {}: {}", query_file.display(), e))?;

    Ok(SessionInputs {
        accession_file,
        query_file,
    })
}

fn download(url: &str, dest: &Path) -> Result<()> {
    let response = reqwest::blocking::get(url)
        .map_err(|e| format!("Failed to download {}: {}", url, e))?;
    if !response.status().is_success() {
        return Err(format!(
            "Failed to download {}: HTTP {}",
            url,
            response.status()
        ));
    }
    stream_to_file(response, dest)
        .map_err(|e| format!("Failed to download {} to {}: {}", url, dest.display(), e))
}

/// Copies the body to disk in chunks; session archives can be large.
fn stream_to_file<R: Read>(mut reader: R, dest: &Path) -> std::io::Result<()> {
    let mut file = File::create(dest)?;
    std::io::copy(&mut reader, &mut file)?;
    Ok(())
}

/// Session archives carry a single `session.json` entry; pull it out with the
/// external `unzip` and file it under the session's name.
fn extract_session_json(zip_path: &Path, input_dir: &Path, session_id: &str) -> Result<PathBuf> {
    let zip_name = zip_path
        .file_name()
        .ok_or_else(|| format!("{} has no file name", zip_path.display()))?;
    tools::run_checked(
        Command::new("unzip")
            .arg("-o")
            .arg(zip_name)
            .arg("session.json")
            .current_dir(input_dir),
        "unzip",
    )?;
    let json_path = input_dir.join(format!("{}.json", session_id));
    fs::rename(input_dir.join("session.json"), &json_path)
        .map_err(|e| format!("File {}: {}", json_path.display(), e))?;
    Ok(json_path)
}

/// Every `_metadata.ID` string array anywhere in the document contributes
/// accessions, in document order.
fn collect_accession_ids(value: &Value) -> Vec<String> {
    let mut ids = Vec::new();
    walk_accession_ids(value, &mut ids);
    ids
}

fn walk_accession_ids(value: &Value, out: &mut Vec<String>) {
    if let Some(ids) = value
        .get("_metadata")
        .and_then(|metadata| metadata.get("ID"))
        .and_then(Value::as_array)
    {
        out.extend(ids.iter().filter_map(Value::as_str).map(str::to_string));
    }
    match value {
        Value::Object(map) => map.values().for_each(|child| walk_accession_ids(child, out)),
        Value::Array(items) => items.iter().for_each(|child| walk_accession_ids(child, out)),
        _ => {}
    }
}

/// First `_query` object holding both `_name` and `_seq`, at any depth.
fn find_query(value: &Value) -> Option<(String, String)> {
    if let Some(query) = value.get("_query") {
        if let (Some(name), Some(seq)) = (
            query.get("_name").and_then(Value::as_str),
            query.get("_seq").and_then(Value::as_str),
        ) {
            return Some((name.to_string(), seq.to_string()));
        }
    }
    match value {
        Value::Object(map) => map.values().find_map(find_query),
        Value::Array(items) => items.iter().find_map(find_query),
        _ => None,
    }
}

fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut out =
        File::create(path).map_err(|e| format!("File {}: {}", path.display(), e))?;
    for line in lines {
        writeln!(out, "{}", line).map_err(|e| format!("File {}: {}", path.display(), e))?;
    }
    Ok(())
}
