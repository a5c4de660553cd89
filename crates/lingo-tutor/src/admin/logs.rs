use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::telemetry::LOG_FILE_PREFIX;

/// Entries returned by one log tail request.
pub const LOG_TAIL_LIMIT: usize = 100;

/// Most recently modified structured log file in `dir`.
pub async fn latest_log_file(dir: &Path) -> io::Result<Option<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(LOG_FILE_PREFIX) {
            continue;
        }
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified()?;
        if newest.as_ref().map_or(true, |(seen, _)| modified >= *seen) {
            newest = Some((modified, entry.path()));
        }
    }
    Ok(newest.map(|(_, path)| path))
}

const TAIL_CHUNK: u64 = 8 * 1024;

/// Last `limit` lines of the file at `path` that parse as JSON, oldest first.
/// The file is read backwards in fixed chunks until enough lines are found.
pub async fn read_json_tail(path: &Path, limit: usize) -> io::Result<Vec<Value>> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut position = file.metadata().await?.len();
    let mut partial: Vec<u8> = Vec::new();
    let mut newest_first = Vec::new();

    while position > 0 && newest_first.len() < limit {
        let start = position.saturating_sub(TAIL_CHUNK);
        let mut chunk = vec![0u8; (position - start) as usize];
        file.seek(SeekFrom::Start(start)).await?;
        file.read_exact(&mut chunk).await?;
        chunk.extend_from_slice(&partial);
        position = start;

        // Bytes before the first newline may continue in the previous chunk.
        let complete_from = if position == 0 {
            0
        } else {
            match chunk.iter().position(|&byte| byte == b'\n') {
                Some(index) => index + 1,
                None => {
                    partial = chunk;
                    continue;
                }
            }
        };
        collect_json_lines(&chunk[complete_from..], limit, &mut newest_first);
        chunk.truncate(complete_from);
        partial = chunk;
    }

    newest_first.reverse();
    Ok(newest_first)
}

fn collect_json_lines(bytes: &[u8], limit: usize, newest_first: &mut Vec<Value>) {
    for line in bytes.split(|&byte| byte == b'\n').rev() {
        if newest_first.len() >= limit {
            return;
        }
        let Ok(text) = std::str::from_utf8(line) else {
            continue;
        };
        if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
            newest_first.push(value);
        }
    }
}
