use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{
    commands::documents::ensure_open,
    core::{
        errors::AppResult,
        types::{StreamKind, StreamPhase},
    },
    session::StreamOutcome,
    stream::{FolderScope, StreamInput},
    AppState,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamReport {
    pub kind: StreamKind,
    pub outcome: StreamOutcome,
    pub phase: StreamPhase,
    pub visible: bool,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodcastResponse {
    pub path: PathBuf,
    pub bytes: usize,
}

/// Writes the part of `text` not yet written and returns the new offset.
/// A shorter text means the stream was reset, so it is written from the start.
fn write_delta<W: Write>(out: &mut W, text: &str, written: usize) -> AppResult<usize> {
    let start = if written <= text.len() && text.is_char_boundary(written) {
        written
    } else {
        0
    };
    if start < text.len() {
        out.write_all(text[start..].as_bytes())?;
        out.flush()?;
    }
    Ok(text.len())
}

/// Runs one stream and echoes its text to `out` as chunks arrive.
async fn follow_stream<W: Write>(state: &AppState, input: StreamInput, out: &mut W) -> AppResult<StreamReport> {
    let kind = input.kind();
    let mut updates = state.controller.subscribe_stream(kind);
    updates.borrow_and_update();
    let mut written = 0usize;

    let run = state.controller.run_stream(input);
    tokio::pin!(run);
    let outcome = loop {
        tokio::select! {
            outcome = &mut run => break outcome?,
            changed = updates.changed() => {
                if changed.is_err() {
                    break (&mut run).await?;
                }
                let current = updates.borrow_and_update().clone();
                if current.visible {
                    written = write_delta(out, &current.text, written)?;
                }
            }
        }
    };

    let last = state.controller.stream_state(kind);
    if last.visible {
        write_delta(out, &last.text, written)?;
        writeln!(out)?;
    }
    Ok(StreamReport {
        kind,
        outcome,
        phase: last.phase,
        visible: last.visible,
        text: last.text,
    })
}

pub async fn insight<W: Write>(
    state: &AppState,
    document_id: &str,
    selected_text: &str,
    out: &mut W,
) -> AppResult<StreamReport> {
    ensure_open(state, document_id).await?;
    state.controller.select_text(selected_text).await?;
    follow_stream(state, StreamInput::insight(document_id, selected_text), out).await
}

pub async fn guide<W: Write>(
    state: &AppState,
    folder_id: &str,
    document_ids: Vec<String>,
    out: &mut W,
) -> AppResult<StreamReport> {
    let scope = FolderScope::new(folder_id, document_ids);
    follow_stream(state, StreamInput::guide(scope), out).await
}

pub async fn podcast(
    state: &AppState,
    folder_id: &str,
    document_ids: Vec<String>,
    output: &Path,
) -> AppResult<PodcastResponse> {
    let scope = FolderScope::new(folder_id, document_ids);
    let audio = state.controller.generate_podcast(&scope).await?;
    tokio::fs::write(output, audio.as_slice()).await?;
    tracing::info!(folder_id, bytes = audio.len(), path = %output.display(), "podcast written");
    Ok(PodcastResponse {
        path: output.to_path_buf(),
        bytes: audio.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::write_delta;

    #[test]
    fn writes_only_new_text() {
        let mut out = Vec::new();
        let written = write_delta(&mut out, "Hello", 0).expect("first write");
        let written = write_delta(&mut out, "Hello, world", written).expect("second write");
        assert_eq!(written, 12);
        assert_eq!(String::from_utf8(out).expect("utf-8 output"), "Hello, world");
    }

    #[test]
    fn rewrites_after_reset() {
        let mut out = Vec::new();
        let written = write_delta(&mut out, "first run", 0).expect("first write");
        write_delta(&mut out, "new", written).expect("write after reset");
        assert_eq!(String::from_utf8(out).expect("utf-8 output"), "first runnew");
    }
}
