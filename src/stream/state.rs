use serde::Serialize;

use crate::core::types::{StreamKind, StreamPhase};
use crate::stream::input::InputFingerprint;

/// Each `begin`/`reset` starts a new run; writes from an older run are ignored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamState {
    pub kind: StreamKind,
    pub phase: StreamPhase,
    pub text: String,
    pub visible: bool,
    pub fingerprint: Option<InputFingerprint>,
    pub run: u64,
}

impl StreamState {
    pub fn new(kind: StreamKind) -> Self {
        Self {
            kind,
            phase: StreamPhase::Idle,
            text: String::new(),
            visible: false,
            fingerprint: None,
            run: 0,
        }
    }

    pub fn reset(&mut self, fingerprint: Option<InputFingerprint>) {
        self.phase = StreamPhase::Idle;
        self.text.clear();
        self.visible = false;
        self.fingerprint = fingerprint;
        self.run += 1;
    }

    pub fn begin(&mut self) -> bool {
        if self.phase.is_in_flight() {
            return false;
        }
        self.phase = StreamPhase::Loading;
        self.text.clear();
        self.visible = true;
        self.run += 1;
        true
    }

    pub fn push_chunk(&mut self, run: u64, chunk: &str) -> bool {
        if run != self.run || !self.phase.is_in_flight() {
            return false;
        }
        if !chunk.is_empty() {
            self.phase = StreamPhase::Streaming;
            self.text.push_str(chunk);
        }
        true
    }

    pub fn finish(&mut self, run: u64) -> bool {
        if run != self.run || !self.phase.is_in_flight() {
            return false;
        }
        self.phase = StreamPhase::Done;
        true
    }

    /// Marks the run failed and appends `warning` where the rest would be.
    pub fn fail(&mut self, run: u64, warning: &str) -> bool {
        if run != self.run || !self.phase.is_in_flight() {
            return false;
        }
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push_str("\n\n");
        }
        self.text.push_str(warning);
        self.phase = StreamPhase::Failed;
        true
    }

    pub fn toggle_visible(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    pub fn has_cached_text(&self) -> bool {
        self.phase.is_terminal() && !self.text.is_empty()
    }
}
