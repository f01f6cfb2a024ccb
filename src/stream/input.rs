use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::core::types::StreamKind;

/// Identity of the input that triggered a generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct InputFingerprint(String);

impl InputFingerprint {
    pub fn from_parts(tag: &str, parts: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(tag.as_bytes());
        for part in parts {
            // length prefix keeps ("ab", "c") and ("a", "bc") apart
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A folder and the documents it contained when the request was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderScope {
    pub folder_id: String,
    pub document_ids: Vec<String>,
}

impl FolderScope {
    pub fn new(folder_id: impl Into<String>, document_ids: Vec<String>) -> Self {
        Self {
            folder_id: folder_id.into(),
            document_ids,
        }
    }

    pub fn fingerprint(&self, tag: &str) -> InputFingerprint {
        let mut parts: Vec<&str> = vec![self.folder_id.as_str()];
        parts.extend(self.document_ids.iter().map(String::as_str));
        InputFingerprint::from_parts(tag, &parts)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamInput {
    Insight {
        document_id: String,
        selected_text: String,
    },
    Guide(FolderScope),
}

impl StreamInput {
    pub fn insight(document_id: impl Into<String>, selected_text: impl Into<String>) -> Self {
        Self::Insight {
            document_id: document_id.into(),
            selected_text: selected_text.into(),
        }
    }

    pub fn guide(scope: FolderScope) -> Self {
        Self::Guide(scope)
    }

    pub fn kind(&self) -> StreamKind {
        match self {
            Self::Insight { .. } => StreamKind::Insight,
            Self::Guide(_) => StreamKind::Guide,
        }
    }

    pub fn fingerprint(&self) -> InputFingerprint {
        match self {
            Self::Insight {
                document_id,
                selected_text,
            } => InputFingerprint::from_parts("insight", &[document_id.as_str(), selected_text.as_str()]),
            Self::Guide(scope) => scope.fingerprint("guide"),
        }
    }
}
