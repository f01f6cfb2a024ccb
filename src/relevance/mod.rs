use std::sync::Arc;

use tokio::sync::watch;

use crate::core::types::{DocumentRelevance, RelatedDocument, RelevanceResult};

#[derive(Debug, Clone, Default)]
pub struct RelevanceSnapshot {
    pub revision: u64,
    pub result: Arc<RelevanceResult>,
}

impl RelevanceSnapshot {
    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }

    pub fn for_document(&self, document_id: &str) -> Option<&DocumentRelevance> {
        self.result.get(document_id)
    }

    pub fn related_documents(&self) -> Vec<RelatedDocument> {
        self.result
            .iter()
            .map(|(document_id, relevance)| RelatedDocument {
                document_id: document_id.clone(),
                original_name: relevance.original_name.clone(),
            })
            .collect()
    }
}

#[derive(Debug)]
pub struct RelevanceWriter {
    tx: watch::Sender<RelevanceSnapshot>,
}

#[derive(Debug, Clone)]
pub struct RelevanceStore {
    rx: watch::Receiver<RelevanceSnapshot>,
}

impl RelevanceStore {
    /// Empty store at revision 0 plus its only writer.
    pub fn channel() -> (RelevanceWriter, RelevanceStore) {
        let (tx, rx) = watch::channel(RelevanceSnapshot::default());
        (RelevanceWriter { tx }, RelevanceStore { rx })
    }

    pub fn snapshot(&self) -> RelevanceSnapshot {
        self.rx.borrow().clone()
    }

    pub fn revision(&self) -> u64 {
        self.rx.borrow().revision
    }

    pub fn subscribe(&self) -> watch::Receiver<RelevanceSnapshot> {
        self.rx.clone()
    }
}

impl RelevanceWriter {
    pub fn publish(&self, result: RelevanceResult) -> RelevanceSnapshot {
        let mut published = RelevanceSnapshot::default();
        self.tx.send_modify(|current| {
            current.revision += 1;
            current.result = Arc::new(result);
            published = current.clone();
        });
        tracing::debug!(
            revision = published.revision,
            documents = published.result.len(),
            "published relevance result"
        );
        published
    }

    pub fn reader(&self) -> RelevanceStore {
        RelevanceStore {
            rx: self.tx.subscribe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RelevanceStore;
    use crate::core::types::{DocumentRelevance, RelevanceResult};

    fn result_with(id: &str, name: &str) -> RelevanceResult {
        let mut result = RelevanceResult::new();
        result.insert(
            id.to_string(),
            DocumentRelevance {
                original_name: name.to_string(),
                sections: vec![],
                subsections: vec![],
            },
        );
        result
    }

    #[test]
    fn publish_replaces_wholesale_and_bumps_revision() {
        let (writer, store) = RelevanceStore::channel();
        assert_eq!(store.revision(), 0);
        assert!(store.snapshot().is_empty());

        writer.publish(result_with("a", "A.pdf"));
        writer.publish(result_with("b", "B.pdf"));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.revision, 2);
        assert!(snapshot.for_document("a").is_none());
        assert_eq!(snapshot.related_documents()[0].original_name, "B.pdf");
    }

    #[test]
    fn readers_share_the_latest_result() {
        let (writer, store) = RelevanceStore::channel();
        let other = writer.reader();
        writer.publish(result_with("a", "A.pdf"));
        assert_eq!(store.snapshot().revision, other.snapshot().revision);
    }
}
