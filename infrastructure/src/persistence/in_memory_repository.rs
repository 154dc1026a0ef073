// ./infrastructure/src/persistence/in_memory_repository.rs
use application::{ApplicationError, DocumentRepository};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use domain::{Document, DocumentId, SearchRequest};
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Process-memory document storage.
///
/// Nothing is persisted; the data lives as long as the repository. Clones
/// share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentRepository {
    // Document ID -> Document
    documents: Arc<DashMap<DocumentId, Arc<Document>>>,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(DashMap::new()),
        }
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    #[instrument(skip(self, document))]
    async fn upsert(&self, document: Document) -> Result<Document, ApplicationError> {
        debug!(doc_id = %document.id(), "Upserting document in in-memory store");
        // The entry guard holds the shard lock, so reading the stored
        // `created` and replacing the document happen as one step.
        let stored = match self.documents.entry(document.id().clone()) {
            Entry::Occupied(mut entry) => {
                trace!(doc_id = %document.id(), "Replacing existing document, keeping its created time");
                let merged = Arc::new(document.preserving_created(entry.get()));
                entry.insert(merged.clone());
                merged
            }
            Entry::Vacant(entry) => {
                trace!(doc_id = %document.id(), "Inserting new document");
                let inserted = Arc::new(document);
                entry.insert(inserted.clone());
                inserted
            }
        };
        Ok((*stored).clone())
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &DocumentId) -> Result<Option<Document>, ApplicationError> {
        debug!(doc_id = %id, "Getting document from in-memory store");
        // Get returns a Ref, so we clone the Document out of the Arc
        let doc = self.documents.get(id).map(|doc_ref| (**doc_ref).clone());
        Ok(doc)
    }

    #[instrument(skip(self, request))]
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Document>, ApplicationError> {
        debug!(match_all = request.is_empty(), "Scanning in-memory store");

        let mut hits: Vec<Document> = self
            .documents
            .iter()
            .filter(|entry| request.matches(entry.value()))
            .map(|entry| (**entry.value()).clone())
            .collect();
        trace!(count = hits.len(), "Documents after filtering");

        // Map iteration order is arbitrary; report oldest first, ids break ties.
        hits.sort_unstable_by(|a, b| {
            a.created()
                .cmp(&b.created())
                .then_with(|| a.id().cmp(b.id()))
        });

        debug!(total_hits = hits.len(), "In-memory search finished.");
        Ok(hits)
    }

    async fn count(&self) -> Result<usize, ApplicationError> {
        Ok(self.documents.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use domain::{Author, DocumentDraft};

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, minute, 0).unwrap()
    }

    fn document(id: &str, title: &str, created: DateTime<Utc>) -> Document {
        Document::try_from(
            DocumentDraft::new()
                .with_id(id)
                .with_title(title)
                .with_content("body")
                .with_author(Author::new("a1", "Ada"))
                .with_created(created),
        )
        .expect("Failed to build test document")
    }

    #[tokio::test]
    async fn upsert_inserts_new_document_verbatim() {
        let repo = InMemoryDocumentRepository::new();
        let doc = document("d1", "First", at(5));

        let stored = repo.upsert(doc.clone()).await.unwrap();
        assert_eq!(stored, doc);
        assert_eq!(repo.get(doc.id()).await.unwrap(), Some(doc));
    }

    #[tokio::test]
    async fn upsert_replaces_fields_but_keeps_created() {
        let repo = InMemoryDocumentRepository::new();
        repo.upsert(document("d1", "First", at(5))).await.unwrap();

        let stored = repo.upsert(document("d1", "Second", at(30))).await.unwrap();
        assert_eq!(stored.title(), Some("Second"));
        assert_eq!(stored.created(), at(5));
        assert_eq!(repo.count().await.unwrap(), 1);

        let fetched = repo.get(&DocumentId::from("d1")).await.unwrap().unwrap();
        assert_eq!(fetched, stored);
    }

    #[tokio::test]
    async fn get_unknown_id_is_none() {
        let repo = InMemoryDocumentRepository::new();
        assert!(repo.get(&DocumentId::from("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn search_orders_by_created_then_id() {
        let repo = InMemoryDocumentRepository::new();
        repo.upsert(document("c", "Late", at(20))).await.unwrap();
        repo.upsert(document("b", "Tie", at(10))).await.unwrap();
        repo.upsert(document("a", "Tie", at(10))).await.unwrap();
        repo.upsert(document("z", "Early", at(1))).await.unwrap();

        let ids: Vec<String> = repo
            .search(&SearchRequest::new())
            .await
            .unwrap()
            .into_iter()
            .map(|doc| doc.id().as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["z", "a", "b", "c"]);
    }

    #[tokio::test]
    async fn clones_share_storage() {
        let repo = InMemoryDocumentRepository::new();
        let other = repo.clone();
        repo.upsert(document("d1", "First", at(5))).await.unwrap();
        assert_eq!(other.count().await.unwrap(), 1);
    }
}
