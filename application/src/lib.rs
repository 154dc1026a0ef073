use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Document, DocumentDraft, DocumentId, DomainError, SearchRequest};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// --- Application Errors ---
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Domain validation error: {0}")]
    DomainError(#[from] DomainError), // Propagate domain errors cleanly
    #[error("Infrastructure error: {0}")]
    InfrastructureError(String),
}

// --- Infrastructure Interfaces (Traits) ---

/// Interface for storing and retrieving documents.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Inserts the document, or replaces the stored one with the same id.
    /// On replace the stored `created` wins over the incoming one; the
    /// returned document is what the repository now holds.
    async fn upsert(&self, document: Document) -> Result<Document, ApplicationError>;
    /// Retrieves a document by its ID.
    async fn get(&self, id: &DocumentId) -> Result<Option<Document>, ApplicationError>;
    /// Returns every stored document accepted by `request.matches`.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Document>, ApplicationError>;
    /// Number of stored documents.
    async fn count(&self) -> Result<usize, ApplicationError>;
}

/// Source of the current time for `created` stamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant. Useful for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

/// Generates ids for documents saved without one.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> DocumentId;
}

/// Random (v4) UUIDs rendered in their hyphenated form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> DocumentId {
        DocumentId::new(Uuid::new_v4().to_string())
    }
}

// --- Application Services (Use Cases) ---

/// The document store: upsert, lookup by id and filtered search over a
/// [`DocumentRepository`].
pub struct DocumentService {
    repository: Arc<dyn DocumentRepository>,
    clock: Arc<dyn Clock>,
    id_generator: Arc<dyn IdGenerator>,
}

impl DocumentService {
    /// Creates a service using the wall clock and random UUIDs.
    pub fn new(repository: Arc<dyn DocumentRepository>) -> Self {
        Self {
            repository,
            clock: Arc::new(SystemClock),
            id_generator: Arc::new(UuidGenerator),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = id_generator;
        self
    }

    /// Upserts a document.
    ///
    /// A draft without an id (or with an empty one) gets a generated id and
    /// is stamped with the current time. A draft with an id replaces any
    /// stored document of that id, except for `created`, which never changes
    /// once stored. A new id keeps the caller's `created`, or is stamped with
    /// the current time if none was given.
    ///
    /// Passing `None` fails with [`ApplicationError::InvalidArgument`] and
    /// leaves the store untouched.
    #[instrument(skip(self, document))]
    pub async fn save(
        &self,
        document: impl Into<Option<DocumentDraft>>,
    ) -> Result<Document, ApplicationError> {
        let Some(draft) = document.into() else {
            warn!("Save rejected: document is absent");
            return Err(ApplicationError::InvalidArgument(
                "document must not be null".to_string(),
            ));
        };

        let draft = match draft.given_id().cloned() {
            None => {
                let id = self.id_generator.generate();
                debug!(doc_id = %id, "Assigned generated id to new document");
                draft.with_id(id).with_created(self.clock.now())
            }
            Some(id) if draft.created.is_none() => {
                debug!(doc_id = %id, "No created timestamp supplied, stamping with current time");
                draft.with_created(self.clock.now())
            }
            Some(_) => draft,
        };

        let document = Document::try_from(draft)?;
        let stored = self.repository.upsert(document).await?;
        info!(doc_id = %stored.id(), created = %stored.created(), "Document saved");
        Ok(stored)
    }

    /// Returns every document matching all filters in the request, ordered
    /// by `created` then id. `None` is treated as the empty request.
    #[instrument(skip(self, request))]
    pub async fn search(
        &self,
        request: impl Into<Option<SearchRequest>>,
    ) -> Result<Vec<Document>, ApplicationError> {
        let request = request.into().unwrap_or_default();
        let documents = self.repository.search(&request).await?;
        info!(
            match_all = request.is_empty(),
            hits = documents.len(),
            "Search finished"
        );
        Ok(documents)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Document>, ApplicationError> {
        let document = self.repository.get(&DocumentId::from(id)).await?;
        if document.is_none() {
            debug!(doc_id = %id, "Document not found");
        }
        Ok(document)
    }

    pub async fn count(&self) -> Result<usize, ApplicationError> {
        self.repository.count().await
    }
}
