use chrono::{DateTime, Utc}; // Creation timestamps
use serde::{Deserialize, Serialize}; // Value types are plain serializable data
use std::fmt;
use thiserror::Error; // For domain-specific errors

// --- Domain Errors ---
#[derive(Error, Debug, PartialEq)]
pub enum DomainError {
    #[error("Missing required field '{0}'")]
    MissingField(String),
}

// --- Document ID ---
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: String) -> Self {
        Self(id)
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}
impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id.to_string())
    }
}
impl From<DocumentId> for String {
    fn from(doc_id: DocumentId) -> Self {
        doc_id.0
    }
}
impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Author ---

/// The person or entity a document is attributed to.
///
/// Authors are embedded in documents by value; the store never checks that
/// author ids are unique.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: String,
    pub name: String,
}

impl Author {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

// --- Document Draft (input to save) ---

/// A document as handed to the store. Every field may be missing; the store
/// fills in `id` and `created` when they are absent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDraft {
    #[serde(default)]
    pub id: Option<DocumentId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

impl DocumentDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// The caller-supplied id, if any. An empty id counts as no id.
    pub fn given_id(&self) -> Option<&DocumentId> {
        self.id.as_ref().filter(|id| !id.is_empty())
    }

    pub fn with_id(mut self, id: impl Into<DocumentId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_author(mut self, author: Author) -> Self {
        self.author = Some(author);
        self
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }
}

impl From<Document> for DocumentDraft {
    fn from(document: Document) -> Self {
        Self {
            id: Some(document.id),
            title: document.title,
            content: document.content,
            author: document.author,
            created: Some(document.created),
        }
    }
}

// --- Stored Document ---

/// A document as held by the store: it always has an id and a creation time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", try_from = "DocumentDraft")]
pub struct Document {
    id: DocumentId,
    title: Option<String>,
    content: Option<String>,
    author: Option<Author>,
    created: DateTime<Utc>,
}

impl TryFrom<DocumentDraft> for Document {
    type Error = DomainError;

    fn try_from(draft: DocumentDraft) -> Result<Self, Self::Error> {
        let id = match draft.id {
            Some(id) if !id.is_empty() => id,
            _ => return Err(DomainError::MissingField("id".to_string())),
        };
        let created = draft
            .created
            .ok_or_else(|| DomainError::MissingField("created".to_string()))?;

        Ok(Self {
            id,
            title: draft.title,
            content: draft.content,
            author: draft.author,
            created,
        })
    }
}

impl Document {
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn author(&self) -> Option<&Author> {
        self.author.as_ref()
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Applies the upsert rule for an id that is already stored: every field
    /// comes from `self` except `created`, which stays the stored value.
    pub fn preserving_created(mut self, stored: &Document) -> Self {
        self.created = stored.created;
        self
    }
}

// --- Search Request ---

/// Filters for a document search.
///
/// Filters combine with AND; the alternatives inside one list combine with
/// OR. A `None` field is not applied. A present but empty list has no
/// alternative to satisfy and so matches nothing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub title_prefixes: Option<Vec<String>>,
    #[serde(default)]
    pub contains_contents: Option<Vec<String>>,
    #[serde(default)]
    pub author_ids: Option<Vec<String>>,
    #[serde(default)]
    pub created_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_to: Option<DateTime<Utc>>,
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no filter is set, i.e. the request matches every document.
    pub fn is_empty(&self) -> bool {
        self.title_prefixes.is_none()
            && self.contains_contents.is_none()
            && self.author_ids.is_none()
            && self.created_from.is_none()
            && self.created_to.is_none()
    }

    pub fn with_title_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.title_prefixes = Some(prefixes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_contains_contents<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contains_contents = Some(fragments.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_author_ids<I, S>(mut self, author_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.author_ids = Some(author_ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_created_from(mut self, from: DateTime<Utc>) -> Self {
        self.created_from = Some(from);
        self
    }

    pub fn with_created_to(mut self, to: DateTime<Utc>) -> Self {
        self.created_to = Some(to);
        self
    }

    /// Checks a document against every filter in the request.
    /// String comparisons are exact and case-sensitive; date bounds are inclusive.
    pub fn matches(&self, document: &Document) -> bool {
        matches_any(&self.title_prefixes, document.title(), |title, prefix| {
            title.starts_with(prefix)
        }) && matches_any(
            &self.contains_contents,
            document.content(),
            |content, fragment| content.contains(fragment),
        ) && matches_any(
            &self.author_ids,
            document.author().map(|author| author.id.as_str()),
            |author_id, wanted| author_id == wanted,
        ) && self
            .created_from
            .is_none_or(|from| document.created() >= from)
            && self.created_to.is_none_or(|to| document.created() <= to)
    }
}

/// An absent filter always matches. A present filter needs the document
/// field to exist and to satisfy at least one alternative.
fn matches_any(
    filter: &Option<Vec<String>>,
    value: Option<&str>,
    predicate: impl Fn(&str, &str) -> bool,
) -> bool {
    match filter {
        None => true,
        Some(alternatives) => value.is_some_and(|value| {
            alternatives
                .iter()
                .any(|alternative| predicate(value, alternative))
        }),
    }
}
