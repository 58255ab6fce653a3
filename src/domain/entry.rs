use chrono::{DateTime, Utc};

/// One item of a fetched feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    /// Only set by sources that report a creation date; feed-rs does not.
    pub created: Option<DateTime<Utc>>,
}

impl Entry {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: Some(title.into()),
            link: None,
            author: None,
            description: None,
            published: None,
            updated: None,
            created: None,
        }
    }

    /// Key used for duplicate suppression: the feed-supplied id, or
    /// `title|link` when the feed has none.
    pub fn identity(&self) -> String {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!(
                "{}|{}",
                self.title.as_deref().unwrap_or(""),
                self.link.as_deref().unwrap_or("")
            ),
        }
    }

    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }

    pub fn with_link(mut self, link: Option<String>) -> Self {
        self.link = link;
        self
    }

    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_published(mut self, published: Option<DateTime<Utc>>) -> Self {
        self.published = published;
        self
    }

    pub fn with_updated(mut self, updated: Option<DateTime<Utc>>) -> Self {
        self.updated = updated;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_prefers_id() {
        let entry = Entry::new("Title")
            .with_id(Some("urn:1".to_string()))
            .with_link(Some("https://example.com/1".to_string()));

        assert_eq!(entry.identity(), "urn:1");
    }

    #[test]
    fn test_identity_falls_back_to_title_and_link() {
        let entry = Entry::new("Title").with_link(Some("https://example.com/1".to_string()));
        assert_eq!(entry.identity(), "Title|https://example.com/1");

        let empty_id = Entry::new("Title").with_id(Some(String::new()));
        assert_eq!(empty_id.identity(), "Title|");
    }
}
