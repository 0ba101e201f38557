//! In-memory filtering and sorting for content lists.

use super::model::{Post, PublishStatus, Resource};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Ordering applied by [`ContentFilter::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Title,
}

/// Fields the list filter needs from a content item.
pub trait Listable {
    fn id(&self) -> &str;
    fn title(&self) -> &str;
    /// Extra text searched besides the title
    fn body(&self) -> Option<&str>;
    fn status(&self) -> PublishStatus;
    fn category_id(&self) -> Option<&str>;
    fn created_at(&self) -> DateTime<Utc>;
}

impl Listable for Post {
    fn id(&self) -> &str {
        &self.id
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn body(&self) -> Option<&str> {
        self.excerpt.as_deref()
    }
    fn status(&self) -> PublishStatus {
        self.status
    }
    fn category_id(&self) -> Option<&str> {
        self.category_id.as_deref()
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Listable for Resource {
    fn id(&self) -> &str {
        &self.id
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn body(&self) -> Option<&str> {
        self.description.as_deref()
    }
    fn status(&self) -> PublishStatus {
        self.status
    }
    fn category_id(&self) -> Option<&str> {
        self.category_id.as_deref()
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Search, facet and sort options for a content list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFilter {
    /// Case-insensitive substring of title or body
    pub search: Option<String>,
    pub category_id: Option<String>,
    pub tag_id: Option<String>,
    pub status: Option<PublishStatus>,
    pub sort: SortOrder,
}

impl ContentFilter {
    pub fn published() -> Self {
        Self {
            status: Some(PublishStatus::Published),
            ..Self::default()
        }
    }

    /// Filters and sorts `items`.
    ///
    /// `tags` maps item id to its tag ids; it is only consulted when
    /// `tag_id` is set.
    pub fn apply<T: Listable>(&self, items: Vec<T>, tags: &HashMap<String, Vec<String>>) -> Vec<T> {
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut out: Vec<T> = items
            .into_iter()
            .filter(|item| self.status.is_none_or(|status| item.status() == status))
            .filter(|item| {
                self.category_id
                    .as_deref()
                    .is_none_or(|category| item.category_id() == Some(category))
            })
            .filter(|item| {
                self.tag_id.as_deref().is_none_or(|tag| {
                    tags.get(item.id())
                        .is_some_and(|ids| ids.iter().any(|id| id == tag))
                })
            })
            .filter(|item| {
                needle.as_deref().is_none_or(|needle| {
                    item.title().to_lowercase().contains(needle)
                        || item
                            .body()
                            .is_some_and(|body| body.to_lowercase().contains(needle))
                })
            })
            .collect();

        match self.sort {
            SortOrder::Newest => out.sort_by(|a, b| b.created_at().cmp(&a.created_at())),
            SortOrder::Oldest => out.sort_by_key(|item| item.created_at()),
            SortOrder::Title => {
                out.sort_by(|a, b| a.title().to_lowercase().cmp(&b.title().to_lowercase()))
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post(id: &str, title: &str, status: PublishStatus, day: u32) -> Post {
        let at = Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap();
        Post {
            id: id.to_string(),
            title: title.to_string(),
            slug: id.to_string(),
            excerpt: Some(format!("about {}", title)),
            content: String::new(),
            cover_image_url: None,
            status,
            category_id: if id == "p1" { Some("rust".into()) } else { None },
            author_id: None,
            published_at: None,
            created_at: at,
            updated_at: at,
        }
    }

    fn sample() -> Vec<Post> {
        vec![
            post("p1", "Borrowing", PublishStatus::Published, 1),
            post("p2", "async traits", PublishStatus::Published, 3),
            post("p3", "Drafty", PublishStatus::Draft, 2),
        ]
    }

    fn ids(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_published_newest_first() {
        let out = ContentFilter::published().apply(sample(), &HashMap::new());
        assert_eq!(ids(&out), vec!["p2", "p1"]);
    }

    #[test]
    fn test_search_matches_body_case_insensitively() {
        let filter = ContentFilter {
            search: Some("ABOUT drafty".into()),
            ..ContentFilter::default()
        };
        assert_eq!(ids(&filter.apply(sample(), &HashMap::new())), vec!["p3"]);
    }

    #[test]
    fn test_category_and_tag_facets() {
        let by_category = ContentFilter {
            category_id: Some("rust".into()),
            ..ContentFilter::default()
        };
        assert_eq!(ids(&by_category.apply(sample(), &HashMap::new())), vec!["p1"]);

        let mut tags = HashMap::new();
        tags.insert("p3".to_string(), vec!["t1".to_string()]);
        let by_tag = ContentFilter {
            tag_id: Some("t1".into()),
            ..ContentFilter::default()
        };
        assert_eq!(ids(&by_tag.apply(sample(), &tags)), vec!["p3"]);
    }

    #[test]
    fn test_title_sort_ignores_case() {
        let filter = ContentFilter {
            sort: SortOrder::Title,
            ..ContentFilter::default()
        };
        assert_eq!(ids(&filter.apply(sample(), &HashMap::new())), vec!["p2", "p1", "p3"]);
    }
}
