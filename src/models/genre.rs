use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::genres;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = genres)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Genre {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub featured_book_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = genres)]
pub struct NewGenre {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub featured_book_id: Option<Uuid>,
}

/// Derive a URL-safe slug from a genre title. Runs once at creation;
/// the stored slug is never regenerated on rename.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(slugify("Science Fiction"), "science-fiction");
    }

    #[test]
    fn collapses_punctuation_runs() {
        assert_eq!(slugify("Mystery & Thriller!"), "mystery-thriller");
    }

    #[test]
    fn trims_trailing_separators() {
        assert_eq!(slugify("Horror "), "horror");
    }
}
