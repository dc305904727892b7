use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "blog_posts")]
#[schema(as = BlogPost)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub id: i32,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub author: String,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("valid regex"));

/// Builds a URL slug from a post title.
pub fn slugify(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");
    let dashed = WHITESPACE.replace_all(&stripped, "-");
    DASHES
        .replace_all(&dashed, "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugify_collapses_whitespace_and_punctuation() {
        assert_eq!(slugify("Eid Cattle Care: 5 Tips!"), "eid-cattle-care-5-tips");
        assert_eq!(slugify("  Feeding -- guide  "), "feeding-guide");
    }

    #[test]
    fn slugify_keeps_unicode_word_characters() {
        assert_eq!(slugify("গরু পালন"), "গরু-পালন");
    }
}
