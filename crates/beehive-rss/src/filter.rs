//! Incremental article filtering against the per-source cursor

use chrono::{DateTime, Utc};

use crate::feed::Article;

/// Select the articles that are new since the last run.
///
/// Walks the feed-ordered list; an article whose GUID equals the stored
/// `last_item_id` is the stop marker (exclusive). When `last_item_date` is
/// known, an article is included only if it was published strictly after it.
/// With no stored cursor at all, every article is new.
pub fn filter_new_articles(
    articles: Vec<Article>,
    last_item_id: &str,
    last_item_date: Option<DateTime<Utc>>,
) -> Vec<Article> {
    if last_item_id.is_empty() && last_item_date.is_none() {
        return articles;
    }

    let mut selected = Vec::new();
    for article in articles {
        if !last_item_id.is_empty() && article.guid == last_item_id {
            break;
        }
        match last_item_date {
            Some(cursor) if article.published <= cursor => continue,
            _ => selected.push(article),
        }
    }
    selected
}

/// The article with the greatest publish time; becomes the new cursor.
pub fn latest_article(articles: &[Article]) -> Option<&Article> {
    articles.iter().max_by_key(|a| a.published)
}
