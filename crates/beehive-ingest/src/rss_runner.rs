//! RSS article pipeline
//!
//! Fetches a blog feed, filters to articles not seen before, extracts IoCs
//! from each article's main content with the LLM session, embeds them and
//! upserts the batch. Per-article failures are counted and skipped; only
//! feed-level failures abort the run.

use std::sync::Arc;

use beehive_common::{Error, History, Ioc, Result, SourceKind, SourceState};
use beehive_extract::{extracted_to_ioc, IocExtractor, LlmClient};
use beehive_rss::{
    extract_main_content, fetch_and_parse, filter_new_articles, latest_article, Article,
    ArticleFetcher, HttpArticleFetcher,
};
use beehive_storage::Storage;
use beehive_vector::NgramVectorizer;
use chrono::Utc;
use tracing::{debug, warn};

use crate::runner::{load_state, persist_outcome};
use crate::source::RssSource;

/// Runs the RSS pipeline for one source.
pub struct RssRunner {
    storage: Arc<dyn Storage>,
    extractor: IocExtractor,
    article_fetcher: Arc<dyn ArticleFetcher>,
    vectorizer: NgramVectorizer,
    feed_client: reqwest::Client,
}

impl RssRunner {
    pub fn new(storage: Arc<dyn Storage>, llm: Arc<dyn LlmClient>) -> Result<Self> {
        Ok(Self {
            storage,
            extractor: IocExtractor::new(llm),
            article_fetcher: Arc::new(HttpArticleFetcher::new()?),
            vectorizer: NgramVectorizer::default(),
            feed_client: beehive_rss::feed_client()?,
        })
    }

    /// Substitute the article fetcher; tests script page contents.
    pub fn with_article_fetcher(mut self, fetcher: Arc<dyn ArticleFetcher>) -> Self {
        self.article_fetcher = fetcher;
        self
    }

    /// Fetch the feed and process everything new since the stored cursor.
    pub async fn run(&self, source_id: &str, source: &RssSource) -> Result<History> {
        let state = load_state(&self.storage, source_id).await?;
        let articles = fetch_and_parse(&self.feed_client, &source.url)
            .await
            .map_err(|e| e.with("source_id", source_id))?;
        self.process(source_id, source, state, articles).await
    }

    /// Steps after the feed fetch; split out so tests can inject articles.
    pub(crate) async fn process(
        &self,
        source_id: &str,
        source: &RssSource,
        mut state: SourceState,
        articles: Vec<Article>,
    ) -> Result<History> {
        let mut new_articles =
            filter_new_articles(articles, &state.last_item_id, state.last_item_date);
        if source.max_articles > 0 {
            new_articles.truncate(source.max_articles);
        }

        let mut history = History::begin(source_id, SourceKind::Rss);
        history.urls.push(source.url.clone());
        history.items_fetched = new_articles.len() as u64;

        let mut iocs: Vec<Ioc> = Vec::new();
        for article in &new_articles {
            history.urls.push(article.url.clone());
            if let Err(err) = self.process_article(source_id, article, &mut history, &mut iocs).await
            {
                history.record_error(&err);
            }
        }

        match self.storage.batch_upsert(iocs).await {
            Ok(batch) => {
                history.iocs_created += batch.created;
                history.iocs_updated += batch.updated;
                history.iocs_unchanged += batch.unchanged;
            }
            Err(err) => history.record_error(&err),
        }

        if let Some(latest) = latest_article(&new_articles) {
            state.last_item_id = latest.guid.clone();
            state.last_item_date = Some(latest.published);
        }
        state.item_count += new_articles.len() as u64;
        state.error_count += history.error_count;
        state.last_fetched_at = Some(Utc::now());

        history.finish();
        state.last_status = Some(history.status);
        state.last_error = history
            .errors
            .last()
            .map(|e| e.message.clone())
            .unwrap_or_default();

        persist_outcome(&self.storage, state, &history).await;
        if history.error_count > 0 {
            warn!(
                source_id,
                errors = history.error_count,
                status = %history.status,
                "RSS run finished with errors"
            );
        }
        Ok(history)
    }

    /// Fetch, extract and embed one article's IoCs into the accumulator.
    async fn process_article(
        &self,
        source_id: &str,
        article: &Article,
        history: &mut History,
        iocs: &mut Vec<Ioc>,
    ) -> Result<()> {
        let html = self
            .article_fetcher
            .fetch(&article.url)
            .await
            .map_err(|e| e.with("source_id", source_id))?;
        let content = extract_main_content(&html);

        let extracted = self
            .extractor
            .extract(&article.title, &content)
            .await
            .map_err(|e| e.with("source_id", source_id).with("url", &article.url))?;

        debug!(
            source_id,
            url = %article.url,
            count = extracted.len(),
            "article processed"
        );

        for item in &extracted {
            history.iocs_extracted += 1;
            let mut ioc = match extracted_to_ioc(
                item,
                source_id,
                &article.guid,
                &article.url,
                &article.title,
            ) {
                Ok(ioc) => ioc,
                Err(err) => {
                    history.record_error(&err);
                    continue;
                }
            };

            let text = format!("{} {}", ioc.value, ioc.description);
            match self.vectorizer.vectorize(&text) {
                Ok(embedding) => ioc.embedding = embedding,
                Err(err) => {
                    history.record_error(
                        &Error::validation(format!("vectorization failed: {err}"))
                            .with("source_id", source_id)
                            .with("value", &ioc.value),
                    );
                    continue;
                }
            }
            iocs.push(ioc);
        }

        Ok(())
    }
}
