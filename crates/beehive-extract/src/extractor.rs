//! Extraction session driver and IoC conversion

use std::sync::Arc;

use beehive_common::{
    context_key, generate_id, identity::ContextParams, normalize, Error, Ioc, IocStatus, IocType,
    Result, SourceKind, EMBEDDING_DIM,
};
use chrono::Utc;
use tracing::debug;

use crate::llm::{GenerateRequest, LlmClient};
use crate::prompt::render_prompt;
use crate::schema::{response_schema, ExtractedIoc, ExtractionResponse};

/// Runs extraction sessions against a configured LLM client.
pub struct IocExtractor {
    client: Arc<dyn LlmClient>,
}

impl IocExtractor {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Extract IoCs from one article. Failures are scoped to the article;
    /// the caller decides whether to continue the run.
    pub async fn extract(&self, title: &str, content: &str) -> Result<Vec<ExtractedIoc>> {
        let request = GenerateRequest {
            prompt: render_prompt(title, content),
            content_type: "application/json",
            response_schema: response_schema(),
        };

        let body = self.client.generate(&request).await?;
        if body.trim().is_empty() {
            return Err(Error::extraction("empty LLM response").with("title", title));
        }

        let response: ExtractionResponse = serde_json::from_str(&body).map_err(|e| {
            Error::extraction(format!("response does not match schema: {e}"))
                .with("title", title)
        })?;

        debug!(title, count = response.iocs.len(), "extracted IoCs");
        Ok(response.iocs)
    }
}

/// Convert one extraction into an IoC record for the article's source.
///
/// The embedding is allocated zero-filled at the configured dimension and
/// replaced by the vectorizer before upsert.
pub fn extracted_to_ioc(
    extracted: &ExtractedIoc,
    source_id: &str,
    article_guid: &str,
    article_url: &str,
    article_title: &str,
) -> Result<Ioc> {
    let ioc_type: IocType = extracted.ioc_type.parse()?;
    let value = normalize(ioc_type, &extracted.value);

    let mut params = ContextParams::new();
    params.insert("article_guid".to_string(), article_guid.to_string());
    params.insert("article_url".to_string(), article_url.to_string());
    let key = context_key(SourceKind::Rss.as_str(), &params);

    let now = Utc::now();
    Ok(Ioc {
        id: generate_id(source_id, ioc_type, &value, &key),
        source_id: source_id.to_string(),
        source_kind: SourceKind::Rss,
        ioc_type,
        value,
        description: extracted.description.clone(),
        source_url: article_url.to_string(),
        context: article_title.to_string(),
        embedding: vec![0.0; EMBEDDING_DIM],
        status: IocStatus::Active,
        first_seen: now,
        updated_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct ScriptedLlm {
        body: String,
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn generate(&self, request: &GenerateRequest) -> Result<String> {
            assert_eq!(request.content_type, "application/json");
            assert!(request.response_schema.is_object());
            Ok(self.body.clone())
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn generate(&self, _request: &GenerateRequest) -> Result<String> {
            Err(Error::extraction("model unavailable"))
        }
    }

    #[tokio::test]
    async fn test_extract_parses_scripted_response() {
        let body = r#"{"iocs":[
            {"type":"domain","value":"evil.example.com","description":"C2 domain"},
            {"type":"sha256","value":"ABCDEF","description":"payload hash"}
        ]}"#;
        let extractor = IocExtractor::new(Arc::new(ScriptedLlm {
            body: body.to_string(),
        }));

        let iocs = extractor.extract("campaign", "content").await.unwrap();
        assert_eq!(iocs.len(), 2);
        assert_eq!(iocs[0].ioc_type, "domain");
    }

    #[tokio::test]
    async fn test_empty_response_is_an_extraction_error() {
        let extractor = IocExtractor::new(Arc::new(ScriptedLlm {
            body: "  ".to_string(),
        }));
        assert!(extractor.extract("t", "c").await.is_err());
    }

    #[tokio::test]
    async fn test_non_json_response_is_an_extraction_error() {
        let extractor = IocExtractor::new(Arc::new(ScriptedLlm {
            body: "no indicators found".to_string(),
        }));
        assert!(extractor.extract("t", "c").await.is_err());
    }

    #[tokio::test]
    async fn test_llm_failure_propagates() {
        let extractor = IocExtractor::new(Arc::new(FailingLlm));
        assert!(extractor.extract("t", "c").await.is_err());
    }

    #[test]
    fn test_conversion_to_ioc() {
        let extracted = ExtractedIoc {
            ioc_type: "domain".to_string(),
            value: "Evil.Example.COM".to_string(),
            description: "C2 domain".to_string(),
        };

        let ioc = extracted_to_ioc(
            &extracted,
            "blog1",
            "guid-1",
            "https://blog.example/post",
            "Campaign writeup",
        )
        .unwrap();

        assert_eq!(ioc.ioc_type, IocType::Domain);
        assert_eq!(ioc.value, "evil.example.com");
        assert_eq!(ioc.status, IocStatus::Active);
        assert_eq!(ioc.embedding.len(), EMBEDDING_DIM);
        assert!(ioc.embedding.iter().all(|x| *x == 0.0));

        // same article, same value: same identity
        let again = extracted_to_ioc(
            &extracted,
            "blog1",
            "guid-1",
            "https://blog.example/post",
            "Campaign writeup",
        )
        .unwrap();
        assert_eq!(ioc.id, again.id);

        // different article GUID: different identity
        let other = extracted_to_ioc(
            &extracted,
            "blog1",
            "guid-2",
            "https://blog.example/post2",
            "Other writeup",
        )
        .unwrap();
        assert_ne!(ioc.id, other.id);
    }

    #[test]
    fn test_unknown_type_is_a_conversion_error() {
        let extracted = ExtractedIoc {
            ioc_type: "yara".to_string(),
            value: "x".to_string(),
            description: "d".to_string(),
        };
        assert!(extracted_to_ioc(&extracted, "s", "g", "u", "t").is_err());
    }
}
