//! LLM-driven IoC extraction
//!
//! Treats the LLM as an external collaborator with a strict output
//! contract: a JSON response constrained by a schema. The provider behind
//! the session is not part of the core; tests script the session.

pub mod extractor;
pub mod llm;
pub mod prompt;
pub mod schema;

pub use extractor::{extracted_to_ioc, IocExtractor};
pub use llm::{GenerateRequest, LlmClient};
pub use prompt::render_prompt;
pub use schema::{response_schema, ExtractedIoc, ExtractionResponse};
