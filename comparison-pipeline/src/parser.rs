use std::sync::Arc;

use minijinja::context;
use serde_json::Value;
use tracing::{info, warn};

use common::{
    error::AppError,
    utils::llm::{ChatModel, ChatRequest, ResponseSchema},
};

use crate::{
    prompts::{PromptRegistry, OUTPUT_REPAIR},
    schema::{comparison_schema, ComparisonResponse, SCHEMA_NAME, SCHEMA_VERSION},
};

/// Parses a raw completion into a [`ComparisonResponse`].
#[derive(Debug, Clone)]
pub struct ComparisonParser {
    schema: Value,
}

impl Default for ComparisonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ComparisonParser {
    pub fn new() -> Self {
        Self {
            schema: comparison_schema(),
        }
    }

    pub fn response_schema(&self) -> ResponseSchema {
        ResponseSchema {
            name: SCHEMA_NAME.to_string(),
            description: "Differences found between two document revisions".to_string(),
            schema: self.schema.clone(),
        }
    }

    pub fn format_instructions(&self) -> String {
        let schema = serde_json::to_string_pretty(&self.schema).unwrap_or_default();
        format!(
            "Respond with a single JSON object that conforms to the JSON schema below. \
             Set \"schema_version\" to {SCHEMA_VERSION}. Do not wrap the JSON in prose.\n\n{schema}"
        )
    }

    pub fn parse(&self, completion: &str) -> Result<ComparisonResponse, AppError> {
        let body = strip_code_fence(completion);

        let value: Value = serde_json::from_str(body)
            .map_err(|err| AppError::LLMParsing(format!("Completion is not valid JSON: {err}")))?;

        // A bare array of records is read as the current version.
        let value = match value {
            Value::Array(changes) => serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "changes": changes,
            }),
            other => other,
        };

        match value.get("schema_version").and_then(Value::as_u64) {
            Some(version) if version == u64::from(SCHEMA_VERSION) => {}
            Some(version) => {
                return Err(AppError::LLMParsing(format!(
                    "Unsupported schema_version {version}, expected {SCHEMA_VERSION}"
                )))
            }
            None => {
                return Err(AppError::LLMParsing(
                    "Missing integer field schema_version".to_string(),
                ))
            }
        }

        serde_json::from_value(value).map_err(|err| {
            AppError::LLMParsing(format!("Completion does not match the schema: {err}"))
        })
    }
}

fn strip_code_fence(completion: &str) -> &str {
    let trimmed = completion.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string, e.g. ```json
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

/// Wraps a [`ComparisonParser`] with one repair round-trip to the model.
pub struct FixingParser {
    parser: ComparisonParser,
    model: Arc<dyn ChatModel>,
    prompts: Arc<PromptRegistry>,
}

impl std::fmt::Debug for FixingParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixingParser")
            .field("model", &self.model.model_name())
            .finish_non_exhaustive()
    }
}

impl FixingParser {
    pub fn new(
        parser: ComparisonParser,
        model: Arc<dyn ChatModel>,
        prompts: Arc<PromptRegistry>,
    ) -> Self {
        Self {
            parser,
            model,
            prompts,
        }
    }

    pub fn parser(&self) -> &ComparisonParser {
        &self.parser
    }

    pub async fn parse(&self, completion: &str) -> Result<ComparisonResponse, AppError> {
        let first_error = match self.parser.parse(completion) {
            Ok(response) => return Ok(response),
            Err(err) => err,
        };

        warn!(error = %first_error, "Completion failed to parse, requesting repair");

        let prompt = self.prompts.render(
            OUTPUT_REPAIR,
            context! {
                format_instruction => self.parser.format_instructions(),
                completion => completion,
                error => first_error.to_string(),
            },
        )?;

        let request = ChatRequest::new(prompt).with_response_schema(self.parser.response_schema());
        let repaired = self.model.complete(request).await?;

        let response = self.parser.parse(&repaired)?;
        info!(changes = response.changes.len(), "Repaired completion parsed");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{schema::ChangeKind, test_support::ScriptedModel};

    const VALID: &str = r#"{"schema_version":1,"changes":[{"page":"1","change_type":"modified","description":"Fee raised"}]}"#;

    #[test]
    fn parses_plain_json() {
        let parsed = ComparisonParser::new().parse(VALID).expect("parse");

        assert_eq!(parsed.schema_version, 1);
        assert_eq!(parsed.changes.len(), 1);
        assert_eq!(parsed.changes[0].change_type, ChangeKind::Modified);
    }

    #[test]
    fn strips_markdown_fences() {
        let fenced = format!("```json\n{VALID}\n```");
        let parsed = ComparisonParser::new().parse(&fenced).expect("parse");

        assert_eq!(parsed.changes[0].description, "Fee raised");
    }

    #[test]
    fn bare_arrays_are_current_version() {
        let parsed = ComparisonParser::new()
            .parse(r#"[{"page":2,"change_type":"added","description":"New clause"}]"#)
            .expect("parse");

        assert_eq!(parsed.schema_version, SCHEMA_VERSION);
        assert_eq!(parsed.changes[0].page, "2");
    }

    #[test]
    fn rejects_other_schema_versions() {
        let err = ComparisonParser::new()
            .parse(r#"{"schema_version":2,"changes":[]}"#)
            .expect_err("version mismatch");

        assert!(matches!(err, AppError::LLMParsing(msg) if msg.contains("schema_version 2")));
    }

    #[test]
    fn rejects_records_outside_schema() {
        let err = ComparisonParser::new()
            .parse(r#"{"schema_version":1,"changes":[{"page":"1","change_type":"moved","description":"x"}]}"#)
            .expect_err("bad change type");

        assert!(matches!(err, AppError::LLMParsing(_)));
    }

    #[test]
    fn format_instructions_embed_schema() {
        let instructions = ComparisonParser::new().format_instructions();

        assert!(instructions.contains("\"change_type\""));
        assert!(instructions.contains("\"schema_version\" to 1"));
    }

    #[tokio::test]
    async fn valid_completion_skips_repair() {
        let model = Arc::new(ScriptedModel::new(Vec::new()));
        let fixing = FixingParser::new(
            ComparisonParser::new(),
            model.clone(),
            Arc::new(PromptRegistry::new().expect("prompts")),
        );

        fixing.parse(VALID).await.expect("parse");

        assert!(model.requests().is_empty());
    }

    #[tokio::test]
    async fn repairs_once_with_error_context() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(VALID.to_string())]));
        let fixing = FixingParser::new(
            ComparisonParser::new(),
            model.clone(),
            Arc::new(PromptRegistry::new().expect("prompts")),
        );

        let parsed = fixing.parse("Sure! Here are the changes").await.expect("repaired");

        assert_eq!(parsed.changes.len(), 1);
        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].prompt.contains("Sure! Here are the changes"));
        assert!(requests[0].prompt.contains("not valid JSON"));
    }

    #[tokio::test]
    async fn second_failure_is_final() {
        let model = Arc::new(ScriptedModel::new(vec![
            Ok("still not json".to_string()),
            Ok(VALID.to_string()),
        ]));
        let fixing = FixingParser::new(
            ComparisonParser::new(),
            model.clone(),
            Arc::new(PromptRegistry::new().expect("prompts")),
        );

        let err = fixing.parse("garbage").await.expect_err("no second repair");

        assert!(matches!(err, AppError::LLMParsing(_)));
        assert_eq!(model.requests().len(), 1);
    }
}
