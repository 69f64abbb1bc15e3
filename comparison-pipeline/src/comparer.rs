use std::sync::Arc;

use minijinja::context;
use tracing::{debug, error, info};

use common::{
    error::AppError,
    utils::{
        llm::{ChatModel, ChatRequest},
        model_loader::ModelLoader,
    },
};

use crate::{
    parser::{ComparisonParser, FixingParser},
    prompts::{PromptRegistry, DOCUMENT_COMPARISON, DOCUMENT_COMPARISON_SYSTEM_MESSAGE},
    table::ComparisonTable,
};

pub struct DocumentComparer {
    model: Arc<dyn ChatModel>,
    prompts: Arc<PromptRegistry>,
    parser: FixingParser,
}

impl std::fmt::Debug for DocumentComparer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentComparer")
            .field("model", &self.model.model_name())
            .finish_non_exhaustive()
    }
}

impl DocumentComparer {
    /// Builds a comparer around the LLM currently selected by `LLM_PROVIDER`.
    pub fn new(loader: &ModelLoader) -> Result<Self, AppError> {
        let llm = loader.load_llm()?;
        info!(
            provider = %llm.provider(),
            model = llm.model_name(),
            "Comparison model loaded"
        );
        Self::with_model(Arc::new(llm))
    }

    pub fn with_model(model: Arc<dyn ChatModel>) -> Result<Self, AppError> {
        let prompts = Arc::new(PromptRegistry::new()?);
        let parser = FixingParser::new(ComparisonParser::new(), model.clone(), prompts.clone());

        Ok(Self {
            model,
            prompts,
            parser,
        })
    }

    /// Asks the model for the differences in a combined corpus and tabulates them.
    pub async fn compare(&self, combined_text: &str) -> Result<ComparisonTable, AppError> {
        let request = self.prepare_request(combined_text)?;
        debug!(prompt_chars = request.prompt.len(), "Prepared comparison request");

        let completion = self.model.complete(request).await.map_err(|err| {
            error!(error = %err, "Error comparing documents");
            AppError::comparison("Error comparing documents", err)
        })?;

        let response = self.parser.parse(&completion).await.map_err(|err| {
            error!(error = %err, "Error comparing documents");
            AppError::comparison("Error comparing documents", err)
        })?;

        let table = ComparisonTable::from_records(&response.changes).map_err(|err| {
            error!(error = %err, "Error formatting comparison");
            match err {
                AppError::Formatting(_) => err,
                other => AppError::Formatting(other.to_string()),
            }
        })?;

        info!(rows = table.rows.len(), "Documents compared");
        Ok(table)
    }

    fn prepare_request(&self, combined_text: &str) -> Result<ChatRequest, AppError> {
        let parser = self.parser.parser();
        let prompt = self.prompts.render(
            DOCUMENT_COMPARISON,
            context! {
                combined_docs => combined_text,
                format_instruction => parser.format_instructions(),
            },
        )?;

        Ok(ChatRequest::new(prompt)
            .with_system(DOCUMENT_COMPARISON_SYSTEM_MESSAGE)
            .with_response_schema(parser.response_schema()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedModel;

    const REPLY: &str = r#"{"schema_version":1,"changes":[
        {"page":"1","change_type":"modified","description":"Payment term 30 -> 45 days"},
        {"page":"2","change_type":"unchanged","description":"NO CHANGE"}
    ]}"#;

    fn comparer(replies: Vec<Result<String, AppError>>) -> (Arc<ScriptedModel>, DocumentComparer) {
        let model = Arc::new(ScriptedModel::new(replies));
        let comparer = DocumentComparer::with_model(model.clone()).expect("comparer");
        (model, comparer)
    }

    #[tokio::test]
    async fn single_round_trip_produces_table() {
        let (model, comparer) = comparer(vec![Ok(REPLY.to_string())]);

        let table = comparer
            .compare("Document: a.pdf\n --- Page 1 --- \n net 30")
            .await
            .expect("compare");

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0].as_deref(), Some("1"));

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].prompt.contains("Document: a.pdf"));
        assert!(requests[0].system.is_some());
        assert!(requests[0].response_schema.is_some());
    }

    #[tokio::test]
    async fn malformed_reply_is_repaired_once() {
        let (model, comparer) = comparer(vec![
            Ok("Here you go: not json".to_string()),
            Ok(REPLY.to_string()),
        ]);

        let table = comparer.compare("Document: a.pdf").await.expect("compare");

        assert_eq!(table.rows.len(), 2);
        assert_eq!(model.requests().len(), 2);
    }

    #[tokio::test]
    async fn model_failure_is_comparison_error() {
        let (_, comparer) = comparer(vec![Err(AppError::LLMParsing(
            "No content found in LLM response".into(),
        ))]);

        let err = comparer.compare("Document: a.pdf").await.expect_err("fails");

        assert!(matches!(err, AppError::Comparison { .. }));
    }

    #[tokio::test]
    async fn failed_repair_is_comparison_error() {
        let (model, comparer) = comparer(vec![Ok("nope".into()), Ok("still nope".into())]);

        let err = comparer.compare("Document: a.pdf").await.expect_err("fails");

        match err {
            AppError::Comparison { source, .. } => {
                assert!(matches!(*source, AppError::LLMParsing(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(model.requests().len(), 2);
    }

    #[tokio::test]
    async fn empty_change_list_gives_empty_table() {
        let (_, comparer) = comparer(vec![Ok(r#"{"schema_version":1,"changes":[]}"#.into())]);

        let table = comparer.compare("").await.expect("compare");

        assert!(table.is_empty());
        assert!(table.columns.is_empty());
    }
}
