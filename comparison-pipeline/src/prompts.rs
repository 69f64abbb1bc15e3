use minijinja::{Environment, Value};

use common::error::AppError;

pub const DOCUMENT_COMPARISON: &str = "document_comparison";
pub const OUTPUT_REPAIR: &str = "output_repair";

pub static DOCUMENT_COMPARISON_SYSTEM_MESSAGE: &str = "You are an assistant that compares revisions of the same document and reports every difference precisely. You always answer with JSON only.";

const DOCUMENT_COMPARISON_TEMPLATE: &str = r#"You will be provided with content from two PDF documents. Your tasks are as follows:

1. Compare the content of the two documents page by page.
2. Identify every difference and note the page number it appears on.
3. Classify each difference as added, removed, modified or unchanged.
4. If a page has no change, report it once with change_type "unchanged" and description "NO CHANGE".

Input documents:

{{ combined_docs }}

Your response should follow this format:

{{ format_instruction }}"#;

const OUTPUT_REPAIR_TEMPLATE: &str = r#"The completion below was supposed to satisfy these instructions:

{{ format_instruction }}

Completion:
--------------
{{ completion }}
--------------

Above, the completion did not satisfy the constraints given in the instructions.
Error:
--------------
{{ error }}
--------------

Please try again. Please only respond with an answer that satisfies the constraints laid out in the instructions."#;

/// Named prompt templates rendered with minijinja.
pub struct PromptRegistry {
    env: Environment<'static>,
}

impl std::fmt::Debug for PromptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRegistry").finish_non_exhaustive()
    }
}

impl PromptRegistry {
    pub fn new() -> Result<Self, AppError> {
        let mut env = Environment::new();
        env.add_template(DOCUMENT_COMPARISON, DOCUMENT_COMPARISON_TEMPLATE)?;
        env.add_template(OUTPUT_REPAIR, OUTPUT_REPAIR_TEMPLATE)?;
        Ok(Self { env })
    }

    pub fn render(&self, name: &str, ctx: Value) -> Result<String, AppError> {
        Ok(self.env.get_template(name)?.render(ctx)?)
    }
}
