use crate::errors::ToolError;
use crate::utils::suggest::suggest;

pub fn unknown_tool_error<S: AsRef<str>>(tool: &str, known_tools: &[S]) -> ToolError {
    let mut err = ToolError::invalid_params(format!("Unknown tool: {}", tool));
    if known_tools.is_empty() {
        return err;
    }
    let known: Vec<&str> = known_tools.iter().map(AsRef::as_ref).collect();
    let suggestions = suggest(tool, &known, 1);
    err = err.with_hint(match suggestions.first() {
        Some(best) => format!("Did you mean: {}?", best),
        None => format!("Use one of: {}.", known.join(", ")),
    });
    err.with_details(serde_json::json!({ "known_tools": known }))
}
