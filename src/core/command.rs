//! Embedded form-command extraction from agent text
//!
//! Agent utterances may carry a one-shot fill instruction of the shape
//! `{'field': 'project_name', 'value': 'Apollo'}`. This parser finds the
//! first such instruction, returns it, and strips it from the text that gets
//! displayed. It is a separate channel from guided fill: the instruction
//! names its own target field and does not touch the guided-fill cursor.

use once_cell::sync::Lazy;
use regex::Regex;

static FORM_COMMAND_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{'field':\s*'([^']+)',\s*'value':\s*'([^']+)'\}").unwrap());

/// A fill instruction extracted from agent text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormCommand {
    pub field: String,
    pub value: String,
}

/// Extract the first embedded form command from `text`, if any.
///
/// Returns the command together with the remaining display text (the matched
/// instruction removed, result trimmed). Text without a command is returned
/// unchanged.
pub fn extract_form_command(text: &str) -> (Option<FormCommand>, String) {
    let Some(caps) = FORM_COMMAND_REGEX.captures(text) else {
        return (None, text.to_string());
    };
    let Some(whole) = caps.get(0) else {
        return (None, text.to_string());
    };

    let command = FormCommand {
        field: caps[1].to_string(),
        value: caps[2].to_string(),
    };
    let cleaned = format!("{}{}", &text[..whole.start()], &text[whole.end()..]);
    (Some(command), cleaned.trim().to_string())
}
