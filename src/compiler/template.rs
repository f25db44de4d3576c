/*!
Fills the `$${Name}` placeholders of a source template with the text of the
slots produced by a compilation.
*/

use crate::compiler::registry::SlotMap;

const OPEN: &str = "$${";
const CLOSE: char = '}';

#[derive(Clone, Debug, PartialEq)]
pub enum TemplateError {
    /// The template refers to a slot which the compilation did not produce.
    UnknownPlaceholder(String),

    /// A placeholder is opened at the given byte offset but never closed.
    Unterminated(usize),
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use TemplateError::*;
        match self {
            UnknownPlaceholder(name) => write!(f, "Unknown template placeholder '{}'", name),
            Unterminated(offset) => write!(f, "Unterminated template placeholder at offset {}", offset),
        }
    }
}

/// Replaces every `$${Name}` in `template` with the text of slot `Name`.
/// Text outside of placeholders is copied as is.
pub fn substitute(template: &str, slots: &SlotMap) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + OPEN.len()..];
        let end = match after.find(CLOSE) {
            Some(end) => end,
            None => {
                let offset = template.len() - rest.len() + start;
                return Err(TemplateError::Unterminated(offset));
            }
        };

        let name = &after[..end];
        match slots.get(name) {
            Some(text) => out.push_str(text),
            None => return Err(TemplateError::UnknownPlaceholder(name.into())),
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}
