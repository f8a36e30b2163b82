// Placeholder substitution into request templates

use crate::error::{QflowError, Result};
use crate::template::{Segment, Template};
use std::collections::HashMap;

/// Placeholder name to substitution value, built fresh for every call.
pub type Parameters = HashMap<String, String>;

/// Substitutes every placeholder of `template` with its value from
/// `parameters`. Values are inserted verbatim; making them safe for an XML
/// text node is the caller's job.
pub fn render(template: &Template, parameters: &Parameters) -> Result<String> {
    let mut body = String::new();

    for segment in template.segments() {
        match segment {
            Segment::Literal(text) => body.push_str(text),
            Segment::Placeholder(name) => {
                let value = parameters
                    .get(name)
                    .ok_or_else(|| QflowError::MissingParameter {
                        template: template.key().to_string(),
                        name: name.clone(),
                    })?;
                body.push_str(value);
            }
        }
    }

    Ok(body)
}
