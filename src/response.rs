// Response extraction: a parsed XML document queried by fixed path expressions

use crate::error::{QflowError, Result};
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

#[derive(Debug)]
enum Content {
    Element(usize),
    Text(String),
}

#[derive(Debug)]
struct Element {
    name: String,
    content: Vec<Content>,
    // one past the last descendant in document order
    subtree_end: usize,
}

/// Elements stored in document (pre-)order, so an element's descendants are
/// the contiguous range after it.
#[derive(Debug)]
pub struct Document {
    elements: Vec<Element>,
}

impl Document {
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut elements: Vec<Element> = Vec::new();
        let mut open: Vec<usize> = Vec::new();

        loop {
            let event = reader.read_event().map_err(|e| {
                QflowError::MalformedResponse(format!(
                    "XML error at position {}: {}",
                    reader.error_position(),
                    e
                ))
            })?;

            match event {
                Event::Start(e) => {
                    let id = open_element(&mut elements, &open, e.local_name().as_ref())?;
                    open.push(id);
                }
                Event::Empty(e) => {
                    open_element(&mut elements, &open, e.local_name().as_ref())?;
                }
                Event::End(_) => {
                    if let Some(id) = open.pop() {
                        elements[id].subtree_end = elements.len();
                    }
                }
                Event::Text(e) => {
                    let raw = utf8(&e)?;
                    let text = unescape(raw)
                        .map_err(|e| QflowError::MalformedResponse(e.to_string()))?;
                    append_text(&mut elements, &open, &text)?;
                }
                Event::CData(e) => {
                    let bytes = e.into_inner();
                    append_text(&mut elements, &open, utf8(&bytes)?)?;
                }
                Event::GeneralRef(e) => {
                    let resolved = match e
                        .resolve_char_ref()
                        .map_err(|e| QflowError::MalformedResponse(e.to_string()))?
                    {
                        Some(ch) => ch.to_string(),
                        None => {
                            let name = utf8(&e)?;
                            resolve_predefined_entity(name)
                                .ok_or_else(|| {
                                    QflowError::MalformedResponse(format!(
                                        "unknown entity &{};",
                                        name
                                    ))
                                })?
                                .to_string()
                        }
                    };
                    append_text(&mut elements, &open, &resolved)?;
                }
                Event::Eof => break,
                _ => (),
            }
        }

        if !open.is_empty() {
            return Err(QflowError::MalformedResponse(format!(
                "{} unclosed element(s) at end of document",
                open.len()
            )));
        }
        if elements.is_empty() {
            return Err(QflowError::MalformedResponse(
                "document has no root element".to_string(),
            ));
        }

        Ok(Self { elements })
    }

    pub fn root(&self) -> Node<'_> {
        Node {
            document: self,
            id: 0,
        }
    }

    /// Evaluates `path` and returns matching elements in document order.
    pub fn select(&self, path: &PathExpr) -> Vec<Node<'_>> {
        let mut context: Vec<usize> = Vec::new();

        for (index, step) in path.steps.iter().enumerate() {
            let mut matched: Vec<usize> = Vec::new();

            if index == 0 {
                match step.axis {
                    Axis::Child => matched.push(0),
                    Axis::Descendant => matched.extend(0..self.elements.len()),
                }
            } else {
                for &id in &context {
                    match step.axis {
                        Axis::Child => {
                            matched.extend(self.elements[id].content.iter().filter_map(
                                |content| match content {
                                    Content::Element(child) => Some(*child),
                                    Content::Text(_) => None,
                                },
                            ))
                        }
                        Axis::Descendant => {
                            matched.extend(id + 1..self.elements[id].subtree_end)
                        }
                    }
                }
            }

            matched.retain(|&id| step.matches(&self.elements[id].name));
            matched.sort_unstable();
            matched.dedup();
            context = matched;

            if context.is_empty() {
                break;
            }
        }

        context
            .into_iter()
            .map(|id| Node { document: self, id })
            .collect()
    }
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| QflowError::MalformedResponse(e.to_string()))
}

fn open_element(elements: &mut Vec<Element>, open: &[usize], name: &[u8]) -> Result<usize> {
    if open.is_empty() && !elements.is_empty() {
        return Err(QflowError::MalformedResponse(
            "multiple root elements".to_string(),
        ));
    }

    let id = elements.len();
    elements.push(Element {
        name: utf8(name)?.to_string(),
        content: Vec::new(),
        subtree_end: id + 1,
    });
    if let Some(&parent) = open.last() {
        elements[parent].content.push(Content::Element(id));
    }
    Ok(id)
}

fn append_text(elements: &mut [Element], open: &[usize], text: &str) -> Result<()> {
    match open.last() {
        Some(&parent) => {
            // adjacent text and entity events belong to one text node
            match elements[parent].content.last_mut() {
                Some(Content::Text(existing)) => existing.push_str(text),
                _ => elements[parent].content.push(Content::Text(text.to_string())),
            }
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(QflowError::MalformedResponse(
            "text outside the root element".to_string(),
        )),
    }
}

/// A matched element, borrowed from the document it was selected from.
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    document: &'a Document,
    id: usize,
}

impl<'a> Node<'a> {
    /// Local name, without any namespace prefix.
    pub fn name(&self) -> &'a str {
        &self.document.elements[self.id].name
    }

    /// Concatenated text of this element and all of its descendants.
    pub fn text_content(&self) -> String {
        let elements = &self.document.elements;
        let mut text = String::new();
        // explicit stack, nesting depth is controlled by the remote side
        let mut pending = vec![elements[self.id].content.iter()];

        loop {
            let Some(contents) = pending.last_mut() else {
                break;
            };
            match contents.next() {
                Some(Content::Text(value)) => text.push_str(value),
                Some(Content::Element(child)) => pending.push(elements[*child].content.iter()),
                None => {
                    pending.pop();
                }
            }
        }
        text
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        let document = self.document;
        document.elements[self.id]
            .content
            .iter()
            .filter_map(move |content| match content {
                Content::Element(id) => Some(Node { document, id: *id }),
                Content::Text(_) => None,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    axis: Axis,
    name: String,
}

impl Step {
    fn matches(&self, name: &str) -> bool {
        self.name == "*" || self.name == name
    }
}

/// An absolute location path such as `//GetResponse/GetResult/Id`: element
/// name steps joined by `/` (child) or `//` (descendant), `*` matching any
/// name. Prefixed step names match on their local part.
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    steps: Vec<Step>,
}

impl PathExpr {
    pub fn parse(expr: &str) -> Result<Self> {
        let invalid = |reason: &str| {
            QflowError::InvalidPathExpression(format!("{} ({})", expr, reason))
        };

        let mut steps = Vec::new();
        let mut rest = expr.trim();
        if rest.is_empty() {
            return Err(invalid("empty path"));
        }

        while !rest.is_empty() {
            let axis = if let Some(after) = rest.strip_prefix("//") {
                rest = after;
                Axis::Descendant
            } else if let Some(after) = rest.strip_prefix('/') {
                rest = after;
                Axis::Child
            } else {
                return Err(invalid("steps must be separated by '/'"));
            };

            let end = rest.find('/').unwrap_or(rest.len());
            let qualified = &rest[..end];
            rest = &rest[end..];

            let name = qualified
                .rsplit_once(':')
                .map_or(qualified, |(_, local)| local);
            let valid = name == "*"
                || (!name.is_empty()
                    && name
                        .chars()
                        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.')));
            if !valid {
                return Err(invalid("expected an element name"));
            }

            steps.push(Step {
                axis,
                name: name.to_string(),
            });
        }

        Ok(Self { steps })
    }
}

/// One parsed response, queried by path for the duration of a single call.
#[derive(Debug)]
pub struct ResponseWrapper {
    document: Document,
}

impl ResponseWrapper {
    pub fn parse(xml: &str) -> Result<Self> {
        Ok(Self {
            document: Document::parse(xml)?,
        })
    }

    /// String value of the first node matching `path`, or an empty string
    /// when nothing matches.
    pub fn get_string(&self, path: &str) -> Result<String> {
        Ok(self
            .get_node_list(path)?
            .first()
            .map(Node::text_content)
            .unwrap_or_default())
    }

    pub fn get_int(&self, path: &str) -> Result<i32> {
        let value = self.get_string(path)?;
        value.parse::<i32>().map_err(|_| {
            QflowError::MalformedResponse(format!(
                "expected an integer at {}, found {:?}",
                path, value
            ))
        })
    }

    pub fn get_node_list(&self, path: &str) -> Result<Vec<Node<'_>>> {
        let path = PathExpr::parse(path)?;
        Ok(self.document.select(&path))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}
