// Request templates: parsing, sources and the per-process template cache

use crate::error::{QflowError, Result};
use dashmap::DashMap;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tracing::debug;

// `{{name}}` or `{{{name}}}`, both substituted verbatim
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{(\{?)\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*(\}?)\}\}")
        .expect("placeholder pattern is valid")
});

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment {
    Literal(String),
    Placeholder(String),
}

/// An immutable XML request skeleton, parsed once into literal text and
/// named placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    key: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(key: &str, source: &str) -> Result<Self> {
        let load_error = |reason: String| QflowError::TemplateLoad {
            key: key.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut cursor = 0;

        for captures in PLACEHOLDER.captures_iter(source) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            let opening = captures.get(1).map_or("", |m| m.as_str());
            let closing = captures.get(3).map_or("", |m| m.as_str());
            if opening.is_empty() != closing.is_empty() {
                return Err(load_error(format!(
                    "unbalanced braces at byte {}",
                    whole.start()
                )));
            }

            push_literal(&mut segments, &source[cursor..whole.start()], cursor)
                .map_err(load_error)?;
            segments.push(Segment::Placeholder(captures[2].to_string()));
            cursor = whole.end();
        }
        push_literal(&mut segments, &source[cursor..], cursor).map_err(load_error)?;

        Ok(Self {
            key: key.to_string(),
            segments,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Placeholder names in the order they appear, duplicates included.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub(crate) fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

fn push_literal(
    segments: &mut Vec<Segment>,
    text: &str,
    offset: usize,
) -> std::result::Result<(), String> {
    if let Some(position) = text.find("{{") {
        return Err(format!("malformed placeholder at byte {}", offset + position));
    }
    if !text.is_empty() {
        segments.push(Segment::Literal(text.to_string()));
    }
    Ok(())
}

// Where template text comes from
pub trait TemplateSource: Send + Sync {
    fn read(&self, key: &str) -> Result<String>;
}

/// Reads templates from files under a root directory, the key being the
/// file name relative to that root.
#[derive(Debug, Clone)]
pub struct DirectoryTemplateSource {
    root: PathBuf,
}

impl DirectoryTemplateSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TemplateSource for DirectoryTemplateSource {
    fn read(&self, key: &str) -> Result<String> {
        let relative = Path::new(key);
        let stays_inside = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if key.is_empty() || !stays_inside {
            return Err(QflowError::TemplateNotFound {
                key: key.to_string(),
            });
        }

        let bytes = match std::fs::read(self.root.join(relative)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(QflowError::TemplateNotFound {
                    key: key.to_string(),
                })
            }
            Err(e) => {
                return Err(QflowError::TemplateLoad {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        String::from_utf8(bytes).map_err(|e| QflowError::TemplateLoad {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryTemplateSource {
    templates: HashMap<String, String>,
}

impl InMemoryTemplateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, key: &str, text: &str) -> Self {
        self.templates.insert(key.to_string(), text.to_string());
        self
    }
}

impl TemplateSource for InMemoryTemplateSource {
    fn read(&self, key: &str) -> Result<String> {
        self.templates
            .get(key)
            .cloned()
            .ok_or_else(|| QflowError::TemplateNotFound {
                key: key.to_string(),
            })
    }
}

/// The request templates shipped with the crate.
pub fn bundled_templates() -> InMemoryTemplateSource {
    InMemoryTemplateSource::new()
        .with_template(
            "GetDynamicSuggestedSlots2.mustache",
            include_str!("../templates/GetDynamicSuggestedSlots2.mustache"),
        )
        .with_template(
            "GetUnit.mustache",
            include_str!("../templates/GetUnit.mustache"),
        )
        .with_template(
            "GetUnitLocalTime.mustache",
            include_str!("../templates/GetUnitLocalTime.mustache"),
        )
        .with_template(
            "SetAppointment.mustache",
            include_str!("../templates/SetAppointment.mustache"),
        )
}

// Loads each template once and hands out shared references afterwards
pub struct TemplateStore {
    source: Arc<dyn TemplateSource>,
    cache: DashMap<String, Arc<Template>>,
}

impl TemplateStore {
    pub fn new(source: Arc<dyn TemplateSource>) -> Self {
        Self {
            source,
            cache: DashMap::new(),
        }
    }

    pub fn load(&self, key: &str) -> Result<Arc<Template>> {
        if let Some(cached) = self.cache.get(key) {
            return Ok(Arc::clone(cached.value()));
        }

        let text = self.source.read(key)?;
        let template = Arc::new(Template::parse(key, &text)?);
        debug!(
            template = key,
            placeholders = template.placeholders().count(),
            "Loaded request template"
        );

        let entry = self.cache.entry(key.to_string()).or_insert(template);
        Ok(Arc::clone(entry.value()))
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}
