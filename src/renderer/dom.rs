//! Element model, selector matching and the live container
//!
//! The controller never walks a real DOM. Hosts describe the element an event
//! fired on as an [`Element`], and interception rules are [`SelectorList`]s
//! matched against it.

use crate::utils::ConfigError;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Snapshot of a DOM element: tag, id, classes and attributes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Tag name (e.g., "a", "form")
    pub tag_name: String,
    /// Element attributes, `id` and `class` included
    pub attributes: BTreeMap<String, String>,
}

impl Element {
    /// Create a new element
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_lowercase(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Get an attribute value
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Set an attribute value
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into().to_lowercase(), value.into());
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Get the ID attribute; an empty id counts as none
    pub fn id(&self) -> Option<&str> {
        self.get_attribute("id").filter(|id| !id.is_empty())
    }

    /// Get class names
    pub fn classes(&self) -> Vec<&str> {
        self.get_attribute("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    value: Option<String>,
}

/// One compound selector, e.g. `a.nav[target]`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct CompoundSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
}

impl CompoundSelector {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attrs.is_empty()
    }

    fn matches(&self, element: &Element) -> bool {
        if let Some(ref tag) = self.tag {
            if !tag.eq_ignore_ascii_case(&element.tag_name) {
                return false;
            }
        }

        if let Some(ref id) = self.id {
            if element.id() != Some(id.as_str()) {
                return false;
            }
        }

        let classes = element.classes();
        if !self.classes.iter().all(|c| classes.contains(&c.as_str())) {
            return false;
        }

        self.attrs.iter().all(|attr| match (&attr.value, element.get_attribute(&attr.name)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(expected), Some(actual)) => expected == actual,
        })
    }
}

/// Comma-separated list of compound selectors.
///
/// Supports tag names, `*`, `#id`, `.class`, `[attr]` and `[attr=value]`.
/// Combinators only keep their right-most compound, which is the part that has
/// to match the event target.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectorList {
    selectors: Vec<CompoundSelector>,
}

impl SelectorList {
    /// Parse a selector string
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let mut selectors = Vec::new();
        for part in input.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(ConfigError::InvalidSelector(input.to_string()));
            }
            selectors.push(parse_compound(part).ok_or_else(|| ConfigError::InvalidSelector(input.to_string()))?);
        }
        Ok(Self { selectors })
    }

    /// A list that matches nothing
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// True if any selector in the list matches `element`
    pub fn matches(&self, element: &Element) -> bool {
        self.selectors.iter().any(|s| s.matches(element))
    }
}

fn parse_compound(selector: &str) -> Option<CompoundSelector> {
    let mut compound = CompoundSelector::default();
    let mut current = String::new();
    let mut mode = 't'; // t=tag, #=id, .=class
    let mut chars = selector.chars().peekable();

    fn flush(compound: &mut CompoundSelector, mode: char, current: &mut String) {
        if current.is_empty() {
            return;
        }
        let value = std::mem::take(current);
        match mode {
            't' if value != "*" => compound.tag = Some(value.to_lowercase()),
            '#' => compound.id = Some(value),
            '.' => compound.classes.push(value),
            _ => {}
        }
    }

    while let Some(ch) = chars.next() {
        match ch {
            '#' | '.' => {
                flush(&mut compound, mode, &mut current);
                mode = ch;
            }
            '[' => {
                flush(&mut compound, mode, &mut current);
                let mut body = String::new();
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some(c) => body.push(c),
                        None => return None,
                    }
                }
                compound.attrs.push(parse_attr(&body)?);
                mode = 't';
            }
            ' ' | '>' | '+' | '~' => {
                // Only the last compound has to match the target element
                flush(&mut compound, mode, &mut current);
                while matches!(chars.peek(), Some(' ' | '>' | '+' | '~')) {
                    chars.next();
                }
                if chars.peek().is_some() {
                    compound = CompoundSelector::default();
                }
                mode = 't';
            }
            _ => current.push(ch),
        }
    }
    flush(&mut compound, mode, &mut current);

    if compound.is_empty() && selector.trim() != "*" {
        return None;
    }
    Some(compound)
}

fn parse_attr(body: &str) -> Option<AttrSelector> {
    let (name, value) = match body.split_once('=') {
        Some((name, value)) => {
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            (name.trim(), Some(value.to_string()))
        }
        None => (body.trim(), None),
    };
    if name.is_empty() {
        return None;
    }
    Some(AttrSelector {
        name: name.to_lowercase(),
        value,
    })
}

/// The container a controller is bound to.
///
/// Holds the live class list and inner HTML. Render hooks receive it by
/// reference and mutate it through interior mutability.
#[derive(Debug)]
pub struct Container {
    element: Element,
    classes: RwLock<Vec<String>>,
    html: RwLock<String>,
}

impl Container {
    pub fn new(element: Element) -> Self {
        let classes = element.classes().into_iter().map(String::from).collect();
        Self {
            element,
            classes: RwLock::new(classes),
            html: RwLock::new(String::new()),
        }
    }

    /// Builder-style initial content
    pub fn with_html(self, html: impl Into<String>) -> Self {
        self.set_html(html);
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.element.id()
    }

    pub fn tag_name(&self) -> &str {
        &self.element.tag_name
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn html(&self) -> String {
        self.html.read().map(|h| h.clone()).unwrap_or_default()
    }

    /// Replace the container's contents
    pub fn set_html(&self, html: impl Into<String>) {
        if let Ok(mut current) = self.html.write() {
            *current = html.into();
        }
    }

    pub fn classes(&self) -> Vec<String> {
        self.classes.read().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes
            .read()
            .map(|c| c.iter().any(|existing| existing == class))
            .unwrap_or(false)
    }

    pub fn add_class(&self, class: &str) {
        if let Ok(mut classes) = self.classes.write() {
            if !classes.iter().any(|c| c == class) {
                classes.push(class.to_string());
            }
        }
    }

    pub fn remove_class(&self, class: &str) {
        if let Ok(mut classes) = self.classes.write() {
            classes.retain(|c| c != class);
        }
    }

    /// Swap the whole class list, returning the previous one
    pub fn replace_classes(&self, new: Vec<String>) -> Vec<String> {
        match self.classes.write() {
            Ok(mut classes) => std::mem::replace(&mut *classes, new),
            Err(_) => Vec::new(),
        }
    }
}
