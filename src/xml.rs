//! Minimal element tree over `quick-xml` events.
//!
//! EC2 query API responses are small, so the whole document is loaded into an
//! owned tree and queried with slash-separated element paths such as
//! `instanceStatusSet/item`. Namespaces are ignored: elements are matched on
//! their local name.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{CheckError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = std::str::from_utf8(start.local_name().as_ref())
            .map_err(|e| CheckError::Xml(format!("element name is not valid UTF-8: {}", e)))?
            .to_string();

        Ok(Self {
            name,
            ..Self::default()
        })
    }

    /// First direct child with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All elements reachable from `self` by following `path` one level per segment
    pub fn find_all<'a>(&'a self, path: &str) -> Vec<&'a Element> {
        let mut current = vec![self];
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = current
                .into_iter()
                .flat_map(|el| el.children.iter().filter(move |c| c.name == segment))
                .collect();
        }
        current
    }

    /// First element matching `path`
    pub fn find(&self, path: &str) -> Option<&Element> {
        self.find_all(path).into_iter().next()
    }

    /// Text of the first element matching `path`, empty when absent
    pub fn text_at(&self, path: &str) -> &str {
        self.find(path).map(|el| el.text.as_str()).unwrap_or("")
    }
}

/// Parse a complete document and return its root element.
///
/// Text is kept byte-for-byte. Whitespace-only runs are dropped when they sit
/// between tags, and kept when they are the whole content of a leaf element.
///
/// Rejects mismatched or unclosed tags, documents without a root element,
/// multiple roots and non-whitespace text outside the root.
pub fn parse(input: &str) -> Result<Element> {
    let mut reader = Reader::from_str(input);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    // whitespace seen since the last tag, not yet known to be content
    let mut pending = String::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| CheckError::Xml(e.to_string()))?;

        match event {
            Event::Start(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err(CheckError::Xml("multiple root elements".to_string()));
                }
                pending.clear();
                stack.push(Element::from_start(&start)?);
            }
            Event::Empty(start) => {
                pending.clear();
                let element = Element::from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let mut element = stack
                    .pop()
                    .ok_or_else(|| CheckError::Xml("unexpected closing tag".to_string()))?;
                if element.children.is_empty() {
                    element.text.push_str(&pending);
                }
                pending.clear();
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| CheckError::Xml(e.to_string()))?;
                if text.trim().is_empty() {
                    pending.push_str(&text);
                    continue;
                }
                let Some(open) = stack.last_mut() else {
                    return Err(CheckError::Xml(
                        "text content outside of the root element".to_string(),
                    ));
                };
                open.text.push_str(&pending);
                open.text.push_str(&text);
                pending.clear();
            }
            Event::CData(data) => {
                let Some(open) = stack.last_mut() else {
                    return Err(CheckError::Xml(
                        "CDATA outside of the root element".to_string(),
                    ));
                };
                let data = std::str::from_utf8(&data).map_err(|e| {
                    CheckError::Xml(format!("CDATA section is not valid UTF-8: {}", e))
                })?;
                open.text.push_str(&pending);
                open.text.push_str(data);
                pending.clear();
            }
            Event::Eof => break,
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(CheckError::Xml(format!(
            "unexpected end of document, <{}> is not closed",
            open.name
        )));
    }

    root.ok_or_else(|| CheckError::Xml("document has no root element".to_string()))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }

    if root.is_some() {
        return Err(CheckError::Xml("multiple root elements".to_string()));
    }

    *root = Some(element);
    Ok(())
}
