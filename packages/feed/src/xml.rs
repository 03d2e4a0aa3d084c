//! XML document to dynamic value tree.
//!
//! The conversion follows the common "xml to dict" convention used by
//! RSS consumers:
//!
//! - attributes become `@name` keys
//! - an element with only text becomes a string
//! - an element with attributes or children keeps its text under `#text`
//! - a child element name that repeats becomes an array
//! - an empty element becomes `null`
//! - qualified names (`gdacs:population`) are kept verbatim
//!
//! The result is a single-key object `{root_name: value}`.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};

/// Errors from converting a document.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// The document is not well-formed.
    #[error("malformed XML: {message}")]
    Malformed {
        /// Description of what went wrong.
        message: String,
    },
}

impl XmlError {
    fn malformed(message: impl std::fmt::Display) -> Self {
        Self::Malformed {
            message: message.to_string(),
        }
    }
}

struct Frame {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self, XmlError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut children = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(XmlError::malformed)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(XmlError::malformed)?;
            children.insert(format!("@{key}"), Value::String(value.into_owned()));
        }
        Ok(Self {
            name,
            children,
            text: String::new(),
        })
    }

    fn push_text(&mut self, text: &str) {
        if !text.is_empty() {
            self.text.push_str(text);
        }
    }

    fn add_child(&mut self, name: String, value: Value) {
        match self.children.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.children.insert(name, value);
            }
        }
    }

    fn close(self) -> (String, Value) {
        let value = if self.children.is_empty() {
            if self.text.is_empty() {
                Value::Null
            } else {
                Value::String(self.text)
            }
        } else {
            let mut children = self.children;
            if !self.text.is_empty() {
                children.insert("#text".to_string(), Value::String(self.text));
            }
            Value::Object(children)
        };
        (self.name, value)
    }
}

/// Parses `xml` into a value tree.
///
/// # Errors
///
/// Returns [`XmlError::Malformed`] if the document is not well-formed,
/// has no root element, or ends with unclosed elements.
pub fn parse(xml: &str) -> Result<Value, XmlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        match reader.read_event().map_err(XmlError::malformed)? {
            Event::Start(ref e) => stack.push(Frame::open(e)?),
            Event::Empty(ref e) => {
                let (name, value) = Frame::open(e)?.close();
                attach(&mut stack, &mut root, name, value)?;
            }
            Event::Text(ref e) => {
                let text = e.unescape().map_err(XmlError::malformed)?;
                if let Some(frame) = stack.last_mut() {
                    frame.push_text(text.trim());
                }
            }
            Event::CData(ref e) => {
                if let Some(frame) = stack.last_mut() {
                    frame.push_text(String::from_utf8_lossy(e).trim());
                }
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| XmlError::malformed("unexpected closing tag"))?;
                let (name, value) = frame.close();
                attach(&mut stack, &mut root, name, value)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::malformed(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }

    let (name, value) = root.ok_or_else(|| XmlError::malformed("document has no root element"))?;
    let mut wrapper = Map::new();
    wrapper.insert(name, value);
    Ok(Value::Object(wrapper))
}

fn attach(
    stack: &mut [Frame],
    root: &mut Option<(String, Value)>,
    name: String,
    value: Value,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.add_child(name, value);
        return Ok(());
    }
    if root.is_some() {
        return Err(XmlError::malformed("multiple root elements"));
    }
    *root = Some((name, value));
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn text_only_elements_become_strings() {
        let tree = parse("<a><b>hello</b></a>").unwrap();
        assert_eq!(tree, json!({"a": {"b": "hello"}}));
    }

    #[test]
    fn attributes_and_text_mix() {
        let tree = parse(r#"<item><guid isPermaLink="false">EQ 1</guid></item>"#).unwrap();
        assert_eq!(
            tree,
            json!({"item": {"guid": {"@isPermaLink": "false", "#text": "EQ 1"}}})
        );
    }

    #[test]
    fn repeated_children_become_arrays() {
        let tree = parse("<c><item>1</item><item>2</item><item>3</item></c>").unwrap();
        assert_eq!(tree, json!({"c": {"item": ["1", "2", "3"]}}));
    }

    #[test]
    fn empty_elements_are_null() {
        let tree = parse("<c><a/><b></b></c>").unwrap();
        assert_eq!(tree, json!({"c": {"a": null, "b": null}}));
    }

    #[test]
    fn namespaced_names_are_kept() {
        let tree = parse(
            r#"<rss xmlns:gdacs="http://www.gdacs.org"><gdacs:population value="100">100 people</gdacs:population></rss>"#,
        )
        .unwrap();
        assert_eq!(
            tree["rss"]["gdacs:population"],
            json!({"@value": "100", "#text": "100 people"})
        );
        assert_eq!(tree["rss"]["@xmlns:gdacs"], json!("http://www.gdacs.org"));
    }

    #[test]
    fn entities_and_cdata_are_decoded() {
        let tree = parse("<a><b>x &amp; y</b><c><![CDATA[<p>hi</p>]]></c></a>").unwrap();
        assert_eq!(tree, json!({"a": {"b": "x & y", "c": "<p>hi</p>"}}));
    }

    #[test]
    fn malformed_documents_fail() {
        assert!(parse("<a><b></a>").is_err());
        assert!(parse("<a>").is_err());
        assert!(parse("").is_err());
    }
}
