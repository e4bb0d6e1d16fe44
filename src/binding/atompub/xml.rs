//! binding::atompub::xml
//!
//! Minimal namespace-aware XML tree over quick-xml.
//!
//! AtomPub responses are small documents that get queried by namespace and
//! local name, and some of them are posted back verbatim (move, addObject).
//! A tree keeps both cheap. Attributes are stored by local name only.

use std::collections::BTreeMap;

use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use crate::error::{CmisError, Result};

/// A node inside an element.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An element with its resolved namespace.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct XmlElement {
    pub ns: Option<String>,
    pub prefix: Option<String>,
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

fn malformed(err: impl std::fmt::Display) -> CmisError {
    CmisError::protocol(format!("malformed XML response: {}", err))
}

impl XmlElement {
    pub fn new(ns: &str, prefix: Option<&str>, name: &str) -> Self {
        Self {
            ns: Some(ns.to_string()),
            prefix: prefix.map(str::to_string),
            name: name.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Parse a document and return its root element.
    pub fn parse(bytes: &[u8]) -> Result<XmlElement> {
        let mut reader = NsReader::from_reader(bytes);
        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let (resolved, event) = reader.read_resolved_event_into(&mut buf).map_err(malformed)?;
            let ns = match resolved {
                ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
                _ => None,
            };
            match event {
                Event::Start(start) => {
                    stack.push(Self::from_start(ns, &start)?);
                }
                Event::Empty(start) => {
                    let element = Self::from_start(ns, &start)?;
                    Self::attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    let mut element = stack
                        .pop()
                        .ok_or_else(|| malformed("unbalanced end tag"))?;
                    element.drop_indentation();
                    Self::attach(&mut stack, &mut root, element);
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(malformed)?;
                    if let Some(top) = stack.last_mut() {
                        top.children.push(XmlNode::Text(text.into_owned()));
                    }
                }
                Event::CData(data) => {
                    if let Some(top) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                        top.children.push(XmlNode::Text(text));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(malformed("unexpected end of document"));
        }
        root.ok_or_else(|| malformed("empty document"))
    }

    fn from_start(ns: Option<String>, start: &quick_xml::events::BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let prefix = start
            .name()
            .prefix()
            .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned());
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(malformed)?;
            let key = attr.key.as_ref();
            if key == b"xmlns" || key.starts_with(b"xmlns:") {
                continue;
            }
            let local = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value().map_err(malformed)?.into_owned();
            attrs.push((local, value));
        }
        Ok(Self {
            ns,
            prefix,
            name,
            attrs,
            children: Vec::new(),
        })
    }

    /// Whitespace between child elements is layout; text-only elements keep
    /// every character.
    fn drop_indentation(&mut self) {
        if self.children.iter().any(|n| matches!(n, XmlNode::Element(_))) {
            self.children
                .retain(|n| !matches!(n, XmlNode::Text(t) if t.trim().is_empty()));
        }
    }

    fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(XmlNode::Element(element)),
            None => {
                if root.is_none() {
                    *root = Some(element);
                }
            }
        }
    }

    pub fn is(&self, ns: &str, name: &str) -> bool {
        self.name == name && self.ns.as_deref() == Some(ns)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Direct element children.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    pub fn child(&self, ns: &str, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.is(ns, name))
    }

    pub fn children_named<'a>(
        &'a self,
        ns: &'a str,
        name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements().filter(move |e| e.is(ns, name))
    }

    /// Matching elements below this one, in document order.
    pub fn descendants(&self, ns: &str, name: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        self.collect_descendants(ns, name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, ns: &str, name: &str, found: &mut Vec<&'a XmlElement>) {
        for child in self.elements() {
            if child.is(ns, name) {
                found.push(child);
            }
            child.collect_descendants(ns, name, found);
        }
    }

    /// First matching descendant.
    pub fn find(&self, ns: &str, name: &str) -> Option<&XmlElement> {
        self.elements().find_map(|child| {
            if child.is(ns, name) {
                Some(child)
            } else {
                child.find(ns, name)
            }
        })
    }

    /// Concatenated direct text content.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                XmlNode::Text(t) => Some(t.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    pub fn child_text(&self, ns: &str, name: &str) -> Option<String> {
        self.child(ns, name).map(|e| e.text().trim().to_string())
    }

    // Building.

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.push((name.to_string(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Serialize as a standalone document.
    pub fn to_xml(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
        self.write_into(&mut out, &BTreeMap::new());
        out
    }

    fn write_into(&self, out: &mut String, scope: &BTreeMap<Option<String>, Option<String>>) {
        let mut scope = scope.clone();
        let qname = match &self.prefix {
            Some(p) => format!("{}:{}", p, self.name),
            None => self.name.clone(),
        };
        out.push('<');
        out.push_str(&qname);

        let bound = scope.get(&self.prefix).cloned().flatten();
        if bound != self.ns {
            match (&self.prefix, &self.ns) {
                (Some(p), Some(ns)) => {
                    out.push_str(&format!(" xmlns:{}=\"{}\"", p, quick_xml::escape::escape(ns)));
                }
                (None, Some(ns)) => {
                    out.push_str(&format!(" xmlns=\"{}\"", quick_xml::escape::escape(ns)));
                }
                (None, None) => out.push_str(" xmlns=\"\""),
                (Some(_), None) => {}
            }
            scope.insert(self.prefix.clone(), self.ns.clone());
        }

        for (k, v) in &self.attrs {
            out.push_str(&format!(" {}=\"{}\"", k, quick_xml::escape::escape(v.as_str())));
        }

        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                XmlNode::Element(e) => e.write_into(out, &scope),
                XmlNode::Text(t) => out.push_str(&quick_xml::escape::escape(t.as_str())),
            }
        }
        out.push_str("</");
        out.push_str(&qname);
        out.push('>');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATOM: &str = "http://www.w3.org/2005/Atom";
    const CMIS: &str = "http://docs.oasis-open.org/ns/cmis/core/200908/";

    const DOC: &str = r#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:cmis="http://docs.oasis-open.org/ns/cmis/core/200908/">
  <link rel="next" href="http://h/next?a=1&amp;b=2"/>
  <entry><title>one &amp; two</title><cmis:value>1</cmis:value></entry>
  <entry><title><![CDATA[<raw>]]></title></entry>
</feed>"#;

    mod parse {
        use super::*;

        #[test]
        fn resolves_namespaces_and_entities() {
            let root = XmlElement::parse(DOC.as_bytes()).unwrap();
            assert!(root.is(ATOM, "feed"));

            let link = root.child(ATOM, "link").unwrap();
            assert_eq!(link.attr("href"), Some("http://h/next?a=1&b=2"));

            let entries = root.descendants(ATOM, "entry");
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[0].child_text(ATOM, "title").as_deref(), Some("one & two"));
            assert_eq!(entries[1].child_text(ATOM, "title").as_deref(), Some("<raw>"));

            let value = root.find(CMIS, "value").unwrap();
            assert_eq!(value.prefix.as_deref(), Some("cmis"));
            assert_eq!(value.text(), "1");
        }

        #[test]
        fn text_only_elements_keep_whitespace() {
            let xml = "<a xmlns:cmis=\"http://docs.oasis-open.org/ns/cmis/core/200908/\">\n  <cmis:value>  padded  </cmis:value>\n  <cmis:value>   </cmis:value>\n</a>";
            let root = XmlElement::parse(xml.as_bytes()).unwrap();
            let values: Vec<String> = root.elements().map(|v| v.text()).collect();
            assert_eq!(values, vec!["  padded  ", "   "]);
            assert!(root.text().is_empty());
        }

        #[test]
        fn rejects_garbage() {
            assert!(XmlElement::parse(b"").is_err());
            assert!(XmlElement::parse(b"<a><b></a>").is_err());
        }
    }

    mod write {
        use super::*;

        #[test]
        fn declares_namespaces_once() {
            let doc = XmlElement::new(ATOM, None, "entry").with_child(
                XmlElement::new(CMIS, Some("cmis"), "properties")
                    .with_child(XmlElement::new(CMIS, Some("cmis"), "value").with_text("a<b")),
            );
            let xml = doc.to_xml();
            assert!(xml.contains("<entry xmlns=\"http://www.w3.org/2005/Atom\">"));
            assert_eq!(xml.matches("xmlns:cmis=").count(), 1);
            assert!(xml.contains("<cmis:value>a&lt;b</cmis:value>"));
        }

        #[test]
        fn reparses_to_same_tree() {
            let root = XmlElement::parse(DOC.as_bytes()).unwrap();
            let again = XmlElement::parse(root.to_xml().as_bytes()).unwrap();
            assert_eq!(root, again);
        }
    }
}
