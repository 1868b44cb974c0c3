//! Namespace-aware XML document model for SAML assertions.
//!
//! The document is parsed once into an element tree; navigation uses two
//! primitives, [`XmlElement::first_matching_child`] and
//! [`XmlElement::next_matching_sibling`], both qualified by namespace URI and
//! local name.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use crate::validation::ValidationError;

const LENIENT_PADDING: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT_PADDING);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT_PADDING);

/// Decode a Base64 or Base64URL token envelope.
///
/// Line breaks and other ASCII whitespace are ignored.
pub fn decode_envelope(token: &str) -> Result<Vec<u8>, ValidationError> {
    let compact: String = token.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    STANDARD_LENIENT
        .decode(&compact)
        .or_else(|_| URL_SAFE_LENIENT.decode(&compact))
        .map_err(|_| ValidationError::InvalidEncoding)
}

#[derive(Debug)]
struct Node {
    namespace: Option<String>,
    local_name: String,
    attributes: Vec<(String, String)>,
    text: String,
    first_child: Option<usize>,
    last_child: Option<usize>,
    next_sibling: Option<usize>,
}

/// Parsed XML document.
#[derive(Debug)]
pub struct XmlDocument {
    nodes: Vec<Node>,
}

impl XmlDocument {
    /// Parse a UTF-8 XML document. Documents with a DOCTYPE are rejected.
    pub fn parse(bytes: &[u8]) -> Result<Self, ValidationError> {
        let xml = std::str::from_utf8(bytes).map_err(|e| invalid(format!("not UTF-8: {e}")))?;
        let mut reader = NsReader::from_str(xml);

        let mut nodes: Vec<Node> = Vec::new();
        let mut open: Vec<usize> = Vec::new();

        loop {
            let (resolved, event) = reader
                .read_resolved_event()
                .map_err(|e| invalid(e.to_string()))?;

            match event {
                Event::Start(start) => {
                    let index = push_node(&mut nodes, &open, resolved, &start)?;
                    open.push(index);
                }
                Event::Empty(start) => {
                    push_node(&mut nodes, &open, resolved, &start)?;
                }
                Event::End(_) => {
                    open.pop();
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| invalid(e.to_string()))?;
                    match open.last() {
                        Some(&index) => nodes[index].text.push_str(&text),
                        None if text.trim().is_empty() => {}
                        None => return Err(invalid("text outside the root element".to_string())),
                    }
                }
                Event::CData(data) => {
                    let data = std::str::from_utf8(&data)
                        .map_err(|e| invalid(format!("CDATA is not UTF-8: {e}")))?;
                    if let Some(&index) = open.last() {
                        nodes[index].text.push_str(data);
                    }
                }
                Event::DocType(_) => {
                    return Err(invalid("DOCTYPE is not allowed".to_string()));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !open.is_empty() {
            return Err(invalid("unexpected end of document".to_string()));
        }
        if nodes.is_empty() {
            return Err(invalid("document has no root element".to_string()));
        }

        Ok(Self { nodes })
    }

    /// Decode a Base64/Base64URL envelope and parse its XML payload.
    pub fn from_envelope(token: &str) -> Result<Self, ValidationError> {
        let bytes = decode_envelope(token)?;
        Self::parse(&bytes)
    }

    pub fn root(&self) -> XmlElement<'_> {
        XmlElement {
            document: self,
            index: 0,
        }
    }
}

fn invalid(message: String) -> ValidationError {
    ValidationError::InvalidFormat(format!("invalid SAML assertion: {message}"))
}

fn push_node(
    nodes: &mut Vec<Node>,
    open: &[usize],
    resolved: ResolveResult<'_>,
    start: &BytesStart<'_>,
) -> Result<usize, ValidationError> {
    let namespace = match resolved {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        ResolveResult::Unbound => None,
        ResolveResult::Unknown(prefix) => {
            return Err(invalid(format!(
                "unknown namespace prefix '{}'",
                String::from_utf8_lossy(&prefix)
            )));
        }
    };
    let local_name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| invalid(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        let value = attr.unescape_value().map_err(|e| invalid(e.to_string()))?;
        attributes.push((key, value.into_owned()));
    }

    let parent = match open.last() {
        Some(&parent) => Some(parent),
        None if nodes.is_empty() => None,
        None => return Err(invalid("multiple root elements".to_string())),
    };

    let index = nodes.len();
    nodes.push(Node {
        namespace,
        local_name,
        attributes,
        text: String::new(),
        first_child: None,
        last_child: None,
        next_sibling: None,
    });

    if let Some(parent) = parent {
        match nodes[parent].last_child {
            Some(previous) => nodes[previous].next_sibling = Some(index),
            None => nodes[parent].first_child = Some(index),
        }
        nodes[parent].last_child = Some(index);
    }

    Ok(index)
}

/// An element within an [`XmlDocument`].
#[derive(Debug, Clone, Copy)]
pub struct XmlElement<'a> {
    document: &'a XmlDocument,
    index: usize,
}

impl<'a> XmlElement<'a> {
    fn node(&self) -> &'a Node {
        &self.document.nodes[self.index]
    }

    fn at(&self, index: Option<usize>) -> Option<XmlElement<'a>> {
        index.map(|index| XmlElement {
            document: self.document,
            index,
        })
    }

    pub fn namespace(&self) -> Option<&'a str> {
        self.node().namespace.as_deref()
    }

    pub fn local_name(&self) -> &'a str {
        &self.node().local_name
    }

    /// Whether this element has the given namespace URI and local name.
    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.namespace() == Some(namespace) && self.local_name() == local_name
    }

    /// Value of an attribute by its (unprefixed) name.
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.node()
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Character data directly inside this element, trimmed.
    pub fn text(&self) -> &'a str {
        self.node().text.trim()
    }

    /// First child element with the given namespace URI and local name.
    pub fn first_matching_child(
        &self,
        namespace: &str,
        local_name: &str,
    ) -> Option<XmlElement<'a>> {
        let first = self.at(self.node().first_child)?;
        if first.is(namespace, local_name) {
            Some(first)
        } else {
            first.next_matching_sibling(namespace, local_name)
        }
    }

    /// Next following sibling with the given namespace URI and local name.
    pub fn next_matching_sibling(
        &self,
        namespace: &str,
        local_name: &str,
    ) -> Option<XmlElement<'a>> {
        let mut current = self.at(self.node().next_sibling);
        while let Some(element) = current {
            if element.is(namespace, local_name) {
                return Some(element);
            }
            current = element.at(element.node().next_sibling);
        }
        None
    }

    /// All child elements with the given namespace URI and local name, in
    /// document order.
    pub fn children(
        &self,
        namespace: &'a str,
        local_name: &'a str,
    ) -> impl Iterator<Item = XmlElement<'a>> + 'a {
        let first = self.first_matching_child(namespace, local_name);
        std::iter::successors(first, move |element| {
            element.next_matching_sibling(namespace, local_name)
        })
    }
}
