//! Parser for `modDesc.xml`, the descriptor document shipped in every mod archive.
//!
//! The document is read into a small element tree first; field extraction then
//! walks the direct children of the `<modDesc>` root:
//!
//! ```xml
//! <modDesc descVersion="72">
//!     <author>Giants Software</author>
//!     <version>1.0.0.0</version>
//!     <title>
//!         <en>Large Silo</en>
//!         <de>Großes Silo</de>
//!     </title>
//!     <description>
//!         <en><![CDATA[A bigger silo.]]></en>
//!     </description>
//!     <iconFilename>icon_silo.dds</iconFilename>
//!     <multiplayer supported="true"/>
//! </modDesc>
//! ```

use crate::models::{DEFAULT_LANGUAGE, Descriptor};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::Read;
use thiserror::Error;

/// Name of the descriptor entry inside a mod archive.
pub const DESCRIPTOR_ENTRY: &str = "modDesc.xml";

const ROOT_ELEMENT: &str = "modDesc";

/// Reasons a descriptor document is rejected
#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("descriptor is not well-formed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("descriptor could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive contains no modDesc.xml")]
    NotInArchive,

    #[error("descriptor has no root element")]
    Empty,

    #[error("descriptor ended before <{0}> was closed")]
    Truncated(String),

    #[error("descriptor root is <{0}>, expected <modDesc>")]
    UnexpectedRoot(String),

    #[error("descriptor is missing <{0}>")]
    MissingElement(&'static str),

    #[error("<{0}> has no localized entries")]
    NoLocalizedEntries(&'static str),
}

#[derive(Debug)]
enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, DescriptorError> {
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            attributes,
            children: Vec::new(),
        })
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find_map(|node| match node {
            Node::Element(element) if element.name == name => Some(element),
            _ => None,
        })
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Concatenated text of this element and all its descendants.
    fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Element(element) => element.collect_text(out),
                Node::Text(text) => out.push_str(text),
            }
        }
    }
}

/// Parses descriptor documents, resolving localized fields against one language.
#[derive(Debug, Clone)]
pub struct DescriptorParser {
    language: String,
}

impl DescriptorParser {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Parse a descriptor from a reader, e.g. an archive entry.
    pub fn parse_reader<R: Read>(&self, mut reader: R) -> Result<Descriptor, DescriptorError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.parse(&bytes)
    }

    /// Parse a descriptor document.
    pub fn parse(&self, bytes: &[u8]) -> Result<Descriptor, DescriptorError> {
        let root = parse_tree(bytes)?;
        if root.name != ROOT_ELEMENT {
            return Err(DescriptorError::UnexpectedRoot(root.name));
        }

        let author = required_child(&root, "author")?.text();
        let version = required_child(&root, "version")?.text();
        let icon = required_child(&root, "iconFilename")?.text();

        // Titles are kept as written; descriptions lose surrounding whitespace.
        let title = self.localized(&root, "title")?;
        let description = self.localized(&root, "description")?.trim().to_string();

        let supports_multiplayer = root
            .child("multiplayer")
            .and_then(|element| element.attribute("supported"))
            .is_some_and(|value| value == "true");

        Ok(Descriptor {
            author,
            version,
            title,
            description,
            icon,
            supports_multiplayer,
        })
    }

    /// Preferred language, then `en`, then whatever comes first.
    fn localized(&self, root: &Element, name: &'static str) -> Result<String, DescriptorError> {
        let element = required_child(root, name)?;
        let entries: Vec<&Node> = element
            .children
            .iter()
            .filter(|node| match node {
                Node::Text(text) => !text.trim().is_empty(),
                Node::Element(_) => true,
            })
            .collect();

        let by_language = |language: &str| {
            entries.iter().find_map(|node| match node {
                Node::Element(entry) if entry.name == language => Some(entry.text()),
                _ => None,
            })
        };

        if let Some(text) = by_language(&self.language) {
            return Ok(text);
        }
        if let Some(text) = by_language(DEFAULT_LANGUAGE) {
            tracing::trace!(
                "<{}> has no '{}' entry, using '{}'",
                name,
                self.language,
                DEFAULT_LANGUAGE
            );
            return Ok(text);
        }

        match entries.first() {
            Some(Node::Element(entry)) => Ok(entry.text()),
            Some(Node::Text(text)) => Ok(text.clone()),
            None => Err(DescriptorError::NoLocalizedEntries(name)),
        }
    }
}

impl Default for DescriptorParser {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE)
    }
}

fn required_child<'a>(root: &'a Element, name: &'static str) -> Result<&'a Element, DescriptorError> {
    root.child(name).ok_or(DescriptorError::MissingElement(name))
}

/// Read the document into an element tree and return its first top-level element.
fn parse_tree(bytes: &[u8]) -> Result<Element, DescriptorError> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Element(element)),
                    None => return Ok(element),
                }
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(Node::Element(element)),
                        None => return Ok(element),
                    }
                }
            }
            Event::Text(text) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text(text.unescape()?.into_owned()));
                }
            }
            Event::CData(data) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    parent.children.push(Node::Text(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    match stack.into_iter().next() {
        Some(unclosed) => Err(DescriptorError::Truncated(unclosed.name)),
        None => Err(DescriptorError::Empty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="no" ?>
<modDesc descVersion="72">
    <author>Giants Software</author>
    <version>1.2.0.0</version>
    <title>
        <en>Large Silo</en>
        <de>Großes Silo</de>
    </title>
    <description>
        <en><![CDATA[
            A bigger silo.
        ]]></en>
        <fr>Un plus grand silo.</fr>
    </description>
    <iconFilename>icon_silo.dds</iconFilename>
    <multiplayer supported="true"/>
</modDesc>
"#;

    #[test]
    fn test_parse_full_descriptor() {
        let descriptor = DescriptorParser::new("en").parse(FULL.as_bytes()).unwrap();

        assert_eq!(descriptor.author, "Giants Software");
        assert_eq!(descriptor.version, "1.2.0.0");
        assert_eq!(descriptor.title, "Large Silo");
        assert_eq!(descriptor.description, "A bigger silo.");
        assert_eq!(descriptor.icon, "icon_silo.dds");
        assert!(descriptor.supports_multiplayer);
    }

    #[test]
    fn test_preferred_language_wins() {
        let descriptor = DescriptorParser::new("de").parse(FULL.as_bytes()).unwrap();
        assert_eq!(descriptor.title, "Großes Silo");
        // No German description, English is next in line
        assert_eq!(descriptor.description, "A bigger silo.");
    }

    #[test]
    fn test_first_entry_when_no_english() {
        let xml = r#"<modDesc>
            <author>a</author><version>1</version>
            <title>
                <pl>Silos</pl>
                <cz>Silo</cz>
            </title>
            <description><pl>  opis  </pl></description>
            <iconFilename>icon.dds</iconFilename>
        </modDesc>"#;

        let descriptor = DescriptorParser::new("fr").parse(xml.as_bytes()).unwrap();
        assert_eq!(descriptor.title, "Silos");
        assert_eq!(descriptor.description, "opis");
    }

    #[test]
    fn test_title_keeps_whitespace() {
        let xml = r#"<modDesc>
            <author>a</author><version>1</version>
            <title><en> Padded </en></title>
            <description><en> Padded </en></description>
            <iconFilename>icon.dds</iconFilename>
        </modDesc>"#;

        let descriptor = DescriptorParser::default().parse(xml.as_bytes()).unwrap();
        assert_eq!(descriptor.title, " Padded ");
        assert_eq!(descriptor.description, "Padded");
    }

    #[test]
    fn test_unlocalized_text_is_used() {
        let xml = r#"<modDesc>
            <author>a</author><version>1</version>
            <title>Plain title</title>
            <description>Plain description</description>
            <iconFilename>icon.dds</iconFilename>
        </modDesc>"#;

        let descriptor = DescriptorParser::default().parse(xml.as_bytes()).unwrap();
        assert_eq!(descriptor.title, "Plain title");
        assert_eq!(descriptor.description, "Plain description");
    }

    #[test]
    fn test_multiplayer_defaults_to_false() {
        let xml = r#"<modDesc>
            <author>a</author><version>1</version>
            <title><en>t</en></title>
            <description><en>d</en></description>
            <iconFilename>icon.dds</iconFilename>
        </modDesc>"#;
        let descriptor = DescriptorParser::default().parse(xml.as_bytes()).unwrap();
        assert!(!descriptor.supports_multiplayer);

        let xml = xml.replace("</iconFilename>", "</iconFilename><multiplayer supported=\"True\"/>");
        let descriptor = DescriptorParser::default().parse(xml.as_bytes()).unwrap();
        assert!(!descriptor.supports_multiplayer);
    }

    #[test]
    fn test_missing_author_is_rejected() {
        let xml = r#"<modDesc><version>1</version></modDesc>"#;
        let err = DescriptorParser::default().parse(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, DescriptorError::MissingElement("author")));
    }

    #[test]
    fn test_empty_title_is_rejected() {
        let xml = r#"<modDesc>
            <author>a</author><version>1</version>
            <title>
            </title>
            <description><en>d</en></description>
            <iconFilename>icon.dds</iconFilename>
        </modDesc>"#;
        let err = DescriptorParser::default().parse(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, DescriptorError::NoLocalizedEntries("title")));
    }

    #[test]
    fn test_wrong_root_is_rejected() {
        let err = DescriptorParser::default()
            .parse(b"<mod><author>a</author></mod>")
            .unwrap_err();
        assert!(matches!(err, DescriptorError::UnexpectedRoot(name) if name == "mod"));
    }

    #[test]
    fn test_broken_xml_is_rejected() {
        let parser = DescriptorParser::default();
        assert!(parser.parse(b"<modDesc><author>a</version></modDesc>").is_err());
        assert!(matches!(
            parser.parse(b"<modDesc><author>a</author>"),
            Err(DescriptorError::Truncated(_))
        ));
        assert!(matches!(parser.parse(b""), Err(DescriptorError::Empty)));
    }

    #[test]
    fn test_nested_author_is_not_a_direct_child() {
        let xml = r#"<modDesc><extra><author>a</author></extra><version>1</version></modDesc>"#;
        let err = DescriptorParser::default().parse(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, DescriptorError::MissingElement("author")));
    }
}
