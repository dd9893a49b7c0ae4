//! Minimal XML element tree for the CloudFront wire schema
//!
//! The control plane speaks a small, fixed XML vocabulary: flat elements with
//! text content, one namespace attribute, and no mixed content that matters.
//! This module parses that subset into an [`Element`] tree and provides the
//! escaping needed to write it back out. Documents outside the subset
//! (unterminated tags, mismatched close tags, unknown entities) are parse
//! errors, never silently skipped.

use crate::error::{Error, Result};
use std::fmt::Write as _;

/// A parsed XML element: name, attributes, child elements, and text content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    /// Tag name of this element
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Concatenated character data directly inside this element
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Attributes in document order
    #[must_use]
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// All child elements in document order
    #[must_use]
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// First child element with the given tag name
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All child elements with the given tag name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text content of the first child with the given tag name
    #[must_use]
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(Element::text)
    }
}

/// Parse a single XML document into its root element
///
/// Leading XML declarations (`<?...?>`) and comments are skipped; anything
/// after the document element other than whitespace or comments is an error.
pub fn parse(input: &str) -> Result<Element> {
    let mut parser = Parser { input, pos: 0 };
    parser.skip_misc();
    let root = parser.parse_element()?;
    parser.skip_misc();
    if parser.pos < parser.input.len() {
        return Err(Error::Xml(
            "trailing content after document element".to_string(),
        ));
    }
    Ok(root)
}

/// Escape character data for use as XML text or attribute content
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Write `<name>text</name>`, or `<name/>` when the text is empty
pub(crate) fn write_text_element(out: &mut String, name: &str, text: &str) {
    if text.is_empty() {
        let _ = write!(out, "<{name}/>");
    } else {
        let _ = write!(out, "<{name}>{}</{name}>", escape(text));
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn rest(&self) -> &str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, prefix: &str) -> bool {
        if self.rest().starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    /// Skip whitespace, `<?...?>` declarations, and `<!--...-->` comments
    fn skip_misc(&mut self) {
        loop {
            self.skip_whitespace();
            if self.rest().starts_with("<?") {
                match self.rest().find("?>") {
                    Some(end) => self.pos += end + 2,
                    None => {
                        // Unterminated declaration; let parse_element report it
                        return;
                    }
                }
            } else if self.rest().starts_with("<!--") {
                match self.rest().find("-->") {
                    Some(end) => self.pos += end + 3,
                    None => return,
                }
            } else {
                return;
            }
        }
    }

    fn parse_element(&mut self) -> Result<Element> {
        if !self.eat("<") {
            return Err(Error::Xml(format!(
                "expected element start at offset {}",
                self.pos
            )));
        }
        let name = self.read_name()?;
        let (attributes, self_closing) = self.parse_attributes()?;

        let mut element = Element {
            name,
            attributes,
            children: Vec::new(),
            text: String::new(),
        };

        if self_closing {
            return Ok(element);
        }

        loop {
            self.read_text_into(&mut element.text)?;

            if self.eat("</") {
                let close = self.read_name()?;
                self.skip_whitespace();
                if !self.eat(">") {
                    return Err(Error::Xml(format!("unterminated close tag </{close}")));
                }
                if close != element.name {
                    return Err(Error::Xml(format!(
                        "mismatched close tag: expected </{}>, found </{close}>",
                        element.name
                    )));
                }
                return Ok(element);
            } else if self.rest().starts_with("<!--") {
                let Some(end) = self.rest().find("-->") else {
                    return Err(Error::Xml("unterminated comment".to_string()));
                };
                self.pos += end + 3;
            } else if self.eat("<![CDATA[") {
                let Some(end) = self.rest().find("]]>") else {
                    return Err(Error::Xml("unterminated CDATA section".to_string()));
                };
                element.text.push_str(&self.rest()[..end]);
                self.pos += end + 3;
            } else if self.peek() == Some(b'<') {
                element.children.push(self.parse_element()?);
            } else {
                return Err(Error::Xml(format!(
                    "unexpected end of document inside <{}>",
                    element.name
                )));
            }
        }
    }

    fn read_name(&mut self) -> Result<String> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || matches!(b, b':' | b'_' | b'-' | b'.') {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(Error::Xml(format!("expected name at offset {start}")));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_attributes(&mut self) -> Result<(Vec<(String, String)>, bool)> {
        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace();
            if self.eat("/>") {
                return Ok((attributes, true));
            }
            if self.eat(">") {
                return Ok((attributes, false));
            }
            if self.peek().is_none() {
                return Err(Error::Xml("unterminated start tag".to_string()));
            }

            let name = self.read_name()?;
            self.skip_whitespace();
            if !self.eat("=") {
                return Err(Error::Xml(format!("attribute {name} missing '='")));
            }
            self.skip_whitespace();
            let quote = match self.peek() {
                Some(q @ (b'"' | b'\'')) => {
                    self.pos += 1;
                    q as char
                }
                _ => {
                    return Err(Error::Xml(format!("attribute {name} value not quoted")));
                }
            };
            let Some(end) = self.rest().find(quote) else {
                return Err(Error::Xml(format!("attribute {name} value unterminated")));
            };
            let raw = &self.rest()[..end];
            let value = decode_entities(raw)?;
            self.pos += end + 1;
            attributes.push((name, value));
        }
    }

    /// Read character data up to the next markup, decoding entities
    fn read_text_into(&mut self, out: &mut String) -> Result<()> {
        let rest = self.rest();
        let end = rest.find('<').unwrap_or(rest.len());
        let chunk = &rest[..end];
        out.push_str(&decode_entities(chunk)?);
        self.pos += end;
        Ok(())
    }
}

fn decode_entities(raw: &str) -> Result<String> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let Some(semi) = rest.find(';') else {
            return Err(Error::Xml("unterminated entity reference".to_string()));
        };
        let entity = &rest[1..semi];
        match entity {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            _ => {
                // Numeric character references: &#nnn; and &#xhh;
                let decoded = entity
                    .strip_prefix("#x")
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| entity.strip_prefix('#').map(str::parse))
                    .and_then(std::result::Result::ok)
                    .and_then(char::from_u32);
                match decoded {
                    Some(c) => out.push(c),
                    None => {
                        return Err(Error::Xml(format!("unknown entity &{entity};")));
                    }
                }
            }
        }
        rest = &rest[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_document() {
        let doc = parse("<Distribution><Id>EDFDVBD6EXAMPLE</Id></Distribution>").unwrap();
        assert_eq!(doc.name(), "Distribution");
        assert_eq!(doc.child_text("Id"), Some("EDFDVBD6EXAMPLE"));
    }

    #[test]
    fn test_parse_skips_declaration_and_comments() {
        let doc = parse(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!-- generated -->\n<Root><A>1</A></Root>",
        )
        .unwrap();
        assert_eq!(doc.name(), "Root");
        assert_eq!(doc.child_text("A"), Some("1"));
    }

    #[test]
    fn test_parse_attributes() {
        let doc = parse(
            "<DistributionConfig xmlns=\"http://cloudfront.amazonaws.com/doc/2008-06-30/\"><Origin>bucket.s3.amazonaws.com</Origin></DistributionConfig>",
        )
        .unwrap();
        assert_eq!(
            doc.attributes(),
            &[(
                "xmlns".to_string(),
                "http://cloudfront.amazonaws.com/doc/2008-06-30/".to_string()
            )]
        );
    }

    #[test]
    fn test_parse_repeated_children_in_order() {
        let doc = parse("<C><CNAME>a.example.com</CNAME><CNAME>b.example.com</CNAME></C>").unwrap();
        let names: Vec<&str> = doc.children_named("CNAME").map(Element::text).collect();
        assert_eq!(names, vec!["a.example.com", "b.example.com"]);
    }

    #[test]
    fn test_parse_self_closing_and_empty() {
        let doc = parse("<L><NextMarker/><Marker></Marker></L>").unwrap();
        assert_eq!(doc.child_text("NextMarker"), Some(""));
        assert_eq!(doc.child_text("Marker"), Some(""));
    }

    #[test]
    fn test_entities_round_trip() {
        let doc = parse("<Comment>a &amp; b &lt;tag&gt; &#33; &#x21;</Comment>").unwrap();
        assert_eq!(doc.text(), "a & b <tag> ! !");
        assert_eq!(escape("a & b <tag>"), "a &amp; b &lt;tag&gt;");
    }

    #[test]
    fn test_cdata() {
        let doc = parse("<Comment><![CDATA[5 < 6 & 7 > 2]]></Comment>").unwrap();
        assert_eq!(doc.text(), "5 < 6 & 7 > 2");
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(parse("<A><B></A>"), Err(Error::Xml(_))));
        assert!(matches!(parse("<A>"), Err(Error::Xml(_))));
        assert!(matches!(parse("<A>&bogus;</A>"), Err(Error::Xml(_))));
        assert!(matches!(parse("<A></A><B></B>"), Err(Error::Xml(_))));
        assert!(matches!(parse("plain text"), Err(Error::Xml(_))));
    }

    #[test]
    fn test_write_text_element() {
        let mut out = String::new();
        write_text_element(&mut out, "Comment", "a & b");
        write_text_element(&mut out, "NextMarker", "");
        assert_eq!(out, "<Comment>a &amp; b</Comment><NextMarker/>");
    }
}
