//! Distribution configuration and its wire serialization

use crate::error::{Error, Result};
use crate::types::XML_NAMESPACE;
use crate::xml::{self, Element};
use chrono::Utc;
use std::fmt::Write as _;

/// Configuration of a CloudFront distribution
///
/// This is the only object callers build themselves; everything else is a
/// projection of server responses. A config serializes to the
/// `DistributionConfig` XML fragment used by create and update calls, with
/// the fixed element order Origin, CallerReference, CNAME*, Comment, Enabled.
///
/// # Example
///
/// ```
/// use cloudfront_client::DistributionConfig;
///
/// let config = DistributionConfig::new("bucket.s3.amazonaws.com")
///     .with_caller_reference("20090630120000")
///     .with_cname("cdn.example.com")
///     .with_comment("static assets")
///     .with_enabled(true);
///
/// let xml = config.to_xml().unwrap();
/// assert!(xml.contains("<Origin>bucket.s3.amazonaws.com</Origin>"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionConfig {
    origin: String,
    caller_reference: String,
    cnames: Vec<String>,
    comment: Option<String>,
    enabled: bool,
}

impl DistributionConfig {
    /// Create a config for the given origin bucket
    ///
    /// A caller reference is generated from the current UTC time. Pass an
    /// explicit one with [`with_caller_reference`](Self::with_caller_reference)
    /// when the idempotency token must survive retries across processes.
    #[must_use]
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            caller_reference: Utc::now().format("%Y%m%d%H%M%S").to_string(),
            cnames: Vec::new(),
            comment: None,
            enabled: false,
        }
    }

    /// Set the caller reference idempotency token
    #[must_use]
    pub fn with_caller_reference(mut self, caller_reference: impl Into<String>) -> Self {
        self.caller_reference = caller_reference.into();
        self
    }

    /// Add a CNAME alias
    #[must_use]
    pub fn with_cname(mut self, cname: impl Into<String>) -> Self {
        self.cnames.push(cname.into());
        self
    }

    /// Set the distribution comment
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Set whether the distribution accepts end-user requests
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The origin Amazon S3 bucket associated with this distribution
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Set the origin bucket
    pub fn set_origin(&mut self, origin: impl Into<String>) {
        self.origin = origin.into();
    }

    /// The caller reference idempotency token
    #[must_use]
    pub fn caller_reference(&self) -> &str {
        &self.caller_reference
    }

    /// CNAME aliases in insertion order
    #[must_use]
    pub fn cnames(&self) -> &[String] {
        &self.cnames
    }

    /// Add a CNAME alias
    pub fn add_cname(&mut self, cname: impl Into<String>) {
        self.cnames.push(cname.into());
    }

    /// Remove a CNAME alias by value; returns whether it was present
    pub fn remove_cname(&mut self, cname: &str) -> bool {
        let before = self.cnames.len();
        self.cnames.retain(|c| c != cname);
        self.cnames.len() != before
    }

    /// The distribution comment
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Set the distribution comment
    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = Some(comment.into());
    }

    /// Whether the distribution accepts end-user requests
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the distribution
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Rebuild a config from a parsed XML fragment
    ///
    /// Accepts both a `DistributionConfig` element and the inline field
    /// layout of a `DistributionSummary` node. A missing caller reference
    /// gets a generated one, matching construction.
    pub(crate) fn from_element(element: &Element) -> Self {
        let mut config = Self::new(element.child_text("Origin").unwrap_or_default());

        if let Some(reference) = element.child_text("CallerReference") {
            config.caller_reference = reference.to_string();
        }
        for cname in element.children_named("CNAME") {
            config.cnames.push(cname.text().to_string());
        }
        config.comment = element.child_text("Comment").map(ToString::to_string);
        config.enabled = element.child_text("Enabled") == Some("true");

        config
    }

    /// Serialize to the wire XML document for create and update requests
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingOrigin`] when the origin is empty; this runs
    /// before any network call is made.
    pub fn to_xml(&self) -> Result<String> {
        if self.origin.is_empty() {
            return Err(Error::MissingOrigin);
        }

        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = write!(out, "<DistributionConfig xmlns=\"{XML_NAMESPACE}\">");
        xml::write_text_element(&mut out, "Origin", &self.origin);
        xml::write_text_element(&mut out, "CallerReference", &self.caller_reference);
        for cname in &self.cnames {
            xml::write_text_element(&mut out, "CNAME", cname);
        }
        xml::write_text_element(&mut out, "Comment", self.comment.as_deref().unwrap_or(""));
        xml::write_text_element(&mut out, "Enabled", if self.enabled { "true" } else { "false" });
        out.push_str("</DistributionConfig>");

        Ok(out)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> DistributionConfig {
        DistributionConfig::new("bucket.s3.amazonaws.com")
            .with_caller_reference("20090630120000")
            .with_cname("a.example.com")
            .with_cname("b.example.com")
            .with_comment("static assets")
            .with_enabled(true)
    }

    #[test]
    fn test_to_xml_element_order() {
        let xml = sample().to_xml().unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <DistributionConfig xmlns=\"http://cloudfront.amazonaws.com/doc/2008-06-30/\">\
             <Origin>bucket.s3.amazonaws.com</Origin>\
             <CallerReference>20090630120000</CallerReference>\
             <CNAME>a.example.com</CNAME>\
             <CNAME>b.example.com</CNAME>\
             <Comment>static assets</Comment>\
             <Enabled>true</Enabled>\
             </DistributionConfig>"
        );
    }

    #[test]
    fn test_to_xml_requires_origin() {
        let config = DistributionConfig::new("");
        assert!(matches!(config.to_xml(), Err(Error::MissingOrigin)));
    }

    #[test]
    fn test_serialize_parse_round_trip() {
        let config = sample();
        let first = config.to_xml().unwrap();

        let root = crate::xml::parse(&first).unwrap();
        let reparsed = DistributionConfig::from_element(&root);
        let second = reparsed.to_xml().unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_round_trip_without_comment_or_cnames() {
        let config = DistributionConfig::new("bucket.s3.amazonaws.com")
            .with_caller_reference("ref-1");
        let first = config.to_xml().unwrap();
        assert!(first.contains("<Comment/>"));
        assert!(first.contains("<Enabled>false</Enabled>"));

        let root = crate::xml::parse(&first).unwrap();
        let second = DistributionConfig::from_element(&root).to_xml().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_from_element_generates_caller_reference() {
        let root = crate::xml::parse(
            "<DistributionConfig><Origin>o.s3.amazonaws.com</Origin><Enabled>false</Enabled></DistributionConfig>",
        )
        .unwrap();
        let config = DistributionConfig::from_element(&root);
        assert!(!config.caller_reference().is_empty());
        assert_eq!(config.caller_reference().len(), 14);
    }

    #[test]
    fn test_comment_escaping() {
        let config = DistributionConfig::new("o.s3.amazonaws.com")
            .with_caller_reference("r")
            .with_comment("assets & <media>");
        let xml = config.to_xml().unwrap();
        assert!(xml.contains("<Comment>assets &amp; &lt;media&gt;</Comment>"));

        let root = crate::xml::parse(&xml).unwrap();
        let reparsed = DistributionConfig::from_element(&root);
        assert_eq!(reparsed.comment(), Some("assets & <media>"));
    }

    #[test]
    fn test_cname_mutation() {
        let mut config = sample();
        assert!(config.remove_cname("a.example.com"));
        assert!(!config.remove_cname("a.example.com"));
        assert_eq!(config.cnames(), &["b.example.com".to_string()]);

        config.add_cname("c.example.com");
        assert_eq!(config.cnames().len(), 2);
    }

    #[test]
    fn test_new_generates_caller_reference() {
        let config = DistributionConfig::new("o.s3.amazonaws.com");
        // YYYYMMDDHHMMSS
        assert_eq!(config.caller_reference().len(), 14);
        assert!(config.caller_reference().chars().all(|c| c.is_ascii_digit()));
        assert!(!config.enabled());
    }
}
