//! Distribution resources as projected from server responses

use crate::config::DistributionConfig;
use crate::error::Result;
use crate::types::DistributionStatus;
use crate::xml::Element;

/// A CloudFront distribution
///
/// Distributions are read-only projections of server responses, rebuilt in
/// full on every fetch. The one mutable piece of client-side state is the
/// ETag version token, which update and delete keep in sync with the server,
/// and the owned [`DistributionConfig`] a caller edits before an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    id: String,
    domain_name: String,
    last_modified_time: String,
    status: DistributionStatus,
    etag: Option<String>,
    config: DistributionConfig,
}

impl Distribution {
    /// Build a distribution from a `Distribution` or `DistributionSummary` element
    ///
    /// Full `Distribution` documents nest the config under a
    /// `DistributionConfig` child; summary nodes inline the config fields, so
    /// the node itself doubles as the config fragment.
    pub(crate) fn from_element(element: &Element, etag: Option<String>) -> Result<Self> {
        let config = match element.child("DistributionConfig") {
            Some(nested) => DistributionConfig::from_element(nested),
            None => DistributionConfig::from_element(element),
        };

        Ok(Self {
            id: element.child_text("Id").unwrap_or_default().to_string(),
            domain_name: element
                .child_text("DomainName")
                .unwrap_or_default()
                .to_string(),
            last_modified_time: element
                .child_text("LastModifiedTime")
                .unwrap_or_default()
                .to_string(),
            status: element.child_text("Status").unwrap_or_default().parse()?,
            etag,
            config,
        })
    }

    /// Server-assigned distribution ID
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The `*.cloudfront.net` domain name serving this distribution
    #[must_use]
    pub fn domain_name(&self) -> &str {
        &self.domain_name
    }

    /// Timestamp of the last configuration change, as reported by the server
    #[must_use]
    pub fn last_modified_time(&self) -> &str {
        &self.last_modified_time
    }

    /// Current lifecycle status
    #[must_use]
    pub fn status(&self) -> DistributionStatus {
        self.status
    }

    /// Opaque version token for optimistic-concurrency control
    ///
    /// `None` for entries built from a `DistributionList` page; fetch the
    /// distribution by id to obtain one before mutating.
    #[must_use]
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// Replace the cached version token
    pub fn set_etag(&mut self, etag: impl Into<String>) {
        self.etag = Some(etag.into());
    }

    /// The distribution's configuration
    #[must_use]
    pub fn config(&self) -> &DistributionConfig {
        &self.config
    }

    /// Mutable access to the configuration, for edit-then-update flows
    pub fn config_mut(&mut self) -> &mut DistributionConfig {
        &mut self.config
    }
}

/// One page of distribution summaries
///
/// Pages carry the pagination cursor that produced them; when
/// [`is_truncated`](Self::is_truncated) is true, pass
/// [`next_marker`](Self::next_marker) as the marker of the next list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionList {
    marker: Option<String>,
    max_items: Option<u32>,
    next_marker: Option<String>,
    is_truncated: bool,
    distributions: Vec<Distribution>,
}

impl DistributionList {
    /// Build a page from a `DistributionList` element
    pub(crate) fn from_element(element: &Element) -> Result<Self> {
        let distributions = element
            .children_named("DistributionSummary")
            .map(|summary| Distribution::from_element(summary, None))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            marker: element.child_text("Marker").map(ToString::to_string),
            max_items: element
                .child_text("MaxItems")
                .and_then(|value| value.parse().ok()),
            next_marker: element.child_text("NextMarker").map(ToString::to_string),
            is_truncated: element.child_text("IsTruncated") == Some("true"),
            distributions,
        })
    }

    /// The `Marker` request parameter this page answers
    #[must_use]
    pub fn marker(&self) -> Option<&str> {
        self.marker.as_deref()
    }

    /// The `MaxItems` request parameter this page answers
    #[must_use]
    pub fn max_items(&self) -> Option<u32> {
        self.max_items
    }

    /// Marker value to continue listing with, when truncated
    #[must_use]
    pub fn next_marker(&self) -> Option<&str> {
        self.next_marker.as_deref()
    }

    /// Whether more distributions remain beyond this page
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.is_truncated
    }

    /// The distribution summaries on this page
    #[must_use]
    pub fn distributions(&self) -> &[Distribution] {
        &self.distributions
    }

    /// Number of entries on this page
    #[must_use]
    pub fn len(&self) -> usize {
        self.distributions.len()
    }

    /// Whether this page is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.distributions.is_empty()
    }

    /// Iterate over the entries on this page
    pub fn iter(&self) -> std::slice::Iter<'_, Distribution> {
        self.distributions.iter()
    }
}

impl<'a> IntoIterator for &'a DistributionList {
    type Item = &'a Distribution;
    type IntoIter = std::slice::Iter<'a, Distribution>;

    fn into_iter(self) -> Self::IntoIter {
        self.distributions.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::xml;
    use pretty_assertions::assert_eq;

    const DISTRIBUTION_DOC: &str = "\
<Distribution xmlns=\"http://cloudfront.amazonaws.com/doc/2008-06-30/\">\
<Id>EDFDVBD6EXAMPLE</Id>\
<Status>Deployed</Status>\
<LastModifiedTime>2009-06-30T12:00:00Z</LastModifiedTime>\
<DomainName>d111111abcdef8.cloudfront.net</DomainName>\
<DistributionConfig>\
<Origin>bucket.s3.amazonaws.com</Origin>\
<CallerReference>20090630120000</CallerReference>\
<CNAME>cdn.example.com</CNAME>\
<Comment>static assets</Comment>\
<Enabled>true</Enabled>\
</DistributionConfig>\
</Distribution>";

    #[test]
    fn test_distribution_from_element() {
        let root = xml::parse(DISTRIBUTION_DOC).unwrap();
        let dist = Distribution::from_element(&root, Some("E2QWRUHAPOMQZL".to_string())).unwrap();

        assert_eq!(dist.id(), "EDFDVBD6EXAMPLE");
        assert_eq!(dist.status(), DistributionStatus::Deployed);
        assert_eq!(dist.domain_name(), "d111111abcdef8.cloudfront.net");
        assert_eq!(dist.last_modified_time(), "2009-06-30T12:00:00Z");
        assert_eq!(dist.etag(), Some("E2QWRUHAPOMQZL"));
        assert_eq!(dist.config().origin(), "bucket.s3.amazonaws.com");
        assert_eq!(dist.config().cnames(), &["cdn.example.com".to_string()]);
        assert!(dist.config().enabled());
    }

    #[test]
    fn test_distribution_unknown_status() {
        let root = xml::parse(
            "<Distribution><Id>X</Id><Status>Vanished</Status><DistributionConfig><Origin>o</Origin><Enabled>false</Enabled></DistributionConfig></Distribution>",
        )
        .unwrap();
        let err = Distribution::from_element(&root, None).unwrap_err();
        assert!(matches!(err, crate::Error::UnknownStatus(s) if s == "Vanished"));
    }

    #[test]
    fn test_list_from_element() {
        let root = xml::parse(
            "<DistributionList>\
             <Marker>EDFDVBD6EXAMPLE</Marker>\
             <MaxItems>2</MaxItems>\
             <NextMarker>E9LHASXEXAMPLE</NextMarker>\
             <IsTruncated>true</IsTruncated>\
             <DistributionSummary>\
             <Id>EDFDVBD6EXAMPLE</Id>\
             <Status>Deployed</Status>\
             <LastModifiedTime>2009-06-30T12:00:00Z</LastModifiedTime>\
             <DomainName>d111111abcdef8.cloudfront.net</DomainName>\
             <Origin>one.s3.amazonaws.com</Origin>\
             <CNAME>cdn.example.com</CNAME>\
             <Comment/>\
             <Enabled>true</Enabled>\
             </DistributionSummary>\
             <DistributionSummary>\
             <Id>E9LHASXEXAMPLE</Id>\
             <Status>InProgress</Status>\
             <LastModifiedTime>2009-06-30T13:00:00Z</LastModifiedTime>\
             <DomainName>d222222abcdef8.cloudfront.net</DomainName>\
             <Origin>two.s3.amazonaws.com</Origin>\
             <Comment/>\
             <Enabled>false</Enabled>\
             </DistributionSummary>\
             </DistributionList>",
        )
        .unwrap();

        let list = DistributionList::from_element(&root).unwrap();
        assert_eq!(list.marker(), Some("EDFDVBD6EXAMPLE"));
        assert_eq!(list.max_items(), Some(2));
        assert_eq!(list.next_marker(), Some("E9LHASXEXAMPLE"));
        assert!(list.is_truncated());
        assert_eq!(list.len(), 2);

        // Summary entries inline their config fields and carry no ETag
        let first = &list.distributions()[0];
        assert_eq!(first.config().origin(), "one.s3.amazonaws.com");
        assert_eq!(first.etag(), None);

        let statuses: Vec<_> = list.iter().map(Distribution::status).collect();
        assert_eq!(
            statuses,
            vec![DistributionStatus::Deployed, DistributionStatus::InProgress]
        );
    }

    #[test]
    fn test_list_empty_page() {
        let root = xml::parse(
            "<DistributionList><MaxItems>100</MaxItems><IsTruncated>false</IsTruncated></DistributionList>",
        )
        .unwrap();
        let list = DistributionList::from_element(&root).unwrap();
        assert!(list.is_empty());
        assert!(!list.is_truncated());
        assert_eq!(list.marker(), None);
        assert_eq!(list.next_marker(), None);
    }
}
