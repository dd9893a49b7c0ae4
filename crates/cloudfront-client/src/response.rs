//! Typed dispatch of raw responses
//!
//! Every CloudFront response body is one of a closed set of XML documents.
//! [`dispatch`] turns a [`RawResponse`] into exactly one [`Outcome`] variant
//! or a typed error; unknown document roots are errors, never silently
//! ignored.

use crate::config::DistributionConfig;
use crate::distribution::{Distribution, DistributionList};
use crate::error::{Error, Result};
use crate::transport::RawResponse;
use crate::xml;
use tracing::trace;

/// The closed set of successful response shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A full distribution document, ETag attached when the header was present
    Distribution(Distribution),
    /// One page of distribution summaries
    DistributionList(DistributionList),
    /// A bare configuration document
    Config(DistributionConfig),
    /// A 2xx response with no body, carrying the `ETag` header if present
    Success(Option<String>),
}

impl Outcome {
    /// Short name of this outcome kind, for error reporting
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Distribution(_) => "Distribution",
            Self::DistributionList(_) => "DistributionList",
            Self::Config(_) => "DistributionConfig",
            Self::Success(_) => "Success",
        }
    }
}

/// Turn a raw response into a typed outcome or a typed error
pub fn dispatch(response: &RawResponse) -> Result<Outcome> {
    let status = response.status();
    let etag = response.header("ETag").map(ToString::to_string);

    // A 2xx with an empty body is a bare success marker
    if (200..300).contains(&status) && response.body().iter().all(u8::is_ascii_whitespace) {
        trace!("Empty {status} response, ETag {etag:?}");
        return Ok(Outcome::Success(etag));
    }

    let document = extract_document(response.body())?;
    let root = xml::parse(document)?;
    trace!("Dispatching on root element <{}>", root.name());

    match root.name() {
        "Distribution" => Ok(Outcome::Distribution(Distribution::from_element(
            &root, etag,
        )?)),
        "DistributionList" => Ok(Outcome::DistributionList(DistributionList::from_element(
            &root,
        )?)),
        "DistributionConfig" => Ok(Outcome::Config(DistributionConfig::from_element(&root))),
        "ErrorResponse" => {
            let error = root.child("Error");
            let code = error
                .and_then(|e| e.child_text("Code"))
                .unwrap_or_default()
                .to_string();
            let message = error
                .and_then(|e| e.child_text("Message"))
                .unwrap_or_default()
                .to_string();
            Err(Error::Api {
                code,
                message,
                status,
            })
        }
        other => Err(Error::UnexpectedDocument(other.to_string())),
    }
}

/// Extract the XML document from a response body
///
/// Greedy match from the first `<` that does not open an `<?...?>`
/// declaration through the last `>`; a body with no such span has no
/// document.
fn extract_document(body: &[u8]) -> Result<&str> {
    let text = std::str::from_utf8(body)
        .map_err(|e| Error::Xml(format!("response body is not valid UTF-8: {e}")))?;

    let mut offset = 0;
    let start = loop {
        let Some(open) = text[offset..].find('<') else {
            return Err(Error::XmlNotFound);
        };
        let open = offset + open;
        if text[open..].starts_with("<?") {
            let Some(end) = text[open..].find("?>") else {
                return Err(Error::XmlNotFound);
            };
            offset = open + end + 2;
        } else {
            break open;
        }
    };

    let end = text.rfind('>').ok_or(Error::XmlNotFound)?;
    if end < start {
        return Err(Error::XmlNotFound);
    }
    Ok(&text[start..=end])
}
