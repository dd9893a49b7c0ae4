//! Shared constants and type definitions for the CloudFront client

use std::fmt;

/// Version of the CloudFront API this client speaks
pub const API_VERSION: &str = "2008-06-30";

/// Path of the distribution collection resource
pub const DISTRIBUTION_URI: &str = "/2008-06-30/distribution";

/// Host domain for CloudFront control-plane requests
pub const CLOUDFRONT_HOST: &str = "cloudfront.amazonaws.com";

/// Standard HTTPS port used by the control plane
pub const CLOUDFRONT_PORT: u16 = 443;

/// Namespace URI for CloudFront XML documents
pub const XML_NAMESPACE: &str = "http://cloudfront.amazonaws.com/doc/2008-06-30/";

/// Lifecycle status of a distribution
///
/// A distribution is `InProgress` while the service propagates a change and
/// `Deployed` once the configuration is live everywhere. Deletes are refused
/// while a distribution is still in progress.
///
/// # Example
///
/// ```
/// use cloudfront_client::DistributionStatus;
///
/// let status: DistributionStatus = "Deployed".parse().unwrap();
/// assert_eq!(status, DistributionStatus::Deployed);
/// assert_eq!(status.as_str(), "Deployed");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistributionStatus {
    /// Configuration is propagated and live
    Deployed,
    /// A change is still propagating
    InProgress,
}

impl DistributionStatus {
    /// Get the status as the wire string
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deployed => "Deployed",
            Self::InProgress => "InProgress",
        }
    }
}

impl fmt::Display for DistributionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DistributionStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Deployed" => Ok(Self::Deployed),
            "InProgress" => Ok(Self::InProgress),
            _ => Err(crate::error::Error::UnknownStatus(s.to_string())),
        }
    }
}
