//! Admin API version selection.
//!
//! The gateway pins one [`ApiVersion`] for every proxied resource call. The
//! default is `2024-10`, the version the install flow was released against.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Shopify Admin API version used in resource paths.
///
/// Shopify releases versions quarterly (January, April, July, October).
/// Known versions have their own variants; any other well-formed
/// `YYYY-MM` quarter parses as [`ApiVersion::Custom`].
///
/// # Example
///
/// ```rust
/// use shopify_app_gateway::ApiVersion;
///
/// assert_eq!(ApiVersion::default(), ApiVersion::V2024_10);
///
/// let version: ApiVersion = "2025-01".parse().unwrap();
/// assert_eq!(version.resource_path("products.json"), "/admin/api/2025-01/products.json");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    /// API version 2024-07 (July 2024)
    V2024_07,
    /// API version 2024-10 (October 2024)
    #[default]
    V2024_10,
    /// API version 2025-01 (January 2025)
    V2025_01,
    /// API version 2025-04 (April 2025)
    V2025_04,
    /// Unstable API version for development stores.
    Unstable,
    /// Any other quarterly release.
    Custom(String),
}

impl ApiVersion {
    /// Returns `true` if this is a known stable API version.
    #[must_use]
    pub const fn is_stable(&self) -> bool {
        !matches!(self, Self::Unstable | Self::Custom(_))
    }

    /// Builds the Admin API path of `resource` for this version.
    #[must_use]
    pub fn resource_path(&self, resource: &str) -> String {
        format!("/admin/api/{self}/{}", resource.trim_start_matches('/'))
    }

    fn is_valid_version_format(s: &str) -> bool {
        let Some((year, month)) = s.split_once('-') else {
            return false;
        };
        year.len() == 4
            && year.chars().all(|c| c.is_ascii_digit())
            && matches!(month, "01" | "04" | "07" | "10")
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let version_str = match self {
            Self::V2024_07 => "2024-07",
            Self::V2024_10 => "2024-10",
            Self::V2025_01 => "2025-01",
            Self::V2025_04 => "2025-04",
            Self::Unstable => "unstable",
            Self::Custom(s) => s,
        };
        f.write_str(version_str)
    }
}

impl FromStr for ApiVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();

        match s.as_str() {
            "2024-07" => Ok(Self::V2024_07),
            "2024-10" => Ok(Self::V2024_10),
            "2025-01" => Ok(Self::V2025_01),
            "2025-04" => Ok(Self::V2025_04),
            "unstable" => Ok(Self::Unstable),
            _ if Self::is_valid_version_format(&s) => Ok(Self::Custom(s)),
            _ => Err(ConfigError::InvalidApiVersion { version: s }),
        }
    }
}
