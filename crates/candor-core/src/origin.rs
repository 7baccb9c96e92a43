//! Origin allow-list for browser-initiated requests.
//!
//! The Origin header is checked first. When it is absent (or not on the
//! list), the scheme and host of the Referer header are checked instead.

use std::fmt;
use std::str::FromStr;

use url::Url;

/// Origins trusted in production.
pub const PRODUCTION_ORIGINS: &[&str] =
    &["https://candorfiction.com", "https://www.candorfiction.com"];

/// Origins trusted everywhere else (staging and local Vite dev server).
pub const DEVELOPMENT_ORIGINS: &[&str] = &[
    "https://candorfiction-staging.doublenot.workers.dev",
    "https://staging.candorfiction.com",
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "https://localhost:5173",
];

/// Deployment environment tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Production,
    #[default]
    Development,
}

impl Environment {
    /// The allow-list that applies to this environment.
    pub fn allowed_origins(self) -> &'static [&'static str] {
        match self {
            Self::Production => PRODUCTION_ORIGINS,
            Self::Development => DEVELOPMENT_ORIGINS,
        }
    }
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    /// Only the exact tag `production` selects the production list.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "production" => Self::Production,
            _ => Self::Development,
        })
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => f.write_str("production"),
            Self::Development => f.write_str("development"),
        }
    }
}

/// Returns true iff the declared origin (or the referer's origin) is trusted.
pub fn is_valid_origin(origin: Option<&str>, referer: Option<&str>, env: Environment) -> bool {
    let allowed = env.allowed_origins();

    if origin.is_some_and(|o| allowed.contains(&o)) {
        return true;
    }

    match referer.and_then(referer_origin) {
        Some(referer_origin) => allowed.contains(&referer_origin.as_str()),
        None => false,
    }
}

/// `scheme://host[:port]` of a referer URL, or `None` if it does not parse.
fn referer_origin(referer: &str) -> Option<String> {
    let url = Url::parse(referer).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}
