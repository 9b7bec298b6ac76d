use tracing::{debug, warn};
use url::{Host, Url};

use crate::allow_list::AllowList;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    /// No destination, or an empty one.
    Missing,
    /// Not an absolute URL.
    InvalidFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid { url: Url },
    Malformed(Malformed),
    Unauthorized { host: String },
}

#[derive(Debug, Clone)]
pub struct RedirectGuard {
    allow_list: AllowList,
}

impl RedirectGuard {
    pub fn new(allow_list: AllowList) -> Self {
        Self { allow_list }
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    /// Decides whether `destination` is safe to redirect a browser to.
    ///
    /// The scheme is not inspected: URLs without a host (`mailto:`,
    /// `javascript:`) simply never match the allow-list. Every
    /// [`ValidationOutcome::Unauthorized`] is logged once with the raw
    /// destination.
    pub fn evaluate(&self, destination: Option<&str>) -> ValidationOutcome {
        let destination = match destination {
            Some(d) if !d.is_empty() => d,
            _ => {
                debug!("Redirect destination missing");
                return ValidationOutcome::Malformed(Malformed::Missing);
            }
        };

        let url = match Url::parse(destination) {
            Ok(url) => url,
            Err(e) => {
                debug!(error = %e, "Redirect destination is not an absolute URL");
                return ValidationOutcome::Malformed(Malformed::InvalidFormat);
            }
        };

        let host = host_with_port(&url);
        let is_domain = matches!(url.host(), Some(Host::Domain(_)));

        if !host.is_empty() && self.allow_list.matches(&host, is_domain) {
            debug!(%host, "Redirect destination allowed");
            return ValidationOutcome::Valid { url };
        }

        // Debug-formatted so control characters in the raw input stay escaped.
        warn!(%host, ?destination, "Blocked unauthorized redirect");
        ValidationOutcome::Unauthorized { host }
    }
}

/// Host as used for matching: `host_str` plus `:port` when the URL carries
/// a non-default port. Opaque hosts of non-special schemes keep their case
/// from the parser, so they are lowercased here.
fn host_with_port(url: &Url) -> String {
    let Some(host) = url.host_str() else {
        return String::new();
    };

    let host = host.to_ascii_lowercase();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    }
}
