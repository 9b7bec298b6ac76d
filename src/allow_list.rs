use thiserror::Error;
use url::Host;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllowListError {
    #[error("invalid allow-list host {entry:?}: {reason}")]
    InvalidHost { entry: String, reason: String },

    #[error("invalid allow-list port in {entry:?}")]
    InvalidPort { entry: String },
}

/// Hosts a redirect may point at, in the canonical form the URL parser
/// produces (lowercase, punycode, optional `:port`).
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    hosts: Vec<String>,
}

impl AllowList {
    pub fn new(entries: Vec<String>) -> Result<Self, AllowListError> {
        let mut hosts: Vec<String> = vec![];

        for entry in entries {
            let trimmed = entry.trim();
            if trimmed.is_empty() {
                continue;
            }

            let host = normalize_entry(trimmed)?;
            if !hosts.contains(&host) {
                hosts.push(host);
            }
        }

        Ok(Self { hosts })
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Exact match against any entry, or a subdomain match with a literal
    /// `.` boundary. IP literals only ever match exactly.
    pub fn matches(&self, host: &str, host_is_domain: bool) -> bool {
        self.hosts.iter().any(|allowed| {
            if host == allowed {
                return true;
            }

            host_is_domain
                && host
                    .strip_suffix(allowed.as_str())
                    .is_some_and(|prefix| prefix.len() > 1 && prefix.ends_with('.'))
        })
    }
}

fn normalize_entry(entry: &str) -> Result<String, AllowListError> {
    let (host, port) = split_host_port(entry).ok_or_else(|| AllowListError::InvalidPort {
        entry: entry.to_string(),
    })?;

    let host = Host::parse(host).map_err(|e| AllowListError::InvalidHost {
        entry: entry.to_string(),
        reason: e.to_string(),
    })?;

    Ok(match port {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Splits `host[:port]`, keeping brackets on IPv6 literals so the host
/// parser recognizes them. `None` means the port part is not a valid `u16`.
fn split_host_port(s: &str) -> Option<(&str, Option<u16>)> {
    if s.starts_with('[') {
        let Some(end) = s.find(']') else {
            return Some((s, None));
        };
        let host = &s[..=end];
        let rest = &s[end + 1..];
        if rest.is_empty() {
            return Some((host, None));
        }
        let port = rest.strip_prefix(':').and_then(|p| p.parse().ok())?;
        return Some((host, Some(port)));
    }

    match s.rsplit_once(':') {
        Some((h, p)) => p.parse().ok().map(|port| (h, Some(port))),
        None => Some((s, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(entries: &[&str]) -> AllowList {
        AllowList::new(entries.iter().map(|e| e.to_string()).collect()).unwrap()
    }

    #[test]
    fn exact_and_subdomain_matches() {
        let allow = list(&["supabase.co", "localhost:3000"]);

        assert!(allow.matches("supabase.co", true));
        assert!(allow.matches("abc.supabase.co", true));
        assert!(allow.matches("a.b.supabase.co", true));
        assert!(allow.matches("localhost:3000", true));
        assert!(!allow.matches("localhost:3001", true));
        assert!(!allow.matches("localhost", true));
    }

    #[test]
    fn superstring_is_not_a_subdomain() {
        let allow = list(&["ready-sets-projects.vercel.app"]);

        assert!(!allow.matches("ready-sets-projects.vercel.app.evil.com", true));
        assert!(!allow.matches("evilready-sets-projects.vercel.app", true));
        assert!(!allow.matches(".ready-sets-projects.vercel.app", true));
        assert!(allow.matches("preview.ready-sets-projects.vercel.app", true));
    }

    #[test]
    fn ip_literals_only_match_exactly() {
        let allow = list(&["0.0.1", "127.0.0.1", "[::1]:3000"]);

        assert!(allow.matches("127.0.0.1", false));
        assert!(allow.matches("[::1]:3000", false));
        assert!(!allow.matches("[::1]", false));
        assert!(!allow.matches("10.0.0.1", false));
    }

    #[test]
    fn entries_are_normalized() {
        let allow = list(&["  Example.COM ", "", "   ", "example.com", "bücher.de"]);

        assert_eq!(allow.hosts(), &["example.com", "xn--bcher-kva.de"]);
    }

    #[test]
    fn rejects_bad_entries() {
        assert_eq!(
            AllowList::new(vec!["localhost:http".to_string()]).unwrap_err(),
            AllowListError::InvalidPort {
                entry: "localhost:http".to_string()
            }
        );
        assert!(matches!(
            AllowList::new(vec!["bad host.com".to_string()]),
            Err(AllowListError::InvalidHost { .. })
        ));
        assert!(matches!(
            AllowList::new(vec!["[::1".to_string()]),
            Err(AllowListError::InvalidHost { .. })
        ));
    }

    #[test]
    fn empty_list_denies_everything() {
        let allow = list(&[]);

        assert!(allow.is_empty());
        assert!(!allow.matches("example.com", true));
        assert!(!allow.matches("", false));
    }
}
