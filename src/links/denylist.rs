use url::Url;

/// Hosts (and host+path prefixes) that never carry article content:
/// the chat platform itself, GIF/emoji services and UI shorteners.
pub const DEFAULT_DENYLIST: &[&str] = &[
    "slack.com",
    "slack-edge.com",
    "slack-files.com",
    "tenor.com",
    "giphy.com",
    "t.co",
    "bit.ly/slack",
];

#[derive(Debug, Clone, PartialEq, Eq)]
struct DenyRule {
    host: String,
    path_prefix: Option<String>,
}

impl DenyRule {
    fn parse(rule: &str) -> Self {
        let rule = rule.trim().trim_start_matches("*.").to_ascii_lowercase();
        match rule.split_once('/') {
            Some((host, path)) => Self {
                host: host.to_string(),
                path_prefix: Some(format!("/{path}")),
            },
            None => Self {
                host: rule,
                path_prefix: None,
            },
        }
    }

    fn matches(&self, host: &str, path: &str) -> bool {
        let host_matches = host == self.host
            || host
                .strip_suffix(self.host.as_str())
                .is_some_and(|rest| rest.ends_with('.'));
        host_matches
            && self
                .path_prefix
                .as_deref()
                .is_none_or(|prefix| path.starts_with(prefix))
    }
}

/// Host-suffix denylist. `giphy.com` covers `media.giphy.com` but not
/// `notgiphy.com`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denylist {
    rules: Vec<DenyRule>,
}

impl Denylist {
    pub fn new<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            rules: rules
                .into_iter()
                .map(|r| DenyRule::parse(r.as_ref()))
                .filter(|r| !r.host.is_empty())
                .collect(),
        }
    }

    pub fn is_denied(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return true;
        };
        let Some(host) = parsed.host_str() else {
            return true;
        };
        let host = host.to_ascii_lowercase();
        self.rules.iter().any(|r| r.matches(&host, parsed.path()))
    }
}

impl Default for Denylist {
    fn default() -> Self {
        Self::new(DEFAULT_DENYLIST)
    }
}
