//! Detection of pages that only render with client-side script.
//!
//! Best-effort: a short but legitimate post on one of the listed platforms
//! is classified as JS-required too.

/// Platforms that serve crawlers an empty application shell.
pub const JS_ONLY_DOMAINS: [&str; 7] = [
    "twitter.com",
    "x.com",
    "instagram.com",
    "facebook.com",
    "tiktok.com",
    "threads.net",
    "linkedin.com",
];

/// Visible text shorter than this on a JS-only platform means the shell
/// came back without content.
pub const MIN_VISIBLE_CHARS: usize = 200;

const JS_PHRASES: [&str; 8] = [
    "enable javascript",
    "javascript is required",
    "javascript is disabled",
    "requires javascript",
    "javascript must be enabled",
    "turn on javascript",
    "javascript to run this app",
    "switch to a supported browser",
];

/// Host-suffix match against [`JS_ONLY_DOMAINS`].
pub fn is_js_only_host(host: &str) -> bool {
    host_in(host, &JS_ONLY_DOMAINS)
}

/// True when `host` is one of `domains` or a subdomain of one.
pub fn host_in<S: AsRef<str>>(host: &str, domains: &[S]) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    domains.iter().any(|domain| {
        let domain = domain.as_ref();
        host == domain
            || host
                .strip_suffix(domain)
                .is_some_and(|rest| rest.ends_with('.'))
    })
}

pub fn mentions_javascript_requirement(visible_text: &str) -> bool {
    let lowered = visible_text.to_lowercase();
    JS_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}

pub fn requires_javascript(visible_text: &str, host: Option<&str>) -> bool {
    if mentions_javascript_requirement(visible_text) {
        return true;
    }
    host.is_some_and(is_js_only_host) && visible_text.trim().chars().count() < MIN_VISIBLE_CHARS
}
