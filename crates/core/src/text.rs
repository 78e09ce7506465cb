//! Text normalisation and link extraction for email bodies.

use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;
use url::{Host, Url};

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(https?://[^\s<>"']+|www\.[^\s<>"']+)"#).expect("valid url regex")
});

/// Strips markup and punctuation, keeping characters that can appear in words and links.
pub fn clean_text(raw: &str) -> String {
    let without_tags = TAG_RE.replace_all(raw, "");
    let kept: String = without_tags
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || ":/._-".contains(*c))
        .collect();
    kept.to_lowercase().trim().to_string()
}

pub fn extract_urls(raw: &str) -> Vec<String> {
    URL_RE
        .find_iter(raw)
        .map(|m| {
            m.as_str()
                .trim_end_matches(|c: char| ".,;!?)\"'".contains(c))
                .to_string()
        })
        .filter(|u| !u.is_empty())
        .collect()
}

/// Lowercased host of a link, without a trailing dot. IP hosts are returned verbatim.
pub fn link_host(link: &str) -> Option<String> {
    let candidate = if link.to_ascii_lowercase().starts_with("www.") {
        format!("http://{link}")
    } else {
        link.to_string()
    };
    let parsed = Url::parse(&candidate).ok()?;
    let host = match parsed.host()? {
        Host::Domain(domain) => domain.trim_end_matches('.').to_ascii_lowercase(),
        Host::Ipv4(ip) => ip.to_string(),
        Host::Ipv6(ip) => ip.to_string(),
    };
    if host.is_empty() {
        return None;
    }
    Some(host)
}

/// Reduces a link to the domain its owner registered, e.g. `https://mail.google.com/x` to
/// `google.com`, using the public suffix list. Hosts with no registrable part are kept whole.
pub fn registered_domain(link: &str) -> Option<String> {
    let host = link_host(link)?;
    if host.parse::<IpAddr>().is_ok() {
        return Some(host);
    }
    Some(psl::domain_str(&host).map(str::to_string).unwrap_or(host))
}

/// Normalises a configured whitelist entry to the exact host it names. Schemes, paths and a
/// leading `www.` are dropped; the host is never reduced further.
pub fn normalize_domain(entry: &str) -> Option<String> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }
    let host = if entry.contains("://") {
        link_host(entry)?
    } else {
        link_host(&format!("http://{entry}"))?
    };
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_strips_tags_and_symbols() {
        let raw = "<p>Hello <b>World</b>!!! Visit https://Example.com/a?b=1 </p>";
        assert_eq!(clean_text(raw), "hello world visit https://example.com/ab1");
    }

    #[test]
    fn clean_text_of_markup_only_is_empty() {
        assert_eq!(clean_text("<br/> <hr> !!!"), "");
    }

    #[test]
    fn urls_are_found_and_trailing_punctuation_dropped() {
        let urls = extract_urls("Go to https://bank.example.com/login. Or WWW.Paypal.com, then (http://x.io)");
        assert_eq!(
            urls,
            vec!["https://bank.example.com/login", "WWW.Paypal.com", "http://x.io"]
        );
    }

    #[test]
    fn no_urls_in_plain_text() {
        assert!(extract_urls("lunch at noon tomorrow").is_empty());
    }

    #[test]
    fn registered_domain_drops_subdomains() {
        assert_eq!(
            registered_domain("https://mail.google.com/inbox").as_deref(),
            Some("google.com")
        );
        assert_eq!(registered_domain("www.Yahoo.com").as_deref(), Some("yahoo.com"));
    }

    #[test]
    fn registered_domain_respects_multi_part_suffixes() {
        assert_eq!(
            registered_domain("https://login.barclays.co.uk/").as_deref(),
            Some("barclays.co.uk")
        );
    }

    #[test]
    fn registered_domain_keeps_ip_hosts() {
        assert_eq!(
            registered_domain("http://192.168.0.10/reset").as_deref(),
            Some("192.168.0.10")
        );
    }

    #[test]
    fn unparseable_link_has_no_domain() {
        assert_eq!(registered_domain("http://"), None);
    }

    #[test]
    fn registered_domain_uses_the_full_suffix_list() {
        assert_eq!(
            registered_domain("https://santander-secure-login.com.ar/verify").as_deref(),
            Some("santander-secure-login.com.ar")
        );
        assert_eq!(
            registered_domain("https://evil.github.io/login").as_deref(),
            Some("evil.github.io")
        );
    }

    #[test]
    fn link_host_keeps_every_label() {
        assert_eq!(
            link_host("https://Login.Santander.com.ar./x").as_deref(),
            Some("login.santander.com.ar")
        );
        assert_eq!(link_host("www.outlook.com/cal").as_deref(), Some("www.outlook.com"));
    }

    #[test]
    fn whitelist_entries_keep_the_configured_host() {
        assert_eq!(normalize_domain(" Gmail.com ").as_deref(), Some("gmail.com"));
        assert_eq!(normalize_domain("www.outlook.com").as_deref(), Some("outlook.com"));
        assert_eq!(
            normalize_domain("santander.com.ar").as_deref(),
            Some("santander.com.ar")
        );
        assert_eq!(
            normalize_domain("https://mycompany.github.io/docs").as_deref(),
            Some("mycompany.github.io")
        );
        assert_eq!(
            normalize_domain("mail.corp.example.co.uk").as_deref(),
            Some("mail.corp.example.co.uk")
        );
        assert_eq!(normalize_domain(""), None);
    }
}
