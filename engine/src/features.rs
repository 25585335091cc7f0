use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use std::{fmt, str::FromStr, sync::LazyLock};

/// Characters counted by `special_chars`.
const SPECIAL_CHARS: &[char] = &['@', '?', '-', '_', '&', '=', '%'];

/// First host label longer than this marks the URL as a long domain.
const LONG_DOMAIN_LABEL: usize = 30;

// Deliberately lenient: octets are not range checked.
static IP_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$").expect("static dotted-quad pattern")
});

/// Names of the ten columns a classifier sees, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureName {
    UrlLength,
    HostnameLength,
    IpInUrl,
    HttpsInUrl,
    SpecialChars,
    NumDots,
    AtSign,
    HyphenInUrl,
    HyphenInSubdomain,
    LongDomain,
}

impl FeatureName {
    pub const ALL: [FeatureName; 10] = [
        FeatureName::UrlLength,
        FeatureName::HostnameLength,
        FeatureName::IpInUrl,
        FeatureName::HttpsInUrl,
        FeatureName::SpecialChars,
        FeatureName::NumDots,
        FeatureName::AtSign,
        FeatureName::HyphenInUrl,
        FeatureName::HyphenInSubdomain,
        FeatureName::LongDomain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureName::UrlLength => "url_length",
            FeatureName::HostnameLength => "hostname_length",
            FeatureName::IpInUrl => "ip_in_url",
            FeatureName::HttpsInUrl => "https_in_url",
            FeatureName::SpecialChars => "special_chars",
            FeatureName::NumDots => "num_dots",
            FeatureName::AtSign => "at_sign",
            FeatureName::HyphenInUrl => "hyphen_in_url",
            FeatureName::HyphenInSubdomain => "hyphen_in_subdomain",
            FeatureName::LongDomain => "long_domain",
        }
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("Unknown feature: {s}"))
    }
}

/// Lexical features of a single URL.
///
/// Built fresh per query by [`extract_features`]; flags serialize as `0`/`1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeatureRecord {
    pub url_length: usize,
    pub hostname_length: usize,
    #[serde(serialize_with = "as_flag")]
    pub ip_in_url: bool,
    #[serde(serialize_with = "as_flag")]
    pub https_in_url: bool,
    pub special_chars: usize,
    pub num_dots: usize,
    #[serde(serialize_with = "as_flag")]
    pub at_sign: bool,
    #[serde(serialize_with = "as_flag")]
    pub hyphen_in_url: bool,
    #[serde(serialize_with = "as_flag")]
    pub hyphen_in_subdomain: bool,
    #[serde(serialize_with = "as_flag")]
    pub long_domain: bool,
}

impl FeatureRecord {
    pub fn value(&self, name: FeatureName) -> f64 {
        match name {
            FeatureName::UrlLength => self.url_length as f64,
            FeatureName::HostnameLength => self.hostname_length as f64,
            FeatureName::IpInUrl => flag(self.ip_in_url),
            FeatureName::HttpsInUrl => flag(self.https_in_url),
            FeatureName::SpecialChars => self.special_chars as f64,
            FeatureName::NumDots => self.num_dots as f64,
            FeatureName::AtSign => flag(self.at_sign),
            FeatureName::HyphenInUrl => flag(self.hyphen_in_url),
            FeatureName::HyphenInSubdomain => flag(self.hyphen_in_subdomain),
            FeatureName::LongDomain => flag(self.long_domain),
        }
    }

    /// Values laid out in the column order a model was trained with.
    pub fn to_row(&self, order: &[FeatureName]) -> Vec<f64> {
        order.iter().map(|name| self.value(*name)).collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = (FeatureName, f64)> + '_ {
        FeatureName::ALL.into_iter().map(move |name| (name, self.value(name)))
    }
}

fn flag(v: bool) -> f64 {
    if v {
        1.0
    } else {
        0.0
    }
}

fn as_flag<S: Serializer>(v: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*v))
}

/// Derive the feature record for `url`. Total: any string yields a record.
pub fn extract_features(url: &str) -> FeatureRecord {
    let parts = split_url(url);
    let host = parts.authority.as_str();

    let labels = || host.split('.');
    let hyphen_in_subdomain =
        !host.is_empty() && labels().any(|label| label.starts_with('-') || label.ends_with('-'));
    let long_domain = labels()
        .next()
        .map_or(false, |first| first.chars().count() > LONG_DOMAIN_LABEL);

    FeatureRecord {
        url_length: url.chars().count(),
        hostname_length: host.chars().count(),
        ip_in_url: IP_LITERAL.is_match(host),
        https_in_url: parts.scheme == "https",
        special_chars: url.chars().filter(|c| SPECIAL_CHARS.contains(c)).count(),
        num_dots: url.matches('.').count(),
        at_sign: url.contains('@'),
        hyphen_in_url: url.contains('-'),
        hyphen_in_subdomain,
        long_domain,
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct UrlParts {
    scheme: String,
    authority: String,
}

/// Lenient `scheme://authority/...` split. Missing pieces come back empty.
fn split_url(raw: &str) -> UrlParts {
    let cleaned: String = raw
        .trim_start_matches(|c: char| c <= ' ')
        .chars()
        .filter(|c| !matches!(c, '\t' | '\r' | '\n'))
        .collect();

    let mut rest = cleaned.as_str();
    let mut scheme = String::new();
    if let Some(idx) = rest.find(':') {
        let candidate = &rest[..idx];
        if is_scheme(candidate) {
            scheme = candidate.to_ascii_lowercase();
            rest = &rest[idx + 1..];
        }
    }

    let authority = rest
        .strip_prefix("//")
        .map(|after| {
            let end = after
                .find(|c: char| matches!(c, '/' | '?' | '#'))
                .unwrap_or(after.len());
            &after[..end]
        })
        .unwrap_or("");

    // An unbalanced IPv6 bracket is unparseable; treat it as no host at all.
    let authority = if authority.contains('[') != authority.contains(']') {
        ""
    } else {
        authority
    };

    UrlParts {
        scheme,
        authority: authority.to_string(),
    }
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_https_url() {
        let f = extract_features("https://example.com");
        assert_eq!(f.url_length, 19);
        assert_eq!(f.hostname_length, 11);
        assert!(f.https_in_url);
        assert!(!f.at_sign);
        assert!(!f.ip_in_url);
        assert_eq!(f.num_dots, 1);
        assert!(!f.hyphen_in_url);
        assert!(!f.long_domain);
        assert!(!f.hyphen_in_subdomain);
        assert_eq!(f.special_chars, 0);
    }

    #[test]
    fn test_ip_literal_host() {
        let f = extract_features("http://192.168.1.1/login");
        assert!(f.ip_in_url);
        assert!(!f.https_in_url);
        assert_eq!(f.hostname_length, 11);
    }

    #[test]
    fn test_ip_literal_accepts_out_of_range_octets() {
        assert!(extract_features("http://999.999.999.999/").ip_in_url);
    }

    #[test]
    fn test_ip_literal_requires_whole_host() {
        assert!(!extract_features("http://192.168.1.1:8080/").ip_in_url);
        assert!(!extract_features("http://1.2.3.4.5/").ip_in_url);
        assert!(!extract_features("http://1234.1.1.1/").ip_in_url);
        assert!(!extract_features("192.168.1.1").ip_in_url);
    }

    #[test]
    fn test_hyphen_in_subdomain_edges_only() {
        let interior = extract_features("https://sub--domain.example.co.uk-login.fake.com");
        assert!(!interior.hyphen_in_subdomain);
        assert!(interior.hyphen_in_url);

        assert!(extract_features("https://-evil.com").hyphen_in_subdomain);
        assert!(extract_features("https://evil-.com").hyphen_in_subdomain);
        assert!(extract_features("http://login.bank-.example.com/x").hyphen_in_subdomain);
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        assert_eq!(extract_features(""), FeatureRecord::default());
    }

    #[test]
    fn test_no_scheme_has_no_host() {
        let f = extract_features("example.com/path-to?x=1");
        assert_eq!(f.hostname_length, 0);
        assert!(!f.https_in_url);
        assert!(!f.long_domain);
        assert!(!f.hyphen_in_subdomain);
        assert_eq!(f.num_dots, 1);
        assert_eq!(f.special_chars, 3);
        assert_eq!(f.url_length, 23);
    }

    #[test]
    fn test_scheme_relative_url_has_host() {
        let f = extract_features("//cdn.example.org/lib.js");
        assert_eq!(f.hostname_length, 15);
        assert!(!f.https_in_url);
    }

    #[test]
    fn test_hostname_includes_port_and_userinfo() {
        let f = extract_features("https://user@example.com:8443/a");
        assert_eq!(f.hostname_length, "user@example.com:8443".len());
        assert!(f.at_sign);
        assert!(f.https_in_url);
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        assert!(extract_features("HTTPS://Example.com").https_in_url);
        assert!(!extract_features("httpss://example.com").https_in_url);
        assert!(!extract_features("ftp://example.com").https_in_url);
    }

    #[test]
    fn test_special_chars_counted_across_url() {
        let f = extract_features("http://a.com/p_q?x=1&y=%20-z@");
        // _ ? = & = % - @
        assert_eq!(f.special_chars, 8);
        assert!(f.at_sign);
        assert!(f.hyphen_in_url);
    }

    #[test]
    fn test_long_domain_uses_first_label() {
        let label = "a".repeat(31);
        assert!(extract_features(&format!("https://{label}.com")).long_domain);
        let label = "a".repeat(30);
        assert!(!extract_features(&format!("https://{label}.com")).long_domain);
        let label = "a".repeat(40);
        assert!(!extract_features(&format!("https://www.{label}.com")).long_domain);
    }

    #[test]
    fn test_unbalanced_bracket_host_degrades() {
        let f = extract_features("http://[::1/path");
        assert_eq!(f.hostname_length, 0);
        assert!(!f.ip_in_url);
        assert_eq!(f.url_length, 16);

        let ok = extract_features("http://[::1]:80/");
        assert_eq!(ok.hostname_length, 8);
    }

    #[test]
    fn test_lengths_count_characters() {
        let f = extract_features("https://bücher.de");
        assert_eq!(f.url_length, 17);
        assert_eq!(f.hostname_length, 9);
    }

    #[test]
    fn test_garbage_input_never_panics() {
        for input in ["://", "https://", ":", "#", "??", "http:///", "  \t\n", "💥://💥", "a:b:c//d"] {
            let f = extract_features(input);
            assert_eq!(f, extract_features(input));
            assert!(f.entries().all(|(_, v)| v.is_finite() && v >= 0.0));
        }
    }

    #[test]
    fn test_leading_whitespace_before_scheme() {
        let f = extract_features("  https://example.com");
        assert!(f.https_in_url);
        assert_eq!(f.hostname_length, 11);
        assert_eq!(f.url_length, 21);
    }

    #[test]
    fn test_row_follows_requested_order() {
        let f = extract_features("https://example.com");
        let row = f.to_row(&[FeatureName::NumDots, FeatureName::HttpsInUrl, FeatureName::UrlLength]);
        assert_eq!(row, vec![1.0, 1.0, 19.0]);
        assert_eq!(f.entries().count(), 10);
    }

    #[test]
    fn test_feature_name_round_trip() {
        for name in FeatureName::ALL {
            assert_eq!(name.as_str().parse::<FeatureName>(), Ok(name));
            assert_eq!(serde_json::to_value(name).unwrap(), name.as_str());
        }
        assert!("entropy".parse::<FeatureName>().is_err());
    }

    #[test]
    fn test_record_serializes_flags_as_integers() {
        let json = serde_json::to_value(extract_features("http://10.0.0.1")).unwrap();
        assert_eq!(json["ip_in_url"], 1);
        assert_eq!(json["https_in_url"], 0);
        assert_eq!(json["url_length"], 15);
        assert_eq!(json.as_object().unwrap().len(), 10);
    }
}
