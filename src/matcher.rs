//! Pure matching primitives used by the validator against policy lists.
//!
//! Each function tests one value against one category's patterns and
//! reports the first pattern that matched, so rejection messages can name
//! the exact rule. None of them hold state. A malformed pattern (bad CIDR,
//! bad regex, non-numeric port) is a [`Error::ConfigurationError`], kept
//! distinct from an ordinary mismatch so callers never confuse a broken
//! policy with a safe target.

use std::net::IpAddr;

use ipnet::IpNet;
use regex::Regex;

use crate::error::Error;

/// Case-insensitive exact match for URL schemes. Scheme patterns are plain
/// strings, so this cannot fail on a malformed pattern.
pub fn scheme_match<'p>(scheme: &str, patterns: &'p [String]) -> Option<&'p str> {
    patterns
        .iter()
        .find(|p| p.eq_ignore_ascii_case(scheme))
        .map(String::as_str)
}

/// Integer equality for ports. Patterns must parse as `u16`.
pub fn port_match<'p>(port: u16, patterns: &'p [String]) -> Result<Option<&'p str>, Error> {
    for pattern in patterns {
        let candidate: u16 = pattern.trim().parse().map_err(|_| Error::ConfigurationError {
            category: "port",
            pattern: pattern.clone(),
            message: "not a valid port number".into(),
        })?;
        if candidate == port {
            return Ok(Some(pattern.as_str()));
        }
    }
    Ok(None)
}

/// Regex match for hostnames, anchored against the full name so a pattern
/// like `(.*)\.example\.com` cannot match `example.com.evil.net`.
pub fn domain_match<'p>(host: &str, patterns: &'p [String]) -> Result<Option<&'p str>, Error> {
    for pattern in patterns {
        let anchored = format!("^(?:{pattern})$");
        let re = Regex::new(&anchored).map_err(|e| Error::ConfigurationError {
            category: "domain",
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        if re.is_match(host) {
            return Ok(Some(pattern.as_str()));
        }
    }
    Ok(None)
}

/// CIDR containment for resolved addresses. A pattern matches only when
/// the address family is the same and the address falls inside the block;
/// an IPv4 address never matches an IPv6 block or vice versa.
pub fn ip_match<'p>(ip: IpAddr, patterns: &'p [String]) -> Result<Option<&'p str>, Error> {
    for pattern in patterns {
        let net: IpNet = pattern.trim().parse().map_err(|_| Error::ConfigurationError {
            category: "ip",
            pattern: pattern.clone(),
            message: "not a valid CIDR block".into(),
        })?;
        if net.contains(&ip) {
            return Ok(Some(pattern.as_str()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(patterns: &[&str]) -> Vec<String> {
        patterns.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scheme_exact_case_insensitive() {
        let patterns = strings(&["http", "https"]);
        assert_eq!(scheme_match("http", &patterns), Some("http"));
        assert_eq!(scheme_match("HTTPS", &patterns), Some("https"));
        assert_eq!(scheme_match("ftp", &patterns), None);
        // No substring matching
        assert_eq!(scheme_match("httpx", &patterns), None);
    }

    #[test]
    fn test_port_equality() {
        let patterns = strings(&["80", "443", "8080"]);
        assert_eq!(port_match(443, &patterns).unwrap(), Some("443"));
        assert_eq!(port_match(8443, &patterns).unwrap(), None);
    }

    #[test]
    fn test_port_bad_pattern_is_configuration_error() {
        let patterns = strings(&["eighty"]);
        let err = port_match(80, &patterns).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_domain_regex_anchored() {
        let patterns = strings(&[r"(.*)\.example\.com"]);
        assert_eq!(
            domain_match("api.example.com", &patterns).unwrap(),
            Some(r"(.*)\.example\.com")
        );
        assert_eq!(
            domain_match("deep.sub.example.com", &patterns).unwrap(),
            Some(r"(.*)\.example\.com")
        );
        // Anchoring: suffix must be the end of the name
        assert_eq!(domain_match("example.com.evil.net", &patterns).unwrap(), None);
        // And the bare apex does not match a subdomain pattern
        assert_eq!(domain_match("example.com", &patterns).unwrap(), None);
    }

    #[test]
    fn test_domain_exact_pattern() {
        let patterns = strings(&[r"internal\.corp"]);
        assert_eq!(domain_match("internal.corp", &patterns).unwrap(), Some(r"internal\.corp"));
        assert_eq!(domain_match("xinternal.corp", &patterns).unwrap(), None);
        assert_eq!(domain_match("internal.corpse", &patterns).unwrap(), None);
    }

    #[test]
    fn test_domain_bad_regex_is_configuration_error() {
        let patterns = strings(&["("]);
        let err = domain_match("example.com", &patterns).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_ip_cidr_containment_v4() {
        let patterns = strings(&["127.0.0.0/8", "169.254.0.0/16"]);
        assert_eq!(
            ip_match("127.0.0.1".parse().unwrap(), &patterns).unwrap(),
            Some("127.0.0.0/8")
        );
        assert_eq!(
            ip_match("169.254.169.254".parse().unwrap(), &patterns).unwrap(),
            Some("169.254.0.0/16")
        );
        assert_eq!(ip_match("93.184.216.34".parse().unwrap(), &patterns).unwrap(), None);
    }

    #[test]
    fn test_ip_cidr_containment_v6() {
        let patterns = strings(&["::1/128", "fc00::/7"]);
        assert_eq!(ip_match("::1".parse().unwrap(), &patterns).unwrap(), Some("::1/128"));
        assert_eq!(
            ip_match("fd00:ec2::254".parse().unwrap(), &patterns).unwrap(),
            Some("fc00::/7")
        );
        assert_eq!(ip_match("2001:4860:4860::8888".parse().unwrap(), &patterns).unwrap(), None);
    }

    #[test]
    fn test_ip_mixed_families_never_match() {
        let v4_patterns = strings(&["0.0.0.0/0"]);
        assert_eq!(ip_match("::1".parse().unwrap(), &v4_patterns).unwrap(), None);

        let v6_patterns = strings(&["::/0"]);
        assert_eq!(ip_match("127.0.0.1".parse().unwrap(), &v6_patterns).unwrap(), None);
    }

    #[test]
    fn test_ip_bad_cidr_is_configuration_error() {
        let patterns = strings(&["not-a-cidr"]);
        let err = ip_match("127.0.0.1".parse().unwrap(), &patterns).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_first_match_wins() {
        let patterns = strings(&["10.0.0.0/8", "10.1.0.0/16"]);
        assert_eq!(
            ip_match("10.1.2.3".parse().unwrap(), &patterns).unwrap(),
            Some("10.0.0.0/8")
        );
    }

    #[test]
    fn test_empty_lists_never_match() {
        let none: Vec<String> = Vec::new();
        assert_eq!(scheme_match("http", &none), None);
        assert_eq!(port_match(80, &none).unwrap(), None);
        assert_eq!(domain_match("example.com", &none).unwrap(), None);
        assert_eq!(ip_match("8.8.8.8".parse().unwrap(), &none).unwrap(), None);
    }
}
