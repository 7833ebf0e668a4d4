//! The address policy: allow/deny rules plus behavioral toggles.
//!
//! A policy is a set of whitelist/blacklist patterns in four independent
//! categories (scheme, port, domain, IP range) and four switches controlling
//! how the guard behaves. Patterns are stored as written; a malformed CIDR
//! or regex only surfaces as [`Error::ConfigurationError`](crate::Error)
//! when a validation actually tries to match it.
//!
//! Evaluation rules, per category:
//! - a blacklist hit always rejects, regardless of any whitelist match;
//! - a non-empty whitelist is exclusive: the value must match one entry.
//!
//! The default policy is fail-closed: only `http`/`https`, only ports
//! 80/443/8080, no embedded credentials, and every private, loopback,
//! link-local, multicast and otherwise reserved IPv4/IPv6 range denied.

/// Which list a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Whitelist,
    Blacklist,
}

/// Which value a rule matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// URL scheme, matched case-insensitively and exactly.
    Scheme,
    /// Port number (explicit or scheme default), matched by integer equality.
    Port,
    /// Hostname, matched by a regex anchored against the full name.
    Domain,
    /// Resolved address, matched by CIDR containment (family-aware).
    Ip,
}

/// Default IP blacklist: RFC 1918 private space, loopback, link-local,
/// CGNAT, documentation, benchmarking, multicast and reserved ranges, plus
/// their IPv6 counterparts (unspecified, loopback, v4-mapped/translated,
/// discard, documentation, ULA, link-local, multicast).
const DEFAULT_IP_BLACKLIST: &[&str] = &[
    "0.0.0.0/8",
    "10.0.0.0/8",
    "100.64.0.0/10",
    "127.0.0.0/8",
    "169.254.0.0/16",
    "172.16.0.0/12",
    "192.0.0.0/29",
    "192.0.2.0/24",
    "192.88.99.0/24",
    "192.168.0.0/16",
    "198.18.0.0/15",
    "198.51.100.0/24",
    "203.0.113.0/24",
    "224.0.0.0/4",
    "240.0.0.0/4",
    "::/128",
    "::1/128",
    "::ffff:0:0/96",
    "64:ff9b::/96",
    "100::/64",
    "2001:db8::/32",
    "fc00::/7",
    "fe80::/10",
    "ff00::/8",
];

const DEFAULT_SCHEME_WHITELIST: &[&str] = &["http", "https"];
const DEFAULT_PORT_WHITELIST: &[&str] = &["80", "443", "8080"];

/// Allow/deny rules and behavioral toggles for one guard instance.
///
/// Treat a policy as immutable while a validation is in flight: `Guard`
/// and `validate` only ever take `&AddressPolicy`, so edit it between
/// calls, not during them.
#[derive(Debug, Clone)]
pub struct AddressPolicy {
    whitelist_scheme: Vec<String>,
    whitelist_port: Vec<String>,
    whitelist_domain: Vec<String>,
    whitelist_ip: Vec<String>,
    blacklist_scheme: Vec<String>,
    blacklist_port: Vec<String>,
    blacklist_domain: Vec<String>,
    blacklist_ip: Vec<String>,
    follow_redirects: bool,
    redirect_limit: u32,
    pin_dns: bool,
    allow_credentials: bool,
}

impl Default for AddressPolicy {
    /// The secure default policy described in the module docs.
    fn default() -> Self {
        let mut policy = Self::empty();
        for &scheme in DEFAULT_SCHEME_WHITELIST {
            policy.add_rule(ListKind::Whitelist, Category::Scheme, scheme);
        }
        for &port in DEFAULT_PORT_WHITELIST {
            policy.add_rule(ListKind::Whitelist, Category::Port, port);
        }
        for &cidr in DEFAULT_IP_BLACKLIST {
            policy.add_rule(ListKind::Blacklist, Category::Ip, cidr);
        }
        policy
    }
}

impl AddressPolicy {
    /// A policy with no rules at all.
    ///
    /// Toggles keep their defaults (redirects off, limit 0, no pinning, no
    /// credentials). With empty lists every scheme, port, domain and IP
    /// passes; callers building policy from scratch start here.
    pub fn empty() -> Self {
        Self {
            whitelist_scheme: Vec::new(),
            whitelist_port: Vec::new(),
            whitelist_domain: Vec::new(),
            whitelist_ip: Vec::new(),
            blacklist_scheme: Vec::new(),
            blacklist_port: Vec::new(),
            blacklist_domain: Vec::new(),
            blacklist_ip: Vec::new(),
            follow_redirects: false,
            redirect_limit: 0,
            pin_dns: false,
            allow_credentials: false,
        }
    }

    fn list_mut(&mut self, kind: ListKind, category: Category) -> &mut Vec<String> {
        match (kind, category) {
            (ListKind::Whitelist, Category::Scheme) => &mut self.whitelist_scheme,
            (ListKind::Whitelist, Category::Port) => &mut self.whitelist_port,
            (ListKind::Whitelist, Category::Domain) => &mut self.whitelist_domain,
            (ListKind::Whitelist, Category::Ip) => &mut self.whitelist_ip,
            (ListKind::Blacklist, Category::Scheme) => &mut self.blacklist_scheme,
            (ListKind::Blacklist, Category::Port) => &mut self.blacklist_port,
            (ListKind::Blacklist, Category::Domain) => &mut self.blacklist_domain,
            (ListKind::Blacklist, Category::Ip) => &mut self.blacklist_ip,
        }
    }

    /// The patterns in one list, in insertion order.
    pub fn rules(&self, kind: ListKind, category: Category) -> &[String] {
        match (kind, category) {
            (ListKind::Whitelist, Category::Scheme) => &self.whitelist_scheme,
            (ListKind::Whitelist, Category::Port) => &self.whitelist_port,
            (ListKind::Whitelist, Category::Domain) => &self.whitelist_domain,
            (ListKind::Whitelist, Category::Ip) => &self.whitelist_ip,
            (ListKind::Blacklist, Category::Scheme) => &self.blacklist_scheme,
            (ListKind::Blacklist, Category::Port) => &self.blacklist_port,
            (ListKind::Blacklist, Category::Domain) => &self.blacklist_domain,
            (ListKind::Blacklist, Category::Ip) => &self.blacklist_ip,
        }
    }

    /// Append a pattern to a list.
    ///
    /// No syntax checking happens here; an invalid CIDR or regex is only
    /// reported when a validation tries to match it.
    pub fn add_rule(
        &mut self,
        kind: ListKind,
        category: Category,
        pattern: impl Into<String>,
    ) -> &mut Self {
        self.list_mut(kind, category).push(pattern.into());
        self
    }

    /// Remove a pattern from a list. Returns whether anything was removed.
    pub fn remove_rule(&mut self, kind: ListKind, category: Category, pattern: &str) -> bool {
        let list = self.list_mut(kind, category);
        let before = list.len();
        list.retain(|p| p != pattern);
        list.len() != before
    }

    /// Whether the guard follows HTTP redirects at all. Default: false.
    pub fn follow_redirects(&self) -> bool {
        self.follow_redirects
    }

    pub fn set_follow_redirects(&mut self, follow: bool) -> &mut Self {
        self.follow_redirects = follow;
        self
    }

    /// Maximum redirect hops per `execute` call; 0 means unlimited.
    /// Default: 0.
    pub fn redirect_limit(&self) -> u32 {
        self.redirect_limit
    }

    pub fn set_redirect_limit(&mut self, limit: u32) -> &mut Self {
        self.redirect_limit = limit;
        self
    }

    /// Whether the transfer connects to the exact IP that was validated,
    /// ignoring any later DNS answer. Default: false.
    ///
    /// Pinning is the DNS-rebinding defense: the address that passed the
    /// IP checks is the address the socket opens to, while the original
    /// hostname is still used for the Host header and TLS server name.
    /// The tradeoff is that a legitimate DNS change between validation and
    /// connect is ignored for that request.
    pub fn pin_dns(&self) -> bool {
        self.pin_dns
    }

    pub fn set_pin_dns(&mut self, pin: bool) -> &mut Self {
        self.pin_dns = pin;
        self
    }

    /// Whether URLs may carry embedded `user:pass@` credentials.
    /// Default: false — userinfo is a classic SSRF obfuscation vector
    /// (`http://trusted.com@evil.com/`).
    pub fn allow_credentials(&self) -> bool {
        self.allow_credentials
    }

    pub fn set_allow_credentials(&mut self, allow: bool) -> &mut Self {
        self.allow_credentials = allow;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_toggles() {
        let policy = AddressPolicy::default();
        assert!(!policy.follow_redirects());
        assert_eq!(policy.redirect_limit(), 0);
        assert!(!policy.pin_dns());
        assert!(!policy.allow_credentials());
    }

    #[test]
    fn test_default_scheme_whitelist() {
        let policy = AddressPolicy::default();
        let schemes = policy.rules(ListKind::Whitelist, Category::Scheme);
        assert_eq!(schemes, &["http".to_string(), "https".to_string()]);
        assert!(policy.rules(ListKind::Blacklist, Category::Scheme).is_empty());
    }

    #[test]
    fn test_default_port_whitelist() {
        let policy = AddressPolicy::default();
        let ports = policy.rules(ListKind::Whitelist, Category::Port);
        assert_eq!(ports.len(), 3);
        assert!(ports.contains(&"8080".to_string()));
    }

    #[test]
    fn test_default_ip_blacklist_covers_known_ranges() {
        let policy = AddressPolicy::default();
        let ips = policy.rules(ListKind::Blacklist, Category::Ip);
        for range in ["127.0.0.0/8", "169.254.0.0/16", "10.0.0.0/8", "::1/128", "fc00::/7"] {
            assert!(ips.contains(&range.to_string()), "missing {range}");
        }
    }

    #[test]
    fn test_default_domain_lists_empty() {
        let policy = AddressPolicy::default();
        assert!(policy.rules(ListKind::Whitelist, Category::Domain).is_empty());
        assert!(policy.rules(ListKind::Blacklist, Category::Domain).is_empty());
    }

    #[test]
    fn test_add_and_remove_rule() {
        let mut policy = AddressPolicy::empty();
        policy.add_rule(ListKind::Blacklist, Category::Domain, r"(.*)\.internal\.net");
        assert_eq!(
            policy.rules(ListKind::Blacklist, Category::Domain),
            &[r"(.*)\.internal\.net".to_string()]
        );

        assert!(policy.remove_rule(ListKind::Blacklist, Category::Domain, r"(.*)\.internal\.net"));
        assert!(policy.rules(ListKind::Blacklist, Category::Domain).is_empty());
    }

    #[test]
    fn test_remove_missing_rule_is_noop() {
        let mut policy = AddressPolicy::empty();
        assert!(!policy.remove_rule(ListKind::Whitelist, Category::Port, "9999"));
    }

    #[test]
    fn test_rules_keep_insertion_order() {
        let mut policy = AddressPolicy::empty();
        policy
            .add_rule(ListKind::Whitelist, Category::Scheme, "https")
            .add_rule(ListKind::Whitelist, Category::Scheme, "http");
        assert_eq!(
            policy.rules(ListKind::Whitelist, Category::Scheme),
            &["https".to_string(), "http".to_string()]
        );
    }

    #[test]
    fn test_toggle_setters_chain() {
        let mut policy = AddressPolicy::default();
        policy
            .set_follow_redirects(true)
            .set_redirect_limit(5)
            .set_pin_dns(true)
            .set_allow_credentials(true);
        assert!(policy.follow_redirects());
        assert_eq!(policy.redirect_limit(), 5);
        assert!(policy.pin_dns());
        assert!(policy.allow_credentials());
    }

    #[test]
    fn test_invalid_pattern_accepted_at_insert_time() {
        let mut policy = AddressPolicy::empty();
        policy.add_rule(ListKind::Blacklist, Category::Ip, "not-a-cidr");
        assert_eq!(
            policy.rules(ListKind::Blacklist, Category::Ip),
            &["not-a-cidr".to_string()]
        );
    }
}
