//! Error types for safefetch.

use std::net::IpAddr;
use thiserror::Error;

/// Errors produced while validating or fetching a URL.
///
/// Every rejection carries the offending value and, for policy failures,
/// the rule it violated (or the whitelist it failed to match), so callers
/// and logs can say exactly why a target was refused.
#[derive(Debug, Error)]
pub enum Error {
    /// The URL could not be parsed at all.
    #[error("invalid URL {url:?}: {reason}")]
    MalformedUrl { url: String, reason: String },

    /// The URL parsed but has no hostname component (e.g. `file:///etc/passwd`).
    #[error("URL {url:?} does not contain a hostname")]
    MissingHost { url: String },

    /// The URL embeds userinfo (`user:pass@`) and the policy disallows it.
    #[error("URL {url:?} contains embedded credentials, which the policy does not allow")]
    CredentialsNotAllowed { url: String },

    /// The scheme failed the policy's scheme lists.
    #[error("scheme {scheme:?} rejected: {reason}")]
    SchemeRejected { scheme: String, reason: String },

    /// The port (explicit or scheme-derived) failed the policy's port lists.
    #[error("port {port} rejected: {reason}")]
    PortRejected { port: u16, reason: String },

    /// The hostname failed the policy's domain lists.
    #[error("host {host:?} rejected: {reason}")]
    DomainRejected { host: String, reason: String },

    /// A resolved address failed the policy's IP lists.
    #[error("host {host:?} resolves to {ip}, which {reason}")]
    IpRejected {
        host: String,
        ip: IpAddr,
        reason: String,
    },

    /// DNS lookup failed or returned no addresses. Distinct from a policy
    /// rejection: the target may be safe, it was just unreachable.
    #[error("DNS resolution failed for {host:?}: {message}")]
    ResolutionFailed { host: String, message: String },

    /// The redirect hop counter reached the configured limit.
    #[error("redirect limit {limit} exceeded")]
    RedirectLimitExceeded { limit: u32 },

    /// Opaque failure from the underlying transfer client. Never retried here.
    #[error("transfer failed for {url:?}: {message}")]
    TransferFailed { url: String, message: String },

    /// A policy pattern (CIDR, regex, port) could not be parsed when
    /// matching was attempted. A caller error, not a security rejection.
    #[error("invalid {category} pattern {pattern:?}: {message}")]
    ConfigurationError {
        category: &'static str,
        pattern: String,
        message: String,
    },
}

impl Error {
    pub(crate) fn malformed_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn resolution_failed(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResolutionFailed {
            host: host.into(),
            message: message.into(),
        }
    }

    #[cfg(feature = "fetch")]
    pub(crate) fn transfer_failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransferFailed {
            url: url.into(),
            message: message.into(),
        }
    }

    /// True when the target was judged unsafe: the URL itself or its
    /// resolved address violated policy.
    pub fn is_policy_rejection(&self) -> bool {
        matches!(
            self,
            Self::CredentialsNotAllowed { .. }
                | Self::SchemeRejected { .. }
                | Self::PortRejected { .. }
                | Self::DomainRejected { .. }
                | Self::IpRejected { .. }
        )
    }

    /// True when the target could not be reached (DNS or transport), as
    /// opposed to being unsafe.
    pub fn is_reachability_failure(&self) -> bool {
        matches!(
            self,
            Self::ResolutionFailed { .. } | Self::TransferFailed { .. }
        )
    }

    /// True when the failure was caused by a malformed policy pattern.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::ConfigurationError { .. })
    }
}
