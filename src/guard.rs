//! The redirect supervisor: validate, fetch, re-validate every hop.
//!
//! [`Guard::execute`] owns the fetch loop. Each hop goes through the full
//! validation pipeline — a redirect can point anywhere, including back
//! into the private network, so the first hop is never enough. The
//! transfer itself is delegated to `reqwest` with its own redirect
//! handling disabled; this module decides whether and to which exact
//! address each request may go.
//!
//! # DNS pinning
//!
//! With `pin_dns` enabled the client gets a per-host resolver override
//! ([`reqwest::ClientBuilder::resolve`]) mapping the validated hostname to
//! the exact checked address. The socket connects to the IP that passed
//! the policy even if DNS would answer differently a moment later, while
//! the Host header and TLS server name still carry the original hostname,
//! so certificate verification stays name-based. The tradeoff: a
//! legitimate DNS change between validation and connect is ignored for
//! that request.

use std::time::Duration;

use reqwest::header::LOCATION;
use reqwest::redirect::Policy as RedirectPolicy;
use reqwest::{Client, Response};
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::policy::AddressPolicy;
use crate::validate::{validate, Validated};

/// HTTP statuses treated as redirects. Deliberately not the whole 3xx
/// class: 304 and friends carry no new target.
fn is_redirect_status(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

/// Result of one `execute` call: the final response plus every validated
/// hop that led to it (the original URL included).
#[derive(Debug)]
pub struct FetchOutcome {
    /// The final, non-redirect HTTP response.
    pub response: Response,

    /// Validated targets in hop order.
    pub chain: Vec<Validated>,
}

/// An outbound-request guard: a policy plus the supervised fetch loop.
///
/// The policy is borrowed immutably for the whole of each `execute` call;
/// edit it between calls via [`Guard::policy_mut`].
#[derive(Debug, Clone)]
pub struct Guard {
    policy: AddressPolicy,
    timeout: Option<Duration>,
}

impl Guard {
    pub fn new(policy: AddressPolicy) -> Self {
        Self {
            policy,
            timeout: None,
        }
    }

    /// A guard with the secure default policy.
    pub fn with_defaults() -> Self {
        Self::new(AddressPolicy::default())
    }

    /// Overall timeout handed to the transfer client, per request.
    /// Timeouts are the transfer layer's concern; a hit surfaces as
    /// [`Error::TransferFailed`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn policy(&self) -> &AddressPolicy {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut AddressPolicy {
        &mut self.policy
    }

    /// Fetch a URL, re-validating every redirect hop.
    ///
    /// Terminates with the first non-redirect response (or the first
    /// response of any kind when `follow_redirects` is off). With a
    /// nonzero `redirect_limit` the number of network connections never
    /// exceeds `redirect_limit + 1`.
    ///
    /// # Errors
    ///
    /// Any validation error from [`validate`], `TransferFailed` for
    /// transport errors (never retried), `RedirectLimitExceeded` when the
    /// hop budget runs out.
    pub async fn execute(&self, raw_url: &str) -> Result<FetchOutcome, Error> {
        let mut current = raw_url.to_string();
        let mut chain = Vec::new();
        let limit = self.policy.redirect_limit();
        let mut hops: u32 = 0;

        loop {
            let validated = validate(&current, &self.policy).await?;
            let response = self.transfer(&validated).await?;
            let status = response.status().as_u16();

            if !self.policy.follow_redirects() || !is_redirect_status(status) {
                debug!(url = %validated.url, status, hops, "fetch complete");
                chain.push(validated);
                return Ok(FetchOutcome { response, chain });
            }

            if limit != 0 && hops == limit {
                warn!(url = %validated.url, limit, "redirect limit exceeded");
                return Err(Error::RedirectLimitExceeded { limit });
            }
            hops += 1;

            let location = redirect_target(&response, validated.url.as_str())?;
            let next = resolve_redirect_url(&validated.url, &location)?;
            debug!(from = %validated.url, to = %next, hop = hops, "following redirect");
            chain.push(validated);
            current = next;
        }
    }

    /// Synchronous version of [`Guard::execute`].
    ///
    /// Blocks the current thread for the whole fetch. Works both inside
    /// and outside a Tokio runtime: on a multi-threaded runtime the task
    /// blocks in place; on a current-thread runtime, where blocking in
    /// place is illegal, the fetch is bridged to a helper thread with a
    /// private runtime (the calling thread still blocks, so tasks on that
    /// runtime make no progress until this returns).
    pub fn execute_sync(&self, raw_url: &str) -> Result<FetchOutcome, Error> {
        use tokio::runtime::{Handle, RuntimeFlavor};

        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(self.execute(raw_url)))
            }
            Ok(_) => std::thread::scope(|scope| {
                scope
                    .spawn(|| self.block_on_fresh_runtime(raw_url))
                    .join()
                    .unwrap_or_else(|_| {
                        Err(Error::transfer_failed(raw_url, "sync bridge thread panicked"))
                    })
            }),
            Err(_) => self.block_on_fresh_runtime(raw_url),
        }
    }

    fn block_on_fresh_runtime(&self, raw_url: &str) -> Result<FetchOutcome, Error> {
        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| Error::transfer_failed(raw_url, e.to_string()))?;
        rt.block_on(self.execute(raw_url))
    }

    /// One HTTP request to a validated target, redirects disabled.
    async fn transfer(&self, validated: &Validated) -> Result<Response, Error> {
        let mut builder = Client::builder().redirect(RedirectPolicy::none());

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        // Pin only hostnames; an IP-literal host already connects to the
        // checked address.
        let host_is_literal = validated.host.starts_with('[')
            || validated.host.parse::<std::net::IpAddr>().is_ok();
        if self.policy.pin_dns() && !host_is_literal {
            builder = builder.resolve(&validated.host, validated.to_socket_addr());
        }

        let client = builder
            .build()
            .map_err(|e| Error::transfer_failed(validated.url.as_str(), e.to_string()))?;

        client
            .get(validated.url.clone())
            .send()
            .await
            .map_err(|e| Error::transfer_failed(validated.url.as_str(), e.to_string()))
    }
}

/// The redirect target reported by the transfer client for the last
/// response: the `Location` header, which is the only channel reqwest
/// exposes once its own redirect handling is disabled.
fn redirect_target(response: &Response, url: &str) -> Result<String, Error> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| Error::transfer_failed(url, "redirect without Location header"))
}

/// Resolve a redirect target (possibly relative) against the current URL.
fn resolve_redirect_url(base: &Url, location: &str) -> Result<String, Error> {
    let resolved = base
        .join(location)
        .map_err(|e| Error::malformed_url(location, e.to_string()))?;
    Ok(resolved.to_string())
}
