//! # safefetch
//!
//! An outbound-request guard against Server-Side Request Forgery (SSRF).
//!
//! Given an arbitrary, possibly attacker-influenced URL, `safefetch`
//! decides whether fetching it is safe, pins the resolved address so the
//! decision cannot be bypassed between check and use (DNS rebinding), and
//! supervises HTTP redirects by re-validating every hop.
//!
//! The default [`AddressPolicy`] is fail-closed: only `http`/`https`, only
//! ports 80/443/8080, no embedded credentials, and all private, loopback,
//! link-local, multicast and reserved IPv4/IPv6 ranges denied.
//!
//! ## Validate only
//!
//! ```rust,no_run
//! use safefetch::{validate, AddressPolicy};
//!
//! # async fn example() -> Result<(), safefetch::Error> {
//! let policy = AddressPolicy::default();
//! let target = validate("https://example.com/api", &policy).await?;
//! println!("safe to connect to {} ({})", target.host, target.ip);
//! # Ok(())
//! # }
//! ```
//!
//! ## Fetch with supervised redirects
//!
//! ```rust,no_run
//! use safefetch::Guard;
//!
//! # async fn example() -> Result<(), safefetch::Error> {
//! let mut guard = Guard::with_defaults();
//! guard.policy_mut().set_follow_redirects(true).set_redirect_limit(5);
//! let outcome = guard.execute("https://example.com/webhook").await?;
//! println!("final status: {}", outcome.response.status());
//! # Ok(())
//! # }
//! ```

mod error;
pub mod matcher;
mod parse;
mod policy;
mod validate;

#[cfg(feature = "fetch")]
mod guard;

pub use error::Error;
pub use parse::ParsedUrl;
pub use policy::{AddressPolicy, Category, ListKind};
pub use validate::{validate, validate_sync, Validated};

#[cfg(feature = "fetch")]
pub use guard::{FetchOutcome, Guard};
