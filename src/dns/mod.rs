//! Best-effort A-record synchronisation for pool members.
//!
//! The synchroniser owns the retry and idempotency contract only; the actual
//! DNS service sits behind [`DnsApi`]. Records are keyed by instance name and
//! carry a fixed 60 second TTL.

use std::future::Future;
use std::net::IpAddr;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;

/// TTL applied to every managed A record.
pub const RECORD_TTL: u32 = 60;

const RETRY_INTERVAL: Duration = Duration::from_secs(5);
const RETRY_LIMIT: u32 = 3;

/// Future returned by DNS calls.
pub type DnsFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, DnsError>> + Send + 'a>>;

/// Managed zone metadata.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DnsZone {
    /// Zone identifier used in API paths.
    pub name: String,
    /// DNS suffix of the zone, with trailing dot (for example
    /// `pool.example.com.`).
    pub dns_name: String,
}

/// One A record as written to the zone.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ARecord {
    /// Fully qualified record name, with trailing dot.
    pub name: String,
    /// Record TTL in seconds.
    pub ttl: u32,
    /// Address the record points at.
    pub ip: IpAddr,
}

/// Errors raised by DNS clients and the synchroniser.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum DnsError {
    /// The configured managed zone does not exist.
    #[error("managed zone '{zone}' not found")]
    ZoneNotFound {
        /// Zone identifier used for the lookup.
        zone: String,
    },
    /// An add collided with an existing record set (HTTP 409).
    #[error("record set '{name}' already exists")]
    AlreadyExists {
        /// Fully qualified record name.
        name: String,
    },
    /// The referenced record set does not exist (HTTP 404).
    #[error("record set '{name}' not found")]
    NotFound {
        /// Fully qualified record name.
        name: String,
    },
    /// The service rejected the change on a precondition (HTTP 412); the
    /// synchroniser retries these at a fixed interval.
    #[error("precondition failed: {message}")]
    Precondition {
        /// Description returned by the service.
        message: String,
    },
    /// Transport-level failure before a response was read.
    #[error("transport failure: {message}")]
    Transport {
        /// Underlying transport error.
        message: String,
    },
    /// The DNS API rejected the request.
    #[error("DNS API error (status {status}): {message}")]
    Api {
        /// HTTP status code of the rejection.
        status: u16,
        /// Response body or decode failure description.
        message: String,
    },
}

/// Remote DNS capability surface.
pub trait DnsApi: Send + Sync {
    /// Resolves the managed zone's metadata.
    fn zone<'a>(&'a self, managed_zone: &'a str) -> DnsFuture<'a, DnsZone>;

    /// Adds a new A record; fails with [`DnsError::AlreadyExists`] when a
    /// record set of that name is present.
    fn add_a_record<'a>(
        &'a self,
        managed_zone: &'a str,
        record: &'a ARecord,
    ) -> DnsFuture<'a, ()>;

    /// Replaces an existing A record, or adds it when absent.
    fn replace_a_record<'a>(
        &'a self,
        managed_zone: &'a str,
        record: &'a ARecord,
    ) -> DnsFuture<'a, ()>;

    /// Removes the A record set with the given fully qualified name; fails
    /// with [`DnsError::NotFound`] when none exists.
    fn remove_a_record<'a>(&'a self, managed_zone: &'a str, name: &'a str) -> DnsFuture<'a, ()>;
}

/// Upserts and removes A records for pool members.
#[derive(Clone, Debug)]
pub struct DnsSynchronizer<D> {
    api: D,
    managed_zone: String,
    retry_interval: Duration,
    retry_limit: u32,
}

impl<D: DnsApi> DnsSynchronizer<D> {
    /// Creates a synchroniser for the given managed zone.
    #[must_use]
    pub fn new(api: D, managed_zone: impl Into<String>) -> Self {
        Self {
            api,
            managed_zone: managed_zone.into(),
            retry_interval: RETRY_INTERVAL,
            retry_limit: RETRY_LIMIT,
        }
    }

    /// Overrides the precondition retry policy; used by tests.
    #[must_use]
    pub const fn with_retry_policy(mut self, interval: Duration, limit: u32) -> Self {
        self.retry_interval = interval;
        self.retry_limit = limit;
        self
    }

    /// Creates or updates the A record for `host`.
    ///
    /// An "already exists" response on add falls back to replace, so the call
    /// is idempotent. Precondition failures retry at a fixed interval up to
    /// the configured cap.
    ///
    /// # Errors
    ///
    /// Returns [`DnsError`] when the zone lookup fails or the change is still
    /// rejected once the retry cap is spent.
    pub async fn upsert(&self, host: &str, ip: IpAddr) -> Result<(), DnsError> {
        let record = ARecord { name: self.fqdn(host).await?, ttl: RECORD_TTL, ip };
        let mut retries: u32 = 0;
        loop {
            let outcome = match self.api.add_a_record(&self.managed_zone, &record).await {
                Err(DnsError::AlreadyExists { .. }) => {
                    self.api.replace_a_record(&self.managed_zone, &record).await
                }
                other => other,
            };
            match outcome {
                Ok(()) => return Ok(()),
                Err(DnsError::Precondition { .. }) if retries < self.retry_limit => {
                    retries += 1;
                    sleep(self.retry_interval).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Removes the A record for `host`; an absent record is success.
    ///
    /// # Errors
    ///
    /// Returns [`DnsError`] when the zone lookup fails or the removal is
    /// rejected once the retry cap is spent.
    pub async fn remove(&self, host: &str) -> Result<(), DnsError> {
        let name = self.fqdn(host).await?;
        let mut retries: u32 = 0;
        loop {
            match self.api.remove_a_record(&self.managed_zone, &name).await {
                Ok(()) | Err(DnsError::NotFound { .. }) => return Ok(()),
                Err(DnsError::Precondition { .. }) if retries < self.retry_limit => {
                    retries += 1;
                    sleep(self.retry_interval).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn fqdn(&self, host: &str) -> Result<String, DnsError> {
        let zone = self.api.zone(&self.managed_zone).await?;
        Ok(format!("{host}.{}", zone.dns_name))
    }
}
