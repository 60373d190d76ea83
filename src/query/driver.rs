//! Sequential lookup issuance.

use std::sync::Arc;

use tracing::debug;

use super::Resolver;
use crate::error::QueryError;

/// Issues a fixed number of lookups for one domain, one after another.
#[derive(Clone)]
pub struct QueryDriver {
    resolver: Arc<dyn Resolver>,
}

impl QueryDriver {
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self { resolver }
    }

    /// Perform `count` lookups of `domain`.
    ///
    /// Each lookup runs on the blocking pool. The first failure stops the
    /// sequence and is returned with its 1-based attempt number; nothing
    /// is retried.
    pub async fn issue_queries(&self, domain: &str, count: u32) -> Result<(), QueryError> {
        for attempt in 1..=count {
            debug!("Performing DNS lookup for {} (attempt {})", domain, attempt);

            let resolver = Arc::clone(&self.resolver);
            let name = domain.to_string();
            let result = tokio::task::spawn_blocking(move || resolver.lookup(&name))
                .await
                .map_err(|e| QueryError::TaskAborted(e.to_string()))?;

            let addrs = result.map_err(|source| QueryError::Lookup {
                attempt,
                domain: domain.to_string(),
                source,
            })?;

            if addrs.is_empty() {
                return Err(QueryError::NoAddresses {
                    attempt,
                    domain: domain.to_string(),
                });
            }

            debug!("Lookup {} returned {} address(es)", attempt, addrs.len());
        }

        Ok(())
    }
}
