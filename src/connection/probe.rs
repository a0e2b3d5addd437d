//! Active reachability checks against a well-known endpoint.

use std::future::Future;
use std::pin::Pin;

use tracing::debug;

/// Seam between the connection monitor and the network.
///
/// A check answers one question: can this session reach the outside world
/// right now? Implementations must never hang indefinitely.
pub trait Reachability: Send + Sync {
    /// Run one reachability check. `true` means reachable.
    fn check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// Production probe: a `GET` to a fixed well-known endpoint with caching
/// disabled. Any response counts as success — the endpoint may return an
/// opaque or non-2xx body; only a network-level error means unreachable.
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    /// Build a probe against the given endpoint.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl Reachability for HttpProbe {
    fn check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            match self
                .client
                .get(&self.url)
                .header(reqwest::header::CACHE_CONTROL, "no-cache")
                .send()
                .await
            {
                Ok(_) => true,
                Err(err) => {
                    debug!(%err, url = %self.url, "reachability probe failed");
                    false
                }
            }
        })
    }
}
