//! HTTP GET abstraction for the lookup sources.

use std::{future::Future, sync::Arc, time::Duration};

use bytes::Bytes;
use reqwest::{Client, Url};

use crate::{Error, Result};

/// Something that can GET a URL and hand back the full response body.
///
/// Implementations must report non-success statuses as errors.
pub trait Upstream: Send + Sync {
  fn get<'a>(&'a self, url: &'a Url) -> impl Future<Output = Result<Bytes>> + Send + 'a;
}

impl<U: Upstream> Upstream for Arc<U> {
  fn get<'a>(&'a self, url: &'a Url) -> impl Future<Output = Result<Bytes>> + Send + 'a {
    (**self).get(url)
  }
}

/// [`Upstream`] over a shared [`reqwest::Client`].
///
/// Cheap to clone; the inner client is `Arc`-based.
#[derive(Clone)]
pub struct HttpUpstream {
  client: Client,
}

impl HttpUpstream {
  /// Build a client whose requests give up after `timeout`.
  pub fn new(timeout: Duration) -> Result<Self> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { client })
  }
}

impl Upstream for HttpUpstream {
  async fn get(&self, url: &Url) -> Result<Bytes> {
    let resp = self.client.get(url.clone()).send().await?;

    let status = resp.status();
    if !status.is_success() {
      tracing::warn!(%url, %status, "upstream returned non-success status");
      return Err(Error::Status { url: url.to_string(), status: status.as_u16() });
    }

    Ok(resp.bytes().await?)
  }
}
