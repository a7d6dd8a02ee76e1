//! Pagination walker
//!
//! Assembles a full collection by following `next` links. Walks are
//! best-effort by contract: a failing page ends the walk and the items
//! gathered so far are returned with `is_complete` cleared, rather than
//! discarding a long partial walk over one bad page.

use serde_json::Value;
use tracing::warn;

use crate::client::{ConnectClient, Query};
use crate::envelope::ResourceEnvelope;
use crate::error::{ConnectError, Result};

/// Outcome of a collection walk
#[derive(Debug, Clone)]
pub struct PageWalk {
    /// Resources in original relative order across all fetched pages
    pub items: Vec<Value>,
    /// False when the walk stopped on a failed page request
    pub is_complete: bool,
}

impl ConnectClient {
    /// Fetch every page of a collection endpoint
    ///
    /// Pages are fetched strictly sequentially; each request depends on the
    /// previous page's `next` link. There is no page-count bound; callers
    /// pass a `limit` query parameter if they need to cap result size.
    ///
    /// Only remote-API and transport failures are swallowed into a partial
    /// walk. Credential and configuration errors propagate: they fail every
    /// page identically and must not masquerade as an empty collection.
    pub async fn paginate(&self, path: &str, query: &Query) -> Result<PageWalk> {
        let mut items = Vec::new();

        let first: ResourceEnvelope = match self.get(path, query).await {
            Ok(envelope) => envelope,
            Err(err) if is_credential_error(&err) => return Err(err),
            Err(err) => {
                warn!(%path, error = %err, "Pagination stopped on first page");
                return Ok(PageWalk {
                    items,
                    is_complete: false,
                });
            }
        };
        items.extend(first.data_items());
        let mut next = first.next_link().map(str::to_string);

        while let Some(link) = next {
            let page: ResourceEnvelope = match self.get_url(&link).await {
                Ok(envelope) => envelope,
                Err(err) if is_credential_error(&err) => return Err(err),
                Err(err) => {
                    warn!(%link, error = %err, "Pagination stopped mid-walk");
                    return Ok(PageWalk {
                        items,
                        is_complete: false,
                    });
                }
            };
            items.extend(page.data_items());
            next = page.next_link().map(str::to_string);
        }

        Ok(PageWalk {
            items,
            is_complete: true,
        })
    }
}

fn is_credential_error(err: &ConnectError) -> bool {
    matches!(
        err,
        ConnectError::ConfigurationError(_)
            | ConnectError::InvalidCredentials(_)
            | ConnectError::Jwt(_)
    )
}
