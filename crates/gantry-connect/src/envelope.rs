//! JSON:API wire envelopes
//!
//! Every connect response shares one wrapper shape. The core only reads the
//! navigation links and paging metadata; `data` stays an untyped
//! `serde_json::Value` and each consumer narrows it to the resource shape
//! it expects.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Generic resource envelope returned by every JSON:API endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceEnvelope {
    /// Primary data: a single resource object or an ordered sequence
    #[serde(default)]
    pub data: Value,

    /// Side-loaded related resources requested via `include=`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included: Option<Value>,

    /// Navigation links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<ResourceLinks>,

    /// Paging metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<EnvelopeMeta>,
}

impl ResourceEnvelope {
    /// Coerce `data` into a sequence: a single resource becomes a
    /// one-element vector, `null` becomes empty
    pub fn data_items(&self) -> Vec<Value> {
        match &self.data {
            Value::Array(items) => items.clone(),
            Value::Null => Vec::new(),
            other => vec![other.clone()],
        }
    }

    /// Absolute URL of the next page, if the collection continues
    pub fn next_link(&self) -> Option<&str> {
        self.links.as_ref()?.next.as_deref()
    }
}

/// Navigation links on a resource collection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceLinks {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
}

/// Envelope metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvelopeMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paging: Option<PagingMeta>,
}

/// Paging totals reported alongside a collection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PagingMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// Error envelope returned on non-2xx statuses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub errors: Vec<ApiErrorObject>,
}

impl ErrorEnvelope {
    /// Human detail of the first error, the field the request engine
    /// surfaces to callers
    pub fn first_detail(&self) -> Option<&str> {
        self.errors.first().map(|e| e.detail.as_str())
    }
}

/// Single error object from the upstream API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorObject {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub source: Option<Value>,
}
