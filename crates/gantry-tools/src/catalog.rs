//! Tool catalog
//!
//! Declares every tool the gateway exposes: name, description and the JSON
//! Schema its arguments must satisfy. A tool-protocol server lists this
//! catalog verbatim and routes invocations through [`crate::dispatch`].

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A named tool operation with its declared input schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

static TOOL_CATALOG: Lazy<Vec<ToolDef>> = Lazy::new(build_catalog);

static TOOL_MAP: Lazy<HashMap<String, ToolDef>> = Lazy::new(|| {
    TOOL_CATALOG
        .iter()
        .cloned()
        .map(|tool| (tool.name.clone(), tool))
        .collect()
});

/// Every tool the gateway exposes
pub fn tool_catalog() -> &'static Vec<ToolDef> {
    &TOOL_CATALOG
}

/// Look up a tool by name
pub fn tool_by_name(name: &str) -> Option<&'static ToolDef> {
    TOOL_MAP.get(name)
}

/// Comma-separated tool names, for unknown-tool error messages
pub fn tool_names() -> String {
    TOOL_CATALOG
        .iter()
        .map(|tool| tool.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn tool(name: &str, description: &str, input_schema: Value) -> ToolDef {
    ToolDef {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

fn build_catalog() -> Vec<ToolDef> {
    vec![
        tool(
            "list_apps",
            "List all apps in App Store Connect, walking every page",
            json!({
                "type": "object",
                "properties": {
                    "limit": {"type": "integer", "minimum": 1, "maximum": 200,
                              "description": "Page size for the underlying listing"}
                }
            }),
        ),
        tool(
            "get_app",
            "Get a single app by its App Store Connect identifier",
            json!({
                "type": "object",
                "properties": {
                    "appId": {"type": "string", "description": "App identifier"}
                },
                "required": ["appId"]
            }),
        ),
        tool(
            "list_builds",
            "List recent builds for an app, newest upload first",
            json!({
                "type": "object",
                "properties": {
                    "appId": {"type": "string"},
                    "limit": {"type": "integer", "minimum": 1, "maximum": 200}
                },
                "required": ["appId"]
            }),
        ),
        tool(
            "list_customer_reviews",
            "List customer reviews for an app with a star-rating distribution summary",
            json!({
                "type": "object",
                "properties": {
                    "appId": {"type": "string"},
                    "limit": {"type": "integer", "minimum": 1, "maximum": 200},
                    "territory": {"type": "string",
                                  "description": "Optional territory filter, e.g. USA"}
                },
                "required": ["appId"]
            }),
        ),
        tool(
            "download_sales_report",
            "Download a sales report as tab-separated text with a units/proceeds rollup",
            json!({
                "type": "object",
                "properties": {
                    "frequency": {"type": "string",
                                  "enum": ["DAILY", "WEEKLY", "MONTHLY", "YEARLY"]},
                    "reportDate": {"type": "string",
                                   "description": "Report date matching the frequency, e.g. 2025-08-01"},
                    "reportSubType": {"type": "string",
                                      "enum": ["SUMMARY", "DETAILED", "SUMMARY_INSTALL_TYPE"]},
                    "reportType": {"type": "string",
                                   "enum": ["SALES", "SUBSCRIPTION", "SUBSCRIBER", "SUBSCRIPTION_EVENT", "NEWSSTAND", "PRE_ORDER"]},
                    "vendorNumber": {"type": "string",
                                     "description": "Overrides the configured vendor number"}
                },
                "required": ["frequency", "reportDate", "reportSubType", "reportType"]
            }),
        ),
        tool(
            "download_finance_report",
            "Download a finance report as tab-separated text",
            json!({
                "type": "object",
                "properties": {
                    "regionCode": {"type": "string",
                                   "description": "Region code, e.g. ZZ for the consolidated report"},
                    "reportDate": {"type": "string",
                                   "description": "Fiscal period, e.g. 2025-08"},
                    "vendorNumber": {"type": "string"}
                },
                "required": ["regionCode", "reportDate"]
            }),
        ),
        tool(
            "list_analytics_report_requests",
            "List analytics report requests for an app",
            json!({
                "type": "object",
                "properties": {
                    "appId": {"type": "string"}
                },
                "required": ["appId"]
            }),
        ),
        tool(
            "download_analytics_segment",
            "Download an analytics report segment from its issued URL",
            json!({
                "type": "object",
                "properties": {
                    "url": {"type": "string",
                            "description": "Segment URL from a prior analytics report lookup"},
                    "hostMarkers": {"type": "array", "items": {"type": "string"},
                                    "description": "Overrides the pre-signed host detection markers"}
                },
                "required": ["url"]
            }),
        ),
        tool(
            "list_diagnostic_signatures",
            "List diagnostic signatures for a build, ranked by weight",
            json!({
                "type": "object",
                "properties": {
                    "buildId": {"type": "string"},
                    "limit": {"type": "integer", "minimum": 1, "maximum": 200}
                },
                "required": ["buildId"]
            }),
        ),
    ]
}
