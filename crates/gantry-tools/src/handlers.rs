//! Tool handlers
//!
//! Thin parameter-marshalling over the connect core: each handler narrows
//! its typed params into a path and query, calls the core, and reshapes the
//! response into the tool's JSON result. Anything heavier than that lives
//! in `gantry-connect` or `summaries`.

use gantry_connect::reports::{FinanceReportFilter, SalesReportFilter};
use gantry_connect::{ConnectClient, ResourceEnvelope, SegmentAuthPolicy};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::Result;
use crate::summaries;

const DEFAULT_BUILD_LIMIT: u32 = 25;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAppsParams {
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Walk every page of `/apps`
pub async fn list_apps(client: &ConnectClient, params: ListAppsParams) -> Result<Value> {
    let mut query = Vec::new();
    if let Some(limit) = params.limit {
        query.push(("limit".to_string(), limit.to_string()));
    }
    let walk = client.paginate("/apps", &query).await?;
    info!(count = walk.items.len(), complete = walk.is_complete, "Listed apps");
    Ok(json!({"apps": walk.items, "isComplete": walk.is_complete}))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAppParams {
    pub app_id: String,
}

/// Fetch one app resource
pub async fn get_app(client: &ConnectClient, params: GetAppParams) -> Result<Value> {
    let envelope: ResourceEnvelope = client
        .get(&format!("/apps/{}", params.app_id), &[])
        .await?;
    Ok(json!({"app": envelope.data}))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBuildsParams {
    pub app_id: String,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// List builds for an app, newest upload first
pub async fn list_builds(client: &ConnectClient, params: ListBuildsParams) -> Result<Value> {
    let query = vec![
        ("filter[app]".to_string(), params.app_id.clone()),
        ("sort".to_string(), "-uploadedDate".to_string()),
        (
            "limit".to_string(),
            params.limit.unwrap_or(DEFAULT_BUILD_LIMIT).to_string(),
        ),
    ];
    let envelope: ResourceEnvelope = client.get("/builds", &query).await?;
    Ok(json!({"builds": envelope.data_items()}))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCustomerReviewsParams {
    pub app_id: String,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub territory: Option<String>,
}

/// Walk an app's customer reviews and attach a rating distribution
pub async fn list_customer_reviews(
    client: &ConnectClient,
    params: ListCustomerReviewsParams,
) -> Result<Value> {
    let mut query = vec![("sort".to_string(), "-createdDate".to_string())];
    if let Some(limit) = params.limit {
        query.push(("limit".to_string(), limit.to_string()));
    }
    if let Some(territory) = &params.territory {
        query.push(("filter[territory]".to_string(), territory.clone()));
    }

    let walk = client
        .paginate(&format!("/apps/{}/customerReviews", params.app_id), &query)
        .await?;
    let summary = summaries::rating_summary(&walk.items);

    Ok(json!({
        "reviews": walk.items,
        "isComplete": walk.is_complete,
        "ratingSummary": serde_json::to_value(summary)?,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReportParams {
    pub frequency: String,
    pub report_date: String,
    pub report_sub_type: String,
    pub report_type: String,
    #[serde(default)]
    pub vendor_number: Option<String>,
}

/// Download a sales report and roll it up by product
pub async fn download_sales_report(
    client: &ConnectClient,
    params: SalesReportParams,
) -> Result<Value> {
    let vendor_number = match params.vendor_number {
        Some(vendor) => vendor,
        None => client.issuer().config().require_vendor_number()?.to_string(),
    };
    let filter = SalesReportFilter {
        frequency: params.frequency,
        report_date: params.report_date,
        report_sub_type: params.report_sub_type,
        report_type: params.report_type,
        vendor_number,
    };

    let report = client.download_sales_report(&filter).await?;
    let rollup = summaries::sales_rollup(&report);

    Ok(json!({
        "content": report,
        "summary": serde_json::to_value(rollup)?,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceReportParams {
    pub region_code: String,
    pub report_date: String,
    #[serde(default = "default_finance_report_type")]
    pub report_type: String,
    #[serde(default)]
    pub vendor_number: Option<String>,
}

fn default_finance_report_type() -> String {
    "FINANCIAL".to_string()
}

/// Download a finance report
pub async fn download_finance_report(
    client: &ConnectClient,
    params: FinanceReportParams,
) -> Result<Value> {
    let vendor_number = match params.vendor_number {
        Some(vendor) => vendor,
        None => client.issuer().config().require_vendor_number()?.to_string(),
    };
    let filter = FinanceReportFilter {
        region_code: params.region_code,
        report_date: params.report_date,
        report_type: params.report_type,
        vendor_number,
    };

    let report = client.download_finance_report(&filter).await?;
    Ok(json!({"content": report}))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAnalyticsReportRequestsParams {
    pub app_id: String,
}

/// List analytics report requests for an app
pub async fn list_analytics_report_requests(
    client: &ConnectClient,
    params: ListAnalyticsReportRequestsParams,
) -> Result<Value> {
    let walk = client
        .paginate(
            &format!("/apps/{}/analyticsReportRequests", params.app_id),
            &[],
        )
        .await?;
    Ok(json!({"reportRequests": walk.items, "isComplete": walk.is_complete}))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadSegmentParams {
    pub url: String,
    #[serde(default)]
    pub host_markers: Option<Vec<String>>,
}

/// Download one analytics data segment as text
pub async fn download_analytics_segment(
    client: &ConnectClient,
    params: DownloadSegmentParams,
) -> Result<Value> {
    let content = match params.host_markers {
        Some(markers) => {
            let policy = SegmentAuthPolicy::new(markers);
            client
                .download_segment_with_policy(&params.url, &policy)
                .await?
        }
        None => client.download_segment(&params.url).await?,
    };
    Ok(json!({"content": content}))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDiagnosticSignaturesParams {
    pub build_id: String,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// List a build's diagnostic signatures, ranked by weight
pub async fn list_diagnostic_signatures(
    client: &ConnectClient,
    params: ListDiagnosticSignaturesParams,
) -> Result<Value> {
    let mut query = Vec::new();
    if let Some(limit) = params.limit {
        query.push(("limit".to_string(), limit.to_string()));
    }
    let envelope: ResourceEnvelope = client
        .get(
            &format!("/builds/{}/diagnosticSignatures", params.build_id),
            &query,
        )
        .await?;

    let signatures = envelope.data_items();
    let ranking = summaries::diagnostic_ranking(&signatures);

    Ok(json!({
        "signatures": signatures,
        "ranking": serde_json::to_value(ranking)?,
    }))
}
