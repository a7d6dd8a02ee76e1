//! Report and segment downloader
//!
//! Sales and finance reports come gzip-compressed from fixed endpoints and
//! are generated asynchronously on Apple's side, so a 404 means "not yet
//! available" rather than a hard failure. Analytics segments are fetched
//! from dynamically issued URLs with their own auth rule: pre-signed
//! object-storage URLs must be fetched without auth headers because the
//! signature embedded in the URL already authorizes the request.

use std::io::Read;

use flate2::read::GzDecoder;
use reqwest::{Method, StatusCode};
use tracing::{debug, instrument};

use crate::client::{api_error, join_query, ConnectClient};
use crate::error::{ConnectError, Result};
use crate::transport::TransportRequest;

/// Fixed endpoint for sales and trends reports
pub const SALES_REPORTS_URL: &str = "https://api.appstoreconnect.apple.com/v1/salesReports";
/// Fixed endpoint for finance reports
pub const FINANCE_REPORTS_URL: &str = "https://api.appstoreconnect.apple.com/v1/financeReports";

const BODY_PREFIX_LIMIT: usize = 200;

/// Filters for a sales report request
#[derive(Debug, Clone)]
pub struct SalesReportFilter {
    /// DAILY, WEEKLY, MONTHLY or YEARLY
    pub frequency: String,
    /// Report date matching the frequency, e.g. `2025-08-01`
    pub report_date: String,
    /// SUMMARY, DETAILED or SUMMARY_INSTALL_TYPE
    pub report_sub_type: String,
    /// SALES, SUBSCRIPTION, SUBSCRIBER, ...
    pub report_type: String,
    /// Vendor number the report is keyed by
    pub vendor_number: String,
}

impl SalesReportFilter {
    fn query(&self) -> Vec<(String, String)> {
        vec![
            ("filter[frequency]".to_string(), self.frequency.clone()),
            ("filter[reportDate]".to_string(), self.report_date.clone()),
            (
                "filter[reportSubType]".to_string(),
                self.report_sub_type.clone(),
            ),
            ("filter[reportType]".to_string(), self.report_type.clone()),
            (
                "filter[vendorNumber]".to_string(),
                self.vendor_number.clone(),
            ),
        ]
    }
}

/// Filters for a finance report request
#[derive(Debug, Clone)]
pub struct FinanceReportFilter {
    /// Region code, e.g. `ZZ` for the consolidated report
    pub region_code: String,
    /// Fiscal period, e.g. `2025-08`
    pub report_date: String,
    /// FINANCIAL or FINANCE_DETAIL
    pub report_type: String,
    /// Vendor number the report is keyed by
    pub vendor_number: String,
}

impl FinanceReportFilter {
    fn query(&self) -> Vec<(String, String)> {
        vec![
            ("filter[regionCode]".to_string(), self.region_code.clone()),
            ("filter[reportDate]".to_string(), self.report_date.clone()),
            ("filter[reportType]".to_string(), self.report_type.clone()),
            (
                "filter[vendorNumber]".to_string(),
                self.vendor_number.clone(),
            ),
        ]
    }
}

/// Decides whether a segment URL is pre-signed and must be fetched bare
///
/// Detection is a substring match against configurable host markers; the
/// defaults cover the object-storage hosts Apple hands out today.
#[derive(Debug, Clone)]
pub struct SegmentAuthPolicy {
    host_markers: Vec<String>,
}

impl Default for SegmentAuthPolicy {
    fn default() -> Self {
        Self {
            host_markers: vec![
                "blobstore.apple.com".to_string(),
                "amazonaws.com".to_string(),
                "storage.googleapis.com".to_string(),
            ],
        }
    }
}

impl SegmentAuthPolicy {
    /// Policy with caller-supplied host markers
    pub fn new(host_markers: Vec<String>) -> Self {
        Self { host_markers }
    }

    /// True when the URL carries its own signed access and auth headers
    /// must be suppressed
    pub fn is_presigned(&self, url: &str) -> bool {
        self.host_markers.iter().any(|marker| url.contains(marker))
    }
}

impl ConnectClient {
    /// Download a sales report as decompressed tab-separated text
    #[instrument(skip(self, filter), fields(report_date = %filter.report_date))]
    pub async fn download_sales_report(&self, filter: &SalesReportFilter) -> Result<String> {
        let description = format!(
            "{} {} sales report for {}",
            filter.frequency, filter.report_type, filter.report_date
        );
        self.download_report(SALES_REPORTS_URL, filter.query(), description)
            .await
    }

    /// Download a finance report as decompressed tab-separated text
    #[instrument(skip(self, filter), fields(report_date = %filter.report_date))]
    pub async fn download_finance_report(&self, filter: &FinanceReportFilter) -> Result<String> {
        let description = format!(
            "{} finance report for region {}",
            filter.report_date, filter.region_code
        );
        self.download_report(FINANCE_REPORTS_URL, filter.query(), description)
            .await
    }

    async fn download_report(
        &self,
        endpoint: &str,
        query: Vec<(String, String)>,
        description: String,
    ) -> Result<String> {
        let url = join_query(endpoint, &query);
        let mut headers = self.issuer.auth_headers()?;
        headers.push(("Accept-Encoding".to_string(), "gzip".to_string()));

        let response = self
            .transport
            .send(TransportRequest::new(Method::GET, url).with_headers(headers))
            .await?;

        // Reports are generated asynchronously, up to 24h after the period
        // closes; a 404 only means "come back later"
        if response.status == StatusCode::NOT_FOUND {
            return Err(ConnectError::ReportNotReady(description));
        }
        if !response.is_success() {
            return Err(api_error(&response));
        }

        debug!(bytes = response.body.len(), "Decompressing report payload");
        Ok(gunzip(&response.body)?)
    }

    /// Download an analytics data segment from its dynamically issued URL,
    /// using the default auth policy
    pub async fn download_segment(&self, url: &str) -> Result<String> {
        self.download_segment_with_policy(url, &SegmentAuthPolicy::default())
            .await
    }

    /// Download an analytics data segment with an explicit auth policy
    ///
    /// The payload is usually gzip but not always; an uncompressed body is
    /// returned as-is instead of failing.
    #[instrument(skip(self, policy))]
    pub async fn download_segment_with_policy(
        &self,
        url: &str,
        policy: &SegmentAuthPolicy,
    ) -> Result<String> {
        let headers = if policy.is_presigned(url) {
            Vec::new()
        } else {
            let mut headers = self.issuer.auth_headers()?;
            headers.push(("Accept-Encoding".to_string(), "gzip".to_string()));
            headers
        };

        let response = self
            .transport
            .send(TransportRequest::new(Method::GET, url.to_string()).with_headers(headers))
            .await
            .map_err(|err| ConnectError::SegmentDownload {
                status: 0,
                status_text: "Transport Error".to_string(),
                body_prefix: truncate(&err.to_string()),
            })?;

        if !response.is_success() {
            return Err(ConnectError::SegmentDownload {
                status: response.status.as_u16(),
                status_text: response.status_text().to_string(),
                body_prefix: truncate(&String::from_utf8_lossy(&response.body)),
            });
        }

        Ok(gunzip_or_raw(&response.body))
    }
}

fn gunzip(bytes: &[u8]) -> std::io::Result<String> {
    let mut decoder = GzDecoder::new(bytes);
    let mut text = String::new();
    decoder.read_to_string(&mut text)?;
    Ok(text)
}

fn gunzip_or_raw(bytes: &[u8]) -> String {
    gunzip(bytes).unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned())
}

fn truncate(text: &str) -> String {
    if text.len() <= BODY_PREFIX_LIMIT {
        return text.to_string();
    }
    let mut end = BODY_PREFIX_LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_client, FakeTransport};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use serde_json::json;
    use std::io::Write;

    fn gzip(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    fn sales_filter() -> SalesReportFilter {
        SalesReportFilter {
            frequency: "DAILY".to_string(),
            report_date: "2025-08-01".to_string(),
            report_sub_type: "SUMMARY".to_string(),
            report_type: "SALES".to_string(),
            vendor_number: "88888888".to_string(),
        }
    }

    #[tokio::test]
    async fn test_sales_report_is_decompressed() {
        let transport = FakeTransport::new();
        let tsv = "Provider\tSKU\tUnits\nAPPLE\tcom.example\t3\n";
        transport.push_bytes(200, gzip(tsv));
        let client = test_client(transport.clone());

        let report = client.download_sales_report(&sales_filter()).await.unwrap();
        assert_eq!(report, tsv);

        let request = &transport.requests()[0];
        assert!(request.url.starts_with(SALES_REPORTS_URL));
        assert!(request.url.contains("filter%5Bfrequency%5D=DAILY"));
        assert!(request.url.contains("filter%5BvendorNumber%5D=88888888"));
        assert!(request
            .headers
            .iter()
            .any(|(name, value)| name == "Accept-Encoding" && value == "gzip"));
    }

    #[tokio::test]
    async fn test_report_404_is_not_yet_available() {
        let transport = FakeTransport::new();
        transport.push_bytes(404, Vec::new());
        let client = test_client(transport);

        let err = client
            .download_sales_report(&sales_filter())
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectError::ReportNotReady(_)));
    }

    #[tokio::test]
    async fn test_report_other_failures_stay_generic() {
        let transport = FakeTransport::new();
        transport.push_json(403, json!({"errors": [{"detail": "Forbidden vendor"}]}));
        let client = test_client(transport);

        let err = client
            .download_sales_report(&sales_filter())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "API Error: Forbidden vendor");
    }

    #[tokio::test]
    async fn test_finance_report_query_shape() {
        let transport = FakeTransport::new();
        transport.push_bytes(200, gzip("header\n"));
        let client = test_client(transport.clone());

        let filter = FinanceReportFilter {
            region_code: "ZZ".to_string(),
            report_date: "2025-07".to_string(),
            report_type: "FINANCIAL".to_string(),
            vendor_number: "88888888".to_string(),
        };
        client.download_finance_report(&filter).await.unwrap();

        let url = &transport.requests()[0].url;
        assert!(url.starts_with(FINANCE_REPORTS_URL));
        assert!(url.contains("filter%5BregionCode%5D=ZZ"));
        assert!(url.contains("filter%5BreportType%5D=FINANCIAL"));
    }

    #[tokio::test]
    async fn test_presigned_segment_sends_no_auth_header() {
        let transport = FakeTransport::new();
        transport.push_bytes(200, gzip("day\tvalue\n"));
        let client = test_client(transport.clone());

        client
            .download_segment("https://report-bucket.s3.amazonaws.com/seg1?X-Amz-Signature=abc")
            .await
            .unwrap();

        assert!(transport.requests()[0].headers.is_empty());
    }

    #[tokio::test]
    async fn test_api_hosted_segment_sends_auth_header() {
        let transport = FakeTransport::new();
        transport.push_bytes(200, gzip("day\tvalue\n"));
        let client = test_client(transport.clone());

        client
            .download_segment("https://api.appstoreconnect.apple.com/v1/analyticsReportSegments/s1/data")
            .await
            .unwrap();

        assert!(transport.requests()[0]
            .headers
            .iter()
            .any(|(name, _)| name == "Authorization"));
    }

    #[tokio::test]
    async fn test_uncompressed_segment_returned_verbatim() {
        let transport = FakeTransport::new();
        transport.push_bytes(200, b"plain tsv text".to_vec());
        let client = test_client(transport);

        let text = client
            .download_segment("https://api.appstoreconnect.apple.com/v1/segments/s1")
            .await
            .unwrap();
        assert_eq!(text, "plain tsv text");
    }

    #[tokio::test]
    async fn test_segment_failure_carries_truncated_body() {
        let transport = FakeTransport::new();
        transport.push_bytes(500, vec![b'x'; 500]);
        let client = test_client(transport);

        let err = client
            .download_segment("https://api.appstoreconnect.apple.com/v1/segments/s1")
            .await
            .unwrap_err();
        match err {
            ConnectError::SegmentDownload {
                status,
                status_text,
                body_prefix,
            } => {
                assert_eq!(status, 500);
                assert_eq!(status_text, "Internal Server Error");
                assert_eq!(body_prefix.len(), 200);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_segment_transport_failure_maps_to_download_error() {
        let transport = FakeTransport::new();
        transport.push_failure("connection refused");
        let client = test_client(transport);

        let err = client
            .download_segment("https://api.appstoreconnect.apple.com/v1/segments/s1")
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectError::SegmentDownload { status: 0, .. }));
    }

    #[test]
    fn test_custom_policy_markers() {
        let policy = SegmentAuthPolicy::new(vec!["cdn.example.net".to_string()]);
        assert!(policy.is_presigned("https://cdn.example.net/seg?sig=1"));
        assert!(!policy.is_presigned("https://report-bucket.s3.amazonaws.com/seg"));
    }
}
