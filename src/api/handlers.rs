use super::error::ApiError;
use crate::models::money::{decimal_from_f64, parse_decimal, serialize_as_f64};
use crate::models::{
    AggregatedReceipt, Classification, ClassificationFigure, InvoiceSummary, MonthlyTrend,
    ReconSummary, RecordFilter, SourceCounts,
};
use crate::service::{self, ReconService};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bigdecimal::BigDecimal;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

fn now_iso() -> String {
    Local::now().to_rfc3339()
}

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

/// 发票级对账结果
#[derive(Debug, Serialize)]
pub struct InvoiceRecordsResponse {
    pub success: bool,
    pub data: Vec<InvoiceSummary>,
    pub total_records: usize,
    pub timestamp: String,
}

/// 上传对账结果 (行级)
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
    pub data: Vec<AggregatedReceipt>,
    pub total_records: usize,
    pub source_counts: SourceCounts,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub success: bool,
    #[serde(flatten)]
    pub summary: ReconSummary,
    pub timestamp: String,
}

/// 数字或数字字符串
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberLike {
    Number(f64),
    Text(String),
}

impl NumberLike {
    fn to_decimal(&self, field: &str) -> Result<BigDecimal, ApiError> {
        let parsed = match self {
            NumberLike::Number(n) => decimal_from_f64(*n),
            NumberLike::Text(s) => parse_decimal(s),
        };
        parsed.ok_or_else(|| ApiError::BadRequest(format!("{field} must be a number")))
    }
}

/// 过滤请求体, 所有字段可选
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_variance: Option<NumberLike>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_variance: Option<NumberLike>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upc: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|s| !s.is_empty()).map(str::to_string)
}

impl FilterRequest {
    /// 空字符串视为未设置
    pub fn to_filter(&self) -> Result<RecordFilter, ApiError> {
        let classification = non_empty(&self.classification)
            .map(|c| c.parse::<Classification>())
            .transpose()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        Ok(RecordFilter {
            classification,
            min_variance: self
                .min_variance
                .as_ref()
                .map(|v| v.to_decimal("min_variance"))
                .transpose()?,
            max_variance: self
                .max_variance
                .as_ref()
                .map(|v| v.to_decimal("max_variance"))
                .transpose()?,
            purchase_order: non_empty(&self.purchase_order),
            upc: non_empty(&self.upc),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct FilterResponse {
    pub success: bool,
    pub data: Vec<AggregatedReceipt>,
    pub total_records: usize,
    pub filters_applied: FilterRequest,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct DisputableResponse {
    pub success: bool,
    pub data: Vec<AggregatedReceipt>,
    pub total_disputable: usize,
    #[serde(serialize_with = "serialize_as_f64")]
    pub total_disputable_amount: BigDecimal,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct MonthlyTrendsResponse {
    pub success: bool,
    pub data: Vec<MonthlyTrend>,
    pub total_months: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct VarianceChartResponse {
    pub success: bool,
    pub data: Vec<ClassificationFigure>,
    pub totals: BTreeMap<&'static str, f64>,
    pub timestamp: String,
}

/// 健康检查
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: now_iso(),
    })
}

/// 默认文件的发票级对账
pub async fn process_default(
    State(service): State<Arc<ReconService>>,
) -> Result<Json<InvoiceRecordsResponse>, ApiError> {
    let dataset = service.default_dataset().await?;
    let invoices = service::summarize_by_invoice(&dataset.rows);
    tracing::info!(
        "process-default: {} rows -> {} invoices",
        dataset.len(),
        invoices.len()
    );

    Ok(Json(InvoiceRecordsResponse {
        success: true,
        total_records: invoices.len(),
        data: invoices,
        timestamp: now_iso(),
    }))
}

/// 上传并对账 (行级结果)
pub async fn upload_and_process(
    State(service): State<Arc<ReconService>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart =
        multipart.map_err(|_| ApiError::BadRequest("No file provided".to_string()))?;

    let mut upload: Option<(String, Bytes)> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            upload = Some((filename, bytes));
            break;
        }
    }
    let Some((filename, bytes)) = upload else {
        return Err(ApiError::BadRequest("No file provided".to_string()));
    };

    let (stored_name, dataset) = service.upload_and_reconcile(&filename, &bytes).await?;

    Ok(Json(UploadResponse {
        success: true,
        filename: stored_name,
        total_records: dataset.len(),
        source_counts: dataset.source_counts,
        data: dataset.rows,
        timestamp: now_iso(),
    }))
}

/// 汇总统计
pub async fn summary(
    State(service): State<Arc<ReconService>>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let dataset = service.default_dataset().await?;
    Ok(Json(SummaryResponse {
        success: true,
        summary: service::summarize(&dataset.rows),
        timestamp: now_iso(),
    }))
}

/// 条件过滤 (行级); 请求体可为空
pub async fn filter(
    State(service): State<Arc<ReconService>>,
    body: Bytes,
) -> Result<Json<FilterResponse>, ApiError> {
    let request: FilterRequest = if body.iter().all(u8::is_ascii_whitespace) {
        FilterRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid filter body: {e}")))?
    };
    let filter = request.to_filter()?;

    let dataset = service.default_dataset().await?;
    let rows = service::filter_rows(&dataset.rows, &filter);

    Ok(Json(FilterResponse {
        success: true,
        total_records: rows.len(),
        data: rows,
        filters_applied: request,
        timestamp: now_iso(),
    }))
}

/// 可争议项, 差异降序
pub async fn disputable_items(
    State(service): State<Arc<ReconService>>,
) -> Result<Json<DisputableResponse>, ApiError> {
    let dataset = service.default_dataset().await?;
    let items = service::disputable_items(&dataset.rows);
    let total_disputable_amount = items
        .iter()
        .fold(BigDecimal::from(0), |acc, r| acc + &r.variance);

    Ok(Json(DisputableResponse {
        success: true,
        total_disputable: items.len(),
        total_disputable_amount,
        data: items,
        timestamp: now_iso(),
    }))
}

/// 月度扣款趋势
pub async fn monthly_trends(
    State(service): State<Arc<ReconService>>,
) -> Result<Json<MonthlyTrendsResponse>, ApiError> {
    let dataset = service.default_dataset().await?;
    let trends = service::monthly_trends(&dataset.rows);

    Ok(Json(MonthlyTrendsResponse {
        success: true,
        total_months: trends.len(),
        data: trends,
        timestamp: now_iso(),
    }))
}

/// 按结论的差异图表数据
pub async fn variance_by_classification(
    State(service): State<Arc<ReconService>>,
) -> Result<Json<VarianceChartResponse>, ApiError> {
    let dataset = service.default_dataset().await?;
    let figures = service::variance_by_classification(&dataset.rows);

    Ok(Json(VarianceChartResponse {
        success: true,
        data: figures.figures(),
        totals: figures.totals(),
        timestamp: now_iso(),
    }))
}

/// 行级结果导出为 CSV
pub async fn export_csv(State(service): State<Arc<ReconService>>) -> Result<Response, ApiError> {
    let dataset = service.default_dataset().await?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in &dataset.rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"reconciliation.csv\""),
        ],
        bytes,
    )
        .into_response())
}
