//! HTTP处理器
//!
//! 前台终端的全部操作入口。号码在请求体中以字符串形式到达（输入框原文），
//! 在此边界一次性解析为整数，核心内部不再出现字符串号码。

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use call_core::utils::parse_reception_number;
use call_core::{CallError, QueueState};
use call_report::export_completion_log;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::service::AppState;

/// API根路径处理器
pub async fn api_root() -> impl IntoResponse {
    Json(json!({
        "service": "Clinic Call API",
        "version": "1.0.0",
        "status": "running",
        "endpoints": {
            "health": "/health",
            "api": "/api/v1",
            "display_stream": "/api/v1/display/stream"
        }
    }))
}

/// 健康检查处理器
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": "1.0.0"
    }))
}

/// 错误响应包装
///
/// 孤儿规则不允许直接为核心错误实现IntoResponse，处理器统一返回此包装。
pub struct ApiError(CallError);

impl From<CallError> for ApiError {
    fn from(err: CallError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CallError::InvalidNumber(_) | CallError::InvalidPatientId(_) => {
                StatusCode::BAD_REQUEST
            }
            CallError::DuplicateNumber(_) => StatusCode::CONFLICT,
            CallError::NotFound(_) => StatusCode::NOT_FOUND,
            CallError::TransientStore(_) => StatusCode::SERVICE_UNAVAILABLE,
            CallError::Config(_) => StatusCode::BAD_REQUEST,
            CallError::Serialization(_) | CallError::Io(_) | CallError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": true,
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// 受理登记请求（字段为输入框原文）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub reception_number: String,
    pub patient_id: String,
}

/// 针对单个号码的操作请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberRequest {
    pub reception_number: u32,
}

/// 修改号码请求（新号码为输入原文）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenumberRequest {
    pub old_number: u32,
    pub new_number: String,
}

/// CSV导出参数（诊所本地日期，闭区间）
#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// 当前状态快照查询
pub async fn get_state(State(app): State<AppState>) -> ApiResult<Json<QueueState>> {
    Ok(Json(app.service.state().await?))
}

/// 受理登记
pub async fn register(
    State(app): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<QueueState>> {
    let number = parse_reception_number(&req.reception_number)?;
    let state = app.service.register(number, req.patient_id.trim()).await?;
    Ok(Json(state))
}

/// 呼叫
pub async fn call(
    State(app): State<AppState>,
    Json(req): Json<NumberRequest>,
) -> ApiResult<Json<QueueState>> {
    Ok(Json(app.service.call(req.reception_number).await?))
}

/// 转入离席
pub async fn mark_absent(
    State(app): State<AppState>,
    Json(req): Json<NumberRequest>,
) -> ApiResult<Json<QueueState>> {
    Ok(Json(app.service.mark_absent(req.reception_number).await?))
}

/// 离席返回等待
pub async fn recall(
    State(app): State<AppState>,
    Json(req): Json<NumberRequest>,
) -> ApiResult<Json<QueueState>> {
    Ok(Json(app.service.recall(req.reception_number).await?))
}

/// 完成
pub async fn complete(
    State(app): State<AppState>,
    Json(req): Json<NumberRequest>,
) -> ApiResult<Json<QueueState>> {
    Ok(Json(app.service.complete(req.reception_number).await?))
}

/// 取消受理
pub async fn cancel(
    State(app): State<AppState>,
    Json(req): Json<NumberRequest>,
) -> ApiResult<Json<QueueState>> {
    Ok(Json(app.service.cancel(req.reception_number).await?))
}

/// 修改受理号码
pub async fn renumber(
    State(app): State<AppState>,
    Json(req): Json<RenumberRequest>,
) -> ApiResult<Json<QueueState>> {
    let new_number = parse_reception_number(&req.new_number)?;
    Ok(Json(app.service.renumber(req.old_number, new_number).await?))
}

/// 重置活跃列表（完成记录日志保留）
pub async fn reset(State(app): State<AppState>) -> ApiResult<Json<QueueState>> {
    info!("Reset requested from staff terminal");
    Ok(Json(app.service.reset().await?))
}

/// 完成记录CSV导出
pub async fn export_csv(
    State(app): State<AppState>,
    Query(params): Query<ExportParams>,
) -> ApiResult<Response> {
    let state = app.service.state().await?;
    let export = export_completion_log(
        &state.completion_log,
        params.start,
        params.end,
        app.clinic_offset,
    )?;

    let Some(export) = export else {
        let body = Json(json!({
            "error": true,
            "message": "指定期间内没有完成记录",
        }));
        return Ok((StatusCode::NOT_FOUND, body).into_response());
    };

    // 文件名含非ASCII字符，经RFC 5987编码进响应头
    let disposition = format!(
        "attachment; filename=\"completion_log.csv\"; filename*=UTF-8''{}",
        rfc5987_encode(&export.filename)
    );
    let headers = [
        (
            header::CONTENT_TYPE,
            "text/csv; charset=utf-8".to_string(),
        ),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    Ok((StatusCode::OK, headers, export.content).into_response())
}

fn rfc5987_encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'-' | b'.' | b'_' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}
