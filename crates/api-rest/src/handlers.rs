use crate::dto::{
    CaseFormReq, CasesRes, DeleteRes, ErrorRes, HealthRes, MonthQuery, MonthRes,
};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use case_core::{month_page, parse_iso_date, CaseError, CaseForm};
use chrono::{Datelike, Local, NaiveDate};
use maud::Markup;

type ApiError = (StatusCode, Json<ErrorRes>);

/// Maps core errors onto HTTP status codes.
pub fn error_status(error: &CaseError) -> StatusCode {
    match error {
        CaseError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        CaseError::NotFound { .. } | CaseError::OutOfRange { .. } => StatusCode::NOT_FOUND,
        CaseError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        CaseError::MalformedDocument(_) | CaseError::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn api_error(context: &str, error: CaseError) -> ApiError {
    let status = error_status(&error);
    if status.is_server_error() {
        tracing::error!("{} error: {:?}", context, error);
    } else {
        tracing::debug!("{} rejected: {}", context, error);
    }
    (
        status,
        Json(ErrorRes {
            error: error.to_string(),
        }),
    )
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn resolve_month(query: &MonthQuery) -> (i32, u32) {
    let today = today();
    (
        query.year.unwrap_or_else(|| today.year()),
        query.month.unwrap_or_else(|| today.month()),
    )
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
pub async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Case REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/cases",
    responses(
        (status = 200, description = "All stored cases in document order", body = CasesRes),
        (status = 503, description = "Storage backend unavailable", body = ErrorRes)
    )
)]
/// Lists the full collection.
#[axum::debug_handler]
pub async fn list_cases(State(state): State<AppState>) -> Result<Json<CasesRes>, ApiError> {
    let cases = state
        .service
        .cases()
        .map_err(|e| api_error("List cases", e))?;
    Ok(Json(CasesRes { cases }))
}

#[utoipa::path(
    post,
    path = "/cases",
    request_body = CaseFormReq,
    responses(
        (status = 200, description = "Case stored; returns the saved collection", body = CasesRes),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 503, description = "Storage backend unavailable", body = ErrorRes)
    )
)]
/// Adds a case, or replaces the stored case with the same key.
///
/// The whole collection is written back before responding.
#[axum::debug_handler]
pub async fn submit_case(
    State(state): State<AppState>,
    Json(req): Json<CaseFormReq>,
) -> Result<Json<CasesRes>, ApiError> {
    let date = match req.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => parse_iso_date(raw)
            .map_err(|e| api_error("Submit case", CaseError::InvalidInput(e.to_string())))?,
        None => today(),
    };

    let form = CaseForm {
        key: req.key,
        date,
        name: req.name,
        extra_fields: req.extra_fields,
        test_dates: req.test_dates,
    };
    let cases = state
        .service
        .submit_form(form)
        .map_err(|e| api_error("Submit case", e))?;
    Ok(Json(CasesRes { cases }))
}

#[utoipa::path(
    delete,
    path = "/cases/{index}",
    params(("index" = usize, Path, description = "Position in the collection")),
    responses(
        (status = 200, description = "Case deleted", body = DeleteRes),
        (status = 404, description = "No case at that position", body = ErrorRes),
        (status = 503, description = "Storage backend unavailable", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn delete_case_at(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<DeleteRes>, ApiError> {
    let deleted = state
        .service
        .remove_at(index)
        .map_err(|e| api_error("Delete case", e))?;
    Ok(Json(DeleteRes { deleted }))
}

#[utoipa::path(
    delete,
    path = "/cases/key/{key}",
    params(("key" = String, Path, description = "Value of the configured key field")),
    responses(
        (status = 200, description = "Case deleted", body = DeleteRes),
        (status = 404, description = "No case with that key", body = ErrorRes),
        (status = 503, description = "Storage backend unavailable", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn delete_case_by_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteRes>, ApiError> {
    let deleted = state
        .service
        .remove_by_key(&key)
        .map_err(|e| api_error("Delete case", e))?;
    Ok(Json(DeleteRes { deleted }))
}

#[utoipa::path(
    get,
    path = "/month",
    params(MonthQuery),
    responses(
        (status = 200, description = "Cases and calendar for the month", body = MonthRes),
        (status = 400, description = "Invalid month", body = ErrorRes),
        (status = 503, description = "Storage backend unavailable", body = ErrorRes)
    )
)]
/// Cases touching the month, its test dates, and the calendar grid.
#[axum::debug_handler]
pub async fn month_view(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthRes>, ApiError> {
    let (year, month) = resolve_month(&query);
    let view = state
        .service
        .month_view(year, month)
        .map_err(|e| api_error("Month view", e))?;
    Ok(Json(MonthRes::from(view)))
}

#[utoipa::path(
    get,
    path = "/month/html",
    params(MonthQuery),
    responses(
        (status = 200, description = "Rendered month page", body = String, content_type = "text/html"),
        (status = 400, description = "Invalid month", body = ErrorRes),
        (status = 503, description = "Storage backend unavailable", body = ErrorRes)
    )
)]
/// The month view rendered as an HTML page with test dates highlighted.
#[axum::debug_handler]
pub async fn month_html(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Markup, ApiError> {
    let (year, month) = resolve_month(&query);
    let view = state
        .service
        .month_view(year, month)
        .map_err(|e| api_error("Month page", e))?;

    Ok(month_page(&view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{router, AppState};
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use case_core::{CaseSchema, CaseService, CoreConfig, MemoryBackend};
    use chrono::Weekday;
    use http_body_util::BodyExt;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> (AppState, Arc<MemoryBackend>) {
        let cfg = Arc::new(
            CoreConfig::new(
                PathBuf::from("unused"),
                "cases.json",
                None,
                CaseSchema::default(),
                Weekday::Sun,
            )
            .unwrap(),
        );
        let backend = Arc::new(MemoryBackend::new());
        let service = CaseService::new(cfg, backend.clone()).unwrap();
        (AppState::new(service), backend)
    }

    async fn send(state: &AppState, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = router(state.clone())
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _) = test_state();
        let (status, body) = send(&state, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"ok\":true"));
    }

    #[tokio::test]
    async fn test_submit_then_month_view() {
        let (state, _) = test_state();
        let submit = r#"{"key":"A1","date":"2025-09-03","name":"檢驗","test_dates":"2025-09-10, 2025-10-01"}"#;

        let (status, body) = send(&state, Method::POST, "/cases", Some(submit)).await;
        assert_eq!(status, StatusCode::OK);
        let cases: CasesRes = serde_json::from_str(&body).unwrap();
        assert_eq!(cases.cases.len(), 1);
        assert_eq!(cases.cases[0].text("name"), Some("檢驗"));

        let (status, body) = send(&state, Method::GET, "/month?year=2025&month=9", None).await;
        assert_eq!(status, StatusCode::OK);
        let month: MonthRes = serde_json::from_str(&body).unwrap();
        assert_eq!(month.records.len(), 1);
        assert_eq!(month.test_dates, vec!["2025-09-10"]);
        assert_eq!(month.first_weekday, "Sun");
        assert!(month.weeks.iter().all(|week| week.len() == 7));
        let flagged: Vec<&str> = month
            .weeks
            .iter()
            .flatten()
            .filter(|d| d.flagged)
            .map(|d| d.date.as_str())
            .collect();
        assert_eq!(flagged, vec!["2025-09-10"]);
    }

    #[tokio::test]
    async fn test_resubmit_keeps_one_case() {
        let (state, _) = test_state();
        send(&state, Method::POST, "/cases", Some(r#"{"key":"A1","date":"2025-09-03"}"#)).await;
        let (_, body) = send(&state, Method::POST, "/cases", Some(r#"{"key":"A1","date":"2025-09-20"}"#)).await;

        let cases: CasesRes = serde_json::from_str(&body).unwrap();
        assert_eq!(cases.cases.len(), 1);
        assert_eq!(cases.cases[0].text("date"), Some("2025-09-20"));
    }

    #[tokio::test]
    async fn test_submit_rejects_bad_date() {
        let (state, _) = test_state();
        let (status, body) =
            send(&state, Method::POST, "/cases", Some(r#"{"key":"A1","date":"03/09/2025"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("YYYY-MM-DD"));
    }

    #[tokio::test]
    async fn test_delete_out_of_range_is_not_found() {
        let (state, _) = test_state();
        send(&state, Method::POST, "/cases", Some(r#"{"key":"A1","date":"2025-09-03"}"#)).await;

        let (status, _) = send(&state, Method::DELETE, "/cases/5", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&state, Method::DELETE, "/cases/0", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("A1"));
    }

    #[tokio::test]
    async fn test_delete_by_key() {
        let (state, _) = test_state();
        send(&state, Method::POST, "/cases", Some(r#"{"key":"A1","date":"2025-09-03"}"#)).await;

        let (status, _) = send(&state, Method::DELETE, "/cases/key/A1", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&state, Method::DELETE, "/cases/key/A1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_month_is_bad_request() {
        let (state, _) = test_state();
        let (status, _) = send(&state, Method::GET, "/month?year=2025&month=13", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_backend_offline_is_service_unavailable() {
        let (state, backend) = test_state();
        backend.set_offline(true);

        let (status, body) = send(&state, Method::GET, "/cases", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("unavailable"));
    }

    #[tokio::test]
    async fn test_month_html_highlights_test_dates() {
        let (state, _) = test_state();
        send(
            &state,
            Method::POST,
            "/cases",
            Some(r#"{"key":"A1","date":"2025-09-03","test_dates":"2025-09-10"}"#),
        )
        .await;

        let (status, body) = send(&state, Method::GET, "/month/html?year=2025&month=9", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<td class=\"wed flagged\">10</td>"));
        assert!(body.contains("<title>Cases 2025-09</title>"));
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let (state, _) = test_state();
        let (status, body) = send(&state, Method::GET, "/api-docs/openapi.json", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("/month/html"));
    }
}
