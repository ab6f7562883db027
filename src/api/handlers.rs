use crate::error::AppError;
use crate::models::{Company, User};
use crate::pricing::PerformancePeriod;
use crate::AppState;
use async_trait::async_trait;
use axum::extract::{FromRequestParts, Path, Query, RawQuery, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

/// HTTP-facing error wrapper rendering `{"message": ...}` bodies
pub struct ApiError(AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self(AppError::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if status.is_server_error() {
            error!(error = %self.0, "request failed");
            "Internal server error.".to_string()
        } else {
            match &self.0 {
                AppError::NotFound(msg)
                | AppError::Unauthorized(msg)
                | AppError::Validation(msg)
                | AppError::Message(msg) => msg.clone(),
                other => other.to_string(),
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Extractor authenticating the bearer token on the request
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .unwrap_or("");

        if token.is_empty() {
            return Err(AppError::Unauthorized("Missing bearer token.".to_string()).into());
        }

        let user = state.auth.authenticate(token).await?;
        Ok(AuthUser(user))
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<Value>> {
    let email = body.email.as_deref().unwrap_or("").trim();
    let password = body.password.as_deref().unwrap_or("");

    if email.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "The email and password fields are required.".to_string(),
        )
        .into());
    }

    let issued = state.auth.login(email, password).await?;
    Ok(Json(json!({ "token": issued.token })))
}

#[derive(Deserialize)]
pub struct ComparisonQuery {
    from: Option<String>,
    to: Option<String>,
}

/// GET /api/companies/:id/stock-prices/comparison
pub async fn comparison(
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
    _user: AuthUser,
    Query(query): Query<ComparisonQuery>,
) -> ApiResult<Json<Value>> {
    let from = parse_required_date("from", query.from.as_deref())?;
    let to = parse_required_date("to", query.to.as_deref())?;

    let company = find_company(&state, company_id).await?;
    let comparison = state.performance.comparison(&company, from, to).await?;

    Ok(Json(json!({ "data": comparison })))
}

/// GET /api/companies/:id/stock-prices/performance
///
/// `periods[]` repeats, which serde-style query extraction cannot express,
/// so the raw query string is parsed by hand.
pub async fn performance(
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
    _user: AuthUser,
    RawQuery(raw): RawQuery,
) -> ApiResult<Json<Value>> {
    let (as_of_raw, period_codes) = parse_performance_query(raw.as_deref().unwrap_or(""));

    let as_of = match &as_of_raw {
        Some(value) => Some(parse_date("as_of", value)?),
        None => None,
    };

    let mut periods = Vec::with_capacity(period_codes.len());
    for code in &period_codes {
        periods.push(PerformancePeriod::from_str(code).map_err(AppError::Validation)?);
    }
    if periods.is_empty() {
        periods = PerformancePeriod::all().to_vec();
    }

    let company = find_company(&state, company_id).await?;
    let summary = state.performance.summary(&company, as_of, &periods).await?;

    Ok(Json(json!({ "data": summary })))
}

async fn find_company(state: &AppState, id: i64) -> ApiResult<Company> {
    state
        .companies
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Company not found.".to_string()).into())
}

fn parse_required_date(field: &str, value: Option<&str>) -> ApiResult<NaiveDate> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => parse_date(field, value),
        _ => Err(AppError::Validation(format!("The {} field is required.", field)).into()),
    }
}

fn parse_date(field: &str, value: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::Validation(format!(
            "The {} field must be a valid date (YYYY-MM-DD).",
            field
        ))
        .into()
    })
}

fn parse_performance_query(raw: &str) -> (Option<String>, Vec<String>) {
    let mut as_of = None;
    let mut periods = Vec::new();

    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        match key.as_ref() {
            "as_of" => as_of = Some(value.to_string()),
            "periods" | "periods[]" | "period" => periods.push(value.to_string()),
            _ => {}
        }
    }

    (as_of, periods)
}
