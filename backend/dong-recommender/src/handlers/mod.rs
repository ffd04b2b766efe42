use actix_web::error::QueryPayloadError;
use actix_web::{get, web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{LocationMatch, RecommendRequest};
use crate::services::Recommender;

pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_ALPHA: f64 = 1.0;

// ===========================================================================
// Request/Response DTOs
// ===========================================================================

#[derive(Debug, Deserialize)]
pub struct LocationCodesQuery {
    pub quarter: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub quarter: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecommendQuery {
    pub dong_code: String,
    pub quarter: String,
    #[validate(range(min = 1, max = 50))]
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[validate(range(min = 0.0, max = 5.0))]
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

impl From<RecommendQuery> for RecommendRequest {
    fn from(query: RecommendQuery) -> Self {
        RecommendRequest {
            location_code: query.dong_code.trim().to_string(),
            quarter: query.quarter.trim().to_string(),
            top_n: query.top_n,
            weight: query.alpha,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuartersResponse {
    pub quarters: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LocationCodesResponse {
    pub dong_codes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub items: Vec<LocationMatch>,
}

// ===========================================================================
// REST API Handlers
// ===========================================================================

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(query_error))
        .service(health)
        .service(list_quarters)
        .service(list_dong_codes)
        .service(search_dong)
        .service(recommend);
}

/// Malformed or missing query parameters get the JSON error envelope.
fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(err.to_string()).into()
}

/// GET /health
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "ok": true }))
}

/// GET /quarters - every quarter in the feature panel
#[get("/quarters")]
pub async fn list_quarters(recommender: web::Data<Recommender>) -> HttpResponse {
    HttpResponse::Ok().json(QuartersResponse {
        quarters: recommender.list_quarters(),
    })
}

/// GET /dong_codes?quarter= - dong codes present in a quarter
#[get("/dong_codes")]
pub async fn list_dong_codes(
    recommender: web::Data<Recommender>,
    query: web::Query<LocationCodesQuery>,
) -> HttpResponse {
    HttpResponse::Ok().json(LocationCodesResponse {
        dong_codes: recommender.list_location_codes(&query.quarter),
    })
}

/// GET /search_dong?q=&quarter= - dong lookup by code fragment or name
#[get("/search_dong")]
pub async fn search_dong(
    recommender: web::Data<Recommender>,
    query: web::Query<SearchQuery>,
) -> HttpResponse {
    HttpResponse::Ok().json(SearchResponse {
        items: recommender.search_locations(&query.q, query.quarter.as_deref()),
    })
}

/// GET /recommend?dong_code=&quarter=&top_n=&alpha=
///
/// score = proba_growth - alpha * proba_risk
#[get("/recommend")]
pub async fn recommend(
    recommender: web::Data<Recommender>,
    query: web::Query<RecommendQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    query.validate()?;
    if !query.alpha.is_finite() {
        return Err(AppError::Validation("alpha must be a finite number".to_string()));
    }

    let request = RecommendRequest::from(query);
    info!(
        dong_code = %request.location_code,
        quarter = %request.quarter,
        top_n = request.top_n,
        alpha = request.weight,
        "Recommendation requested"
    );

    let recommender = recommender.into_inner();
    let result = web::block(move || recommender.recommend(&request)).await??;

    Ok(HttpResponse::Ok().json(result))
}
