use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dong_recommender::handlers;
use dong_recommender::models::CATEGORY_COLUMN;
use dong_recommender::services::feature_store;
use dong_recommender::services::ranking::load_model;
use dong_recommender::{Config, NameLookup, Recommender};

#[actix_web::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(&config.log_format);

    info!(
        "Starting dong-recommender v{}",
        env!("CARGO_PKG_VERSION")
    );

    config
        .validate()
        .context("Configuration validation failed")?;

    // Artifacts are loaded once and shared read-only by every worker
    let store = feature_store::load_csv(&config.features_path)
        .with_context(|| format!("Failed to load feature panel {}", config.features_path))?;

    let mut feature_columns = config.feature_columns();
    if feature_columns.is_empty() {
        feature_columns = store.feature_columns().to_vec();
    }
    info!(columns = ?feature_columns, "Model input columns");

    let growth = load_model(&config.growth_model_path, &feature_columns)
        .context("Failed to load growth model")?;
    let risk = load_model(&config.risk_model_path, &feature_columns)
        .context("Failed to load risk model")?;

    let category_names =
        NameLookup::load_optional(&config.category_map_path, CATEGORY_COLUMN, "biz_name")
            .context("Failed to load category map")?;
    let location_names =
        NameLookup::load_optional(&config.location_map_path, "dong_code", "dong_name")
            .context("Failed to load dong map")?;

    let recommender = web::Data::new(
        Recommender::new(Arc::new(store), growth, risk)
            .with_category_names(category_names)
            .with_location_names(location_names),
    );

    let allowed_origins = config.allowed_origins();
    info!(
        "Starting HTTP server on {}:{}",
        config.http_host, config.http_port
    );

    HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in &allowed_origins {
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(recommender.clone())
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind((config.http_host.as_str(), config.http_port))
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server error")
}

fn init_tracing(log_format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,dong_recommender=debug".into());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_line_number(true)
                    .with_target(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
