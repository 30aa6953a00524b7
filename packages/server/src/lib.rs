#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the flood exposure dashboard.
//!
//! Hosts one dashboard session backed by the in-memory map engine. The
//! REST API mirrors the dashboard's controls (municipality dropdown,
//! scenario toggles, legend cards, Blue Acres switch, CSV download) and
//! the raw data files are served under `/data` for the map frontend.

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use flood_map_asset_models::{Municipality, ScenarioYear};
use flood_map_config::AppConfig;
use flood_map_dashboard::{Dashboard, Refresh, Resource, Viewport};
use flood_map_engine::InMemoryEngine;

/// Shared application state.
pub struct AppState {
    /// The dashboard session.
    pub dashboard: Arc<Dashboard>,
    /// Engine behind the session, for layer state inspection.
    pub engine: Arc<InMemoryEngine>,
}

/// Builds the engine and dashboard described by `config` and loads the
/// startup resources. Missing data degrades to empty layers, no baseline
/// totals and no viewport fits.
pub async fn open_dashboard(config: &AppConfig) -> AppState {
    let mut engine = InMemoryEngine::new();
    for year in ScenarioYear::all() {
        engine.load_source_file_or_empty(*year, &config.data.assets_path(*year));
    }
    let engine = Arc::new(engine);

    let viewport = match (
        config.dashboard.viewport_width,
        config.dashboard.viewport_height,
    ) {
        (Some(width), Some(height)) => Viewport::from_dimensions(width, height),
        _ => Viewport::Desktop,
    };
    let municipality = Municipality::from_url_param(config.dashboard.city.as_deref());
    log::info!("Opening dashboard for {}", municipality.display_name());

    let dashboard = Dashboard::new(engine.clone(), municipality, viewport);

    let totals = config
        .data
        .totals_url
        .clone()
        .map_or_else(|| Resource::File(config.data.totals_path()), Resource::Url);
    let boundaries = config
        .data
        .boundary_url
        .clone()
        .map_or_else(|| Resource::File(config.data.boundary_path()), Resource::Url);
    log::info!("Loading totals from {totals} and boundaries from {boundaries}");
    dashboard.load(&totals, &boundaries).await;

    if let Refresh::Applied(report) = dashboard.refresh_statistics().await {
        log::info!(
            "{}: {} assets, {} exposed in 2025, {} by 2050",
            report.display_name,
            report.statistics.overall_total,
            report.statistics.overall_2025,
            report.statistics.overall_2050,
        );
    }

    AppState {
        dashboard: Arc::new(dashboard),
        engine,
    }
}

/// Registers the `/api` routes.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/municipalities", web::get().to(handlers::municipalities))
            .route("/asset-types", web::get().to(handlers::asset_types))
            .route("/state", web::get().to(handlers::current_state))
            .route(
                "/municipality/{key}",
                web::post().to(handlers::select_municipality),
            )
            .route("/scenario/{year}", web::post().to(handlers::toggle_scenario))
            .route(
                "/assets/{type}/toggle",
                web::post().to(handlers::toggle_asset_type),
            )
            .route("/overlay/toggle", web::post().to(handlers::toggle_overlay))
            .route("/statistics", web::get().to(handlers::statistics))
            .route("/export", web::get().to(handlers::export)),
    );
}

/// Starts the flood map API server.
///
/// Loads the data described by `config` and serves the API until the
/// server is stopped. The caller provides the async runtime.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: AppConfig) -> std::io::Result<()> {
    let state = web::Data::new(open_dashboard(&config).await);
    let data_dir = config.data.dir.clone();
    let bind_addr = config.server.bind_addr;
    let port = config.server.port;

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_api)
            // Serve the boundary, asset and findings files to the map
            .service(Files::new("/data", data_dir.clone()))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;

    use super::*;

    const ASSETS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-74.17, 40.73]},
             "properties": {"UNIQUE_ID": "A1", "ASSET": "SCHOOL", "MUN": "NEWARK CITY", "NAME": "Central HS"}}
        ]
    }"#;

    fn state() -> web::Data<AppState> {
        let mut engine = InMemoryEngine::new();
        engine
            .insert_source_geojson(ScenarioYear::Current, ASSETS)
            .unwrap();
        let engine = Arc::new(engine);
        let dashboard = Dashboard::new(engine.clone(), Municipality::Newark, Viewport::Desktop);
        web::Data::new(AppState {
            dashboard: Arc::new(dashboard),
            engine,
        })
    }

    #[actix_web::test]
    async fn unknown_municipality_is_not_found() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_api)).await;

        let req = test::TestRequest::post()
            .uri("/api/municipality/HOBOKEN")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(state.dashboard.selection().municipality(), Municipality::Newark);
    }

    #[actix_web::test]
    async fn overlay_toggle_reports_layer_state() {
        let app = test::init_service(App::new().app_data(state()).configure(configure_api)).await;

        let req = test::TestRequest::post().uri("/api/overlay/toggle").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["selection"]["overlay"], true);
        assert_eq!(body["map"]["layers"]["assets_2025"]["visibility"], "none");
        assert_eq!(body["map"]["layers"]["blueacres-fill"]["visibility"], "visible");
    }

    #[actix_web::test]
    async fn export_downloads_csv() {
        let app = test::init_service(App::new().app_data(state()).configure(configure_api)).await;

        let req = test::TestRequest::get().uri("/api/export").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("Newark_2025_2050_flood_exposed_assets.csv"));

        let body = test::read_body(resp).await;
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.contains("Central HS,Schools,Unknown,Newark,A1,2025,-74.170000,40.730000"));
    }

    #[actix_web::test]
    async fn empty_export_is_not_found() {
        let state = state();
        assert!(state.dashboard.select_municipality("TRENTON CITY"));
        let app = test::init_service(App::new().app_data(state).configure(configure_api)).await;

        let req = test::TestRequest::get().uri("/api/export").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "No exposed assets found for this municipality");
    }

    #[actix_web::test]
    async fn statistics_report() {
        let app = test::init_service(App::new().app_data(state()).configure(configure_api)).await;

        let req = test::TestRequest::get().uri("/api/statistics").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["municipality"], "NEWARK CITY");
        assert_eq!(body["statistics"]["overall2025"], 1);
        assert_eq!(body["legend"][0]["label"], "Schools");
    }
}
