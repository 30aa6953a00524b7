//! HTTP handler functions for the flood map API.

use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, web};
use flood_map_asset_models::{AssetType, Municipality};
use flood_map_dashboard::{ExportError, Refresh};
use flood_map_server_models::{ApiAssetType, ApiError, ApiHealth, ApiMunicipality, ApiState};

use crate::AppState;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        totals_loaded: state.dashboard.totals().is_some_and(|t| !t.is_empty()),
        bounds_loaded: state.dashboard.bounds().is_some(),
    })
}

/// `GET /api/municipalities`
pub async fn municipalities(state: web::Data<AppState>) -> HttpResponse {
    let bounds = state.dashboard.bounds();
    let list: Vec<ApiMunicipality> = Municipality::all()
        .iter()
        .map(|mun| ApiMunicipality::new(*mun, bounds.and_then(|b| b.get(*mun))))
        .collect();
    HttpResponse::Ok().json(list)
}

/// `GET /api/asset-types`
pub async fn asset_types() -> HttpResponse {
    let list: Vec<ApiAssetType> = AssetType::all().iter().copied().map(Into::into).collect();
    HttpResponse::Ok().json(list)
}

/// `GET /api/state`
pub async fn current_state(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(snapshot(&state))
}

/// `POST /api/municipality/{key}`
pub async fn select_municipality(
    state: web::Data<AppState>,
    key: web::Path<String>,
) -> HttpResponse {
    if state.dashboard.select_municipality(&key) {
        HttpResponse::Ok().json(snapshot(&state))
    } else {
        HttpResponse::NotFound().json(ApiError::new(format!("Unknown municipality: {key}")))
    }
}

/// `POST /api/scenario/{year}`
pub async fn toggle_scenario(state: web::Data<AppState>, year: web::Path<String>) -> HttpResponse {
    if state.dashboard.toggle_scenario(&year) {
        HttpResponse::Ok().json(snapshot(&state))
    } else {
        HttpResponse::NotFound().json(ApiError::new(format!("Unknown scenario: {year}")))
    }
}

/// `POST /api/assets/{type}/toggle`
pub async fn toggle_asset_type(
    state: web::Data<AppState>,
    asset: web::Path<String>,
) -> HttpResponse {
    if state.dashboard.toggle_asset_type(&asset) {
        HttpResponse::Ok().json(snapshot(&state))
    } else {
        HttpResponse::NotFound().json(ApiError::new(format!("Unknown asset type: {asset}")))
    }
}

/// `POST /api/overlay/toggle`
pub async fn toggle_overlay(state: web::Data<AppState>) -> HttpResponse {
    state.dashboard.toggle_overlay();
    HttpResponse::Ok().json(snapshot(&state))
}

/// `GET /api/statistics`
///
/// Recomputes the report for the active municipality.
pub async fn statistics(state: web::Data<AppState>) -> HttpResponse {
    match state.dashboard.refresh_statistics().await {
        Refresh::Applied(report) => HttpResponse::Ok().json(report.as_ref()),
        Refresh::Stale => HttpResponse::Conflict().json(ApiError::new(
            "Municipality changed while computing statistics",
        )),
    }
}

/// `GET /api/export`
///
/// Downloads every exposed asset of the active municipality as CSV.
pub async fn export(state: web::Data<AppState>) -> HttpResponse {
    match state.dashboard.export_csv().await {
        Ok(export) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(export.filename)],
            })
            .body(export.contents),
        Err(e @ ExportError::NoAssets) => HttpResponse::NotFound().json(ApiError::new(e.to_string())),
        Err(e) => {
            log::error!("Failed to build export: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to build export"))
        }
    }
}

fn snapshot(state: &AppState) -> ApiState {
    let selection = state.dashboard.selection();
    ApiState {
        active_year: selection.active_year(),
        selection,
        map: state.engine.snapshot(),
    }
}
