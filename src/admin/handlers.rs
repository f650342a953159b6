use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::reload::ReloadStatus;
use crate::routing::RouteInfo;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub routes: usize,
    pub reload: ReloadStatus,
}

#[derive(Serialize)]
pub struct ReloadAccepted {
    pub status: &'static str,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        routes: state.router.len(),
        reload: state.reloader.status(),
    })
}

pub async fn get_routes(State(state): State<AdminState>) -> Json<Vec<RouteInfo>> {
    Json(state.router.describe())
}

pub async fn post_reload(State(state): State<AdminState>) -> (StatusCode, Json<ReloadAccepted>) {
    state.reload.trigger("admin request");
    (
        StatusCode::ACCEPTED,
        Json(ReloadAccepted {
            status: "reload scheduled",
        }),
    )
}
