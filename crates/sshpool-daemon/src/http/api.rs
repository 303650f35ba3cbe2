//! Channel routes

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use sshpool_core::record::TextOutput;
use sshpool_core::ChannelInfo;

use super::error::ApiError;
use crate::state::DaemonState;

/// Body returned by mutating routes on success
pub const OK: &str = "OK";

pub fn router() -> Router<DaemonState> {
    Router::new()
        .route("/channels", get(list_channels).post(create_channel))
        .route(
            "/channels/:alias",
            get(channel_info).post(run_command).delete(delete_channel),
        )
}

async fn list_channels(State(state): State<DaemonState>) -> Json<BTreeMap<String, ChannelInfo>> {
    tracing::debug!("GET /channels");
    Json(state.registry.list())
}

async fn channel_info(
    State(state): State<DaemonState>,
    Path(alias): Path<String>,
) -> Result<Json<ChannelInfo>, ApiError> {
    tracing::debug!(%alias, "GET /channels/:alias");
    let channel = state.registry.lookup(&alias)?;
    Ok(Json(channel.info()))
}

async fn create_channel(
    State(state): State<DaemonState>,
    descriptor: String,
) -> Result<&'static str, ApiError> {
    tracing::debug!("POST /channels");
    let channel = state.registry.create(&descriptor).await?;
    tracing::info!(channel = %channel.dsn().redacted(), "Channel created");
    Ok(OK)
}

async fn run_command(
    State(state): State<DaemonState>,
    Path(alias): Path<String>,
    command: String,
) -> Result<Json<TextOutput>, ApiError> {
    tracing::debug!(%alias, %command, "POST /channels/:alias");
    let output = state.registry.execute(&alias, &command).await?;
    Ok(Json(output.to_text()))
}

async fn delete_channel(
    State(state): State<DaemonState>,
    Path(alias): Path<String>,
) -> Result<&'static str, ApiError> {
    tracing::debug!(%alias, "DELETE /channels/:alias");
    state.registry.remove(&alias)?;
    Ok(OK)
}
