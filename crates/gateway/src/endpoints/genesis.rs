//! # GET /registration/v1beta1/genesis

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use keyreg_core::export_genesis;
use keyreg_types::{GenesisDocument, GenesisState};

use crate::config::GatewayState;
use crate::error::GatewayError;

/// 現行スキーマのジェネシス文書としてKeeperの全状態を書き出す。
pub async fn handle_genesis(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<GenesisDocument<GenesisState>>, GatewayError> {
    let keeper = state.keeper.read().await;
    Ok(Json(GenesisDocument::current(export_genesis(&*keeper)?)))
}
