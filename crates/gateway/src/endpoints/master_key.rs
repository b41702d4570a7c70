//! # GET /registration/v1beta1/master-key/{key_type}

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use keyreg_types::{MasterKey, MasterKeyType};

use crate::config::GatewayState;
use crate::error::GatewayError;

/// マスター鍵を返す。未設定なら404。
pub async fn handle_master_key(
    State(state): State<Arc<GatewayState>>,
    Path(key_type): Path<String>,
) -> Result<Json<MasterKey>, GatewayError> {
    let key_type: MasterKeyType = key_type
        .parse()
        .map_err(|e: keyreg_types::UnknownMasterKeyType| GatewayError::BadRequest(e.to_string()))?;

    let keeper = state.keeper.read().await;
    keeper
        .get_master_key(key_type)?
        .map(Json)
        .ok_or_else(|| GatewayError::NotFound(format!("マスター鍵 {key_type}")))
}
