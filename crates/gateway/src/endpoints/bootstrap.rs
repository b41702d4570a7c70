//! # GET /registration/v1beta1/bootstrap/{node_id}
//!
//! ノードが `load_seed` を呼ぶために必要な入力一式を返す。

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use keyreg_types::BootstrapMaterial;

use super::parse_node_id;
use crate::config::GatewayState;
use crate::error::GatewayError;

/// 未認証のノードには403、マスター鍵が未設定なら404を返す。
pub async fn handle_bootstrap(
    State(state): State<Arc<GatewayState>>,
    Path(node_id): Path<String>,
) -> Result<Json<BootstrapMaterial>, GatewayError> {
    let node_id = parse_node_id(&node_id)?;
    let material = state.keeper.read().await.bootstrap_material(&node_id)?;
    tracing::info!(node_id = %node_id, "ブートストラップ入力を返却します");
    Ok(Json(material))
}
