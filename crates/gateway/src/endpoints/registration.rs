//! # 登録レコード照会
//!
//! - `GET /registration/v1beta1/registration/{node_id}`
//! - `GET /registration/v1beta1/authenticated/{node_id}`
//! - `GET /registration/v1beta1/registrations?limit=N`

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use keyreg_types::{AuthenticationStatus, RegistrationEntry, RegistrationList, RegistrationNodeInfo};
use serde::Deserialize;

use super::parse_node_id;
use crate::config::GatewayState;
use crate::error::GatewayError;

/// 登録レコードを返す。未登録なら404。
pub async fn handle_registration(
    State(state): State<Arc<GatewayState>>,
    Path(node_id): Path<String>,
) -> Result<Json<RegistrationNodeInfo>, GatewayError> {
    let node_id = parse_node_id(&node_id)?;
    let keeper = state.keeper.read().await;
    keeper
        .get_registration_info(&node_id)?
        .map(Json)
        .ok_or_else(|| GatewayError::NotFound(format!("ノード {node_id}")))
}

/// ノードの認証状態を返す。未登録のノードは `authenticated: false`。
pub async fn handle_authenticated(
    State(state): State<Arc<GatewayState>>,
    Path(node_id): Path<String>,
) -> Result<Json<AuthenticationStatus>, GatewayError> {
    let node_id = parse_node_id(&node_id)?;
    let authenticated = state.keeper.read().await.is_node_authenticated(&node_id)?;
    Ok(Json(AuthenticationStatus {
        node_id,
        authenticated,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// 返す件数の上限。省略時は全件
    pub limit: Option<usize>,
}

/// 登録レコードをNodeId昇順で列挙する。
pub async fn handle_registrations(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<RegistrationList>, GatewayError> {
    let mut registrations = Vec::new();
    if query.limit != Some(0) {
        let keeper = state.keeper.read().await;
        keeper.list_registration_info(|node_id, info| {
            registrations.push(RegistrationEntry {
                node_id: node_id.clone(),
                info,
            });
            query.limit.map_or(false, |limit| registrations.len() >= limit)
        })?;
    }
    Ok(Json(RegistrationList { registrations }))
}
