//! # Gatewayエンドポイント
//!
//! すべてのルートは `/registration/v1beta1` 以下に置く。

pub mod bootstrap;
pub mod genesis;
pub mod master_key;
pub mod register;
pub mod registration;

pub use bootstrap::handle_bootstrap;
pub use genesis::handle_genesis;
pub use master_key::handle_master_key;
pub use register::handle_register;
pub use registration::{handle_authenticated, handle_registration, handle_registrations};

use keyreg_types::NodeId;

use crate::error::GatewayError;

/// パスパラメータの16進数NodeIdを解析する。
pub(crate) fn parse_node_id(raw: &str) -> Result<NodeId, GatewayError> {
    raw.parse()
        .map_err(|e| GatewayError::BadRequest(format!("node_idが不正です: {e}")))
}
