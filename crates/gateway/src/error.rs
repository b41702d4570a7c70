//! # Gateway エラー型

use axum::http::StatusCode;
use keyreg_core::KeeperError;

/// Gatewayエラー型。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// 証明書の検証に失敗
    #[error("不正な証明書: {0}")]
    InvalidCertificate(String),
    /// 対象が存在しない
    #[error("見つかりません: {0}")]
    NotFound(String),
    /// ノードが未認証
    #[error("未認証のノードです: {0}")]
    NotAuthenticated(String),
    /// マスター鍵が設定済み
    #[error("競合: {0}")]
    Conflict(String),
    /// エンクレーブが未接続
    #[error("エンクレーブが利用できません")]
    EnclaveUnavailable,
    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
    /// 不正なリクエスト
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),
}

impl From<KeeperError> for GatewayError {
    fn from(e: KeeperError) -> Self {
        match e {
            KeeperError::InvalidCertificate(inner) => {
                GatewayError::InvalidCertificate(inner.to_string())
            }
            KeeperError::NotFound(what) => GatewayError::NotFound(what),
            KeeperError::NotAuthenticated(node_id) => {
                GatewayError::NotAuthenticated(node_id.to_hex())
            }
            e @ KeeperError::AlreadyDefined(_) => GatewayError::Conflict(e.to_string()),
            e @ KeeperError::InvalidGenesis(_) => GatewayError::BadRequest(e.to_string()),
            e @ (KeeperError::Enclave(_) | KeeperError::Codec(_)) => {
                GatewayError::Internal(e.to_string())
            }
        }
    }
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            GatewayError::InvalidCertificate(_) | GatewayError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::NotAuthenticated(_) => StatusCode::FORBIDDEN,
            GatewayError::Conflict(_) => StatusCode::CONFLICT,
            GatewayError::EnclaveUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
