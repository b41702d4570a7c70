//! # POST /registration/v1beta1/register
//!
//! 登録トランザクションを受け付ける。証明書を検証し、
//! エンクレーブが生成したノード宛ての暗号化シードを返す。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use keyreg_types::{RegisterRequest, RegisterResponse};

use crate::config::GatewayState;
use crate::error::GatewayError;

pub async fn handle_register(
    State(state): State<Arc<GatewayState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, GatewayError> {
    let enclave = state
        .enclave
        .as_deref()
        .ok_or(GatewayError::EnclaveUnavailable)?;

    let (node_id, encrypted_seed) = state
        .keeper
        .write()
        .await
        .register_node(request.certificate, enclave)?;

    Ok(Json(RegisterResponse {
        node_id,
        encrypted_seed,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::testing::{mock_node, test_state};
    use keyreg_core::{MemoryStore, RegistrationKeeper};
    use keyreg_crypto::attestation::mock::MockVerifier;
    use keyreg_crypto::AttestationVerifier;
    use keyreg_types::Certificate;

    #[tokio::test]
    async fn test_register_stores_record() {
        let state = test_state();
        let (cert, id) = mock_node();

        let Json(response) = handle_register(
            State(state.clone()),
            Json(RegisterRequest {
                certificate: cert.clone(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.node_id, id);
        let info = state.keeper.read().await.get_registration_info(&id).unwrap().unwrap();
        assert_eq!(info.certificate, cert);
    }

    #[tokio::test]
    async fn test_invalid_certificate_is_rejected() {
        let state = test_state();
        let result = handle_register(
            State(state.clone()),
            Json(RegisterRequest {
                certificate: Certificate::new(b"forged".to_vec()),
            }),
        )
        .await;

        assert!(matches!(result, Err(GatewayError::InvalidCertificate(_))));
        assert!(state.keeper.read().await.store().is_empty());
    }

    #[tokio::test]
    async fn test_register_without_enclave_is_unavailable() {
        let verifier: Box<dyn AttestationVerifier> = Box::new(MockVerifier);
        let state = Arc::new(GatewayState::new(
            RegistrationKeeper::new(MemoryStore::new(), verifier),
            None,
        ));
        let (cert, _) = mock_node();

        let result = handle_register(State(state), Json(RegisterRequest { certificate: cert })).await;
        assert!(matches!(result, Err(GatewayError::EnclaveUnavailable)));
    }
}
