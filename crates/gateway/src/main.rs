//! # Keyreg Gateway
//!
//! 登録Keeperの照会APIと登録トランザクションの受付を提供するHTTPサービス。
//!
//! ## 役割
//! - 起動時のジェネシス読み込み（旧スキーマはマイグレーション後に読み込む）
//! - 登録レコード・認証状態・マスター鍵の照会
//! - ノードのブートストラップ入力の返却
//! - 登録トランザクションの受付
//!
//! ## API エンドポイント
//! - `GET /registration/v1beta1/master-key/{key_type}`: マスター鍵
//! - `GET /registration/v1beta1/registration/{node_id}`: 登録レコード
//! - `GET /registration/v1beta1/authenticated/{node_id}`: 認証状態
//! - `GET /registration/v1beta1/registrations`: 登録レコード一覧
//! - `GET /registration/v1beta1/bootstrap/{node_id}`: ブートストラップ入力
//! - `GET /registration/v1beta1/genesis`: ジェネシス文書
//! - `POST /registration/v1beta1/register`: 登録

mod config;
mod endpoints;
mod error;

use std::sync::Arc;

use anyhow::Context;
use axum::routing::{get, post};
use keyreg_core::{init_genesis, load_genesis_document, MemoryStore, RegistrationKeeper};

use config::{GatewayConfig, GatewayState, SharedKeeper};
use endpoints::*;

/// ルーターを構築する。
fn router(state: Arc<GatewayState>) -> axum::Router {
    axum::Router::new()
        .route(
            "/registration/v1beta1/master-key/{key_type}",
            get(handle_master_key),
        )
        .route(
            "/registration/v1beta1/registration/{node_id}",
            get(handle_registration),
        )
        .route(
            "/registration/v1beta1/authenticated/{node_id}",
            get(handle_authenticated),
        )
        .route("/registration/v1beta1/registrations", get(handle_registrations))
        .route("/registration/v1beta1/bootstrap/{node_id}", get(handle_bootstrap))
        .route("/registration/v1beta1/genesis", get(handle_genesis))
        .route("/registration/v1beta1/register", post(handle_register))
        .with_state(state)
}

/// 設定に従ってKeeperを構築し、ジェネシス文書があれば読み込む。
fn build_keeper(config: &GatewayConfig) -> anyhow::Result<SharedKeeper> {
    let mut keeper = RegistrationKeeper::new(MemoryStore::new(), config.build_verifier()?)
        .with_master_key_policy(config.master_key_policy);

    if let Some(path) = &config.genesis_path {
        let raw = std::fs::read(path)
            .with_context(|| format!("ジェネシス文書を読み込めません: {}", path.display()))?;
        let document = load_genesis_document(&raw)?;
        init_genesis(&mut keeper, &document.registration)?;
        tracing::info!(
            path = %path.display(),
            registrations = keeper.registration_count()?,
            "ジェネシス状態を初期化しました"
        );
    }
    Ok(keeper)
}

// ---------------------------------------------------------------------------
// エントリポイント
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = GatewayConfig::from_env()?;
    let keeper = build_keeper(&config)?;
    let enclave = config.build_enclave();
    if enclave.is_none() {
        tracing::warn!("エンクレーブが未接続です。登録リクエストは受け付けません");
    }

    let app = router(Arc::new(GatewayState::new(keeper, enclave)));

    tracing::info!("Gatewayを {} で起動します", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// テスト
// ---------------------------------------------------------------------------
