//! # Gateway設定・共有状態
//!
//! 環境変数からの設定読み込みとGatewayの共有状態の定義。
//!
//! | 環境変数 | 既定値 | 説明 |
//! |---------|--------|------|
//! | `LISTEN_ADDR` | `0.0.0.0:3000` | 待ち受けアドレス |
//! | `GENESIS_PATH` | なし | 起動時に読み込むジェネシス文書（v1はマイグレーションする） |
//! | `MOCK_MODE` | `false` | `true` でモック検証器・モックエンクレーブを使用 |
//! | `MASTER_KEY_POLICY` | `overwrite` | `overwrite` / `set-once` |
//! | `NITRO_ROOT_CERT_PATH` | なし | AWS Nitroルート証明書（DER）の差し替え |

use std::path::PathBuf;

use anyhow::Context;
use keyreg_core::{EnclaveApi, MasterKeyPolicy, MemoryStore, MockEnclaveApi, RegistrationKeeper};
use keyreg_crypto::attestation::mock::MockVerifier;
use keyreg_crypto::attestation::nitro::NitroVerifier;
use keyreg_crypto::AttestationVerifier;
use tokio::sync::RwLock;

/// Gatewayが保持するKeeperの具体型。
pub type SharedKeeper = RegistrationKeeper<MemoryStore, Box<dyn AttestationVerifier>>;

/// 環境変数から読み込んだGateway設定。
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub listen_addr: String,
    pub genesis_path: Option<PathBuf>,
    pub mock_mode: bool,
    pub master_key_policy: MasterKeyPolicy,
    pub nitro_root_cert_path: Option<PathBuf>,
}

impl GatewayConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let master_key_policy = match std::env::var("MASTER_KEY_POLICY") {
            Ok(value) => value.parse::<MasterKeyPolicy>().map_err(|e: String| anyhow::anyhow!(e))?,
            Err(_) => MasterKeyPolicy::default(),
        };

        Ok(Self {
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            genesis_path: std::env::var("GENESIS_PATH").ok().map(PathBuf::from),
            mock_mode: std::env::var("MOCK_MODE").map_or(false, |v| v == "true"),
            master_key_policy,
            nitro_root_cert_path: std::env::var("NITRO_ROOT_CERT_PATH").ok().map(PathBuf::from),
        })
    }

    /// 設定に従って検証器を構築する。
    pub fn build_verifier(&self) -> anyhow::Result<Box<dyn AttestationVerifier>> {
        if self.mock_mode {
            tracing::warn!("MOCK_MODEが有効です。モック検証器を使用します（開発環境用）");
            return Ok(Box::new(MockVerifier));
        }
        let verifier = match &self.nitro_root_cert_path {
            Some(path) => {
                let root_der = std::fs::read(path).with_context(|| {
                    format!("Nitroルート証明書を読み込めません: {}", path.display())
                })?;
                NitroVerifier::with_root(root_der)
            }
            None => NitroVerifier::aws()?,
        };
        Ok(Box::new(verifier))
    }

    /// 設定に従ってエンクレーブを構築する。モック以外のエンクレーブはこのプロセスには接続しない。
    pub fn build_enclave(&self) -> Option<Box<dyn EnclaveApi>> {
        self.mock_mode
            .then(|| Box::new(MockEnclaveApi) as Box<dyn EnclaveApi>)
    }
}

/// Gatewayの共有状態。
pub struct GatewayState {
    /// 登録Keeper。書き込みはトランザクション単位で直列化する
    pub keeper: RwLock<SharedKeeper>,
    /// シード生成を行うエンクレーブ（未接続なら登録を受け付けない）
    pub enclave: Option<Box<dyn EnclaveApi>>,
}

impl GatewayState {
    pub fn new(keeper: SharedKeeper, enclave: Option<Box<dyn EnclaveApi>>) -> Self {
        Self {
            keeper: RwLock::new(keeper),
            enclave,
        }
    }
}
