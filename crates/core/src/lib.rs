//! # Keyreg Core
//!
//! エンクレーブノードの登録状態機械を実装する。
//!
//! ## 処理フロー
//! 1. ノードがAttestation証明書を提出する
//! 2. Keeperが証明書を検証し、検証済みIDから `NodeId` を導出する
//! 3. 登録レコード（証明書 + 暗号化シード）を `0x01 || NodeId` に保存する
//! 4. ブートストラップノードが2つのマスター鍵を確立する
//! 5. 各ノードは自身のレコードとマスター鍵を取得し、エンクレーブを初期化する
//!
//! チェーンのアップグレード時は [`migration`] が旧スキーマのジェネシス状態を現行スキーマに変換する。

pub mod codec;
pub mod enclave;
pub mod error;
pub mod genesis;
pub mod keeper;
pub mod keys;
pub mod migration;
pub mod store;

#[cfg(test)]
mod test_helpers;

pub use enclave::{load_bootstrap_material, EnclaveApi, EnclaveError, MockEnclaveApi};
pub use error::{KeeperError, MigrationError};
pub use genesis::{export_genesis, init_genesis, validate_genesis};
pub use keeper::{MasterKeyPolicy, RegistrationKeeper};
pub use migration::{load_genesis_document, migrate_document, migrate_v1_to_v2};
pub use store::{KvStore, MemoryStore};
