//! # ストアキーのレイアウト
//!
//! | 名前空間 | キー |
//! |---------|------|
//! | 登録レコード | `0x01 \|\| NodeId` |
//! | マスター鍵 | `0x02 \|\| tag`（`node_exch` / `io`） |

use keyreg_types::{MasterKeyType, NodeId};

/// 登録レコード名前空間のプレフィックス。
pub const REGISTRATION_STORE_PREFIX: &[u8] = &[0x01];

/// マスター鍵名前空間のプレフィックス。
pub const MASTER_KEY_STORE_PREFIX: &[u8] = &[0x02];

/// 登録レコードのストアキー。
pub fn registration_key(node_id: &NodeId) -> Vec<u8> {
    [REGISTRATION_STORE_PREFIX, node_id.as_bytes()].concat()
}

/// マスター鍵のストアキー。
pub fn master_key_key(key_type: MasterKeyType) -> Vec<u8> {
    [MASTER_KEY_STORE_PREFIX, key_type.tag().as_bytes()].concat()
}

/// 登録レコードのストアキーから `NodeId` を取り出す。
pub fn node_id_from_registration_key(key: &[u8]) -> Option<NodeId> {
    key.strip_prefix(REGISTRATION_STORE_PREFIX)
        .map(|id| NodeId::from_bytes(id.to_vec()))
}
