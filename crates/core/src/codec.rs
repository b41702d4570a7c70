//! # レコードコーデック
//!
//! ストアに保存するレコードはbincodeでエンコードする。
//! 同じ値は常に同じバイト列になるため、全レプリカでストアの内容が一致する。

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::KeeperError;

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, KeeperError> {
    bincode::serialize(value).map_err(|e| KeeperError::Codec(e.to_string()))
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, KeeperError> {
    bincode::deserialize(bytes).map_err(|e| KeeperError::Codec(e.to_string()))
}
