//! # Identity & Key Store
//!
//! 登録モジュールが使うキー・バリューストアの抽象インターフェースとメモリ内実装。
//!
//! チェーンの状態遷移はトランザクション単位で直列に実行されるため、
//! ストア自体はロックを持たない。排他はコンセンサス層の実行スケジューラが保証する。

use std::collections::BTreeMap;

/// キー・バリューストアの抽象インターフェース。
///
/// 削除操作は持たない。レコードの不在は「一度も書き込まれていない」ことを意味する。
pub trait KvStore {
    /// キーに対応する値を返す。
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// 値を書き込む（既存の値は上書き）。
    fn set(&mut self, key: &[u8], value: Vec<u8>);

    /// `prefix` で始まる全エントリをキーの辞書順（昇順）で返す。
    ///
    /// 返すキーはプレフィックスを含む完全なキー。イテレータは遅延評価で、
    /// 呼び出しごとに先頭からやり直せる。
    fn iter_prefix<'a>(
        &'a self,
        prefix: &[u8],
    ) -> Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a>;
}

/// `BTreeMap` によるメモリ内ストア。
///
/// キー順が決定的なので、全レプリカで同じ列挙結果になる。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        self.entries.insert(key.to_vec(), value);
    }

    fn iter_prefix<'a>(
        &'a self,
        prefix: &[u8],
    ) -> Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a> {
        let prefix = prefix.to_vec();
        Box::new(
            self.entries
                .range(prefix.clone()..)
                .take_while(move |(k, _)| k.starts_with(&prefix))
                .map(|(k, v)| (k.clone(), v.clone())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_overwrite() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get(b"a"), None);

        store.set(b"a", vec![1]);
        store.set(b"a", vec![2]);
        assert_eq!(store.get(b"a"), Some(vec![2]));
        assert_eq!(store.len(), 1);
    }

    /// プレフィックス外のキーを含まず、昇順で返ることを確認
    #[test]
    fn test_iter_prefix_is_ordered_and_bounded() {
        let mut store = MemoryStore::new();
        store.set(&[0x02, 0x00], vec![9]);
        store.set(&[0x01, 0x03], vec![3]);
        store.set(&[0x01, 0x01], vec![1]);
        store.set(&[0x00, 0xff], vec![0]);
        store.set(&[0x01, 0x02], vec![2]);

        let values: Vec<u8> = store.iter_prefix(&[0x01]).map(|(_, v)| v[0]).collect();
        assert_eq!(values, vec![1, 2, 3]);

        let keys: Vec<Vec<u8>> = store.iter_prefix(&[0x01]).map(|(k, _)| k).collect();
        assert_eq!(keys[0], vec![0x01, 0x01]);

        assert_eq!(store.iter_prefix(&[0x03]).count(), 0);
    }

    /// 独立したストア同士は状態を共有しない
    #[test]
    fn test_instances_are_isolated() {
        let mut a = MemoryStore::new();
        let b = MemoryStore::new();
        a.set(b"k", vec![1]);
        assert!(b.is_empty());
    }
}
