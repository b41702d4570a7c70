//! # バイト列のシリアライズ規則
//!
//! 人間可読な形式（JSON）ではBase64文字列、バイナリ形式では生のバイト列。

/// `#[serde(with = "encoding::base64_bytes")]` 用のヘルパー。
pub mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    fn engine() -> base64::engine::GeneralPurpose {
        base64::engine::general_purpose::STANDARD
    }

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&engine().encode(bytes))
        } else {
            serializer.serialize_bytes(bytes)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            engine()
                .decode(s.as_bytes())
                .map_err(|e| serde::de::Error::custom(format!("Base64デコードに失敗: {e}")))
        } else {
            serde_bytes::ByteBuf::deserialize(deserializer).map(|b| b.into_vec())
        }
    }
}

/// `Option<Vec<u8>>` 用。`null` は `None`。
pub mod base64_bytes_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => serializer.serialize_some(&Wrapper(b)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<Owned>::deserialize(deserializer).map(|o| o.map(|w| w.0))
    }

    struct Wrapper<'a>(&'a [u8]);

    impl serde::Serialize for Wrapper<'_> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            super::base64_bytes::serialize(self.0, serializer)
        }
    }

    struct Owned(Vec<u8>);

    impl<'de> Deserialize<'de> for Owned {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            super::base64_bytes::deserialize(deserializer).map(Owned)
        }
    }
}
