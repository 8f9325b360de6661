//! 不透明对象的编解码契约。
//!
//! 缓冲只负责长度前缀帧，对象如何变成字节由调用方注入的 [`ObjectCodec`] 决定。
//! 启用 `json` Feature（默认开启）时提供基于 `serde_json` 的 [`JsonCodec`]。

use alloc::vec::Vec;

use crate::error::CodecError;

/// 对象编解码能力：`encode(value) -> bytes` / `decode(bytes) -> value`。
///
/// - **契约 (What)**：`decode(encode(v))` 必须得到与 `v` 等价的值；畸形输入返回 [`CodecError`]，
///   不得 panic。
/// - **线程模型**：缓冲只以 `&self` 调用编解码器，是否可跨线程共享由实现自行决定。
pub trait ObjectCodec {
    type Value;

    fn encode(&self, value: &Self::Value) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Value, CodecError>;
}

#[cfg(feature = "json")]
pub use json::JsonCodec;

#[cfg(feature = "json")]
mod json {
    use alloc::vec::Vec;
    use core::{fmt, marker::PhantomData};

    use serde::{Serialize, de::DeserializeOwned};

    use super::ObjectCodec;
    use crate::error::CodecError;

    /// 以 JSON 文本作为对象负载的编解码器。
    pub struct JsonCodec<T> {
        _marker: PhantomData<fn() -> T>,
    }

    impl<T> JsonCodec<T> {
        pub const fn new() -> Self {
            Self {
                _marker: PhantomData,
            }
        }
    }

    impl<T> Default for JsonCodec<T> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<T> Clone for JsonCodec<T> {
        fn clone(&self) -> Self {
            *self
        }
    }

    impl<T> Copy for JsonCodec<T> {}

    impl<T> fmt::Debug for JsonCodec<T> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("JsonCodec").finish()
        }
    }

    impl<T> ObjectCodec for JsonCodec<T>
    where
        T: Serialize + DeserializeOwned,
    {
        type Value = T;

        fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
            serde_json::to_vec(value).map_err(CodecError::encode)
        }

        fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
            serde_json::from_slice(bytes).map_err(CodecError::decode)
        }
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::error::CodecStage;

    #[test]
    fn json_codec_roundtrips_structured_values() {
        let codec = JsonCodec::<(String, u32)>::new();
        let bytes = codec.encode(&("World".to_owned(), 7)).expect("编码失败");
        assert_eq!(codec.decode(&bytes).expect("解码失败"), ("World".to_owned(), 7));
    }

    #[test]
    fn json_codec_reports_decode_stage_on_garbage() {
        let codec = JsonCodec::<u64>::new();
        let err = codec.decode(b"{not json").expect_err("畸形输入应失败");
        assert_eq!(err.stage(), CodecStage::Decode);
    }
}
