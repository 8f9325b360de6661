//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义缓冲读写、视图构造、组合视图与对象编解码可能出现的全部失败；
//! - 每个变体携带稳定错误码（见 [`codes`]），便于上层协议栈按码分类处理。
//!
//! ## 设计要求（What）
//! - 所有失败都是同步返回，核心层不做重试，也不做部分成功的恢复；
//! - 返回 `Err` 时游标保持调用前的取值，除非具体方法另有说明。

use alloc::{boxed::Box, string::String};
use core::fmt;
use std::error::Error as StdError;

use thiserror::Error;

use crate::contract::BufKind;

/// 便捷别名，默认错误类型为 [`BufError`]。
pub type Result<T, E = BufError> = core::result::Result<T, E>;

/// 稳定错误码常量，与 [`BufError::code`] 一一对应。
pub mod codes {
    /// 索引或长度越出有效区间。
    pub const BUFFER_BOUNDS: &str = "buffer.bounds";
    /// 读取超过 `writerIndex`。
    pub const BUFFER_UNDERFLOW: &str = "buffer.underflow";
    /// 写入超过切片视图的固定长度。
    pub const BUFFER_CAPACITY_EXCEEDED: &str = "buffer.capacity_exceeded";
    /// 组合视图不支持的操作。
    pub const BUFFER_UNSUPPORTED: &str = "buffer.unsupported";
    /// 对象编解码失败。
    pub const BUFFER_CODEC: &str = "buffer.codec";
    /// 读出的字节无法解释为目标类型。
    pub const BUFFER_MALFORMED: &str = "buffer.malformed";
    /// 待写入的值无法按线格式编码。
    pub const BUFFER_UNENCODABLE: &str = "buffer.unencodable";
}

/// 字节缓冲错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：把越界、下溢、切片容量超限、组合视图不支持、编解码失败等路径归入一个枚举，
///   调用方可以用 `?` 一路传播，也可以按 [`BufError::code`] 做分类统计。
/// - **契约 (What)**：
///   - `Bounds`：`get`/`set`/`slice`/游标设置的索引落在 `[0, capacity)`（或对应区间）之外；
///   - `Underflow`：请求读取的字节数大于 `readableBytes`；
///   - `CapacityExceeded`：切片视图写入会越过其固定长度，即使父缓冲仍有空间；
///   - `Unsupported`：对组合视图调用 `slice`/`duplicate`；
///   - `Codec`：注入的对象编解码器报告失败；
///   - `Malformed`/`Unencodable`：字符串、字符或帧长度在解码/编码阶段不合法。
#[derive(Debug, Error)]
pub enum BufError {
    #[error("index {index} (length {length}) is out of bounds for capacity {capacity}")]
    Bounds {
        index: usize,
        length: usize,
        capacity: usize,
    },

    #[error("cannot read {requested} bytes: only {readable} readable")]
    Underflow { requested: usize, readable: usize },

    #[error(
        "write of {requested} bytes exceeds fixed capacity {capacity} ({writable} writable)"
    )]
    CapacityExceeded {
        requested: usize,
        writable: usize,
        capacity: usize,
    },

    #[error("`{operation}` is not supported by {kind} buffers")]
    Unsupported {
        operation: &'static str,
        kind: BufKind,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("malformed {what}: {detail}")]
    Malformed { what: &'static str, detail: String },

    #[error("cannot encode {what}: {detail}")]
    Unencodable { what: &'static str, detail: String },
}

impl BufError {
    /// 返回稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            BufError::Bounds { .. } => codes::BUFFER_BOUNDS,
            BufError::Underflow { .. } => codes::BUFFER_UNDERFLOW,
            BufError::CapacityExceeded { .. } => codes::BUFFER_CAPACITY_EXCEEDED,
            BufError::Unsupported { .. } => codes::BUFFER_UNSUPPORTED,
            BufError::Codec(_) => codes::BUFFER_CODEC,
            BufError::Malformed { .. } => codes::BUFFER_MALFORMED,
            BufError::Unencodable { .. } => codes::BUFFER_UNENCODABLE,
        }
    }

    pub(crate) fn bounds(index: usize, length: usize, capacity: usize) -> Self {
        BufError::Bounds {
            index,
            length,
            capacity,
        }
    }

    pub(crate) fn underflow(requested: usize, readable: usize) -> Self {
        BufError::Underflow {
            requested,
            readable,
        }
    }
}

/// 编解码所处的阶段。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CodecStage {
    Encode,
    Decode,
}

impl fmt::Display for CodecStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecStage::Encode => f.write_str("encode"),
            CodecStage::Decode => f.write_str("decode"),
        }
    }
}

/// 对象编解码器报告的失败。
///
/// - `stage` 标明失败发生在编码还是解码；
/// - `source` 保留编解码器的原始错误，便于通过 [`StdError::source`] 追溯。
#[derive(Debug, Error)]
#[error("object codec failed to {stage}: {source}")]
pub struct CodecError {
    stage: CodecStage,
    #[source]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

impl CodecError {
    /// 以任意错误构造编码阶段失败。
    pub fn encode<E>(source: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Self {
            stage: CodecStage::Encode,
            source: source.into(),
        }
    }

    /// 以任意错误构造解码阶段失败。
    pub fn decode<E>(source: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Self {
            stage: CodecStage::Decode,
            source: source.into(),
        }
    }

    pub fn stage(&self) -> CodecStage {
        self.stage
    }
}
