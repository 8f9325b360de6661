#![deny(unsafe_code)]

//! `spark-bytebuf` 提供游标式的内存字节缓冲。
//!
//! # 模块定位（Why）
//! - 为协议编解码、文件格式等上层组件提供统一的“按序写入、按序读出”字节区，
//!   定宽原语以大端字节序编码，字符串与对象负载使用 4 字节长度前缀帧；
//! - 在可增长缓冲之上提供零拷贝的切片视图、跨缓冲拼接的组合视图，以及回收缓冲的复用池。
//!
//! # 设计概要（How）
//! - `contract` 模块定义 [`ByteBuf`] 契约与 [`ByteBufExt`] 对象读写扩展；
//! - `growable` 模块实现拥有存储、倍增扩容的 [`GrowableBuf`]；
//! - `sliced` 模块实现别名父存储固定窗口的 [`SlicedBuf`]；
//! - `composite` 模块实现借用多个组件的 [`CompositeBuf`]；
//! - `pool` 模块实现并发安全的自由链表 [`BufferPool`]；
//! - `codec` 模块定义注入式的 [`ObjectCodec`]，默认提供 JSON 实现。
//!
//! # 使用示例
//! ```
//! use spark_bytebuf::{BufferPool, ByteBuf};
//!
//! let pool = BufferPool::new();
//! let mut buf = pool.acquire();
//! buf.write_string("Hello").unwrap();
//! buf.write_i32(123).unwrap();
//! assert_eq!(buf.read_string().unwrap(), "Hello");
//! assert_eq!(buf.read_i32().unwrap(), 123);
//! pool.release(buf);
//! ```
//!
//! # 并发模型
//! 单个缓冲实例不提供并发修改语义，写路径均要求 `&mut self`；只有 [`BufferPool`]
//! 允许多线程同时 `acquire`/`release`。

extern crate alloc;

pub mod codec;
mod composite;
mod contract;
pub mod error;
mod growable;
mod pool;
mod sliced;

#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use codec::ObjectCodec;
pub use composite::{CompositeBuf, composite_buffer};
pub use contract::{BufKind, ByteBuf, ByteBufExt, LENGTH_PREFIX_LEN};
pub use error::{BufError, CodecError, CodecStage, Result};
pub use growable::GrowableBuf;
pub use pool::{BufferPool, PoolConfig, PoolStats};
pub use sliced::SlicedBuf;
