use alloc::{string::String, vec, vec::Vec};
use core::fmt;

use bytes::Bytes;

use crate::{
    codec::ObjectCodec,
    error::{BufError, Result},
    growable::GrowableBuf,
    sliced::SlicedBuf,
};

/// 帧长度前缀的字节宽度（大端 `u32`）。
pub const LENGTH_PREFIX_LEN: usize = 4;

/// 缓冲的所有权形态。
///
/// - `Growable`：独占并拥有存储，可被复用池回收；
/// - `Sliced`：借用父缓冲存储的固定窗口，不拥有内存；
/// - `Composite`：借用多个组件缓冲，拼接成一个逻辑序列。
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum BufKind {
    Growable,
    Sliced,
    Composite,
}

impl BufKind {
    /// 是否拥有底层存储；只有拥有存储的缓冲才允许进入复用池。
    pub fn is_owning(self) -> bool {
        matches!(self, BufKind::Growable)
    }
}

impl fmt::Display for BufKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufKind::Growable => f.write_str("growable"),
            BufKind::Sliced => f.write_str("sliced"),
            BufKind::Composite => f.write_str("composite"),
        }
    }
}

/// `ByteBuf` 定义游标式字节缓冲的统一契约。
///
/// # 设计背景（Why）
/// - 可增长缓冲、切片视图与组合视图对外暴露同一组读写能力，调用方只需面向该 trait 编程；
/// - trait 保持对象安全（`&mut dyn ByteBuf`），组合视图正是以 trait 对象借用其组件。
///
/// # 逻辑解析（How）
/// - 实现者只需提供游标、单字节、批量读写与视图构造等原语；
/// - 定宽整数、浮点、字符、布尔、字符串与长度前缀帧均由默认方法在 `write_bytes`/`read_into`
///   之上完成，统一采用大端字节序；组合视图会覆盖其中一部分，转交第一个组件。
///
/// # 契约说明（What）
/// - 任意可观测时刻满足 `0 <= reader_index <= writer_index <= capacity`；
/// - 读操作成功时 `reader_index` 恰好前进读取的字节数，写操作同理推进 `writer_index`；
/// - 返回 `Err` 时游标不发生部分移动。
///
/// # 设计考量（Trade-offs & Gotchas）
/// - 单个实例不携带同步语义：写路径要求 `&mut self`，跨线程共享需调用方自行串行化；
/// - `duplicate` 对拥有存储的缓冲是深拷贝，对切片视图是再建一个别名视图，两者刻意不对称。
pub trait ByteBuf {
    /// 缓冲的所有权形态。
    fn kind(&self) -> BufKind;

    fn reader_index(&self) -> usize;

    fn writer_index(&self) -> usize;

    /// 当前分配给该缓冲的总容量。
    fn capacity(&self) -> usize;

    /// 设置读指针；要求 `index <= writer_index`。
    fn set_reader_index(&mut self, index: usize) -> Result<()>;

    /// 设置写指针；要求 `reader_index <= index <= capacity`。
    fn set_writer_index(&mut self, index: usize) -> Result<()>;

    /// 将两个游标归零，不触碰存储内容。
    fn clear(&mut self);

    fn readable_bytes(&self) -> usize {
        self.writer_index() - self.reader_index()
    }

    fn writable_bytes(&self) -> usize {
        self.capacity().saturating_sub(self.writer_index())
    }

    /// 在读指针处消费一个字节。
    fn read_u8(&mut self) -> Result<u8>;

    /// 在写指针处追加一个字节。
    fn write_u8(&mut self, value: u8) -> Result<()>;

    /// 按绝对索引读取，不移动游标。
    fn get_u8(&self, index: usize) -> Result<u8>;

    /// 按绝对索引写入，不移动游标。
    fn set_u8(&mut self, index: usize, value: u8) -> Result<()>;

    /// 追加全部 `src` 字节。
    fn write_bytes(&mut self, src: &[u8]) -> Result<()>;

    /// 读取恰好 `dst.len()` 个字节；可读字节不足时返回 `Underflow` 且不移动游标。
    fn read_into(&mut self, dst: &mut [u8]) -> Result<()>;

    /// 读取 `len` 个字节并以 [`Bytes`] 返回。
    fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        if len > self.readable_bytes() {
            return Err(BufError::underflow(len, self.readable_bytes()));
        }
        let mut out = vec![0u8; len];
        self.read_into(&mut out)?;
        Ok(Bytes::from(out))
    }

    /// 返回别名化 `[index, index + length)` 的切片视图。
    fn slice(&self, index: usize, length: usize) -> Result<SlicedBuf>;

    /// 复制当前缓冲：拥有存储的缓冲返回独立副本，视图返回新的别名视图。
    fn duplicate(&self) -> Result<Self>
    where
        Self: Sized;

    /// 交出可被复用池回收的底层缓冲；非拥有型缓冲返回 `None`。
    fn into_reusable(self) -> Option<GrowableBuf>
    where
        Self: Sized,
    {
        None
    }

    fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    fn read_i32(&mut self) -> Result<i32> {
        let mut raw = [0u8; 4];
        self.read_into(&mut raw)?;
        Ok(i32::from_be_bytes(raw))
    }

    fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    fn read_i64(&mut self) -> Result<i64> {
        let mut raw = [0u8; 8];
        self.read_into(&mut raw)?;
        Ok(i64::from_be_bytes(raw))
    }

    /// 以 IEEE-754 位模式写入 32 位浮点。
    fn write_f32(&mut self, value: f32) -> Result<()> {
        self.write_i32(value.to_bits() as i32)
    }

    fn read_f32(&mut self) -> Result<f32> {
        self.read_i32().map(|bits| f32::from_bits(bits as u32))
    }

    /// 以 IEEE-754 位模式写入 64 位浮点。
    fn write_f64(&mut self, value: f64) -> Result<()> {
        self.write_i64(value.to_bits() as i64)
    }

    fn read_f64(&mut self) -> Result<f64> {
        self.read_i64().map(|bits| f64::from_bits(bits as u64))
    }

    /// 写入 16 位字符码元。
    fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    fn read_u16(&mut self) -> Result<u16> {
        let mut raw = [0u8; 2];
        self.read_into(&mut raw)?;
        Ok(u16::from_be_bytes(raw))
    }

    /// 写入基本多文种平面内的字符，占 2 字节。
    fn write_char(&mut self, value: char) -> Result<()> {
        let unit = u16::try_from(u32::from(value)).map_err(|_| BufError::Unencodable {
            what: "char",
            detail: alloc::format!("{value:?} lies outside the basic multilingual plane"),
        })?;
        self.write_u16(unit)
    }

    /// 读取 16 位字符；代理区码元视为畸形并回退读指针。
    fn read_char(&mut self) -> Result<char> {
        let mark = self.reader_index();
        let unit = self.read_u16()?;
        match char::from_u32(u32::from(unit)) {
            Some(ch) => Ok(ch),
            None => {
                self.set_reader_index(mark)?;
                Err(BufError::Malformed {
                    what: "char",
                    detail: alloc::format!("code unit {unit:#06x} is a surrogate"),
                })
            }
        }
    }

    /// 布尔值占 1 字节，写入规范值 `1`/`0`。
    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(u8::from(value))
    }

    /// 任意非零字节读作 `true`。
    fn read_bool(&mut self) -> Result<bool> {
        self.read_u8().map(|byte| byte != 0)
    }

    /// 写入 4 字节大端长度前缀与负载。
    fn write_payload(&mut self, payload: &[u8]) -> Result<()> {
        let len = u32::try_from(payload.len()).map_err(|_| BufError::Unencodable {
            what: "payload",
            detail: alloc::format!("{} bytes exceed the u32 length prefix", payload.len()),
        })?;
        let mut frame = Vec::with_capacity(LENGTH_PREFIX_LEN + payload.len());
        frame.extend_from_slice(&len.to_be_bytes());
        frame.extend_from_slice(payload);
        self.write_bytes(&frame)
    }

    /// 读取长度前缀帧；负载不完整时回退到前缀之前。
    fn read_payload(&mut self) -> Result<Bytes> {
        let mark = self.reader_index();
        let len = self.read_i32()? as u32 as usize;
        if len > self.readable_bytes() {
            let readable = self.readable_bytes();
            self.set_reader_index(mark)?;
            return Err(BufError::underflow(len, readable));
        }
        self.read_bytes(len)
    }

    /// UTF-8 编码后按长度前缀帧写入。
    fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_payload(value.as_bytes())
    }

    /// 读取长度前缀帧并按 UTF-8 解码；解码失败时回退整个帧。
    fn read_string(&mut self) -> Result<String> {
        let mark = self.reader_index();
        let payload = self.read_payload()?;
        match core::str::from_utf8(&payload) {
            Ok(text) => Ok(String::from(text)),
            Err(err) => {
                self.set_reader_index(mark)?;
                Err(BufError::Malformed {
                    what: "string",
                    detail: alloc::format!("{err}"),
                })
            }
        }
    }
}

/// 基于注入编解码器的对象读写扩展。
///
/// 对象以与字符串相同的长度前缀帧承载编解码器产出的负载。解码失败时帧已被消费，
/// 读指针停在该帧之后，流的帧对齐保持不变。
pub trait ByteBufExt: ByteBuf {
    fn write_object<C>(&mut self, codec: &C, value: &C::Value) -> Result<()>
    where
        C: ObjectCodec + ?Sized,
    {
        let payload = codec.encode(value)?;
        self.write_payload(&payload)
    }

    fn read_object<C>(&mut self, codec: &C) -> Result<C::Value>
    where
        C: ObjectCodec + ?Sized,
    {
        let payload = self.read_payload()?;
        Ok(codec.decode(&payload)?)
    }
}

impl<B: ByteBuf + ?Sized> ByteBufExt for B {}
