use alloc::{string::String, vec::Vec};
use core::fmt;

use bytes::Bytes;
use tracing::trace;

use crate::{
    contract::{BufKind, ByteBuf},
    error::{BufError, Result},
    sliced::SlicedBuf,
};

/// `CompositeBuf` 把多个独立拥有的缓冲拼接为一个逻辑序列，对外只暴露一对游标。
///
/// # 设计动机（Why）
/// - 协议头与负载往往分处不同缓冲，组合视图允许在不复制的前提下顺序读出它们；
/// - 组件以 `&'a mut dyn ByteBuf` 借用，组合视图存活期间组件无法被单独使用、丢弃或归还复用池，
///   悬垂引用在编译期即被排除。
///
/// # 逻辑解析（How）
/// - 构造时累加各组件的 `readable_bytes` 得到初始 `writer_index`，累加
///   `readable_bytes + writable_bytes` 得到缓存的 `total_capacity`；
/// - 单字节操作按顺序扫描组件、累加各组件“当前”可读字节数来定位目标组件，
///   定位出的组件内索引直接作为该组件的绝对索引使用；
/// - 定宽整数、浮点、16 位字符、字符串、长度前缀帧与对象读写整体转交第一个组件，
///   推进的是第一个组件自身的游标，组合视图的游标不受影响。
///
/// # 契约说明（What）
/// - 成员在构造后固定，不提供追加组件的入口；
/// - `slice`/`duplicate` 返回 [`BufError::Unsupported`]；
/// - 组合视图从不进入复用池。
///
/// # 风险提示（Trade-offs）
/// - 定位是 O(组件数) 的线性扫描；
/// - 转交第一个组件意味着对多组件视图，定宽读写与字节级读写观察到的是两套不同的游标，
///   调用方混用两类操作时需自行对齐。
pub struct CompositeBuf<'a> {
    components: Vec<&'a mut dyn ByteBuf>,
    reader_index: usize,
    writer_index: usize,
    total_capacity: usize,
}

/// 以同类缓冲的可变借用构造组合视图。
pub fn composite_buffer<'a, B>(buffers: impl IntoIterator<Item = &'a mut B>) -> CompositeBuf<'a>
where
    B: ByteBuf + 'a,
{
    CompositeBuf::from_buffers(buffers)
}

impl<'a> CompositeBuf<'a> {
    /// 以任意组件构造组合视图，允许混合不同的缓冲类型。
    pub fn new(components: Vec<&'a mut dyn ByteBuf>) -> Self {
        let mut writer_index = 0;
        let mut total_capacity = 0;
        for component in &components {
            writer_index += component.readable_bytes();
            total_capacity += component.readable_bytes() + component.writable_bytes();
        }
        trace!(
            components = components.len(),
            readable = writer_index,
            total_capacity,
            "composite buffer assembled"
        );
        Self {
            components,
            reader_index: 0,
            writer_index,
            total_capacity,
        }
    }

    pub fn from_buffers<B>(buffers: impl IntoIterator<Item = &'a mut B>) -> Self
    where
        B: ByteBuf + 'a,
    {
        Self::new(
            buffers
                .into_iter()
                .map(|buf| buf as &'a mut dyn ByteBuf)
                .collect(),
        )
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// 按下标只读访问组件。
    pub fn component(&self, index: usize) -> Option<&dyn ByteBuf> {
        self.components.get(index).map(|component| &**component)
    }

    /// 定位逻辑索引所在的组件及组件内索引。
    fn locate(&self, index: usize) -> Result<(usize, usize)> {
        let mut start = 0;
        for (id, component) in self.components.iter().enumerate() {
            let readable = component.readable_bytes();
            if index < start + readable {
                return Ok((id, index - start));
            }
            start += readable;
        }
        Err(BufError::bounds(index, 1, start))
    }

    /// 所有组件当前可读字节之和，即可被定位的逻辑区间长度。
    fn addressable(&self) -> usize {
        self.components
            .iter()
            .map(|component| component.readable_bytes())
            .sum()
    }

    fn first(&mut self) -> Result<&mut (dyn ByteBuf + 'a)> {
        match self.components.first_mut() {
            Some(component) => Ok(&mut **component),
            None => Err(BufError::bounds(0, 1, 0)),
        }
    }
}

impl fmt::Debug for CompositeBuf<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeBuf")
            .field("components", &self.components.len())
            .field("reader_index", &self.reader_index)
            .field("writer_index", &self.writer_index)
            .field("total_capacity", &self.total_capacity)
            .finish()
    }
}

impl ByteBuf for CompositeBuf<'_> {
    fn kind(&self) -> BufKind {
        BufKind::Composite
    }

    fn reader_index(&self) -> usize {
        self.reader_index
    }

    fn writer_index(&self) -> usize {
        self.writer_index
    }

    fn capacity(&self) -> usize {
        self.total_capacity
    }

    fn set_reader_index(&mut self, index: usize) -> Result<()> {
        if index > self.writer_index {
            return Err(BufError::bounds(index, 0, self.writer_index));
        }
        self.reader_index = index;
        Ok(())
    }

    fn set_writer_index(&mut self, index: usize) -> Result<()> {
        if index < self.reader_index || index > self.total_capacity {
            return Err(BufError::bounds(index, 0, self.total_capacity));
        }
        self.writer_index = index;
        Ok(())
    }

    fn clear(&mut self) {
        self.reader_index = 0;
        self.writer_index = 0;
    }

    fn read_u8(&mut self) -> Result<u8> {
        if self.reader_index >= self.writer_index {
            return Err(BufError::underflow(1, 0));
        }
        let (id, local) = self.locate(self.reader_index)?;
        let value = self.components[id].get_u8(local)?;
        self.reader_index += 1;
        Ok(value)
    }

    fn write_u8(&mut self, value: u8) -> Result<()> {
        if self.writer_index >= self.total_capacity {
            return Err(BufError::bounds(self.writer_index, 1, self.total_capacity));
        }
        let (id, local) = self.locate(self.writer_index)?;
        self.components[id].set_u8(local, value)?;
        self.writer_index += 1;
        Ok(())
    }

    fn get_u8(&self, index: usize) -> Result<u8> {
        let (id, local) = self.locate(index)?;
        self.components[id].get_u8(local)
    }

    fn set_u8(&mut self, index: usize, value: u8) -> Result<()> {
        let (id, local) = self.locate(index)?;
        self.components[id].set_u8(local, value)
    }

    fn write_bytes(&mut self, src: &[u8]) -> Result<()> {
        if src.is_empty() {
            return Ok(());
        }
        let end = self.writer_index + src.len();
        let limit = self.total_capacity.min(self.addressable());
        if end > limit {
            return Err(BufError::bounds(self.writer_index, src.len(), limit));
        }
        for (offset, byte) in src.iter().enumerate() {
            let (id, local) = self.locate(self.writer_index + offset)?;
            self.components[id].set_u8(local, *byte)?;
        }
        self.writer_index = end;
        Ok(())
    }

    fn read_into(&mut self, dst: &mut [u8]) -> Result<()> {
        let readable = self.readable_bytes();
        if dst.len() > readable {
            return Err(BufError::underflow(dst.len(), readable));
        }
        for (offset, slot) in dst.iter_mut().enumerate() {
            let (id, local) = self.locate(self.reader_index + offset)?;
            *slot = self.components[id].get_u8(local)?;
        }
        self.reader_index += dst.len();
        Ok(())
    }

    fn slice(&self, _index: usize, _length: usize) -> Result<SlicedBuf> {
        Err(BufError::Unsupported {
            operation: "slice",
            kind: BufKind::Composite,
        })
    }

    fn duplicate(&self) -> Result<Self> {
        Err(BufError::Unsupported {
            operation: "duplicate",
            kind: BufKind::Composite,
        })
    }

    fn write_i32(&mut self, value: i32) -> Result<()> {
        self.first()?.write_i32(value)
    }

    fn read_i32(&mut self) -> Result<i32> {
        self.first()?.read_i32()
    }

    fn write_i64(&mut self, value: i64) -> Result<()> {
        self.first()?.write_i64(value)
    }

    fn read_i64(&mut self) -> Result<i64> {
        self.first()?.read_i64()
    }

    fn write_f32(&mut self, value: f32) -> Result<()> {
        self.first()?.write_f32(value)
    }

    fn read_f32(&mut self) -> Result<f32> {
        self.first()?.read_f32()
    }

    fn write_f64(&mut self, value: f64) -> Result<()> {
        self.first()?.write_f64(value)
    }

    fn read_f64(&mut self) -> Result<f64> {
        self.first()?.read_f64()
    }

    fn write_u16(&mut self, value: u16) -> Result<()> {
        self.first()?.write_u16(value)
    }

    fn read_u16(&mut self) -> Result<u16> {
        self.first()?.read_u16()
    }

    fn write_char(&mut self, value: char) -> Result<()> {
        self.first()?.write_char(value)
    }

    fn read_char(&mut self) -> Result<char> {
        self.first()?.read_char()
    }

    fn write_payload(&mut self, payload: &[u8]) -> Result<()> {
        self.first()?.write_payload(payload)
    }

    fn read_payload(&mut self) -> Result<Bytes> {
        self.first()?.read_payload()
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        self.first()?.write_string(value)
    }

    fn read_string(&mut self) -> Result<String> {
        self.first()?.read_string()
    }
}
