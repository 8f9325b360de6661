use alloc::sync::Arc;
use core::fmt;

use crate::{
    contract::{BufKind, ByteBuf},
    error::{BufError, Result},
    growable::Storage,
};

/// `SlicedBuf` 是别名父缓冲存储中固定窗口的视图。
///
/// # 契约说明（What）
/// - 视图覆盖父存储的 `[offset, offset + length)`，局部索引 `i` 映射到父存储的 `offset + i`；
/// - 游标初始为 `(0, length)`，与父缓冲的游标相互独立；
/// - 容量恒为 `length`：任何会让 `writer_index` 越过 `length` 的写入返回 `CapacityExceeded`，
///   即使父缓冲在窗口之外仍有空间，视图也不会请求父缓冲扩容；
/// - 通过视图的写入对父缓冲以及所有重叠视图立即可见。
///
/// # 生命周期
/// 视图持有父存储的 `Arc`，父缓冲被丢弃后存储仍随最后一个视图存活；复用池会拒绝回收
/// 仍有存活视图的父缓冲，因此池中缓冲永远不会与外部视图共享内存。
pub struct SlicedBuf {
    storage: Arc<Storage>,
    offset: usize,
    length: usize,
    reader_index: usize,
    writer_index: usize,
}

impl SlicedBuf {
    /// 调用方需保证 `offset + length` 不超过存储当前长度。
    pub(crate) fn new(storage: Arc<Storage>, offset: usize, length: usize) -> Self {
        Self {
            storage,
            offset,
            length,
            reader_index: 0,
            writer_index: length,
        }
    }

    /// 视图在根缓冲存储中的起始偏移。
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// 视图的固定长度，同时也是其容量。
    pub fn length(&self) -> usize {
        self.length
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.length {
            return Err(BufError::bounds(index, 1, self.length));
        }
        Ok(())
    }

    fn check_writable(&self, requested: usize) -> Result<()> {
        let writable = self.length - self.writer_index;
        if requested > writable {
            return Err(BufError::CapacityExceeded {
                requested,
                writable,
                capacity: self.length,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for SlicedBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlicedBuf")
            .field("offset", &self.offset)
            .field("length", &self.length)
            .field("reader_index", &self.reader_index)
            .field("writer_index", &self.writer_index)
            .finish()
    }
}

impl ByteBuf for SlicedBuf {
    fn kind(&self) -> BufKind {
        BufKind::Sliced
    }

    fn reader_index(&self) -> usize {
        self.reader_index
    }

    fn writer_index(&self) -> usize {
        self.writer_index
    }

    fn capacity(&self) -> usize {
        self.length
    }

    fn set_reader_index(&mut self, index: usize) -> Result<()> {
        if index > self.writer_index {
            return Err(BufError::bounds(index, 0, self.writer_index));
        }
        self.reader_index = index;
        Ok(())
    }

    fn set_writer_index(&mut self, index: usize) -> Result<()> {
        if index < self.reader_index || index > self.length {
            return Err(BufError::bounds(index, 0, self.length));
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
        let value = self.storage.read()[self.offset + self.reader_index];
        self.reader_index += 1;
        Ok(value)
    }

    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.check_writable(1)?;
        self.storage.write()[self.offset + self.writer_index] = value;
        self.writer_index += 1;
        Ok(())
    }

    fn get_u8(&self, index: usize) -> Result<u8> {
        self.check_index(index)?;
        Ok(self.storage.read()[self.offset + index])
    }

    fn set_u8(&mut self, index: usize, value: u8) -> Result<()> {
        self.check_index(index)?;
        self.storage.write()[self.offset + index] = value;
        Ok(())
    }

    fn write_bytes(&mut self, src: &[u8]) -> Result<()> {
        self.check_writable(src.len())?;
        let start = self.offset + self.writer_index;
        self.storage.write()[start..start + src.len()].copy_from_slice(src);
        self.writer_index += src.len();
        Ok(())
    }

    fn read_into(&mut self, dst: &mut [u8]) -> Result<()> {
        let readable = self.readable_bytes();
        if dst.len() > readable {
            return Err(BufError::underflow(dst.len(), readable));
        }
        let start = self.offset + self.reader_index;
        dst.copy_from_slice(&self.storage.read()[start..start + dst.len()]);
        self.reader_index += dst.len();
        Ok(())
    }

    /// 切片的切片直接以根存储为基准合成偏移，不形成嵌套引用链。
    fn slice(&self, index: usize, length: usize) -> Result<SlicedBuf> {
        match index.checked_add(length) {
            Some(end) if end <= self.length => Ok(SlicedBuf::new(
                Arc::clone(&self.storage),
                self.offset + index,
                length,
            )),
            _ => Err(BufError::bounds(index, length, self.length)),
        }
    }

    /// 返回覆盖同一区域、游标重新初始化的别名视图，而不是内存副本。
    fn duplicate(&self) -> Result<Self> {
        Ok(SlicedBuf::new(
            Arc::clone(&self.storage),
            self.offset,
            self.length,
        ))
    }
}
