use alloc::{sync::Arc, vec, vec::Vec};
use core::fmt;

use bytes::Bytes;
use spin::RwLock;
use tracing::trace;

use crate::{
    contract::{BufKind, ByteBuf},
    error::{BufError, Result},
    sliced::SlicedBuf,
};

/// 可增长缓冲与其切片视图共享的字节存储。
///
/// 存储只会变长，且只有拥有它的 [`GrowableBuf`] 会触发变长；切片视图创建时已校验
/// `offset + length <= capacity`，因此视图的任何访问都落在存储范围内。
pub(crate) type Storage = RwLock<Vec<u8>>;

/// `GrowableBuf` 是拥有存储、按需倍增扩容的游标缓冲。
///
/// # 设计动机（Why）
/// - 作为切片视图、组合视图与复用池的共同基础，承担全部定宽编码与长度前缀帧的读写；
/// - 存储置于 `Arc<RwLock<Vec<u8>>>` 之中，切片视图通过克隆 `Arc` 别名同一块内存，
///   `Arc` 的引用计数即为“存活视图计数”，复用池据此拒绝回收仍被别名的缓冲。
///
/// # 架构关系（How）
/// - `reader_index`/`writer_index` 为普通字段，只能经由 `&mut self` 修改，单实例单写者由借用规则保证；
/// - `capacity` 缓存存储长度，扩容时与存储同步刷新；
/// - 扩容策略：先尝试容量翻倍，翻倍仍不足时直接扩到所需大小，已写内容原样保留。
///
/// # 契约说明（What）
/// - `0 <= reader_index <= writer_index <= capacity` 始终成立，容量单调不减；
/// - `duplicate` 返回拥有独立存储副本的新缓冲，两者此后互不影响；
/// - `slice` 返回的视图与本缓冲共享存储，视图的写入对本缓冲立即可见，反之亦然。
///
/// # 风险与取舍（Trade-offs）
/// - 每次存储访问都要获取一次自旋读写锁；单写者场景下锁总是无竞争的，换来的是别名视图的内存安全。
pub struct GrowableBuf {
    storage: Arc<Storage>,
    capacity: usize,
    reader_index: usize,
    writer_index: usize,
}

impl GrowableBuf {
    /// 未显式指定时使用的初始容量。
    pub const DEFAULT_CAPACITY: usize = 256;

    /// 以默认容量创建空缓冲。
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// 以给定初始容量创建空缓冲，容量允许为 0。
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: Arc::new(RwLock::new(vec![0u8; capacity])),
            capacity,
            reader_index: 0,
            writer_index: 0,
        }
    }

    /// 以已有字节构造缓冲，全部字节均处于可读状态。
    pub fn from_vec(data: Vec<u8>) -> Self {
        let len = data.len();
        Self {
            storage: Arc::new(RwLock::new(data)),
            capacity: len,
            reader_index: 0,
            writer_index: len,
        }
    }

    /// 复制当前可读区间为 [`Bytes`]，不移动游标。
    pub fn to_bytes(&self) -> Bytes {
        let storage = self.storage.read();
        Bytes::copy_from_slice(&storage[self.reader_index..self.writer_index])
    }

    /// 仍在别名本缓冲存储的切片视图数量。
    pub fn view_count(&self) -> usize {
        Arc::strong_count(&self.storage) - 1
    }

    /// 确保写指针之后至少还有 `additional` 字节空间。
    ///
    /// 所需容量超出 `isize::MAX` 或分配失败时返回 `Bounds`，容量与内容保持不变。
    pub fn ensure_writable(&mut self, additional: usize) -> Result<()> {
        let out_of_range = || BufError::bounds(self.writer_index, additional, self.capacity);
        let required = self
            .writer_index
            .checked_add(additional)
            .filter(|required| *required <= isize::MAX as usize)
            .ok_or_else(out_of_range)?;
        if required <= self.capacity {
            return Ok(());
        }
        let new_capacity = self
            .capacity
            .saturating_mul(2)
            .min(isize::MAX as usize)
            .max(required);
        {
            let mut storage = self.storage.write();
            let additional_storage = new_capacity - storage.len();
            storage
                .try_reserve_exact(additional_storage)
                .map_err(|_| out_of_range())?;
            storage.resize(new_capacity, 0);
        }
        trace!(
            old_capacity = self.capacity,
            new_capacity,
            writer_index = self.writer_index,
            "growable buffer expanded"
        );
        self.capacity = new_capacity;
        Ok(())
    }
}

impl Default for GrowableBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<u8>> for GrowableBuf {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}

impl From<&[u8]> for GrowableBuf {
    fn from(data: &[u8]) -> Self {
        Self::from_vec(data.to_vec())
    }
}

impl fmt::Debug for GrowableBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrowableBuf")
            .field("reader_index", &self.reader_index)
            .field("writer_index", &self.writer_index)
            .field("capacity", &self.capacity)
            .field("views", &self.view_count())
            .finish()
    }
}

impl ByteBuf for GrowableBuf {
    fn kind(&self) -> BufKind {
        BufKind::Growable
    }

    fn reader_index(&self) -> usize {
        self.reader_index
    }

    fn writer_index(&self) -> usize {
        self.writer_index
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn set_reader_index(&mut self, index: usize) -> Result<()> {
        if index > self.writer_index {
            return Err(BufError::bounds(index, 0, self.writer_index));
        }
        self.reader_index = index;
        Ok(())
    }

    fn set_writer_index(&mut self, index: usize) -> Result<()> {
        if index < self.reader_index || index > self.capacity {
            return Err(BufError::bounds(index, 0, self.capacity));
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
        let value = self.storage.read()[self.reader_index];
        self.reader_index += 1;
        Ok(value)
    }

    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.ensure_writable(1)?;
        self.storage.write()[self.writer_index] = value;
        self.writer_index += 1;
        Ok(())
    }

    fn get_u8(&self, index: usize) -> Result<u8> {
        if index >= self.capacity {
            return Err(BufError::bounds(index, 1, self.capacity));
        }
        Ok(self.storage.read()[index])
    }

    fn set_u8(&mut self, index: usize, value: u8) -> Result<()> {
        if index >= self.capacity {
            return Err(BufError::bounds(index, 1, self.capacity));
        }
        self.storage.write()[index] = value;
        Ok(())
    }

    fn write_bytes(&mut self, src: &[u8]) -> Result<()> {
        self.ensure_writable(src.len())?;
        let end = self.writer_index + src.len();
        self.storage.write()[self.writer_index..end].copy_from_slice(src);
        self.writer_index = end;
        Ok(())
    }

    fn read_into(&mut self, dst: &mut [u8]) -> Result<()> {
        let readable = self.readable_bytes();
        if dst.len() > readable {
            return Err(BufError::underflow(dst.len(), readable));
        }
        let end = self.reader_index + dst.len();
        dst.copy_from_slice(&self.storage.read()[self.reader_index..end]);
        self.reader_index = end;
        Ok(())
    }

    fn slice(&self, index: usize, length: usize) -> Result<SlicedBuf> {
        match index.checked_add(length) {
            Some(end) if end <= self.capacity => Ok(SlicedBuf::new(
                Arc::clone(&self.storage),
                index,
                length,
            )),
            _ => Err(BufError::bounds(index, length, self.capacity)),
        }
    }

    fn duplicate(&self) -> Result<Self> {
        let copy = self.storage.read().clone();
        Ok(Self {
            storage: Arc::new(RwLock::new(copy)),
            capacity: self.capacity,
            reader_index: self.reader_index,
            writer_index: self.writer_index,
        })
    }

    fn into_reusable(self) -> Option<GrowableBuf> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::ByteBufExt;

    #[test]
    fn primitives_are_written_big_endian() {
        let mut buf = GrowableBuf::with_capacity(32);
        buf.write_i32(0x0102_0304).expect("写入 i32");
        buf.write_u16(0x0A0B).expect("写入 u16");
        buf.write_bool(true).expect("写入 bool");
        assert_eq!(
            buf.to_bytes().as_ref(),
            &[0x01, 0x02, 0x03, 0x04, 0x0A, 0x0B, 0x01]
        );
    }

    #[test]
    fn floats_use_ieee754_bit_patterns() {
        let mut buf = GrowableBuf::with_capacity(16);
        buf.write_f32(1.0).expect("写入 f32");
        buf.write_f64(-2.0).expect("写入 f64");
        assert_eq!(&buf.to_bytes()[..4], &0x3F80_0000u32.to_be_bytes());
        assert_eq!(&buf.to_bytes()[4..], &0xC000_0000_0000_0000u64.to_be_bytes());
        assert_eq!(buf.read_f32().expect("读取 f32"), 1.0);
        assert_eq!(buf.read_f64().expect("读取 f64"), -2.0);
    }

    #[test]
    fn growth_doubles_then_falls_back_to_required_size() {
        let mut buf = GrowableBuf::with_capacity(4);
        buf.write_bytes(&[1, 2, 3]).expect("初始写入");
        buf.write_bytes(&[4, 5]).expect("触发翻倍");
        assert_eq!(buf.capacity(), 8);
        buf.write_bytes(&[0; 20]).expect("翻倍不足时按需扩容");
        assert_eq!(buf.capacity(), 25);
        assert_eq!(&buf.to_bytes()[..5], &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn oversized_growth_request_is_rejected_without_panicking() {
        let mut buf = GrowableBuf::with_capacity(4);
        buf.write_u8(7).expect("初始写入");

        let err = buf.ensure_writable(usize::MAX).expect_err("writer_index + additional 溢出");
        assert_eq!(err.code(), "buffer.bounds");
        let err = buf
            .ensure_writable(isize::MAX as usize)
            .expect_err("所需容量超出 isize::MAX");
        assert!(matches!(err, BufError::Bounds { index: 1, .. }));

        assert_eq!(buf.capacity(), 4, "失败不改变容量");
        assert_eq!(buf.read_u8().expect("内容保持不变"), 7);
    }

    #[test]
    fn zero_capacity_grows_to_required_size() {
        let mut buf = GrowableBuf::with_capacity(0);
        buf.write_i64(42).expect("零容量也能写入");
        assert_eq!(buf.capacity(), 8);
        assert_eq!(buf.read_i64().expect("读取 i64"), 42);
    }

    #[test]
    fn read_past_writer_index_underflows_without_moving_cursor() {
        let mut buf = GrowableBuf::with_capacity(8);
        buf.write_u16(7).expect("写入 u16");
        let err = buf.read_i32().expect_err("可读字节不足");
        assert_eq!(err.code(), "buffer.underflow");
        assert_eq!(buf.reader_index(), 0);
        assert_eq!(buf.read_u16().expect("读取 u16"), 7);
        assert!(matches!(buf.read_u8(), Err(BufError::Underflow { .. })));
    }

    #[test]
    fn absolute_access_is_bounded_by_capacity() {
        let mut buf = GrowableBuf::with_capacity(4);
        buf.set_u8(3, 9).expect("容量内写入");
        assert_eq!(buf.get_u8(3).expect("容量内读取"), 9);
        assert_eq!(buf.writer_index(), 0, "绝对访问不移动游标");
        assert!(matches!(buf.get_u8(4), Err(BufError::Bounds { .. })));
        assert!(matches!(buf.set_u8(4, 1), Err(BufError::Bounds { .. })));
    }

    #[test]
    fn cursor_setters_preserve_ordering_invariant() {
        let mut buf = GrowableBuf::with_capacity(32);
        buf.set_writer_index(5).expect("写指针移动到 5");
        buf.set_reader_index(2).expect("读指针移动到 2");
        assert_eq!((buf.reader_index(), buf.writer_index()), (2, 5));
        assert!(buf.set_reader_index(6).is_err());
        assert!(buf.set_writer_index(1).is_err());
        assert!(buf.set_writer_index(33).is_err());
        buf.clear();
        assert_eq!((buf.reader_index(), buf.writer_index()), (0, 0));
    }

    #[test]
    fn truncated_frame_rolls_back_reader_index() {
        let mut buf = GrowableBuf::with_capacity(16);
        buf.write_i32(10).expect("写入伪造长度");
        buf.write_bytes(b"abc").expect("写入不完整负载");
        let err = buf.read_string().expect_err("帧不完整");
        assert!(matches!(err, BufError::Underflow { requested: 10, readable: 3 }));
        assert_eq!(buf.reader_index(), 0);
    }

    #[test]
    fn invalid_utf8_rolls_back_whole_frame() {
        let mut buf = GrowableBuf::with_capacity(16);
        buf.write_payload(&[0xFF, 0xFE]).expect("写入非法 UTF-8");
        let err = buf.read_string().expect_err("非法 UTF-8");
        assert_eq!(err.code(), "buffer.malformed");
        assert_eq!(buf.reader_index(), 0);
        assert_eq!(buf.read_payload().expect("原始负载仍可读").as_ref(), &[0xFF, 0xFE]);
    }

    #[test]
    fn chars_outside_bmp_are_rejected() {
        let mut buf = GrowableBuf::with_capacity(8);
        assert_eq!(
            buf.write_char('😀').expect_err("超出 BMP").code(),
            "buffer.unencodable"
        );
        assert_eq!(buf.writer_index(), 0);
        buf.write_u16(0xD800).expect("写入代理码元");
        assert_eq!(buf.read_char().expect_err("代理码元").code(), "buffer.malformed");
        assert_eq!(buf.reader_index(), 0);
    }

    #[test]
    fn duplicate_copies_storage_and_cursors() {
        let mut original = GrowableBuf::with_capacity(16);
        original.write_bytes(&[1, 2, 3, 4]).expect("写入原始数据");
        let mut copy = original.duplicate().expect("深拷贝");
        assert_eq!(copy.readable_bytes(), original.readable_bytes());
        assert_eq!(copy.capacity(), original.capacity());

        copy.set_u8(0, 99).expect("修改副本");
        copy.write_u8(88).expect("副本追加");
        assert_eq!(original.get_u8(0).expect("读取原始"), 1);
        assert_eq!(original.writer_index(), 4);
        assert_eq!(original.view_count(), 0, "深拷贝不是视图");
    }

    #[test]
    fn slice_outside_capacity_is_rejected() {
        let buf = GrowableBuf::with_capacity(8);
        assert!(buf.slice(4, 4).is_ok());
        assert!(matches!(buf.slice(5, 4), Err(BufError::Bounds { .. })));
        assert!(matches!(buf.slice(usize::MAX, 2), Err(BufError::Bounds { .. })));
    }

    #[test]
    fn writes_objects_through_injected_codec() {
        struct Upper;
        impl crate::codec::ObjectCodec for Upper {
            type Value = String;
            fn encode(&self, value: &String) -> core::result::Result<Vec<u8>, crate::CodecError> {
                Ok(value.to_uppercase().into_bytes())
            }
            fn decode(&self, bytes: &[u8]) -> core::result::Result<String, crate::CodecError> {
                String::from_utf8(bytes.to_vec()).map_err(crate::CodecError::decode)
            }
        }

        let mut buf = GrowableBuf::with_capacity(4);
        buf.write_object(&Upper, &"World".to_owned()).expect("写入对象");
        assert_eq!(&buf.to_bytes()[..4], &5u32.to_be_bytes());
        assert_eq!(buf.read_object(&Upper).expect("读取对象"), "WORLD");
    }
}
