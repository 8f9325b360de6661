#![cfg(feature = "json")]

//! `bytebuf_contract` 集成测试：从公开 API 视角覆盖三种缓冲形态的核心契约。
//!
//! - 可增长缓冲：混合类型的顺序读写、自动扩容、深拷贝独立性；
//! - 切片视图：与父缓冲双向别名、固定容量、别名式 `duplicate`；
//! - 组合视图：跨组件顺序读取、不支持的操作。

use serde::{Deserialize, Serialize};
use spark_bytebuf::{
    BufError, ByteBuf, ByteBufExt, CompositeBuf, GrowableBuf, JsonCodec, composite_buffer,
};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Greeting {
    to: String,
    times: u32,
}

#[test]
fn mixed_sequence_reads_back_in_write_order() {
    let codec = JsonCodec::<Greeting>::new();
    let greeting = Greeting {
        to: "World".to_owned(),
        times: 3,
    };

    let mut buf = GrowableBuf::with_capacity(32);
    buf.write_string("Hello").expect("写入字符串");
    buf.write_i32(123).expect("写入 i32");
    buf.write_i64(4_567_890_123).expect("写入 i64");
    buf.write_f32(3.25).expect("写入 f32");
    buf.write_f64(6.5).expect("写入 f64");
    buf.write_char('A').expect("写入字符");
    buf.write_bool(false).expect("写入布尔");
    buf.write_object(&codec, &greeting).expect("写入对象");
    buf.write_bytes(&[10, 20, 30]).expect("写入原始字节");

    assert_eq!(buf.read_string().expect("读取字符串"), "Hello");
    assert_eq!(buf.read_i32().expect("读取 i32"), 123);
    assert_eq!(buf.read_i64().expect("读取 i64"), 4_567_890_123);
    assert_eq!(buf.read_f32().expect("读取 f32"), 3.25);
    assert_eq!(buf.read_f64().expect("读取 f64"), 6.5);
    assert_eq!(buf.read_char().expect("读取字符"), 'A');
    assert!(!buf.read_bool().expect("读取布尔"));
    assert_eq!(buf.read_object(&codec).expect("读取对象"), greeting);
    assert_eq!(buf.read_bytes(3).expect("读取原始字节").as_ref(), &[10, 20, 30]);
    assert_eq!(buf.readable_bytes(), 0);
}

#[test]
fn string_frame_is_length_prefixed_utf8() {
    let mut buf = GrowableBuf::with_capacity(0);
    buf.write_string("héllo").expect("写入字符串");
    let bytes = buf.to_bytes();
    assert_eq!(&bytes[..4], &[0, 0, 0, 6]);
    assert_eq!(&bytes[4..], "héllo".as_bytes());
}

#[test]
fn any_nonzero_byte_reads_as_true() {
    let mut buf = GrowableBuf::from_vec(vec![0, 1, 0x7F, 0xFF]);
    let decoded: Vec<bool> = (0..4).map(|_| buf.read_bool().expect("读取布尔")).collect();
    assert_eq!(decoded, vec![false, true, true, true]);
}

#[test]
fn small_buffer_grows_to_hold_sixteen_bytes() {
    let data: Vec<u8> = (1..=16).collect();
    let mut buf = GrowableBuf::with_capacity(4);
    buf.write_bytes(&data).expect("自动扩容");
    assert!(buf.capacity() >= 16);
    assert_eq!(buf.read_bytes(16).expect("读取全部").as_ref(), data.as_slice());

    buf.set_reader_index(4).expect("移动读指针");
    buf.write_bytes(&[1, 2, 3, 4]).expect("继续写入");
    assert_eq!(buf.reader_index(), 4);
    assert_eq!(buf.readable_bytes(), 16);
}

#[test]
fn slice_and_parent_alias_both_ways() {
    let mut original = GrowableBuf::with_capacity(16);
    original
        .write_bytes(&[1, 2, 3, 4, 5, 6, 7, 8])
        .expect("填充父缓冲");

    let mut slice = original.slice(2, 4).expect("构造切片");
    assert_eq!(slice.readable_bytes(), 4);
    assert_eq!(slice.get_u8(0).expect("读取"), 3);

    slice.set_u8(1, 99).expect("经切片写入");
    assert_eq!(original.get_u8(3).expect("父缓冲可见"), 99);

    original.set_u8(5, 55).expect("经父缓冲写入");
    assert_eq!(slice.get_u8(3).expect("切片可见"), 55);

    assert_eq!(slice.writable_bytes(), 0);
    assert!(matches!(
        slice.write_u8(88),
        Err(BufError::CapacityExceeded { .. })
    ));
    assert!(original.writable_bytes() > 0, "父缓冲仍有空间");
}

#[test]
fn duplicate_semantics_differ_by_ownership() {
    let mut original = GrowableBuf::with_capacity(16);
    original.write_bytes(&[1, 2, 3, 4]).expect("填充");

    let mut copy = original.duplicate().expect("深拷贝");
    copy.set_u8(0, 99).expect("修改副本");
    copy.write_u8(88).expect("副本追加");
    copy.write_bytes(&[77, 66]).expect("副本追加");
    assert_eq!(copy.get_u8(0).expect("副本"), 99);
    assert_eq!(original.get_u8(0).expect("原始"), 1);
    assert_eq!(original.readable_bytes(), 4);

    original.set_u8(1, 42).expect("修改原始");
    assert_eq!(copy.get_u8(1).expect("副本"), 2);

    let view = original.slice(0, 4).expect("构造切片");
    let mut alias = view.duplicate().expect("别名副本");
    alias.set_u8(2, 33).expect("经别名写入");
    assert_eq!(view.get_u8(2).expect("原视图"), 33);
    assert_eq!(original.get_u8(2).expect("父缓冲"), 33);
}

#[test]
fn composite_reads_components_in_order() {
    let mut buf1 = GrowableBuf::with_capacity(8);
    let mut buf2 = GrowableBuf::with_capacity(8);
    buf1.write_bytes(&[1, 2, 3, 4]).expect("填充");
    buf2.write_bytes(&[5, 6, 7, 8]).expect("填充");

    let mut composite = composite_buffer([&mut buf1, &mut buf2]);
    assert_eq!(composite.readable_bytes(), 8);
    let all = composite.read_bytes(8).expect("读取全部");
    for (i, byte) in all.iter().enumerate() {
        assert_eq!(*byte as usize, i + 1);
    }
}

#[test]
fn composite_over_composite_flattens_reads() {
    let mut a = GrowableBuf::from_vec(vec![1, 2]);
    let mut b = GrowableBuf::from_vec(vec![3]);
    let mut c = GrowableBuf::from_vec(vec![4, 5]);
    let mut inner = composite_buffer([&mut a, &mut b]);
    let mut outer = CompositeBuf::new(vec![
        &mut inner as &mut dyn ByteBuf,
        &mut c as &mut dyn ByteBuf,
    ]);
    assert_eq!(outer.readable_bytes(), 5);
    assert_eq!(
        outer.read_bytes(5).expect("读取全部").as_ref(),
        &[1, 2, 3, 4, 5]
    );
}

#[test]
fn composite_rejects_slice_and_duplicate() {
    let mut a = GrowableBuf::from_vec(vec![1, 2]);
    let composite = composite_buffer([&mut a]);
    assert!(matches!(
        composite.slice(0, 1),
        Err(BufError::Unsupported { operation: "slice", .. })
    ));
    assert_eq!(
        composite.duplicate().expect_err("不支持").code(),
        "buffer.unsupported"
    );
}

#[test]
fn codec_failure_surfaces_as_codec_error() {
    let mut buf = GrowableBuf::with_capacity(16);
    buf.write_payload(b"not json").expect("写入畸形负载");
    let err = buf
        .read_object(&JsonCodec::<Greeting>::new())
        .expect_err("解码应失败");
    assert_eq!(err.code(), "buffer.codec");
    assert_eq!(buf.readable_bytes(), 0, "帧已被消费，流保持对齐");
}
