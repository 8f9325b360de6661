use alloc::{collections::VecDeque, sync::Arc};
use core::sync::atomic::{AtomicU64, Ordering};

use spin::Mutex;
use tracing::{debug, trace, warn};

use crate::{contract::ByteBuf, growable::GrowableBuf};

/// 复用池配置。
///
/// - `initial_capacity`：自由链表为空时新建缓冲的初始容量，默认 256 字节。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PoolConfig {
    initial_capacity: usize,
}

impl PoolConfig {
    pub const DEFAULT_INITIAL_CAPACITY: usize = GrowableBuf::DEFAULT_CAPACITY;

    pub const fn new() -> Self {
        Self {
            initial_capacity: Self::DEFAULT_INITIAL_CAPACITY,
        }
    }

    pub const fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    pub const fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// 复用池的计数快照。
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PoolStats {
    /// 因自由链表为空而新建的缓冲数。
    pub allocated: u64,
    /// 从自由链表取出的缓冲数。
    pub reused: u64,
    /// 成功入队的缓冲数。
    pub released: u64,
    /// 因仍有存活切片视图而拒绝入队的缓冲数。
    pub discarded: u64,
    /// 当前自由链表中的缓冲数。
    pub idle: usize,
}

/// `BufferPool` 是回收 [`GrowableBuf`] 的并发安全自由链表。
///
/// # 模块角色（Why）
/// - 高频编解码路径反复申请同尺寸缓冲，复用已分配的存储可以削减分配抖动；
/// - 池是显式构造、可克隆注入的句柄，而非进程级隐式全局量：克隆共享同一自由链表。
///
/// # 核心机制（How）
/// - 内部以 `spin::Mutex<VecDeque<GrowableBuf>>` 维护先进先出的自由链表，临界区只包含一次入队或出队；
/// - `PoolMetrics` 以原子计数记录分配、复用、回收与丢弃次数，支撑 [`BufferPool::statistics`]；
/// - 归还时借助 [`ByteBuf::into_reusable`] 区分所有权形态：只有可增长缓冲会被入队，
///   切片视图与组合视图直接丢弃，不报错。
///
/// # 契约说明（What）
/// - 构造后为空；`acquire` 从不阻塞、从不失败；
/// - 入队的缓冲游标已归零（存储内容与容量保持原样），因此取出的缓冲 `readable_bytes() == 0`；
/// - 仍被切片视图别名的缓冲不会入队，以免池中缓冲与外部视图共享内存；
/// - 不设容量上限、不做过期淘汰，`clear` 一次性清空自由链表。
#[derive(Clone, Default)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

impl BufferPool {
    /// 以默认配置创建空池。
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            inner: Arc::new(PoolInner::new(config)),
        }
    }

    pub fn config(&self) -> PoolConfig {
        self.inner.config
    }

    /// 取出一个可复用缓冲；自由链表为空时按配置容量新建。
    pub fn acquire(&self) -> GrowableBuf {
        let reused = self.inner.free_list.lock().pop_front();
        match reused {
            Some(buf) => {
                self.inner.metrics.reused.fetch_add(1, Ordering::Relaxed);
                trace!(capacity = buf.capacity(), "buffer pool hit");
                buf
            }
            None => {
                self.inner.metrics.allocated.fetch_add(1, Ordering::Relaxed);
                let capacity = self.inner.config.initial_capacity;
                trace!(capacity, "buffer pool miss, allocating");
                GrowableBuf::with_capacity(capacity)
            }
        }
    }

    /// 归还缓冲；非拥有型缓冲被静默丢弃。
    pub fn release<B: ByteBuf>(&self, buf: B) {
        let Some(mut buf) = buf.into_reusable() else {
            return;
        };
        let views = buf.view_count();
        if views > 0 {
            self.inner.metrics.discarded.fetch_add(1, Ordering::Relaxed);
            warn!(
                views,
                capacity = buf.capacity(),
                "released buffer still aliased by slice views, dropping instead of pooling"
            );
            return;
        }
        buf.clear();
        self.inner.free_list.lock().push_back(buf);
        self.inner.metrics.released.fetch_add(1, Ordering::Relaxed);
    }

    /// 丢弃自由链表中的全部缓冲，返回丢弃数量。
    pub fn clear(&self) -> usize {
        let drained = core::mem::take(&mut *self.inner.free_list.lock());
        let count = drained.len();
        drop(drained);
        debug!(count, "buffer pool cleared");
        count
    }

    /// 当前自由链表中的缓冲数。
    pub fn idle(&self) -> usize {
        self.inner.free_list.lock().len()
    }

    pub fn statistics(&self) -> PoolStats {
        let metrics = &self.inner.metrics;
        PoolStats {
            allocated: metrics.allocated.load(Ordering::Relaxed),
            reused: metrics.reused.load(Ordering::Relaxed),
            released: metrics.released.load(Ordering::Relaxed),
            discarded: metrics.discarded.load(Ordering::Relaxed),
            idle: self.idle(),
        }
    }
}

struct PoolInner {
    free_list: Mutex<VecDeque<GrowableBuf>>,
    config: PoolConfig,
    metrics: PoolMetrics,
}

impl PoolInner {
    fn new(config: PoolConfig) -> Self {
        Self {
            free_list: Mutex::new(VecDeque::new()),
            config,
            metrics: PoolMetrics::default(),
        }
    }
}

impl Default for PoolInner {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

#[derive(Default)]
struct PoolMetrics {
    allocated: AtomicU64,
    reused: AtomicU64,
    released: AtomicU64,
    discarded: AtomicU64,
}
