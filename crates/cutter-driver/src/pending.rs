//! 挂起功率插槽
//!
//! 同步标记策略下，命令上下文写入、执行上下文读取的单字节插槽。

use std::sync::atomic::{AtomicU8, Ordering};

/// 挂起功率（原子单字节，跨线程无撕裂）
///
/// # 使用场景
///
/// - 命令上下文：`store()` 写入换算后的硬件值，然后入队同步标记块
/// - 执行上下文：到达同步标记块时 `load()` 并写入硬件输出
///
/// 单写者/单读者：写入使用 `Release`，读取使用 `Acquire`，
/// 保证执行上下文看到标记块时也能看到它之前写入的值。
///
/// # 示例
///
/// ```rust
/// use cutter_driver::PendingPower;
///
/// let pending = PendingPower::new(0);
/// pending.store(200);
/// assert_eq!(pending.load(), 200);
/// ```
#[derive(Debug, Default)]
pub struct PendingPower {
    inner: AtomicU8,
}

impl PendingPower {
    pub fn new(value: u8) -> Self {
        Self {
            inner: AtomicU8::new(value),
        }
    }

    /// 写入挂起值（命令上下文）
    pub fn store(&self, value: u8) {
        self.inner.store(value, Ordering::Release);
    }

    /// 读取挂起值（执行上下文）
    pub fn load(&self) -> u8 {
        self.inner.load(Ordering::Acquire)
    }
}
