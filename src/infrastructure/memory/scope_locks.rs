//! Scope Locks - 任务作用域互斥
//!
//! 每个 (book, chapter) 对应一把异步互斥锁。
//! 获取时按排序后的键顺序逐把加锁，作用域重叠的任务必然在第一把
//! 公共锁上相遇，全局顺序一致，不会死锁。

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::application::ports::TaskScope;

/// 作用域锁竞技场
#[derive(Default)]
pub struct ScopeLockArena {
    locks: DashMap<(String, String), Arc<Mutex<()>>>,
}

impl ScopeLockArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取作用域内全部互斥锁，返回的 guard 集合在任务结束时整体释放
    pub async fn acquire(&self, scope: &TaskScope) -> Vec<OwnedMutexGuard<()>> {
        let mut guards = Vec::new();
        for key in scope.lock_keys() {
            let lock = self
                .locks
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone();
            guards.push(lock.lock_owned().await);
        }
        guards
    }

    /// 回收无人持有的锁条目，防止竞技场无限增长
    pub fn sweep(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
