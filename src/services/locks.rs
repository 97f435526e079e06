use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// 进程内按 key 的互斥锁注册表, 用于拒绝同一逻辑操作的并发重复提交
/// (例如同一用户连点两次搜索)。
/// - key 形如 "search:{user_id}" / "bonus:{user_id}" / "gift:{token}"
/// - 锁按需懒创建, 进程生命周期内不回收 (单进程 bot 可接受)
/// - try_acquire 非阻塞: 已被持有时调用方应立即拒绝, 而不是排队
#[derive(Clone, Default)]
pub struct LockRegistry {
    inner: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

/// 持有期间同 key 的 try_acquire 都会失败; drop 即释放,
/// 覆盖所有退出路径 (成功 / 错误 / 提前 return)
pub type ActionGuard = OwnedMutexGuard<()>;

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut map = self.inner.lock().unwrap();
        map.entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// 尝试获取 key 对应的锁; 已被持有时返回 None
    pub fn try_acquire(&self, key: &str) -> Option<ActionGuard> {
        self.entry(key).try_lock_owned().ok()
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.entry(key).try_lock().is_err()
    }

    pub fn search_key(user_id: i64) -> String {
        format!("search:{user_id}")
    }

    pub fn bonus_key(user_id: i64) -> String {
        format!("bonus:{user_id}")
    }

    pub fn submission_key(user_id: i64) -> String {
        format!("submit:{user_id}")
    }

    pub fn purchase_key(user_id: i64) -> String {
        format!("purchase:{user_id}")
    }

    pub fn gift_key(token: &Uuid) -> String {
        format!("gift:{token}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_acquire_rejected() {
        let registry = LockRegistry::new();
        let key = LockRegistry::search_key(123);

        let guard = registry.try_acquire(&key);
        assert!(guard.is_some());
        // 同 key 第二次获取必须立即失败
        assert!(registry.try_acquire(&key).is_none());
        assert!(registry.is_held(&key));

        drop(guard);
        // 释放后可再次获取
        assert!(!registry.is_held(&key));
        assert!(registry.try_acquire(&key).is_some());
    }

    #[test]
    fn test_distinct_keys_are_independent() {
        let registry = LockRegistry::new();
        let _search = registry.try_acquire(&LockRegistry::search_key(1)).unwrap();
        // 同一用户不同动作互不阻塞
        assert!(registry
            .try_acquire(&LockRegistry::bonus_key(1))
            .is_some());
        // 不同用户同一动作互不阻塞
        assert!(registry
            .try_acquire(&LockRegistry::search_key(2))
            .is_some());
    }
}
