//! 内存等待池
use crate::domain::user::{User, UserId};
use crate::domain::user_store::UserStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use randomtalk_domain::error::{DomainError, DomainResult};
use std::collections::HashMap;

/// 以用户 ID 为键的内存池；单个操作在锁内完成
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    pub fn contains(&self, id: &UserId) -> bool {
        self.users.read().contains_key(id)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn add_user(&self, user: User) -> DomainResult<()> {
        self.users.write().insert(user.id().clone(), user);
        Ok(())
    }

    async fn get_all(&self) -> DomainResult<Vec<User>> {
        Ok(self.users.read().values().cloned().collect())
    }

    async fn remove_users(&self, ids: &[UserId]) -> DomainResult<()> {
        let mut users = self.users.write();
        if let Some(missing) = ids.iter().find(|id| !users.contains_key(*id)) {
            return Err(DomainError::not_found(format!(
                "user {missing} is not in the waiting pool"
            )));
        }
        for id in ids {
            users.remove(id);
        }
        Ok(())
    }
}
