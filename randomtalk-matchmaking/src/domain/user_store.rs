use super::user::{User, UserId};
use async_trait::async_trait;
use randomtalk_domain::error::DomainResult;

/// 等待池
///
/// 每个操作对后端单独原子，跨操作的序列不是事务。
#[async_trait]
pub trait UserStore: Send + Sync {
    /// 以用户 ID 为键加入；已存在时覆盖
    async fn add_user(&self, user: User) -> DomainResult<()>;

    async fn get_all(&self) -> DomainResult<Vec<User>>;

    /// 全部存在才删除，任一缺失返回 `NotFound` 且不做任何修改
    async fn remove_users(&self, ids: &[UserId]) -> DomainResult<()>;
}
