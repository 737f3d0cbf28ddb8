//! 稳定匹配（Gale-Shapley）
//!
//! 双方的偏好列表只包含双向兼容的对象，并按对方的用户 ID 字典序排列；
//! 除此之外没有更多排序信号。复杂度受偏好列表总长度约束，最坏 O(n·m)。
//!
use super::user::User;

/// 稳定匹配求解器
pub trait StableMatchFinder: Send + Sync {
    /// 返回与 `proposers` 等长的结果，每项为 `reviewers` 中的下标或 `None`（未匹配）；
    /// 任一输入为空时返回 `None`
    fn find_stable_matches(&self, proposers: &[User], reviewers: &[User])
    -> Option<Vec<Option<usize>>>;
}

/// 经典的延迟接受算法，纯计算，不会挂起
#[derive(Debug, Default, Clone, Copy)]
pub struct GaleShapleyMatcher;

impl GaleShapleyMatcher {
    pub fn new() -> Self {
        Self
    }
}

impl StableMatchFinder for GaleShapleyMatcher {
    fn find_stable_matches(
        &self,
        proposers: &[User],
        reviewers: &[User],
    ) -> Option<Vec<Option<usize>>> {
        let (n_p, n_r) = (proposers.len(), reviewers.len());
        if n_p == 0 || n_r == 0 {
            return None;
        }

        let proposer_prefs: Vec<Vec<usize>> = proposers
            .iter()
            .map(|p| compatible_in_id_order(p, reviewers))
            .collect();

        // rank[r][p]：r 对 p 的名次；不在列表中的取哨兵值
        let sentinel = n_p + 1;
        let mut rank = vec![vec![sentinel; n_p]; n_r];
        for (r, reviewer) in reviewers.iter().enumerate() {
            for (position, p) in compatible_in_id_order(reviewer, proposers)
                .into_iter()
                .enumerate()
            {
                rank[r][p] = position;
            }
        }

        let mut matches: Vec<Option<usize>> = vec![None; n_p];
        let mut engaged_to: Vec<Option<usize>> = vec![None; n_r];
        let mut next_proposal = vec![0usize; n_p];

        while let Some(p) = (0..n_p)
            .find(|&p| matches[p].is_none() && next_proposal[p] < proposer_prefs[p].len())
        {
            let r = proposer_prefs[p][next_proposal[p]];
            next_proposal[p] += 1;

            match engaged_to[r] {
                None => {
                    engaged_to[r] = Some(p);
                    matches[p] = Some(r);
                }
                Some(current) if rank[r][p] < rank[r][current] => {
                    matches[current] = None;
                    engaged_to[r] = Some(p);
                    matches[p] = Some(r);
                }
                Some(_) => {}
            }
        }

        Some(matches)
    }
}

/// `others` 中与 `user` 双向兼容者的下标，按其用户 ID 排序
fn compatible_in_id_order(user: &User, others: &[User]) -> Vec<usize> {
    let mut candidates: Vec<usize> = others
        .iter()
        .enumerate()
        .filter(|(_, other)| user.is_compatible_with(other))
        .map(|(idx, _)| idx)
        .collect();
    candidates.sort_by(|&a, &b| others[a].id().cmp(others[b].id()));
    candidates
}
