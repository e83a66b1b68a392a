//! `filter`：候选后处理（去重/排序/裁剪）。

use std::collections::HashSet;

use crate::model::Candidate;

/// Filter：对解析结果做后处理。
pub trait Filter<C> {
    fn apply(&self, candidates: Vec<C>) -> Vec<C>;
}

/// 截断到 `limit` 条（至少 1 条）。
pub struct Truncate {
    pub limit: usize,
}

impl<C> Filter<C> for Truncate {
    fn apply(&self, mut candidates: Vec<C>) -> Vec<C> {
        candidates.truncate(self.limit.max(1));
        candidates
    }
}

/// 按 key 去重，保留第一次出现的项。
pub struct DedupByKey;

impl<C: Candidate> Filter<C> for DedupByKey {
    fn apply(&self, candidates: Vec<C>) -> Vec<C> {
        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|c| seen.insert(c.key().to_string()))
            .collect()
    }
}

/// 按权重倒序（稳定排序，同权重保持原顺序）。
pub struct RankByWeight;

impl<C: Candidate> Filter<C> for RankByWeight {
    fn apply(&self, mut candidates: Vec<C>) -> Vec<C> {
        candidates.sort_by(|a, b| b.weight().cmp(&a.weight()));
        candidates
    }
}
