//! `resolver`：查询串 -> 候选列表（异步）。
//!
//! core 不关心候选来自内存、文件还是网络；解析是一个挂起点，
//! 完成时控制器会按请求代数（generation）判断结果是否已过期。

use futures::future::{self, LocalBoxFuture};
use thiserror::Error;

use crate::model::Candidate;

/// 解析失败。控制器把失败当作空结果处理（关闭菜单），不会重试。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("candidate source unavailable: {0}")]
    Unavailable(String),
}

pub type ResolveFuture<C> = LocalBoxFuture<'static, Result<Vec<C>, ResolveError>>;

/// Resolver 抽象。
///
/// 约定：
/// - `query` 是触发符之后、caret 之前的文本
/// - 空串表示“不过滤”，返回完整集合
/// - 事件循环是单线程的，返回的 future 不要求 `Send`
pub trait Resolver<C> {
    fn resolve(&self, query: &str) -> ResolveFuture<C>;
}

/// 默认 resolver：内存列表 + 区分大小写的前缀过滤，保持列表原有顺序。
#[derive(Debug, Clone)]
pub struct ListResolver<C> {
    items: Vec<C>,
}

impl<C> ListResolver<C>
where
    C: Candidate + Clone,
{
    pub fn new(items: Vec<C>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[C] {
        &self.items
    }

    /// 同步过滤。
    pub fn filter(&self, query: &str) -> Vec<C> {
        if query.is_empty() {
            return self.items.clone();
        }
        self.items
            .iter()
            .filter(|c| c.key().starts_with(query))
            .cloned()
            .collect()
    }
}

impl<C> Resolver<C> for ListResolver<C>
where
    C: Candidate + Clone + 'static,
{
    fn resolve(&self, query: &str) -> ResolveFuture<C> {
        Box::pin(future::ready(Ok(self.filter(query))))
    }
}

/// 把同步闭包包装成立即就绪的 resolver。
pub struct FnResolver<F>(pub F);

impl<C, F> Resolver<C> for FnResolver<F>
where
    F: Fn(&str) -> Vec<C>,
    C: 'static,
{
    fn resolve(&self, query: &str) -> ResolveFuture<C> {
        Box::pin(future::ready(Ok((self.0)(query))))
    }
}
