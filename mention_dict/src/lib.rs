use std::{collections::BTreeMap, fs, io, path::Path};

use futures::future;
use mention_core::{
    model::Member,
    resolver::{ResolveFuture, Resolver},
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("failed to read member directory: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: missing handle")]
    MissingHandle { line: usize },
    #[error("line {line}: invalid weight `{value}`")]
    BadWeight { line: usize, value: String },
    #[error("line {line}: duplicate handle `{handle}`")]
    Duplicate { line: usize, handle: String },
}

/// 成员目录。
///
/// TSV 格式：
///
/// - `handle<TAB>display name<TAB>weight`
/// - display name、weight 可省略（weight 默认 0）
/// - 允许 `#` 开头注释行与空行
///
/// 作为 resolver：空查询返回全部成员（文件顺序）；
/// 否则按 handle 做区分大小写的前缀匹配，结果仍保持文件顺序。
#[derive(Debug, Clone, Default)]
pub struct MemberDirectory {
    members: Vec<Member>,
    index: BTreeMap<String, usize>, // handle -> members 下标
}

impl MemberDirectory {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let s = fs::read_to_string(path)?;
        let dir = Self::from_tsv_str(&s)?;
        debug!(path = %path.display(), members = dir.len(), "member directory loaded");
        Ok(dir)
    }

    pub fn from_tsv_str(s: &str) -> Result<Self, DirectoryError> {
        let mut dir = Self::default();

        for (idx, raw) in s.lines().enumerate() {
            let line = idx + 1;
            if raw.trim().is_empty() || raw.trim_start().starts_with('#') {
                continue;
            }
            let mut it = raw.split('\t');
            let handle = it.next().unwrap_or("").trim();
            if handle.is_empty() {
                return Err(DirectoryError::MissingHandle { line });
            }
            let display = it.next().map(str::trim).filter(|x| !x.is_empty());
            let weight = match it.next().map(str::trim).filter(|x| !x.is_empty()) {
                Some(x) => x.parse::<i32>().map_err(|_| DirectoryError::BadWeight {
                    line,
                    value: x.to_string(),
                })?,
                None => 0,
            };

            let mut member = Member::new(handle).with_weight(weight);
            if let Some(name) = display {
                member = member.with_display_name(name);
            }
            dir.insert(line, member)?;
        }

        Ok(dir)
    }

    pub fn from_members(members: impl IntoIterator<Item = Member>) -> Result<Self, DirectoryError> {
        let mut dir = Self::default();
        for (i, m) in members.into_iter().enumerate() {
            dir.insert(i + 1, m)?;
        }
        Ok(dir)
    }

    fn insert(&mut self, line: usize, member: Member) -> Result<(), DirectoryError> {
        if self.index.contains_key(&member.handle) {
            return Err(DirectoryError::Duplicate {
                line,
                handle: member.handle,
            });
        }
        self.index.insert(member.handle.clone(), self.members.len());
        self.members.push(member);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn get(&self, handle: &str) -> Option<&Member> {
        self.index.get(handle).map(|&i| &self.members[i])
    }

    /// 同步查询。
    pub fn lookup(&self, query: &str) -> Vec<Member> {
        if query.is_empty() {
            return self.members.clone();
        }
        let mut hits: Vec<usize> = self
            .index
            .range(query.to_string()..)
            .take_while(|(handle, _)| handle.starts_with(query))
            .map(|(_, &i)| i)
            .collect();
        hits.sort_unstable();
        hits.into_iter().map(|i| self.members[i].clone()).collect()
    }
}

impl Resolver<Member> for MemberDirectory {
    fn resolve(&self, query: &str) -> ResolveFuture<Member> {
        Box::pin(future::ready(Ok(self.lookup(query))))
    }
}
