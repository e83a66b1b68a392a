//! `trigger`：在 caret 之前的文本里识别提及（mention）触发符。
//!
//! 规则：取 `text[..caret]` 的最后一个空白分隔 token，
//! 若该 token 以触发符开头，则进入提及模式；token 剩余部分即查询串。

use crate::text::{byte_index_at_char, char_len};

/// 一次成功的触发识别结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerMatch {
    /// 触发符所在的字符偏移
    pub index: usize,
    /// 触发符之后、caret 之前的查询串（可以为空）
    pub query: String,
}

/// 识别触发符；`caret` 是字符偏移，超出末尾时按末尾处理。
pub fn detect_trigger(text: &str, caret: usize, trigger: char) -> Option<TriggerMatch> {
    let before = &text[..byte_index_at_char(text, caret)];
    let token_start = before
        .char_indices()
        .filter(|(_, ch)| ch.is_whitespace())
        .last()
        .map(|(idx, ch)| idx + ch.len_utf8())
        .unwrap_or(0);
    let token = &before[token_start..];
    let rest = token.strip_prefix(trigger)?;
    Some(TriggerMatch {
        index: char_len(&before[..token_start]),
        query: rest.to_string(),
    })
}
