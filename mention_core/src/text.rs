//! `text`：字符偏移（char offset）与字节偏移之间的换算。
//!
//! 对外 API 的 caret / trigger index / selection 一律使用 **字符偏移**，
//! 只有在切片 `&str` 时才换算成字节偏移。

/// 文本的字符数。
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// 字符偏移 -> 字节偏移；超出末尾时钳制到 `text.len()`。
pub fn byte_index_at_char(text: &str, char_index: usize) -> usize {
    if char_index == 0 {
        return 0;
    }
    text.char_indices()
        .nth(char_index)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

/// 按字符偏移切成 `[0, at)` 与 `[at, end)` 两段。
pub fn split_at_char(text: &str, at: usize) -> (&str, &str) {
    text.split_at(byte_index_at_char(text, at))
}
