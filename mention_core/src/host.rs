//! `host`：控制器依赖的外部协作者（全部由宿主提供）。
//!
//! - `TextControl`：可编辑文本控件（文本、caret、选区、焦点、几何）
//! - `MenuContainer`：可定位、可显示/隐藏的菜单容器，控制器只负责摆放与填充
//! - `RowRenderer`：每个候选渲染成一行菜单项
//! - `ReplacementFormatter`：候选 + 触发符 -> 提交文本
//!
//! 另外提供 `MemoryControl`：内存里的文本控件，CLI 与测试都用它。

use crate::{
    caret::ControlStyle,
    model::{Candidate, MenuPosition, Rect, ScrollOffset},
    text::{byte_index_at_char, char_len},
};

/// 可编辑文本控件。偏移一律为字符偏移。
pub trait TextControl {
    fn value(&self) -> &str;
    /// 选区起点（caret）
    fn selection_start(&self) -> usize;
    fn set_value(&mut self, value: String);
    fn set_selection_range(&mut self, start: usize, end: usize);
    fn focus(&mut self);
    /// 控件在视口中的矩形
    fn bounding_rect(&self) -> Rect;
    /// 控件自身内容的滚动偏移
    fn scroll_offset(&self) -> ScrollOffset;
    /// 页面（视口）的滚动偏移
    fn page_scroll(&self) -> ScrollOffset;
    /// 计算样式，供 caret locator 镜像
    fn style(&self) -> &ControlStyle;
}

/// 菜单容器。控制器不解释 `Row` 的内容。
pub trait MenuContainer {
    type Row;

    fn clear(&mut self);
    fn append(&mut self, row: Self::Row);
    fn set_position(&mut self, position: MenuPosition);
    fn show(&mut self);
    fn hide(&mut self);
}

/// 菜单行渲染器。
///
/// 行只携带下标；宿主在点击时调用 `MentionController::commit(index)`，
/// 不需要为每一行绑定闭包。激活态样式与无障碍属性（`aria-selected` 等）由实现自己负责。
pub trait RowRenderer<C, R> {
    fn render(&self, candidate: &C, index: usize, active: bool) -> R;
}

impl<C, R, F> RowRenderer<C, R> for F
where
    F: Fn(&C, usize, bool) -> R,
{
    fn render(&self, candidate: &C, index: usize, active: bool) -> R {
        self(candidate, index, active)
    }
}

/// 提交文本格式化：`(candidate, trigger) -> 插入控件的文本`（可含尾随分隔符）。
pub trait ReplacementFormatter<C> {
    fn format(&self, candidate: &C, trigger: char) -> String;
}

impl<C, F> ReplacementFormatter<C> for F
where
    F: Fn(&C, char) -> String,
{
    fn format(&self, candidate: &C, trigger: char) -> String {
        self(candidate, trigger)
    }
}

/// 默认格式：触发符 + key + 一个空格，例如 `@alice `。
pub fn default_formatter<C: Candidate>(candidate: &C, trigger: char) -> String {
    format!("{trigger}{} ", candidate.key())
}

/// 内存文本控件。
#[derive(Debug, Clone)]
pub struct MemoryControl {
    value: String,
    selection: (usize, usize),
    focused: bool,
    rect: Rect,
    scroll: ScrollOffset,
    page_scroll: ScrollOffset,
    style: ControlStyle,
}

impl Default for MemoryControl {
    fn default() -> Self {
        let style = ControlStyle::default();
        let border = style.effective_border();
        Self {
            value: String::new(),
            selection: (0, 0),
            focused: false,
            rect: Rect {
                left: 0.0,
                top: 0.0,
                width: style.content_width() + style.padding.horizontal() + border.horizontal(),
                height: style.content_height() + style.padding.vertical() + border.vertical(),
            },
            scroll: ScrollOffset::default(),
            page_scroll: ScrollOffset::default(),
            style,
        }
    }
}

impl MemoryControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(mut self, style: ControlStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    pub fn with_scroll(mut self, scroll: ScrollOffset) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn with_page_scroll(mut self, page_scroll: ScrollOffset) -> Self {
        self.page_scroll = page_scroll;
        self
    }

    /// 整体替换文本，caret 放到末尾。
    pub fn set_text(&mut self, text: &str) {
        self.value = text.to_string();
        let end = char_len(&self.value);
        self.selection = (end, end);
    }

    /// 把 caret 放到 `caret`（钳制到文本长度）。
    pub fn set_caret(&mut self, caret: usize) {
        let caret = caret.min(char_len(&self.value));
        self.selection = (caret, caret);
    }

    /// 在 caret 处输入文本（先删除选区）。
    pub fn type_text(&mut self, text: &str) {
        let (start, end) = self.ordered_selection();
        let start_byte = byte_index_at_char(&self.value, start);
        let end_byte = byte_index_at_char(&self.value, end);
        self.value.replace_range(start_byte..end_byte, text);
        let caret = start + char_len(text);
        self.selection = (caret, caret);
    }

    /// 退格：有选区删选区，否则删 caret 前一个字符。
    pub fn backspace(&mut self) {
        let (start, end) = self.ordered_selection();
        let from = if start == end { start.saturating_sub(1) } else { start };
        let from_byte = byte_index_at_char(&self.value, from);
        let end_byte = byte_index_at_char(&self.value, end);
        self.value.replace_range(from_byte..end_byte, "");
        self.selection = (from, from);
    }

    pub fn selection(&self) -> (usize, usize) {
        self.selection
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    fn ordered_selection(&self) -> (usize, usize) {
        let (a, b) = self.selection;
        let len = char_len(&self.value);
        (a.min(b).min(len), a.max(b).min(len))
    }
}

impl TextControl for MemoryControl {
    fn value(&self) -> &str {
        &self.value
    }

    fn selection_start(&self) -> usize {
        self.ordered_selection().0
    }

    fn set_value(&mut self, value: String) {
        self.value = value;
        let len = char_len(&self.value);
        self.selection = (self.selection.0.min(len), self.selection.1.min(len));
    }

    fn set_selection_range(&mut self, start: usize, end: usize) {
        let len = char_len(&self.value);
        self.selection = (start.min(len), end.min(len));
    }

    fn focus(&mut self) {
        self.focused = true;
    }

    fn bounding_rect(&self) -> Rect {
        self.rect
    }

    fn scroll_offset(&self) -> ScrollOffset {
        self.scroll
    }

    fn page_scroll(&self) -> ScrollOffset {
        self.page_scroll
    }

    fn style(&self) -> &ControlStyle {
        &self.style
    }
}
