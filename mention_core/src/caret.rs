//! `caret`：caret 像素坐标定位（Caret Locator）。
//!
//! 做法与浏览器里的“镜像元素”一致：
//! - 按控件的排版/盒模型属性（`ControlStyle`）构造一个不可见的镜像
//! - 镜像内容 = caret 之前的文本 + 标记节点（caret 之后的文本，为空时用占位字形）
//! - 量出标记节点的起点与行高，再加上控件自身的 border 宽度
//! - 镜像用完即丢，不留任何副作用
//!
//! 这里提供契约（`CaretLocator`）和一个等宽网格实现（`MonospaceLocator`）；
//! 基于真实字形排版的实现见 `mention_layout`。

use crate::{
    host::TextControl,
    model::CaretCoordinates,
    text::{char_len, split_at_char},
};

/// 占位字形：标记节点内容为空时使用，保证标记有可测量的几何。
pub const DEFAULT_PLACEHOLDER: char = '.';

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub const fn uniform(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BoxSizing {
    #[default]
    ContentBox,
    BorderBox,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Scroll,
    Auto,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BorderStyle {
    None,
    #[default]
    Solid,
    Dashed,
    Dotted,
    Double,
    Inset,
    Outset,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FontVariant {
    #[default]
    Normal,
    SmallCaps,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Start,
    End,
    Left,
    Right,
    Center,
    Justify,
}

impl TextAlign {
    /// 解析成物理方向（`Start/End` 依赖书写方向）。`Justify` 在镜像中按起始对齐处理。
    pub fn resolve(self, direction: Direction) -> TextAlign {
        match (self, direction) {
            (TextAlign::Start | TextAlign::Justify, Direction::Ltr) => TextAlign::Left,
            (TextAlign::Start | TextAlign::Justify, Direction::Rtl) => TextAlign::Right,
            (TextAlign::End, Direction::Ltr) => TextAlign::Right,
            (TextAlign::End, Direction::Rtl) => TextAlign::Left,
            (other, _) => other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextTransform {
    #[default]
    None,
    Uppercase,
    Lowercase,
    Capitalize,
}

impl TextTransform {
    pub fn apply(self, text: &str) -> String {
        match self {
            TextTransform::None => text.to_string(),
            TextTransform::Uppercase => text.to_uppercase(),
            TextTransform::Lowercase => text.to_lowercase(),
            TextTransform::Capitalize => {
                let mut out = String::with_capacity(text.len());
                let mut at_word_start = true;
                for ch in text.chars() {
                    if at_word_start && ch.is_alphabetic() {
                        out.extend(ch.to_uppercase());
                    } else {
                        out.push(ch);
                    }
                    at_word_start = ch.is_whitespace();
                }
                out
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
    Overline,
    LineThrough,
}

/// 滚动条行为（平台排版引擎族）。
///
/// 由特性探测得出，而不是匹配引擎名：宿主测一个 `overflow: scroll` 元素的
/// 外宽与内容宽之差，交给 `ScrollbarMode::from_probe`。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum ScrollbarMode {
    /// 滚动条浮在内容之上，不占宽度；镜像裁剪溢出即可
    #[default]
    Overlay,
    /// 滚动条占据内容宽度
    Reserved { width: f32 },
}

impl ScrollbarMode {
    pub fn from_probe(outer_width: f32, inner_width: f32) -> Self {
        let width = outer_width - inner_width;
        if width > 0.0 {
            ScrollbarMode::Reserved { width }
        } else {
            ScrollbarMode::Overlay
        }
    }
}

/// 控件的计算样式：镜像需要复制的全部排版与盒模型属性。
#[derive(Debug, Clone, PartialEq)]
pub struct ControlStyle {
    pub direction: Direction,
    pub box_sizing: BoxSizing,
    /// 计算宽度（含义随 `box_sizing` 变化）
    pub width: f32,
    /// 计算高度（含义随 `box_sizing` 变化）
    pub height: f32,
    pub overflow_x: Overflow,
    pub overflow_y: Overflow,
    pub border: Edges,
    pub border_style: BorderStyle,
    pub padding: Edges,
    pub font_style: FontStyle,
    pub font_variant: FontVariant,
    pub font_weight: u16,
    /// 百分比，100 为正常
    pub font_stretch: f32,
    pub font_size: f32,
    pub font_size_adjust: Option<f32>,
    /// 行高（px）；`None` 表示 `normal`
    pub line_height: Option<f32>,
    pub font_family: Vec<String>,
    pub text_align: TextAlign,
    pub text_transform: TextTransform,
    pub text_indent: f32,
    pub text_decoration: TextDecoration,
    pub letter_spacing: f32,
    pub word_spacing: f32,
    /// 制表位宽度（以空格数计）
    pub tab_size: u16,
    pub scrollbar: ScrollbarMode,
}

impl Default for ControlStyle {
    fn default() -> Self {
        Self {
            direction: Direction::Ltr,
            box_sizing: BoxSizing::ContentBox,
            width: 320.0,
            height: 96.0,
            overflow_x: Overflow::Visible,
            overflow_y: Overflow::Auto,
            border: Edges::uniform(1.0),
            border_style: BorderStyle::Solid,
            padding: Edges::uniform(2.0),
            font_style: FontStyle::Normal,
            font_variant: FontVariant::Normal,
            font_weight: 400,
            font_stretch: 100.0,
            font_size: 16.0,
            font_size_adjust: None,
            line_height: None,
            font_family: vec!["monospace".to_string()],
            text_align: TextAlign::Start,
            text_transform: TextTransform::None,
            text_indent: 0.0,
            text_decoration: TextDecoration::None,
            letter_spacing: 0.0,
            word_spacing: 0.0,
            tab_size: 8,
            scrollbar: ScrollbarMode::Overlay,
        }
    }
}

impl ControlStyle {
    /// 实际生效的 border；`border-style: none` 时宽度计算为 0。
    pub fn effective_border(&self) -> Edges {
        if self.border_style == BorderStyle::None {
            Edges::default()
        } else {
            self.border
        }
    }

    /// 行高（px）；`normal` 按 1.2 倍字号估算。
    pub fn line_height_px(&self) -> f32 {
        self.line_height.unwrap_or(self.font_size * 1.2).max(1.0)
    }

    pub fn content_width(&self) -> f32 {
        match self.box_sizing {
            BoxSizing::ContentBox => self.width,
            BoxSizing::BorderBox => {
                self.width - self.padding.horizontal() - self.effective_border().horizontal()
            }
        }
        .max(0.0)
    }

    pub fn content_height(&self) -> f32 {
        match self.box_sizing {
            BoxSizing::ContentBox => self.height,
            BoxSizing::BorderBox => {
                self.height - self.padding.vertical() - self.effective_border().vertical()
            }
        }
        .max(0.0)
    }

    /// 内容区左上角相对 border box 左上角的偏移。
    pub fn content_origin(&self) -> (f32, f32) {
        let border = self.effective_border();
        (
            border.left + self.padding.left,
            border.top + self.padding.top,
        )
    }

    /// 根据全文排版高度决定镜像的换行宽度与裁剪方式。
    pub fn mirror_box(&self, full_text_height: f32) -> MirrorBox {
        let scrollable = matches!(self.overflow_y, Overflow::Auto | Overflow::Scroll);
        let overflows = full_text_height > self.content_height();
        match self.scrollbar {
            ScrollbarMode::Reserved { width }
                if self.overflow_y == Overflow::Scroll || (scrollable && overflows) =>
            {
                MirrorBox {
                    wrap_width: (self.content_width() - width).max(0.0),
                    clip: false,
                }
            }
            ScrollbarMode::Reserved { .. } => MirrorBox {
                wrap_width: self.content_width(),
                clip: false,
            },
            ScrollbarMode::Overlay => MirrorBox {
                wrap_width: self.content_width(),
                clip: true,
            },
        }
    }
}

/// 镜像元素的盒：换行宽度，以及是否裁剪溢出（`overflow: hidden`）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorBox {
    pub wrap_width: f32,
    pub clip: bool,
}

/// 镜像内容：caret 之前的文本 + 标记节点文本。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorText {
    pub before: String,
    pub marker: String,
    /// 标记节点是否使用了占位字形
    pub placeholder: bool,
}

impl MirrorText {
    pub fn split(value: &str, offset: usize, placeholder: char) -> Self {
        let (before, after) = split_at_char(value, offset);
        if after.is_empty() {
            Self {
                before: before.to_string(),
                marker: placeholder.to_string(),
                placeholder: true,
            }
        } else {
            Self {
                before: before.to_string(),
                marker: after.to_string(),
                placeholder: false,
            }
        }
    }

    /// 应用 `text-transform`（分别作用于两段，标记起点保持不变）。
    pub fn transformed(&self, transform: TextTransform) -> Self {
        Self {
            before: transform.apply(&self.before),
            marker: transform.apply(&self.marker),
            placeholder: self.placeholder,
        }
    }

    /// 镜像全文，以及标记起点的字符下标。
    pub fn joined(&self) -> (String, usize) {
        let mut text = String::with_capacity(self.before.len() + self.marker.len());
        text.push_str(&self.before);
        text.push_str(&self.marker);
        (text, char_len(&self.before))
    }
}

/// Caret Locator 契约：返回 `offset` 处 caret 相对控件 border box 的坐标和行高。
///
/// `placeholder` 是 caret 之后没有文本时标记节点使用的字形（由配置决定）。
pub trait CaretLocator<T: ?Sized> {
    fn locate(&self, control: &T, offset: usize, placeholder: char) -> CaretCoordinates;
}

/// 等宽网格镜像：每个字符固定步进，适合终端与测试。
///
/// 支持：硬换行、pre-wrap 的按词软换行（单词过长时按字形断开）、制表位、
/// letter/word spacing、首行缩进、对齐与书写方向、text-transform。
#[derive(Debug, Clone)]
pub struct MonospaceLocator {
    /// 单个字符的步进（px）
    pub advance: f32,
}

impl Default for MonospaceLocator {
    fn default() -> Self {
        Self { advance: 8.0 }
    }
}

impl MonospaceLocator {
    pub fn new(advance: f32) -> Self {
        Self {
            advance: advance.max(0.1),
        }
    }

    /// 在给定样式下定位镜像全文中第 `marker` 个字符的起点。
    pub fn locate_in_style(
        &self,
        style: &ControlStyle,
        value: &str,
        offset: usize,
        placeholder: char,
    ) -> CaretCoordinates {
        let line_height = style.line_height_px();
        let full: Vec<char> = style.text_transform.apply(value).chars().collect();
        let full_rows = GridLayout::build(&full, self, style, style.content_width()).rows.len();
        let mirror_box = style.mirror_box(full_rows as f32 * line_height);

        let mirror = MirrorText::split(value, offset, placeholder).transformed(style.text_transform);
        let (text, marker) = mirror.joined();
        let chars: Vec<char> = text.chars().collect();
        let grid = GridLayout::build(&chars, self, style, mirror_box.wrap_width);

        let (origin_x, origin_y) = style.content_origin();
        let Some(cell) = grid.cells.get(marker) else {
            return CaretCoordinates {
                left: origin_x,
                top: origin_y,
                height: line_height,
            };
        };
        let row_width = grid.rows.get(cell.row).copied().unwrap_or(0.0);
        let free = (mirror_box.wrap_width - row_width).max(0.0);
        let edge = match style.text_align.resolve(style.direction) {
            TextAlign::Right => free,
            TextAlign::Center => free / 2.0,
            _ => 0.0,
        };
        // cell.x 是沿书写方向的前进量；RTL 行从右边缘往左排
        let x = match style.direction {
            Direction::Ltr => edge + cell.x,
            Direction::Rtl => edge + row_width - cell.x,
        };
        let x = if mirror_box.clip {
            x.min(mirror_box.wrap_width)
        } else {
            x
        };

        CaretCoordinates {
            left: origin_x + x,
            top: origin_y + cell.row as f32 * line_height,
            height: line_height,
        }
    }

    fn char_advance(&self, style: &ControlStyle, ch: char) -> f32 {
        let mut w = self.advance + style.letter_spacing;
        if ch == ' ' {
            w += style.word_spacing;
        }
        w.max(0.0)
    }

    fn tab_advance(&self, style: &ControlStyle, x: f32) -> f32 {
        let stop = (self.advance + style.letter_spacing).max(0.1) * f32::from(style.tab_size.max(1));
        let next = ((x / stop).floor() + 1.0) * stop;
        next - x
    }
}

impl<T> CaretLocator<T> for MonospaceLocator
where
    T: TextControl + ?Sized,
{
    fn locate(&self, control: &T, offset: usize, placeholder: char) -> CaretCoordinates {
        self.locate_in_style(control.style(), control.value(), offset, placeholder)
    }
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    row: usize,
    x: f32,
    width: f32,
}

/// 网格排版结果：每个字符一个 cell，以及每行的内容宽度。
struct GridLayout {
    cells: Vec<Cell>,
    rows: Vec<f32>,
}

impl GridLayout {
    fn build(chars: &[char], locator: &MonospaceLocator, style: &ControlStyle, wrap_width: f32) -> Self {
        let mut cells: Vec<Cell> = Vec::with_capacity(chars.len());
        let mut row = 0usize;
        let mut x = style.text_indent;
        // 当前行最后一个可断点（空白字符）的下标
        let mut break_after: Option<usize> = None;

        for (i, &ch) in chars.iter().enumerate() {
            if ch == '\n' {
                cells.push(Cell { row, x, width: 0.0 });
                row += 1;
                x = 0.0;
                break_after = None;
                continue;
            }
            let width = if ch == '\t' {
                locator.tab_advance(style, x)
            } else {
                locator.char_advance(style, ch)
            };
            let row_start = if row == 0 { style.text_indent } else { 0.0 };
            if !ch.is_whitespace() && x + width > wrap_width && x > row_start {
                row += 1;
                x = 0.0;
                if let Some(b) = break_after {
                    for cell in &mut cells[b + 1..i] {
                        cell.row = row;
                        cell.x = x;
                        x += cell.width;
                    }
                }
                break_after = None;
            }
            cells.push(Cell { row, x, width });
            if ch.is_whitespace() {
                break_after = Some(i);
            }
            x += width;
        }

        let mut rows = vec![0.0f32; row + 1];
        for (cell, ch) in cells.iter().zip(chars) {
            if !ch.is_whitespace() {
                rows[cell.row] = rows[cell.row].max(cell.x + cell.width);
            }
        }
        Self { cells, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(width: f32) -> ControlStyle {
        ControlStyle {
            width,
            height: 200.0,
            border: Edges::uniform(1.0),
            padding: Edges::uniform(2.0),
            line_height: Some(20.0),
            ..ControlStyle::default()
        }
    }

    #[test]
    fn mirror_uses_placeholder_for_empty_remainder() {
        let m = MirrorText::split("hello", 5, '.');
        assert_eq!(m.before, "hello");
        assert_eq!(m.marker, ".");
        assert!(m.placeholder);

        let m = MirrorText::split("hello", 2, '.');
        assert_eq!(m.marker, "llo");
        assert!(!m.placeholder);
    }

    #[test]
    fn caret_at_start_sits_on_content_origin() {
        let c = MonospaceLocator::new(8.0).locate_in_style(&style(200.0), "", 0, '.');
        assert_eq!(c, CaretCoordinates { left: 3.0, top: 3.0, height: 20.0 });
    }

    #[test]
    fn caret_advances_per_char_and_line() {
        let loc = MonospaceLocator::new(8.0);
        let s = style(200.0);
        let c = loc.locate_in_style(&s, "hello", 5, '.');
        assert_eq!(c.left, 3.0 + 40.0);
        assert_eq!(c.top, 3.0);

        let c = loc.locate_in_style(&s, "ab\ncd", 4, '.');
        assert_eq!(c.left, 3.0 + 8.0);
        assert_eq!(c.top, 3.0 + 20.0);
    }

    #[test]
    fn caret_right_after_newline_starts_next_row() {
        let c = MonospaceLocator::new(8.0).locate_in_style(&style(200.0), "ab\n", 3, '.');
        assert_eq!(c.left, 3.0);
        assert_eq!(c.top, 23.0);
    }

    #[test]
    fn word_moves_to_next_row_when_it_overflows() {
        // 10 列宽：`hello @alice` 中 `@alice` 整词换到第二行
        let loc = MonospaceLocator::new(8.0);
        let c = loc.locate_in_style(&style(80.0), "hello @alice", 12, '.');
        assert_eq!(c.top, 23.0);
        assert_eq!(c.left, 3.0 + 6.0 * 8.0);
    }

    #[test]
    fn long_word_breaks_per_glyph() {
        let c = MonospaceLocator::new(8.0).locate_in_style(&style(40.0), "abcdefgh", 7, '.');
        assert_eq!(c.top, 23.0);
        assert_eq!(c.left, 3.0 + 2.0 * 8.0);
    }

    #[test]
    fn tabs_jump_to_next_stop() {
        let s = ControlStyle {
            tab_size: 4,
            ..style(400.0)
        };
        let c = MonospaceLocator::new(8.0).locate_in_style(&s, "a\tb", 2, '.');
        assert_eq!(c.left, 3.0 + 32.0);
    }

    #[test]
    fn spacing_and_indent_shift_caret() {
        let s = ControlStyle {
            letter_spacing: 1.0,
            word_spacing: 4.0,
            text_indent: 10.0,
            ..style(400.0)
        };
        let c = MonospaceLocator::new(8.0).locate_in_style(&s, "a b", 3, '.');
        assert_eq!(c.left, 3.0 + 10.0 + 9.0 + 13.0 + 9.0);
    }

    #[test]
    fn uppercase_transform_can_grow_text() {
        let s = ControlStyle {
            text_transform: TextTransform::Uppercase,
            ..style(400.0)
        };
        let c = MonospaceLocator::new(8.0).locate_in_style(&s, "ß@", 1, '.');
        assert_eq!(c.left, 3.0 + 16.0);
    }

    #[test]
    fn right_alignment_offsets_by_free_space() {
        let s = ControlStyle {
            text_align: TextAlign::Right,
            ..style(80.0)
        };
        // 镜像内容 `ab.`，行宽 24，空余 56
        let c = MonospaceLocator::new(8.0).locate_in_style(&s, "ab", 2, '.');
        assert_eq!(c.left, 3.0 + 56.0 + 16.0);
    }

    #[test]
    fn rtl_rows_run_from_the_right_edge() {
        let rtl = ControlStyle {
            direction: Direction::Rtl,
            ..style(80.0)
        };
        // `start` 在 RTL 下靠右：行占 [56, 80]，标记在 `a`、`b` 左侧
        let c = MonospaceLocator::new(8.0).locate_in_style(&rtl, "ab", 2, '.');
        assert_eq!(c.left, 3.0 + 64.0);
        let c = MonospaceLocator::new(8.0).locate_in_style(&rtl, "ab", 0, '.');
        assert_eq!(c.left, 3.0 + 80.0);

        let left = ControlStyle {
            text_align: TextAlign::Left,
            ..rtl
        };
        let c = MonospaceLocator::new(8.0).locate_in_style(&left, "ab", 2, '.');
        assert_eq!(c.left, 3.0 + 8.0);
    }

    #[test]
    fn border_style_none_drops_border_width() {
        let s = ControlStyle {
            border_style: BorderStyle::None,
            ..style(200.0)
        };
        let c = MonospaceLocator::new(8.0).locate_in_style(&s, "", 0, '.');
        assert_eq!((c.left, c.top), (2.0, 2.0));
    }

    #[test]
    fn reserved_scrollbar_narrows_wrap_width_only_when_overflowing() {
        let s = ControlStyle {
            height: 20.0,
            scrollbar: ScrollbarMode::from_probe(100.0, 84.0),
            ..style(80.0)
        };
        assert_eq!(s.scrollbar, ScrollbarMode::Reserved { width: 16.0 });
        assert_eq!(s.mirror_box(20.0).wrap_width, 80.0);
        assert_eq!(s.mirror_box(60.0).wrap_width, 64.0);

        let overlay = ControlStyle {
            scrollbar: ScrollbarMode::from_probe(100.0, 100.0),
            ..s
        };
        let b = overlay.mirror_box(60.0);
        assert_eq!(b.wrap_width, 80.0);
        assert!(b.clip);
    }

    #[test]
    fn border_box_subtracts_padding_and_border() {
        let s = ControlStyle {
            box_sizing: BoxSizing::BorderBox,
            width: 100.0,
            height: 50.0,
            ..style(0.0)
        };
        assert_eq!(s.content_width(), 94.0);
        assert_eq!(s.content_height(), 44.0);
    }

    #[test]
    fn capitalize_uppercases_word_starts() {
        assert_eq!(TextTransform::Capitalize.apply("hello wide world"), "Hello Wide World");
    }
}
