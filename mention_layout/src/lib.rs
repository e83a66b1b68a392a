//! 基于真实字形排版的 caret 定位：用 cosmic-text 的 `Buffer` 充当镜像元素。
//!
//! 流程与 `mention_core::caret` 的契约一致：
//! - 按控件样式构造 `Buffer`（字号、行高、pre-wrap + break-word 换行、对齐、制表位、字体属性）
//! - 内容 = caret 之前的文本 + 标记文本（为空时用占位字形）
//! - 在排版结果中找到标记首字形所在的 layout run，读出 x / 行顶 / 行高
//! - `Buffer` 用完即丢

use std::cell::RefCell;

use cosmic_text::{
    Align, Attrs, Buffer, Family, FontSystem, LayoutRun, Metrics, Shaping, Stretch, Style, Weight,
    Wrap,
};
use mention_core::{
    caret::{CaretLocator, ControlStyle, Direction, FontStyle, MirrorText, TextAlign},
    host::TextControl,
    model::CaretCoordinates,
};
use tracing::trace;

pub struct MirrorLocator {
    font_system: RefCell<FontSystem>,
}

impl Default for MirrorLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl MirrorLocator {
    /// 加载系统字体。
    pub fn new() -> Self {
        Self::with_font_system(FontSystem::new())
    }

    pub fn with_font_system(font_system: FontSystem) -> Self {
        Self {
            font_system: RefCell::new(font_system),
        }
    }

    /// 字体库里是否有可用字体（没有时 x 坐标恒为 0，只有行信息可信）。
    pub fn has_fonts(&self) -> bool {
        self.font_system.borrow().db().faces().next().is_some()
    }

    pub fn locate_in_style(
        &self,
        style: &ControlStyle,
        value: &str,
        offset: usize,
        placeholder: char,
    ) -> CaretCoordinates {
        let mut font_system = self.font_system.borrow_mut();
        let font_system = &mut *font_system;
        let line_height = style.line_height_px();

        let full_text = style.text_transform.apply(value);
        let full = shape(font_system, style, &full_text, style.content_width());
        let full_height = full.layout_runs().count() as f32 * line_height;
        let mirror_box = style.mirror_box(full_height);

        let mirror = MirrorText::split(value, offset, placeholder).transformed(style.text_transform);
        let (text, _) = mirror.joined();
        let buffer = shape(font_system, style, &text, mirror_box.wrap_width);
        let (line, index) = line_and_index_from_byte(&text, mirror.before.len());

        let (origin_x, origin_y) = style.content_origin();
        let (x, line_top, run_height) = match find_marker_run(&buffer, line, index) {
            Some((run, x)) => {
                let run_start = run.glyphs.iter().map(|g| g.start).min().unwrap_or(0);
                let mut x = x + spacing_before(style, run.text, run_start, index);
                if run.line_i == 0 && is_first_run_of_line(&buffer, &run) {
                    x += style.text_indent;
                }
                (x, run.line_top, run.line_height)
            }
            None => {
                trace!(line, index, "marker glyph not found, using line fallback");
                let top = fallback_line_top(&buffer, line).unwrap_or(line as f32 * line_height);
                (0.0, top, line_height)
            }
        };
        let x = if mirror_box.clip {
            x.clamp(0.0, mirror_box.wrap_width)
        } else {
            x
        };

        CaretCoordinates {
            left: origin_x + x,
            top: origin_y + line_top,
            height: if run_height > 0.0 { run_height } else { line_height },
        }
    }
}

impl<T> CaretLocator<T> for MirrorLocator
where
    T: TextControl + ?Sized,
{
    fn locate(&self, control: &T, offset: usize, placeholder: char) -> CaretCoordinates {
        self.locate_in_style(control.style(), control.value(), offset, placeholder)
    }
}

fn shape(font_system: &mut FontSystem, style: &ControlStyle, text: &str, width: f32) -> Buffer {
    let metrics = Metrics::new(style.font_size.max(1.0), style.line_height_px());
    let mut buffer = Buffer::new(font_system, metrics);
    buffer.set_wrap(font_system, Wrap::WordOrGlyph);
    buffer.set_size(font_system, Some(width.max(1.0)), None);
    buffer.set_tab_width(font_system, style.tab_size.max(1));
    let family = style.font_family.first().map(String::as_str).unwrap_or("monospace");
    let attrs = Attrs::new()
        .family(family_for(family))
        .weight(Weight(style.font_weight))
        .style(match style.font_style {
            FontStyle::Normal => Style::Normal,
            FontStyle::Italic => Style::Italic,
            FontStyle::Oblique => Style::Oblique,
        })
        .stretch(stretch_for(style.font_stretch));
    buffer.set_text(
        font_system,
        text,
        &attrs,
        Shaping::Advanced,
        Some(align_for(style.text_align, style.direction)),
    );
    buffer.shape_until_scroll(font_system, false);
    buffer
}

fn family_for(name: &str) -> Family<'_> {
    match name {
        "monospace" => Family::Monospace,
        "serif" => Family::Serif,
        "sans-serif" => Family::SansSerif,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        other => Family::Name(other),
    }
}

fn stretch_for(percent: f32) -> Stretch {
    match percent {
        p if p <= 56.25 => Stretch::UltraCondensed,
        p if p <= 68.75 => Stretch::ExtraCondensed,
        p if p <= 81.25 => Stretch::Condensed,
        p if p <= 93.75 => Stretch::SemiCondensed,
        p if p <= 106.25 => Stretch::Normal,
        p if p <= 118.75 => Stretch::SemiExpanded,
        p if p <= 137.5 => Stretch::Expanded,
        p if p <= 175.0 => Stretch::ExtraExpanded,
        _ => Stretch::UltraExpanded,
    }
}

fn align_for(align: TextAlign, direction: Direction) -> Align {
    match align {
        TextAlign::Center => Align::Center,
        TextAlign::Justify => Align::Justified,
        other => match other.resolve(direction) {
            TextAlign::Right => Align::Right,
            _ => Align::Left,
        },
    }
}

/// 字节偏移 -> (行号, 行内字节偏移)，按 `\n` 分行。
fn line_and_index_from_byte(text: &str, byte: usize) -> (usize, usize) {
    let before = &text[..byte.min(text.len())];
    match before.rfind('\n') {
        Some(nl) => (before.matches('\n').count(), byte - nl - 1),
        None => (0, byte),
    }
}

/// 找到包含标记首字形的 run，并给出该字形的起点 x。
fn find_marker_run<'a>(buffer: &'a Buffer, line: usize, index: usize) -> Option<(LayoutRun<'a>, f32)> {
    let mut line_end: Option<(LayoutRun<'a>, f32)> = None;
    for run in buffer.layout_runs() {
        if run.line_i != line {
            continue;
        }
        for glyph in run.glyphs.iter() {
            if index >= glyph.start && index < glyph.end {
                let span = (glyph.end - glyph.start).max(1) as f32;
                let offset = glyph.w * ((index - glyph.start) as f32 / span);
                let x = if glyph.level.is_rtl() {
                    glyph.x + glyph.w - offset
                } else {
                    glyph.x + offset
                };
                return Some((run, x));
            }
        }
        // 标记是换行符时落在行尾
        if let Some(last) = run.glyphs.last() {
            if index == last.end {
                let x = if last.level.is_rtl() { last.x } else { last.x + last.w };
                line_end = Some((run, x));
            }
        }
    }
    line_end
}

fn is_first_run_of_line(buffer: &Buffer, target: &LayoutRun<'_>) -> bool {
    buffer
        .layout_runs()
        .find(|run| run.line_i == target.line_i)
        .is_some_and(|run| run.line_top == target.line_top)
}

fn fallback_line_top(buffer: &Buffer, target_line: usize) -> Option<f32> {
    let mut last_before = None;
    for run in buffer.layout_runs() {
        if run.line_i == target_line {
            return Some(run.line_top);
        }
        if run.line_i < target_line {
            last_before = Some((run.line_i, run.line_top, run.line_height));
        }
    }
    let (line_i, line_top, line_height) = last_before?;
    Some(line_top + line_height * target_line.saturating_sub(line_i) as f32)
}

/// cosmic-text 不处理 letter/word spacing，这里按标记之前同一 run 内的字符数补上。
///
/// `line_text` 是整条逻辑行；软换行后的 run 从 `run_start` 开始计数。
fn spacing_before(style: &ControlStyle, line_text: &str, run_start: usize, index: usize) -> f32 {
    if style.letter_spacing == 0.0 && style.word_spacing == 0.0 {
        return 0.0;
    }
    let end = index.min(line_text.len());
    let before = line_text.get(run_start.min(end)..end).unwrap_or("");
    let chars = before.chars().count() as f32;
    let spaces = before.chars().filter(|c| *c == ' ').count() as f32;
    chars * style.letter_spacing + spaces * style.word_spacing
}

#[cfg(test)]
mod tests {
    use super::*;
    use mention_core::caret::Edges;

    fn style() -> ControlStyle {
        ControlStyle {
            width: 300.0,
            height: 200.0,
            border: Edges::uniform(1.0),
            padding: Edges::uniform(4.0),
            font_size: 14.0,
            line_height: Some(20.0),
            ..ControlStyle::default()
        }
    }

    #[test]
    fn splits_lines_on_newline() {
        assert_eq!(line_and_index_from_byte("ab\ncd", 4), (1, 1));
        assert_eq!(line_and_index_from_byte("ab\ncd", 3), (1, 0));
        assert_eq!(line_and_index_from_byte("ab\ncd", 2), (0, 2));
        assert_eq!(line_and_index_from_byte("abc", 3), (0, 3));
    }

    #[test]
    fn stretch_buckets_follow_css_keywords() {
        assert_eq!(stretch_for(100.0), Stretch::Normal);
        assert_eq!(stretch_for(50.0), Stretch::UltraCondensed);
        assert_eq!(stretch_for(125.0), Stretch::Expanded);
        assert_eq!(stretch_for(200.0), Stretch::UltraExpanded);
    }

    #[test]
    fn spacing_counts_chars_and_spaces() {
        let s = ControlStyle {
            letter_spacing: 1.0,
            word_spacing: 3.0,
            ..style()
        };
        assert_eq!(spacing_before(&s, "a b c", 0, 4), 4.0 + 6.0);
        assert_eq!(spacing_before(&style(), "a b c", 0, 4), 0.0);
    }

    #[test]
    fn spacing_on_wrapped_run_counts_from_run_start() {
        let s = ControlStyle {
            letter_spacing: 1.0,
            word_spacing: 3.0,
            ..style()
        };
        // 第二个视觉行从字节 6 (`world`) 开始
        assert_eq!(spacing_before(&s, "hello world", 6, 8), 2.0);
        assert_eq!(spacing_before(&s, "hello world", 6, 6), 0.0);
    }

    #[test]
    fn caret_at_start_sits_on_content_origin() {
        let locator = MirrorLocator::new();
        let c = locator.locate_in_style(&style(), "", 0, '.');
        assert!((c.left - 5.0).abs() < 0.5);
        assert_eq!(c.top, 5.0);
        assert_eq!(c.height, 20.0);
    }

    #[test]
    fn caret_after_newline_moves_one_line_down() {
        let locator = MirrorLocator::new();
        let c = locator.locate_in_style(&style(), "ab\ncd", 3, '.');
        assert_eq!(c.top, 5.0 + 20.0);
        assert!((c.left - 5.0).abs() < 0.5);
    }

    #[test]
    fn caret_moves_right_as_text_grows() {
        let locator = MirrorLocator::new();
        if !locator.has_fonts() {
            return;
        }
        let short = locator.locate_in_style(&style(), "hello @a", 2, '.');
        let long = locator.locate_in_style(&style(), "hello @a", 8, '.');
        assert!(long.left > short.left);
        assert_eq!(long.top, short.top);
    }
}
