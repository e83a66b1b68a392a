//! `MentionController`：对宿主提供的提及控制器。
//!
//! 控制器自身不做 I/O，而是：
//! - 持有 `Context`（状态）与外部协作者（控件、菜单容器、resolver、formatter、行渲染器）
//! - 输入事件：识别触发符 -> 打开/关闭菜单 -> 返回待完成的解析请求
//! - 解析完成：按代数丢弃过期结果，否则整体替换候选并重绘
//! - 按键事件：依次交给 processors 链，直到被消费
//!
//! 每个入口都是一次完整的状态迁移，渲染器看不到中间状态。宿主应在控件
//! 完成本次输入的布局（含滚动）之后再调用 `handle_input`。

use std::fmt;

use tracing::{debug, trace, warn};

use crate::{
    caret::{CaretLocator, MonospaceLocator},
    config::{ConfigError, MentionConfig},
    context::Context,
    filter::{DedupByKey, Filter, RankByWeight, Truncate},
    host::{MenuContainer, ReplacementFormatter, RowRenderer, TextControl},
    key_event::{Commit, Key, KeyOutcome},
    model::{Candidate, MenuPosition, MenuState},
    processor::{KeyProcessor, MenuAction, ProcessStatus, default_chain},
    resolver::{ResolveError, ResolveFuture, Resolver},
    text::{byte_index_at_char, char_len},
    trigger::detect_trigger,
};

/// 已发出、尚未完成的解析请求。
///
/// 请求不会被中途取消；过期与否在 `MentionController::complete` 时按代数判断。
pub struct PendingResolution<C> {
    pub generation: u64,
    pub query: String,
    future: ResolveFuture<C>,
}

impl<C> PendingResolution<C> {
    /// 等待 resolver 完成。
    pub async fn resolve(self) -> Resolved<C> {
        let result = self.future.await;
        Resolved {
            generation: self.generation,
            query: self.query,
            result,
        }
    }
}

impl<C> fmt::Debug for PendingResolution<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingResolution")
            .field("generation", &self.generation)
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

/// 解析完成的结果，交回 `MentionController::complete`。
#[derive(Debug)]
pub struct Resolved<C> {
    pub generation: u64,
    pub query: String,
    pub result: Result<Vec<C>, ResolveError>,
}

/// 提及控制器（CLOSED / OPEN 状态机的容器）。
pub struct MentionController<C, T, M>
where
    M: MenuContainer,
{
    control: T,
    menu: M,
    resolver: Box<dyn Resolver<C>>,
    formatter: Box<dyn ReplacementFormatter<C>>,
    renderer: Box<dyn RowRenderer<C, M::Row>>,
    locator: Box<dyn CaretLocator<T>>,
    filters: Vec<Box<dyn Filter<C>>>,
    processors: Vec<Box<dyn KeyProcessor<C>>>,
    config: MentionConfig,
    ctx: Context<C>,
}

impl<C, T, M> MentionController<C, T, M>
where
    C: Candidate + 'static,
    T: TextControl,
    M: MenuContainer,
{
    /// 用五个外部协作者创建控制器，并组装默认 processors 链。
    ///
    /// caret 定位默认使用 `MonospaceLocator`，可用 `with_locator` 替换。
    pub fn new(
        control: T,
        menu: M,
        resolver: impl Resolver<C> + 'static,
        formatter: impl ReplacementFormatter<C> + 'static,
        renderer: impl RowRenderer<C, M::Row> + 'static,
    ) -> Self {
        Self {
            control,
            menu,
            resolver: Box::new(resolver),
            formatter: Box::new(formatter),
            renderer: Box::new(renderer),
            locator: Box::new(MonospaceLocator::default()),
            filters: Vec::new(),
            processors: default_chain(),
            config: MentionConfig::default(),
            ctx: Context::default(),
        }
    }

    pub fn with_locator(mut self, locator: impl CaretLocator<T> + 'static) -> Self {
        self.locator = Box::new(locator);
        self
    }

    /// 整体替换配置；先经过 `MentionConfig::validate`。
    pub fn with_config(mut self, config: MentionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// 设置触发符。不做校验：空白触发符永远不会命中（token 按空白切分），菜单始终关闭。
    pub fn trigger(mut self, trigger: char) -> Self {
        self.config.trigger = trigger;
        self
    }

    /// 设置候选数量上限；0 表示不限。
    pub fn candidate_limit(mut self, limit: usize) -> Self {
        self.config.candidate_limit = (limit > 0).then_some(limit);
        self
    }

    /// 追加一个自定义 filter（在去重/排序之后、截断之前执行）。
    pub fn with_filter(mut self, filter: impl Filter<C> + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// 在默认链之后追加一个按键 processor。
    pub fn with_processor(mut self, processor: impl KeyProcessor<C> + 'static) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    pub fn config(&self) -> &MentionConfig {
        &self.config
    }

    pub fn state(&self) -> &MenuState<C> {
        &self.ctx.menu
    }

    pub fn generation(&self) -> u64 {
        self.ctx.generation
    }

    pub fn control(&self) -> &T {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut T {
        &mut self.control
    }

    pub fn menu(&self) -> &M {
        &self.menu
    }

    /// 输入事件：重新识别触发状态。
    ///
    /// 命中触发符时打开（或刷新）菜单并返回解析请求；否则关闭菜单返回 `None`。
    /// 无论哪种情况，之前所有在途请求都会过期。
    pub fn handle_input(&mut self) -> Option<PendingResolution<C>> {
        let generation = self.ctx.next_generation();
        let caret = self.control.selection_start();
        let Some(found) = detect_trigger(self.control.value(), caret, self.config.trigger) else {
            self.close();
            return None;
        };

        let position = self.anchor_position(caret);
        let query = found.query.clone();
        debug!(
            generation,
            trigger_index = found.index,
            query = %query,
            left = position.left,
            top = position.top,
            "mention triggered"
        );
        self.ctx.open(self.config.trigger, found, position);
        self.render();

        Some(PendingResolution {
            generation,
            future: self.resolver.resolve(&query),
            query,
        })
    }

    /// 解析完成：过期或菜单已关闭则丢弃；失败或空结果关闭菜单。
    ///
    /// 返回结果是否被采纳。
    pub fn complete(&mut self, resolved: Resolved<C>) -> bool {
        if !self.ctx.is_current(resolved.generation) {
            trace!(
                generation = resolved.generation,
                current = self.ctx.generation,
                query = %resolved.query,
                "discarding stale resolution"
            );
            return false;
        }

        match resolved.result {
            Err(err) => {
                warn!(query = %resolved.query, error = %err, "resolver failed, closing menu");
                self.close();
            }
            Ok(candidates) => {
                let candidates = self.post_process(candidates);
                if candidates.is_empty() {
                    debug!(query = %resolved.query, "no candidates, closing menu");
                    self.close();
                } else {
                    debug!(query = %resolved.query, count = candidates.len(), "candidates resolved");
                    self.ctx.replace_candidates(candidates);
                    self.render();
                }
            }
        }
        true
    }

    /// 便捷入口：`handle_input` + 等待解析 + `complete`。
    pub async fn input(&mut self) -> bool {
        let Some(pending) = self.handle_input() else {
            return false;
        };
        let resolved = pending.resolve().await;
        self.complete(resolved)
    }

    /// 按键事件；只在菜单打开时交给 processors 链。
    ///
    /// 返回 `Handled` 时宿主必须阻止控件的默认行为。
    pub fn handle_key(&mut self, key: &Key) -> KeyOutcome {
        let Some(menu) = self.ctx.menu.as_open_mut() else {
            return KeyOutcome::Ignored;
        };

        let mut outcome = KeyOutcome::Ignored;
        let mut actions = Vec::new();
        for p in &mut self.processors {
            let (status, mut a) = p.process(menu, key);
            actions.append(&mut a);
            if status == ProcessStatus::Consume {
                outcome = KeyOutcome::Handled;
                break;
            }
        }

        for action in actions {
            match action {
                MenuAction::Render => self.render(),
                MenuAction::Commit(index) => {
                    self.commit(index);
                }
                MenuAction::Close => self.close(),
            }
        }
        outcome
    }

    /// 提交第 `index` 个候选（键盘提交与点击共用的唯一入口）。
    ///
    /// 文本拼接为 `text[..trigger_index] + replacement + text[caret..]`，
    /// caret 移到替换文本之后，关闭菜单并把焦点还给控件。
    pub fn commit(&mut self, index: usize) -> Option<Commit> {
        let menu = self.ctx.menu.as_open()?;
        let candidate = menu.candidates.get(index)?;
        let replacement = self.formatter.format(candidate, menu.trigger);

        let value = self.control.value();
        let caret = self.control.selection_start();
        // caret 被移到触发符之前时，按记录的查询串确定被替换区间的终点
        let end = if caret < menu.trigger_index {
            menu.trigger_index + 1 + char_len(&menu.query)
        } else {
            caret
        };
        let prefix = &value[..byte_index_at_char(value, menu.trigger_index)];
        let suffix = &value[byte_index_at_char(value, end)..];

        let mut next = String::with_capacity(prefix.len() + replacement.len() + suffix.len());
        next.push_str(prefix);
        next.push_str(&replacement);
        next.push_str(suffix);
        let new_caret = char_len(&next) - char_len(suffix);

        debug!(index, replacement = %replacement, caret = new_caret, "mention committed");
        self.control.set_value(next.clone());
        self.control.set_selection_range(new_caret, new_caret);
        self.close();
        self.control.focus();

        Some(Commit {
            replacement,
            value: next,
            caret: new_caret,
        })
    }

    /// 关闭菜单：清空候选、位置与 trigger，并隐藏容器。
    pub fn close(&mut self) {
        if self.ctx.close() {
            debug!(generation = self.ctx.generation, "menu closed");
        }
        self.render();
    }

    /// 把当前状态同步到菜单容器。
    ///
    /// OPEN 且有候选：清空、定位、逐行渲染、显示；
    /// OPEN 但首个结果未到、或 CLOSED：清空并隐藏。
    pub fn render(&mut self) {
        self.menu.clear();
        match self.ctx.menu.as_open() {
            Some(open) if !open.candidates.is_empty() => {
                self.menu.set_position(open.position);
                for (i, candidate) in open.candidates.iter().enumerate() {
                    let row = self.renderer.render(candidate, i, i == open.active);
                    self.menu.append(row);
                }
                self.menu.show();
            }
            _ => self.menu.hide(),
        }
    }

    /// 菜单锚点：caret 坐标 + 控件视口矩形 + 页面滚动 - 控件滚动，落在 caret 所在行下方。
    fn anchor_position(&self, caret: usize) -> MenuPosition {
        let coords = self.locator.locate(&self.control, caret, self.config.placeholder);
        let rect = self.control.bounding_rect();
        let page = self.control.page_scroll();
        let scroll = self.control.scroll_offset();
        MenuPosition {
            left: page.x + rect.left + coords.left - scroll.x,
            top: page.y + rect.top + coords.top + coords.height - scroll.y,
        }
    }

    fn post_process(&self, mut candidates: Vec<C>) -> Vec<C> {
        if self.config.dedup {
            candidates = DedupByKey.apply(candidates);
        }
        if self.config.rank_by_weight {
            candidates = RankByWeight.apply(candidates);
        }
        for f in &self.filters {
            candidates = f.apply(candidates);
        }
        if let Some(limit) = self.config.candidate_limit {
            candidates = Truncate { limit }.apply(candidates);
        }
        candidates
    }
}
