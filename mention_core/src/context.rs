//! `Context`：控制器的唯一状态容器。
//!
//! 约定：
//! - `menu`：CLOSED / OPEN 状态机；trigger/active/position 随 OPEN 一起创建、一起销毁
//! - `generation`：单调递增的请求代数，每个输入事件加一；
//!   解析完成时只接受与当前代数相同、且菜单仍打开的结果（以“被取代”代替真正的取消）
use crate::{
    model::{MenuPosition, MenuState, OpenMenu},
    trigger::TriggerMatch,
};

#[derive(Debug, Clone)]
pub struct Context<C> {
    pub menu: MenuState<C>,
    pub generation: u64,
}

impl<C> Default for Context<C> {
    fn default() -> Self {
        Self {
            menu: MenuState::Closed,
            generation: 0,
        }
    }
}

impl<C> Context<C> {
    /// 开始一次新的请求，之前所有在途的解析都随之过期。
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// 结果是否仍然有效：代数一致且菜单打开。
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation && self.menu.is_open()
    }

    /// 关闭菜单；返回之前是否处于打开状态。
    pub fn close(&mut self) -> bool {
        let was_open = self.menu.is_open();
        self.menu = MenuState::Closed;
        was_open
    }

    /// 打开（或刷新）菜单：active 归零，位置与 trigger 更新。
    ///
    /// 同一个 trigger 上继续输入时保留旧候选，直到新结果到达再整体替换；
    /// trigger 位置变了则旧候选属于另一个提及，直接丢弃。
    pub fn open(&mut self, trigger: char, found: TriggerMatch, position: MenuPosition) {
        let candidates = match std::mem::replace(&mut self.menu, MenuState::Closed) {
            MenuState::Open(prev) if prev.trigger_index == found.index => prev.candidates,
            _ => Vec::new(),
        };
        self.menu = MenuState::Open(OpenMenu {
            trigger,
            trigger_index: found.index,
            query: found.query,
            active: 0,
            candidates,
            position,
        });
    }

    /// 整体替换候选并钳制 active；菜单关闭时不做任何事。
    pub fn replace_candidates(&mut self, candidates: Vec<C>) {
        if let Some(menu) = self.menu.as_open_mut() {
            menu.candidates = candidates;
            menu.clamp_active();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(index: usize, query: &str) -> TriggerMatch {
        TriggerMatch {
            index,
            query: query.to_string(),
        }
    }

    #[test]
    fn generation_supersedes_earlier_requests() {
        let mut ctx: Context<u8> = Context::default();
        let first = ctx.next_generation();
        ctx.open('@', found(0, ""), MenuPosition::default());
        let second = ctx.next_generation();
        assert!(!ctx.is_current(first));
        assert!(ctx.is_current(second));
        ctx.close();
        assert!(!ctx.is_current(second));
    }

    #[test]
    fn reopening_elsewhere_drops_old_candidates() {
        let mut ctx: Context<u8> = Context::default();
        ctx.open('@', found(0, "a"), MenuPosition::default());
        ctx.replace_candidates(vec![1, 2, 3]);
        ctx.menu.as_open_mut().unwrap().active = 2;

        ctx.open('@', found(0, "ab"), MenuPosition::default());
        let menu = ctx.menu.as_open().unwrap();
        assert_eq!(menu.candidates, [1, 2, 3]);
        assert_eq!(menu.active, 0);

        ctx.open('@', found(5, ""), MenuPosition::default());
        assert!(ctx.menu.as_open().unwrap().candidates.is_empty());
    }

    #[test]
    fn replace_clamps_active_and_ignores_closed() {
        let mut ctx: Context<u8> = Context::default();
        ctx.replace_candidates(vec![1]);
        assert!(!ctx.menu.is_open());

        ctx.open('@', found(0, ""), MenuPosition::default());
        ctx.replace_candidates(vec![1, 2, 3]);
        ctx.menu.as_open_mut().unwrap().active = 2;
        ctx.replace_candidates(vec![9]);
        assert_eq!(ctx.menu.as_open().unwrap().active, 0);
    }
}
