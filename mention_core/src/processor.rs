//! `processor`：菜单打开期间的按键处理链。
//!
//! 与输入法的 processor 概念一致：按顺序处理 `Key`，修改菜单状态，
//! 并可产生 `MenuAction`（重绘 / 提交 / 关闭）交给控制器执行。
//!
//! 默认链路（`MentionController::new` 组装）：
//! - `NavigationProcessor`：ArrowUp/ArrowDown 移动高亮，钳制在列表范围内
//! - `CommitProcessor`：Enter/Tab 提交高亮候选
//! - `DismissProcessor`：Escape 关闭菜单

use crate::{key_event::Key, model::OpenMenu};

/// Processor 执行结果：是否“消费”了本次按键。
///
/// - `Consume`：已处理，后续 processor 不再执行，宿主需阻止默认行为
/// - `Continue`：不处理，交给下一个 processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Consume,
    Continue,
}

/// processor 请求控制器执行的动作。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// 菜单状态已变化，需要重绘
    Render,
    /// 提交第 n 个候选
    Commit(usize),
    /// 关闭菜单
    Close,
}

/// KeyProcessor：处理按键并改变菜单状态；必要时产生动作。
pub trait KeyProcessor<C> {
    fn process(&mut self, menu: &mut OpenMenu<C>, key: &Key) -> (ProcessStatus, Vec<MenuAction>);
}

/// 上下移动高亮。
pub struct NavigationProcessor;

impl<C> KeyProcessor<C> for NavigationProcessor {
    fn process(&mut self, menu: &mut OpenMenu<C>, key: &Key) -> (ProcessStatus, Vec<MenuAction>) {
        let last = menu.candidates.len().saturating_sub(1);
        match key {
            Key::ArrowDown => {
                menu.active = (menu.active + 1).min(last);
                (ProcessStatus::Consume, vec![MenuAction::Render])
            }
            Key::ArrowUp => {
                menu.active = menu.active.saturating_sub(1);
                (ProcessStatus::Consume, vec![MenuAction::Render])
            }
            _ => (ProcessStatus::Continue, Vec::new()),
        }
    }
}

/// Enter/Tab 提交高亮候选；没有候选时不拦截。
pub struct CommitProcessor;

impl<C> KeyProcessor<C> for CommitProcessor {
    fn process(&mut self, menu: &mut OpenMenu<C>, key: &Key) -> (ProcessStatus, Vec<MenuAction>) {
        match key {
            Key::Enter | Key::Tab if menu.active_candidate().is_some() => {
                (ProcessStatus::Consume, vec![MenuAction::Commit(menu.active)])
            }
            _ => (ProcessStatus::Continue, Vec::new()),
        }
    }
}

/// Escape 关闭菜单。
pub struct DismissProcessor;

impl<C> KeyProcessor<C> for DismissProcessor {
    fn process(&mut self, _menu: &mut OpenMenu<C>, key: &Key) -> (ProcessStatus, Vec<MenuAction>) {
        match key {
            Key::Escape => (ProcessStatus::Consume, vec![MenuAction::Close]),
            _ => (ProcessStatus::Continue, Vec::new()),
        }
    }
}

/// 默认 processors 链。
pub fn default_chain<C>() -> Vec<Box<dyn KeyProcessor<C>>> {
    vec![
        Box::new(NavigationProcessor),
        Box::new(CommitProcessor),
        Box::new(DismissProcessor),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MenuPosition;

    fn menu(n: usize) -> OpenMenu<u32> {
        OpenMenu {
            trigger: '@',
            trigger_index: 0,
            query: String::new(),
            active: 0,
            candidates: (0..n as u32).collect(),
            position: MenuPosition::default(),
        }
    }

    fn run(menu: &mut OpenMenu<u32>, key: Key) -> (ProcessStatus, Vec<MenuAction>) {
        let mut actions = Vec::new();
        for p in &mut default_chain::<u32>() {
            let (status, mut a) = p.process(menu, &key);
            actions.append(&mut a);
            if status == ProcessStatus::Consume {
                return (status, actions);
            }
        }
        (ProcessStatus::Continue, actions)
    }

    #[test]
    fn navigation_is_clamped_at_both_ends() {
        let mut m = menu(3);
        run(&mut m, Key::ArrowUp);
        assert_eq!(m.active, 0);
        for _ in 0..5 {
            run(&mut m, Key::ArrowDown);
        }
        assert_eq!(m.active, 2);
        run(&mut m, Key::ArrowUp);
        assert_eq!(m.active, 1);
    }

    #[test]
    fn navigation_on_empty_list_stays_at_zero() {
        let mut m = menu(0);
        let (status, _) = run(&mut m, Key::ArrowDown);
        assert_eq!(status, ProcessStatus::Consume);
        assert_eq!(m.active, 0);
    }

    #[test]
    fn enter_and_tab_commit_active() {
        let mut m = menu(3);
        m.active = 2;
        assert_eq!(run(&mut m, Key::Tab), (ProcessStatus::Consume, vec![MenuAction::Commit(2)]));
        assert_eq!(run(&mut m, Key::Enter).1, vec![MenuAction::Commit(2)]);
    }

    #[test]
    fn enter_without_candidates_passes_through() {
        let mut m = menu(0);
        assert_eq!(run(&mut m, Key::Enter).0, ProcessStatus::Continue);
    }

    #[test]
    fn other_keys_are_not_intercepted() {
        let mut m = menu(2);
        assert_eq!(run(&mut m, Key::Other("a".into())), (ProcessStatus::Continue, vec![]));
        assert_eq!(run(&mut m, Key::Escape).1, vec![MenuAction::Close]);
    }
}
