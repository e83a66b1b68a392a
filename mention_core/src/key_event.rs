/// 键盘事件（逻辑键）。
///
/// 说明：
/// - 控制器只关心“语义键”，不关心具体平台键值。
/// - 宿主（CLI/GUI）负责把系统按键转换成这些事件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// 下移高亮
    ArrowDown,
    /// 上移高亮
    ArrowUp,
    /// 提交高亮候选
    Enter,
    /// 与 Enter 相同
    Tab,
    /// 关闭菜单
    Escape,
    /// 其他键：不拦截，交给控件默认编辑行为
    Other(String),
}

impl Key {
    /// 按 DOM `KeyboardEvent.key` 的命名解析。
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowDown" | "Down" => Key::ArrowDown,
            "ArrowUp" | "Up" => Key::ArrowUp,
            "Enter" => Key::Enter,
            "Tab" => Key::Tab,
            "Escape" | "Esc" => Key::Escape,
            other => Key::Other(other.to_string()),
        }
    }
}

/// 按键处理结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// 控制器已处理；宿主必须阻止控件的默认行为（不插入换行/制表符，不切换焦点）
    Handled,
    /// 未拦截
    Ignored,
}

impl KeyOutcome {
    pub fn prevent_default(self) -> bool {
        self == KeyOutcome::Handled
    }
}

/// 一次提交（上屏）的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// formatter 产出的替换文本
    pub replacement: String,
    /// 提交后的完整控件文本
    pub value: String,
    /// 提交后的 caret（字符偏移），紧跟在替换文本之后
    pub caret: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dom_key_names() {
        assert_eq!(Key::from_name("ArrowDown"), Key::ArrowDown);
        assert_eq!(Key::from_name("Esc"), Key::Escape);
        assert_eq!(Key::from_name("a"), Key::Other("a".to_string()));
        assert!(KeyOutcome::Handled.prevent_default());
        assert!(!KeyOutcome::Ignored.prevent_default());
    }
}
