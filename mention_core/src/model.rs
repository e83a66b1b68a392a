/// 候选项（可被菜单展示与用户选择）。
///
/// 宿主自行定义候选的具体形状；core 只需要：
/// - `key`：用于前缀过滤的标识串（例如用户名）
/// - `label`：菜单展示文本，默认等于 `key`
/// - `weight`：排序权重（越大越靠前），默认 0
pub trait Candidate {
    fn key(&self) -> &str;

    fn label(&self) -> &str {
        self.key()
    }

    fn weight(&self) -> i32 {
        0
    }
}

/// 成员（最常见的提及对象）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// 用户名（提交文本的主体）
    pub handle: String,
    /// 展示名（可选）
    pub display_name: Option<String>,
    /// 权重，由目录文件决定
    pub weight: i32,
}

impl Member {
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            display_name: None,
            weight: 0,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }
}

impl Candidate for Member {
    fn key(&self) -> &str {
        &self.handle
    }

    fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.handle)
    }

    fn weight(&self) -> i32 {
        self.weight
    }
}

impl Candidate for String {
    fn key(&self) -> &str {
        self
    }
}

/// 视口（页面）坐标系下的矩形。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// 滚动偏移。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollOffset {
    pub x: f32,
    pub y: f32,
}

/// caret 在控件内的像素坐标（相对控件 border box 左上角）及所在行高。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CaretCoordinates {
    pub left: f32,
    pub top: f32,
    pub height: f32,
}

/// 菜单锚点（页面坐标）。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MenuPosition {
    pub left: f32,
    pub top: f32,
}

/// 菜单打开期间的整体状态：trigger/active/position 一起创建、一起销毁。
#[derive(Debug, Clone, PartialEq)]
pub struct OpenMenu<C> {
    /// 触发符（提交时原样交给 formatter）
    pub trigger: char,
    /// 触发符所在字符偏移
    pub trigger_index: usize,
    /// 当前查询串
    pub query: String,
    /// 高亮项下标，钳制在 `[0, len-1]`
    pub active: usize,
    /// 候选列表；每次解析成功后整体替换
    pub candidates: Vec<C>,
    /// 菜单锚点
    pub position: MenuPosition,
}

impl<C> OpenMenu<C> {
    pub fn active_candidate(&self) -> Option<&C> {
        self.candidates.get(self.active)
    }

    /// 把 `active` 钳制回合法范围（列表为空时为 0）。
    pub fn clamp_active(&mut self) {
        self.active = self.active.min(self.candidates.len().saturating_sub(1));
    }
}

/// 菜单状态机：CLOSED / OPEN。
#[derive(Debug, Clone, PartialEq)]
pub enum MenuState<C> {
    Closed,
    Open(OpenMenu<C>),
}

impl<C> Default for MenuState<C> {
    fn default() -> Self {
        MenuState::Closed
    }
}

impl<C> MenuState<C> {
    pub fn is_open(&self) -> bool {
        matches!(self, MenuState::Open(_))
    }

    pub fn as_open(&self) -> Option<&OpenMenu<C>> {
        match self {
            MenuState::Open(menu) => Some(menu),
            MenuState::Closed => None,
        }
    }

    pub fn as_open_mut(&mut self) -> Option<&mut OpenMenu<C>> {
        match self {
            MenuState::Open(menu) => Some(menu),
            MenuState::Closed => None,
        }
    }
}
