//! `mention_core`：提及（mention）自动补全的纯逻辑层，不做任何 I/O。
//!
//! 设计目标：
//! - **核心可复用**：终端、GUI、网页宿主都能复用同一套状态机
//! - **分层清晰**：trigger（识别） -> resolver（查候选） -> filter（后处理） -> controller（状态机/渲染/提交）
//! - **协作者可插拔**：控件、菜单容器、resolver、formatter、行渲染器、caret locator 都由宿主提供
pub mod caret;
pub mod config;
pub mod context;
pub mod controller;
pub mod filter;
pub mod host;
pub mod key_event;
pub mod model;
pub mod processor;
pub mod resolver;
pub mod text;
pub mod trigger;
