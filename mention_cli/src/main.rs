use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context as _, Result};
use clap::Parser;
use futures::executor::block_on;
use mention_core::{
    caret::MonospaceLocator,
    config::MentionConfig,
    controller::MentionController,
    host::{MemoryControl, MenuContainer, TextControl, default_formatter},
    key_event::{Key, KeyOutcome},
    model::{Candidate, Member, MenuPosition},
};
use mention_dict::MemberDirectory;
use mention_layout::MirrorLocator;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

type Controller = MentionController<Member, MemoryControl, TerminalMenu>;

/// 终端里的提及补全演示：输入一行文本，`@` 之后的内容会触发成员补全。
#[derive(Debug, Parser)]
#[command(name = "mention_cli", version)]
struct Args {
    /// 成员目录（TSV：handle<TAB>display name<TAB>weight）
    #[arg(long)]
    users: Option<PathBuf>,
    /// 控制器配置（TOML）
    #[arg(long)]
    config: Option<PathBuf>,
    /// 触发符，覆盖配置文件
    #[arg(long)]
    trigger: Option<char>,
    /// 候选数量上限，覆盖配置文件；0 表示不限
    #[arg(long)]
    limit: Option<usize>,
    /// 用系统字体排版定位 caret（默认按等宽网格估算）
    #[arg(long)]
    glyph: bool,
}

/// 把菜单“画”在终端里：只记录行与位置，由 REPL 在每条命令之后打印。
#[derive(Debug, Default)]
struct TerminalMenu {
    rows: Vec<String>,
    position: Option<MenuPosition>,
    visible: bool,
}

impl MenuContainer for TerminalMenu {
    type Row = String;

    fn clear(&mut self) {
        self.rows.clear();
    }

    fn append(&mut self, row: String) {
        self.rows.push(row);
    }

    fn set_position(&mut self, position: MenuPosition) {
        self.position = Some(position);
    }

    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let users_path = args.users.clone().unwrap_or_else(default_users_path);
    let directory = MemberDirectory::from_path(&users_path)
        .with_context(|| format!("loading member directory {}", users_path.display()))?;
    let config = load_config(&args)?;
    info!(users = directory.len(), trigger = %config.trigger, "mention demo starting");

    let controller = MentionController::new(
        MemoryControl::new(),
        TerminalMenu::default(),
        directory,
        default_formatter::<Member>,
        render_row,
    );
    let controller = if args.glyph {
        controller.with_locator(MirrorLocator::new())
    } else {
        controller.with_locator(MonospaceLocator::default())
    };
    let mut controller = controller.with_config(config)?;

    repl(&mut controller, &users_path)
}

fn default_users_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("asset").join("users.tsv")
}

fn load_config(args: &Args) -> Result<MentionConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let s = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            MentionConfig::from_toml_str(&s)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => MentionConfig::default(),
    };
    if let Some(trigger) = args.trigger {
        config.trigger = trigger;
    }
    if let Some(limit) = args.limit {
        config.candidate_limit = (limit > 0).then_some(limit);
    }
    config.validate()?;
    Ok(config)
}

fn render_row(member: &Member, index: usize, active: bool) -> String {
    let marker = if active { '>' } else { ' ' };
    match &member.display_name {
        Some(name) => format!("{marker} {index}. {} ({name})", member.key()),
        None => format!("{marker} {index}. {}", member.key()),
    }
}

fn repl(controller: &mut Controller, users_path: &PathBuf) -> Result<()> {
    let mut out = io::stdout();
    let mut line = String::new();
    writeln!(out, "mention demo | users: {}", users_path.display())?;
    writeln!(
        out,
        "输入一行文本（`|` 标记 caret，缺省在末尾）；命令：:down :up :enter :tab :esc :click N :show :q"
    )?;
    out.flush()?;

    loop {
        line.clear();
        print!("text>");
        out.flush()?;
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim_end_matches(['\r', '\n']);
        if input.is_empty() {
            continue;
        }

        match input {
            ":q" | ":quit" | ":exit" => break,
            ":show" => {}
            ":down" => press(&mut out, controller, Key::ArrowDown)?,
            ":up" => press(&mut out, controller, Key::ArrowUp)?,
            ":enter" => press(&mut out, controller, Key::Enter)?,
            ":tab" => press(&mut out, controller, Key::Tab)?,
            ":esc" => press(&mut out, controller, Key::Escape)?,
            cmd if cmd.starts_with(":click") => {
                let Some(index) = cmd[":click".len()..].trim().parse::<usize>().ok() else {
                    writeln!(out, "用法：:click N")?;
                    continue;
                };
                match controller.commit(index) {
                    Some(commit) => writeln!(out, "commit: {}", commit.replacement.trim_end())?,
                    None => writeln!(out, "(没有第 {index} 项)")?,
                }
            }
            cmd if cmd.starts_with(':') => {
                writeln!(out, "未知命令：{cmd}")?;
                continue;
            }
            text => {
                let (value, caret) = split_caret_marker(text);
                let control = controller.control_mut();
                control.set_text(&value);
                if let Some(caret) = caret {
                    control.set_caret(caret);
                }
                block_on(controller.input());
            }
        }
        show(&mut out, controller)?;
    }

    Ok(())
}

fn press(out: &mut impl Write, controller: &mut Controller, key: Key) -> io::Result<()> {
    if controller.handle_key(&key) == KeyOutcome::Ignored {
        writeln!(out, "({key:?} 未被拦截)")?;
    }
    Ok(())
}

fn show(out: &mut impl Write, controller: &Controller) -> io::Result<()> {
    let control = controller.control();
    let caret = control.selection_start();
    let (before, after) = mention_core::text::split_at_char(control.value(), caret);
    writeln!(out, "value: {before}|{after}  (caret {caret})")?;

    let menu = controller.menu();
    if !menu.visible {
        writeln!(out, "menu: hidden")?;
        return Ok(());
    }
    match menu.position {
        Some(p) => writeln!(out, "menu @ ({:.1}, {:.1})", p.left, p.top)?,
        None => writeln!(out, "menu")?,
    }
    for row in &menu.rows {
        writeln!(out, "  {row}")?;
    }
    Ok(())
}

/// 去掉第一个 `|`，返回其字符偏移作为 caret。
fn split_caret_marker(text: &str) -> (String, Option<usize>) {
    match text.find('|') {
        Some(byte) => {
            let caret = text[..byte].chars().count();
            let mut value = text.to_string();
            value.remove(byte);
            (value, Some(caret))
        }
        None => (text.to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caret_marker_is_stripped() {
        assert_eq!(split_caret_marker("hi @a| there"), ("hi @a there".to_string(), Some(5)));
        assert_eq!(split_caret_marker("é|x"), ("éx".to_string(), Some(1)));
        assert_eq!(split_caret_marker("plain"), ("plain".to_string(), None));
    }

    #[test]
    fn flags_override_config() {
        let args = Args::parse_from(["mention_cli", "--trigger", "#", "--limit", "0"]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.trigger, '#');
        assert_eq!(config.candidate_limit, None);

        let args = Args::parse_from(["mention_cli", "--limit", "3"]);
        assert_eq!(load_config(&args).unwrap().candidate_limit, Some(3));
    }

    #[test]
    fn rows_show_active_marker_and_display_name() {
        let m = Member::new("bb2").with_display_name("Bob");
        assert_eq!(render_row(&m, 1, true), "> 1. bb2 (Bob)");
        assert_eq!(render_row(&Member::new("cc1"), 0, false), "  0. cc1");
    }

    #[test]
    fn demo_asset_loads() {
        let dir = MemberDirectory::from_path(default_users_path()).unwrap();
        assert_eq!(dir.len(), 15);
    }
}
