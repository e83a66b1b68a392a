use futures::executor::block_on;
use mention_core::{
    controller::MentionController,
    host::{MemoryControl, MenuContainer, TextControl, default_formatter},
    key_event::{Key, KeyOutcome},
    model::{Candidate, Member, MenuPosition},
};
use mention_dict::MemberDirectory;

#[derive(Debug, Default)]
struct Rows {
    rows: Vec<String>,
    visible: bool,
    position: Option<MenuPosition>,
}

impl MenuContainer for Rows {
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

fn row(m: &Member, index: usize, active: bool) -> String {
    format!("{}{index}:{}", if active { ">" } else { " " }, m.label())
}

fn controller(tsv: &str) -> MentionController<Member, MemoryControl, Rows> {
    let dir = MemberDirectory::from_tsv_str(tsv).unwrap();
    MentionController::new(
        MemoryControl::new(),
        Rows::default(),
        dir,
        default_formatter::<Member>,
        row,
    )
}

#[test]
fn hello_at_a_commits_first_match() {
    let mut c = controller("aaa\nbbb\n");
    c.control_mut().set_text("hello @a");
    assert!(block_on(c.input()));
    assert_eq!(c.menu().rows, [">0:aaa"]);
    assert!(c.menu().visible);
    assert!(c.menu().position.is_some());

    assert_eq!(c.handle_key(&Key::Enter), KeyOutcome::Handled);
    assert_eq!(c.control().value(), "hello @aaa ");
    assert_eq!(c.control().selection_start(), 11);
    assert!(!c.state().is_open());
    assert!(!c.menu().visible);
}

#[test]
fn demo_directory_navigates_and_clicks() {
    let tsv = include_str!("../../mention_cli/asset/users.tsv");
    let mut c = controller(tsv);
    c.control_mut().set_text("ping @aaa");
    assert!(block_on(c.input()));
    assert_eq!(c.menu().rows.len(), 4);

    c.handle_key(&Key::ArrowDown);
    c.handle_key(&Key::ArrowDown);
    assert_eq!(c.state().as_open().unwrap().active, 2);
    assert!(c.menu().rows[2].starts_with('>'));

    let commit = c.commit(1).unwrap();
    assert_eq!(commit.value, "ping @aaa2 ");
    assert_eq!(commit.caret, 11);
}

#[test]
fn narrowing_query_until_nothing_matches_closes() {
    let mut c = controller("cc1\nccccccc3\n");
    c.control_mut().set_text("@c");
    assert!(block_on(c.input()));
    assert_eq!(c.menu().rows.len(), 2);

    c.control_mut().type_text("x");
    assert!(block_on(c.input()));
    assert!(!c.state().is_open());
    assert!(!c.menu().visible);
}
