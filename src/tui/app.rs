use crate::grading::{FormField, GradeInput};
use crate::image_resolver::Resolution;
use crate::models::{Record, SessionPhase};
use crate::session::Session;
use crate::tui::input::UserAction;

/// 状态栏消息类型
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

/// 一帧界面所需的会话数据
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    AllLabeled {
        total: usize,
    },
    // 没有可评分的记录，但上一次保存没有写入存储
    PendingWrite {
        labeled: usize,
        total: usize,
    },
    Grading {
        record: Record,
        image: Resolution,
        position: usize,
        labeled: usize,
        total: usize,
        revisiting: bool,
        unsynced: bool,
        saving: bool,
    },
}

/// TUI应用主结构
pub struct App {
    pub session: Session,
    pub form: GradeInput,             // 当前表单输入
    pub focus: FormField,             // 当前聚焦的字段
    pub form_position: Option<usize>, // 表单初值对应的记录位置，用于判断是否需要重新填充
    pub status: Option<StatusMessage>,
    pub should_quit: bool,
    pub show_help_bar: bool,
}

impl App {
    pub fn new(session: Session, show_help_bar: bool) -> Self {
        let mut app = Self {
            session,
            form: GradeInput::default(),
            focus: FormField::Type,
            form_position: None,
            status: None,
            should_quit: false,
            show_help_bar,
        };
        // 初始化表单内容
        app.sync_form();
        app
    }

    /// 处理退出操作
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// 当前记录发生变化时，用记录的值重新填充表单
    pub fn sync_form(&mut self) {
        let position = self.session.current_position();
        if position == self.form_position {
            return;
        }
        self.form_position = position;
        self.focus = FormField::Type;
        self.form = match self.session.current_record() {
            Some(record) => GradeInput::from_record(record),
            None => GradeInput::default(),
        };
    }

    /// 生成当前帧的数据快照
    pub fn screen(&mut self) -> Screen {
        let saving = *self.session.phase() == SessionPhase::Saving;
        let (labeled, total) = self.session.progress();
        let Some(position) = self.session.current_position() else {
            if self.session.has_unsynced_changes() {
                return Screen::PendingWrite { labeled, total };
            }
            return Screen::AllLabeled { total };
        };
        let record = self.session.dataset().records[position].clone();
        let image = self
            .session
            .current_image()
            .unwrap_or_else(|| Resolution::NotFound { path: self.session.image_root() });

        Screen::Grading {
            record,
            image,
            position,
            labeled,
            total,
            revisiting: self.session.is_revisiting(),
            unsynced: self.session.has_unsynced_changes(),
            saving,
        }
    }

    /// 当前记录的图像存在时才允许编辑
    pub fn can_edit(&mut self) -> bool {
        matches!(self.session.current_image(), Some(Resolution::Found(_)))
    }

    /// 可编辑的记录，或者有待重试的写入
    pub fn can_save(&mut self) -> bool {
        self.can_edit() || self.session.has_pending_write()
    }

    /// 处理除保存之外的用户操作（保存需要控制器先绘制一帧）
    pub fn handle_action(&mut self, action: UserAction) {
        if self.session.phase().is_terminal() {
            if action == UserAction::Quit {
                self.quit();
            }
            return;
        }

        match action {
            UserAction::Quit => self.quit(),
            UserAction::FocusUp => self.focus = self.focus.previous(),
            UserAction::FocusDown => self.focus = self.focus.next(),
            UserAction::Increase
            | UserAction::Decrease
            | UserAction::Digit(_)
            | UserAction::DeleteDigit => {
                if self.can_edit() {
                    self.edit(action);
                }
            }
            UserAction::Previous => {
                self.session.previous();
                self.status = None;
            }
            UserAction::Next => {
                self.session.next();
                self.status = None;
            }
            UserAction::Reload => self.reload(),
            UserAction::Save => {
                if self.begin_save() {
                    self.save();
                }
            }
            UserAction::None => {}
        }
        self.sync_form();
    }

    fn edit(&mut self, action: UserAction) {
        match action {
            UserAction::Increase => self.form.increment(self.focus),
            UserAction::Decrease => self.form.decrement(self.focus),
            UserAction::Digit(d) => self.form.push_digit(self.focus, u32::from(d)),
            UserAction::DeleteDigit => self.form.pop_digit(self.focus),
            _ => {}
        }
    }

    /// 检查是否可以保存并进入Saving状态；不可保存时设置错误消息
    pub fn begin_save(&mut self) -> bool {
        if self.session.phase().is_terminal() {
            return false;
        }
        if !self.can_save() {
            let name = self
                .session
                .current_record()
                .map(|r| r.image_name.clone())
                .unwrap_or_default();
            self.set_status(
                StatusKind::Error,
                format!("Image {} not found, saving is unavailable", name),
            );
            return false;
        }
        self.session.begin_save();
        self.set_status(StatusKind::Info, "Saving...".to_string());
        true
    }

    /// 执行保存（阻塞直到写入完成或失败）
    pub fn save(&mut self) {
        let name = self
            .session
            .current_record()
            .map(|r| r.image_name.clone())
            .unwrap_or_default();
        match self.session.save_current(self.form) {
            Ok(()) if name.is_empty() => self.set_status(
                StatusKind::Success,
                "Pending changes pushed to the store".to_string(),
            ),
            Ok(()) => self.set_status(
                StatusKind::Success,
                format!("Changes saved for Image {} and pushed to the store", name),
            ),
            Err(e) => self.set_status(
                StatusKind::Error,
                format!("Failed to save changes: {}", e),
            ),
        }
        self.sync_form();
    }

    fn reload(&mut self) {
        match self.session.reload() {
            Ok(()) => {
                self.form_position = None;
                self.set_status(StatusKind::Info, "Reloaded metadata from the store".to_string());
            }
            Err(e) => self.set_status(StatusKind::Error, format!("Reload failed: {}", e)),
        }
    }

    fn set_status(&mut self, kind: StatusKind, text: String) {
        self.status = Some(StatusMessage { kind, text });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_resolver::ImageResolver;
    use crate::models::PneumothoraxType;
    use crate::store::MetadataStore;
    use crate::store::memory::MemoryStore;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn create_test_app(table: &str, images: &[&str]) -> (MemoryStore, TempDir, App) {
        let image_dir = tempdir().unwrap();
        for name in images {
            fs::write(image_dir.path().join(name), b"x").unwrap();
        }
        let remote = MemoryStore::new(table);
        let store = MetadataStore::new(Box::new(remote.clone()), "GT.csv", "grade");
        let session = Session::open(store, ImageResolver::new(image_dir.path())).unwrap();
        (remote, image_dir, App::new(session, true))
    }

    const TABLE: &str = "\
Index,Image_Name,Label_Flag,Pneumothorax_Type,A,B,C,Pneumothorax_Percentage
0,a.png,1,Tension,5,5,5,74.7
1,b.png,0,Simple,0,0,0,
2,c.png,0,Tension,7,0,0,
";

    #[test]
    fn test_app_quit() {
        let (_remote, _dir, mut app) = create_test_app(TABLE, &["a.png", "b.png", "c.png"]);
        assert!(!app.should_quit);
        app.handle_action(UserAction::Quit);
        assert!(app.should_quit);
    }

    #[test]
    fn test_form_seeded_from_current_record() {
        let (_remote, _dir, mut app) = create_test_app(TABLE, &["a.png", "b.png", "c.png"]);
        assert_eq!(app.form_position, Some(1));
        assert_eq!(app.form, GradeInput::default());

        app.handle_action(UserAction::Next);
        assert_eq!(app.form_position, Some(2));
        assert_eq!(app.form.pneumothorax_type, PneumothoraxType::Tension);
        assert_eq!(app.form.a, 7);
    }

    #[test]
    fn test_editing_and_saving() {
        let (remote, _dir, mut app) = create_test_app(TABLE, &["a.png", "b.png", "c.png"]);
        app.handle_action(UserAction::Increase); // Type -> Tension
        app.handle_action(UserAction::FocusDown);
        app.handle_action(UserAction::Digit(1));
        app.handle_action(UserAction::Digit(2));
        app.handle_action(UserAction::FocusDown);
        app.handle_action(UserAction::Increase);
        assert_eq!((app.form.a, app.form.b, app.form.c), (12, 1, 0));

        app.handle_action(UserAction::Save);
        assert_eq!(app.status.as_ref().map(|s| s.kind), Some(StatusKind::Success));
        assert_eq!(remote.commit_messages().len(), 1);

        let saved = &app.session.dataset().records[1];
        assert!(saved.label_flag);
        assert_eq!(saved.pneumothorax_type, PneumothoraxType::Tension);
        assert_eq!(saved.measurement_a, 12);
        // 表单移动到下一条记录
        assert_eq!(app.form_position, Some(2));
    }

    #[test]
    fn test_save_blocked_without_image() {
        let (remote, _dir, mut app) = create_test_app(TABLE, &["a.png", "c.png"]);
        assert!(!app.can_save());
        assert!(matches!(
            app.screen(),
            Screen::Grading { image: Resolution::NotFound { .. }, .. }
        ));

        app.handle_action(UserAction::Save);
        assert_eq!(app.status.as_ref().map(|s| s.kind), Some(StatusKind::Error));
        assert!(remote.commit_messages().is_empty());
        assert_eq!(*app.session.phase(), SessionPhase::Ready);
    }

    #[test]
    fn test_missing_image_ignores_edits() {
        let (_remote, _dir, mut app) = create_test_app(TABLE, &["a.png", "c.png"]);
        assert!(!app.can_edit());
        app.handle_action(UserAction::Increase);
        app.handle_action(UserAction::FocusDown);
        app.handle_action(UserAction::Digit(9));
        assert_eq!(app.form, GradeInput::default());

        // 导航仍然可用
        app.handle_action(UserAction::Next);
        assert_eq!(app.form_position, Some(2));
        assert!(app.can_edit());
    }

    #[test]
    fn test_pending_write_screen_and_retry() {
        let table = "\
Index,Image_Name,Label_Flag
0,a.png,0
1,b.png,0
2,c.png,1
";
        let (remote, _dir, mut app) = create_test_app(table, &["a.png", "b.png", "c.png"]);
        remote.fail_next_write("offline");
        app.handle_action(UserAction::Save);
        assert_eq!(app.status.as_ref().map(|s| s.kind), Some(StatusKind::Error));

        app.handle_action(UserAction::Next);
        app.handle_action(UserAction::Next);
        assert_eq!(app.screen(), Screen::PendingWrite { labeled: 2, total: 3 });
        assert!(app.can_save());

        app.handle_action(UserAction::Save);
        let status = app.status.clone().unwrap();
        assert_eq!(status.kind, StatusKind::Success);
        assert_eq!(status.text, "Pending changes pushed to the store");
        assert_eq!(app.screen(), Screen::AllLabeled { total: 3 });
        assert_eq!(remote.commit_messages().len(), 1);
    }

    #[test]
    fn test_failed_save_reports_error() {
        let (remote, _dir, mut app) = create_test_app(TABLE, &["a.png", "b.png", "c.png"]);
        remote.fail_next_write("offline");
        app.handle_action(UserAction::Save);

        let status = app.status.clone().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert!(status.text.contains("offline"));
        assert!(matches!(app.session.phase(), SessionPhase::SaveFailed(_)));
        // 仍停留在同一条记录
        assert_eq!(app.form_position, Some(1));
    }

    #[test]
    fn test_all_labeled_screen() {
        let table = "Index,Image_Name,Label_Flag\n0,a.png,1\n";
        let (_remote, _dir, mut app) = create_test_app(table, &["a.png"]);
        assert_eq!(app.screen(), Screen::AllLabeled { total: 1 });

        // 终态下只响应退出
        app.handle_action(UserAction::Previous);
        assert_eq!(app.screen(), Screen::AllLabeled { total: 1 });
        app.handle_action(UserAction::Quit);
        assert!(app.should_quit);
    }

    #[test]
    fn test_previous_shows_labeled_record() {
        let (_remote, _dir, mut app) = create_test_app(TABLE, &["a.png", "b.png", "c.png"]);
        app.handle_action(UserAction::Previous);
        match app.screen() {
            Screen::Grading { record, revisiting, .. } => {
                assert_eq!(record.index, 0);
                assert!(revisiting);
            }
            other => panic!("unexpected screen {:?}", other),
        }
        assert_eq!(app.form.a, 5);
    }
}
