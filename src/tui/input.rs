use crate::models::KeybindingsConfig;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// 输入处理器，负责将按键事件映射到应用操作
pub struct InputHandler {
    keybindings: KeybindingsConfig,
}

/// 用户操作类型
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UserAction {
    Quit,
    FocusUp,
    FocusDown,
    Increase,
    Decrease,
    Digit(u8),
    DeleteDigit,
    Save,
    Previous,
    Next,
    Reload,
    None,
}

impl InputHandler {
    pub fn new(keybindings: KeybindingsConfig) -> Self {
        Self { keybindings }
    }

    /// 处理按键事件，返回对应的用户操作
    pub fn handle_key_event(&self, key_event: KeyEvent) -> UserAction {
        if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c') {
            return UserAction::Quit;
        }

        match key_event.code {
            KeyCode::Char(c) => self.handle_char_key(c),
            KeyCode::Up => self.get_named_key_action("up"),
            KeyCode::Down => self.get_named_key_action("down"),
            KeyCode::Left => self.get_named_key_action("left"),
            KeyCode::Right => self.get_named_key_action("right"),
            KeyCode::Tab => UserAction::FocusDown,
            KeyCode::BackTab => UserAction::FocusUp,
            KeyCode::Backspace | KeyCode::Delete => UserAction::DeleteDigit,
            KeyCode::Esc => UserAction::Quit,
            _ => UserAction::None,
        }
    }

    /// 处理字符按键：配置的绑定优先，其次是数字输入
    fn handle_char_key(&self, c: char) -> UserAction {
        let key_str = c.to_string();

        // 构建操作映射表
        let action_map = self.build_action_map();

        // 查找匹配的操作
        match self.find_matching_action(&key_str, &action_map) {
            UserAction::None => c
                .to_digit(10)
                .map(|d| UserAction::Digit(d as u8))
                .unwrap_or(UserAction::None),
            action => action,
        }
    }

    /// 构建操作映射表
    fn build_action_map(&self) -> [(&str, UserAction); 9] {
        [
            (&self.keybindings.quit, UserAction::Quit),
            (&self.keybindings.save, UserAction::Save),
            (&self.keybindings.previous, UserAction::Previous),
            (&self.keybindings.next, UserAction::Next),
            (&self.keybindings.reload, UserAction::Reload),
            (&self.keybindings.up, UserAction::FocusUp),
            (&self.keybindings.down, UserAction::FocusDown),
            (&self.keybindings.left, UserAction::Decrease),
            (&self.keybindings.right, UserAction::Increase),
        ]
    }

    /// 查找匹配的操作
    fn find_matching_action(&self, key_str: &str, action_map: &[(&str, UserAction)]) -> UserAction {
        for (key, action) in action_map {
            if key_str == *key {
                return *action;
            }
        }
        UserAction::None
    }

    /// 方向键：绑定为方向键名称或对应的vim按键时生效
    fn get_named_key_action(&self, name: &str) -> UserAction {
        let (configured, action) = match name {
            "up" => (&self.keybindings.up, UserAction::FocusUp),
            "down" => (&self.keybindings.down, UserAction::FocusDown),
            "left" => (&self.keybindings.left, UserAction::Decrease),
            "right" => (&self.keybindings.right, UserAction::Increase),
            _ => return UserAction::None,
        };
        let vim_equivalent = match name {
            "up" => "k",
            "down" => "j",
            "left" => "h",
            _ => "l",
        };
        if configured == name || configured == vim_equivalent {
            action
        } else {
            UserAction::None
        }
    }

    /// 帮助栏文字
    pub fn help_text(&self) -> String {
        format!(
            "{}/{}: field  {}/{}: adjust  0-9: type value  {}: save  {}: previous  {}: next  {}: reload  {}: quit",
            self.keybindings.up,
            self.keybindings.down,
            self.keybindings.left,
            self.keybindings.right,
            self.keybindings.save,
            self.keybindings.previous,
            self.keybindings.next,
            self.keybindings.reload,
            self.keybindings.quit,
        )
    }
}
