use crate::models::{ColorConfig, KeybindingsConfig};
use crate::tui::utils::Theme;
use crate::tui::{App, Event, EventHandler, InputHandler, Renderer, UserAction};
use anyhow::Result;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io;
use std::time::Duration;
use tracing::info;

/// TUI应用控制器，负责协调各个组件
pub struct TuiApp {
    app: App,
    input_handler: InputHandler,
    renderer: Renderer,
    tick_rate: Duration,
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TuiApp {
    pub fn new(
        app: App,
        keybindings: KeybindingsConfig,
        colors: &ColorConfig,
        refresh_rate_ms: u64,
    ) -> Result<Self> {
        // 设置终端
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        let input_handler = InputHandler::new(keybindings);
        let renderer = Renderer::new(Theme::from_config(colors), input_handler.help_text());

        Ok(Self {
            app,
            input_handler,
            renderer,
            tick_rate: Duration::from_millis(refresh_rate_ms.max(10)),
            terminal,
        })
    }

    /// 运行TUI应用主循环，无论循环是否出错都会恢复终端
    pub fn run(&mut self) -> Result<()> {
        let result = self.event_loop();
        self.cleanup()?;
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let events = EventHandler::new(self.tick_rate);
        info!(store = %self.app.session.store_description(), "grading session started");

        loop {
            // 渲染界面
            self.draw()?;

            // 处理事件
            match events.next()? {
                Event::Input(event) => {
                    let action = self.input_handler.handle_key_event(event);
                    self.handle_user_action(action)?;
                }
                Event::Resize | Event::Tick => {}
            }

            if self.app.should_quit {
                break;
            }
        }

        info!("grading session finished");
        Ok(())
    }

    fn handle_user_action(&mut self, action: UserAction) -> Result<()> {
        match action {
            // 写入是阻塞的，先绘制一帧Saving状态
            UserAction::Save => {
                if self.app.begin_save() {
                    self.draw()?;
                    self.app.save();
                }
            }
            _ => self.app.handle_action(action),
        }
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        self.terminal.draw(|f| {
            self.renderer.draw(f, &mut self.app);
        })?;
        Ok(())
    }

    // 清理终端设置
    pub fn cleanup(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}
