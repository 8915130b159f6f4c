use crate::grading::FormField;
use crate::image_resolver::Resolution;
use crate::models::{PneumothoraxType, Record};
use crate::tui::app::{App, Screen, StatusKind};
use crate::tui::utils::{Theme, format_file_size, progress_ratio};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};

/// TUI渲染器，负责处理所有UI渲染逻辑
pub struct Renderer {
    theme: Theme,
    help_text: String,
}

impl Renderer {
    pub fn new(theme: Theme, help_text: String) -> Self {
        Self { theme, help_text }
    }

    /// 从app结构体中读取数据并渲染
    pub fn draw(&self, f: &mut Frame, app: &mut App) {
        let help_height = if app.show_help_bar { 1 } else { 0 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
                Constraint::Length(help_height),
            ])
            .split(f.area());

        match app.screen() {
            Screen::AllLabeled { total } => {
                self.draw_progress(f, total, total, chunks[0]);
                self.draw_all_labeled(f, chunks[1]);
            }
            Screen::PendingWrite { labeled, total } => {
                self.draw_progress(f, labeled, total, chunks[0]);
                self.draw_pending_write(f, chunks[1]);
            }
            Screen::Grading {
                record,
                image,
                labeled,
                total,
                revisiting,
                unsynced,
                saving,
                ..
            } => {
                self.draw_progress(f, labeled, total, chunks[0]);

                let body = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .split(chunks[1]);
                self.draw_image_panel(f, &record, &image, revisiting, body[0]);
                // 看不到图像时不提供输入
                if image.is_found() {
                    self.draw_form(f, app, saving, unsynced, body[1]);
                } else {
                    self.draw_blocked(f, body[1]);
                }
            }
        }

        self.draw_status(f, app, chunks[2]);
        if app.show_help_bar {
            self.draw_help_bar(f, chunks[3]);
        }
    }

    /// 绘制标题与评分进度
    fn draw_progress(&self, f: &mut Frame, labeled: usize, total: usize, area: Rect) {
        let gauge = Gauge::default()
            .block(self.block("Pneumothorax Grading"))
            .gauge_style(Style::default().fg(self.theme.success))
            .ratio(progress_ratio(labeled, total))
            .label(format!("{}/{} labeled", labeled, total));
        f.render_widget(gauge, area);
    }

    fn draw_all_labeled(&self, f: &mut Frame, area: Rect) {
        let done = Paragraph::new("All images have been labeled! No more images to process.")
            .style(Style::default().fg(self.theme.success).add_modifier(Modifier::BOLD))
            .block(self.block("Done"))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(done, area);
    }

    fn draw_pending_write(&self, f: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from(Span::styled(
                "All images have been labeled, but the last change has not reached the store.",
                Style::default().fg(self.theme.error).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Save again to retry the write, or reload to discard it.",
                Style::default().fg(self.theme.text),
            )),
        ];
        let pending = Paragraph::new(lines)
            .block(self.block("Unsaved changes"))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(pending, area);
    }

    fn draw_blocked(&self, f: &mut Frame, area: Rect) {
        let blocked = Paragraph::new(vec![
            Line::from(Span::styled(
                "Cannot grade without viewing the image.",
                Style::default().fg(self.theme.error).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Use previous/next to move to another record.",
                Style::default().fg(self.theme.text),
            )),
        ])
        .block(self.block("Grading unavailable"))
        .wrap(Wrap { trim: true });
        f.render_widget(blocked, area);
    }

    /// 绘制图像信息面板
    fn draw_image_panel(
        &self,
        f: &mut Frame,
        record: &Record,
        image: &Resolution,
        revisiting: bool,
        area: Rect,
    ) {
        let text_style = Style::default().fg(self.theme.text);
        let mut lines = vec![Line::from(Span::styled(
            record.caption(),
            text_style.add_modifier(Modifier::BOLD),
        ))];

        if revisiting && record.label_flag {
            lines.push(Line::from(Span::styled(
                "Already labeled, saving again overwrites the grading",
                Style::default().fg(self.theme.focused),
            )));
        }
        lines.push(Line::from(""));

        match image {
            Resolution::Found(found) => {
                lines.push(Line::from(vec![
                    Span::styled("File: ", text_style),
                    Span::raw(found.path.display().to_string()),
                ]));
                lines.push(Line::from(vec![
                    Span::styled("Size: ", text_style),
                    Span::raw(format_file_size(found.size_bytes)),
                ]));
                let dimensions = found
                    .dimensions
                    .map(|(w, h)| format!("{} x {}", w, h))
                    .unwrap_or_else(|| "unknown".to_string());
                lines.push(Line::from(vec![
                    Span::styled("Dimensions: ", text_style),
                    Span::raw(dimensions),
                ]));
            }
            Resolution::NotFound { path } => {
                let error_style = Style::default().fg(self.theme.error);
                lines.push(Line::from(Span::styled(
                    format!("Image {} not found.", record.image_name),
                    error_style.add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(Span::styled(
                    format!("Expected at {}", path.display()),
                    error_style,
                )));
            }
        }

        let panel = Paragraph::new(lines)
            .block(self.block("Image"))
            .wrap(Wrap { trim: true });
        f.render_widget(panel, area);
    }

    /// 绘制评分表单
    fn draw_form(&self, f: &mut Frame, app: &App, saving: bool, unsynced: bool, area: Rect) {
        let mut lines = Vec::new();

        for field in FormField::ALL {
            let focused = field == app.focus;
            let marker = if focused { "> " } else { "  " };
            let label_style = if focused {
                Style::default()
                    .fg(self.theme.focused)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.text)
            };

            let mut spans = vec![Span::styled(format!("{}{}: ", marker, field.label()), label_style)];
            match app.form.value(field) {
                Some(value) => {
                    spans.push(Span::styled(value.to_string(), label_style));
                    spans.push(Span::raw(" (0-100)"));
                }
                None => spans.extend(self.type_selector(app.form.pneumothorax_type)),
            }
            lines.push(Line::from(spans));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Pneumothorax Percentage: ", Style::default().fg(self.theme.text)),
            Span::styled(
                format!("{:.2}%", app.form.percentage()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]));

        if unsynced {
            lines.push(Line::from(Span::styled(
                "Unsaved changes: the last save did not reach the store",
                Style::default().fg(self.theme.error),
            )));
        }

        let title = if saving { "Grading [saving...]" } else { "Grading" };
        let form = Paragraph::new(lines)
            .block(self.block(title))
            .wrap(Wrap { trim: true });
        f.render_widget(form, area);
    }

    /// 类型单选项，选中项高亮
    fn type_selector(&self, selected: PneumothoraxType) -> Vec<Span<'static>> {
        let mut spans = Vec::new();
        for kind in PneumothoraxType::ALL {
            let (mark, style) = if kind == selected {
                (
                    "(x) ",
                    Style::default()
                        .fg(self.theme.focused)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                ("( ) ", Style::default().fg(self.theme.text))
            };
            spans.push(Span::styled(format!("{}{}  ", mark, kind.as_str()), style));
        }
        spans
    }

    fn draw_status(&self, f: &mut Frame, app: &App, area: Rect) {
        let (text, color) = match &app.status {
            Some(status) => {
                let color = match status.kind {
                    StatusKind::Info => self.theme.text,
                    StatusKind::Success => self.theme.success,
                    StatusKind::Error => self.theme.error,
                };
                (status.text.clone(), color)
            }
            None => (app.session.store_description(), self.theme.text),
        };
        let status = Paragraph::new(text)
            .style(Style::default().fg(color))
            .block(self.block("Status"));
        f.render_widget(status, area);
    }

    fn draw_help_bar(&self, f: &mut Frame, area: Rect) {
        let help = Paragraph::new(self.help_text.as_str())
            .style(Style::default().add_modifier(Modifier::DIM));
        f.render_widget(help, area);
    }

    fn block<'a>(&self, title: &'a str) -> Block<'a> {
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border))
    }
}
