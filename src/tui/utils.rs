use crate::models::ColorConfig;
use ratatui::style::Color;

/// 界面配色
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub border: Color,
    pub focused: Color,
    pub success: Color,
    pub error: Color,
    pub text: Color,
}

impl Theme {
    pub fn from_config(colors: &ColorConfig) -> Self {
        Self {
            border: parse_color(&colors.border),
            focused: parse_color(&colors.focused),
            success: parse_color(&colors.success),
            error: parse_color(&colors.error),
            text: parse_color(&colors.text),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_config(&ColorConfig::default())
    }
}

/// 将颜色字符串转换为ratatui的Color
pub fn parse_color(color_str: &str) -> Color {
    let color_map = get_color_map();
    color_map
        .get(&color_str.to_lowercase())
        .copied()
        .unwrap_or(Color::White)
}

/// 获取颜色映射表
fn get_color_map() -> std::collections::HashMap<String, Color> {
    use std::collections::HashMap;

    let mut map = HashMap::new();

    // 基础颜色
    insert_basic_colors(&mut map);

    // 灰色系
    insert_gray_colors(&mut map);

    // 亮色
    insert_light_colors(&mut map);

    map
}

/// 插入基础颜色
fn insert_basic_colors(map: &mut std::collections::HashMap<String, Color>) {
    map.insert("black".to_string(), Color::Black);
    map.insert("red".to_string(), Color::Red);
    map.insert("green".to_string(), Color::Green);
    map.insert("yellow".to_string(), Color::Yellow);
    map.insert("blue".to_string(), Color::Blue);
    map.insert("magenta".to_string(), Color::Magenta);
    map.insert("cyan".to_string(), Color::Cyan);
    map.insert("white".to_string(), Color::White);
}

/// 插入灰色系颜色
fn insert_gray_colors(map: &mut std::collections::HashMap<String, Color>) {
    map.insert("gray".to_string(), Color::Gray);
    map.insert("grey".to_string(), Color::Gray);
    map.insert("dark_gray".to_string(), Color::DarkGray);
    map.insert("dark_grey".to_string(), Color::DarkGray);
}

/// 插入亮色
fn insert_light_colors(map: &mut std::collections::HashMap<String, Color>) {
    map.insert("light_red".to_string(), Color::LightRed);
    map.insert("light_green".to_string(), Color::LightGreen);
    map.insert("light_yellow".to_string(), Color::LightYellow);
    map.insert("light_blue".to_string(), Color::LightBlue);
    map.insert("light_magenta".to_string(), Color::LightMagenta);
    map.insert("light_cyan".to_string(), Color::LightCyan);
}

/// 文件大小的可读形式
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

/// 进度比例，空表视为0
pub fn progress_ratio(labeled: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (labeled as f64 / total as f64).clamp(0.0, 1.0)
    }
}
