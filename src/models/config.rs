use serde::Deserialize;

/// 应用程序配置结构
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub images: ImagesConfig,
    pub tui: TuiConfig,
    pub keybindings: KeybindingsConfig,
    pub logging: LoggingConfig,
}

/// 元数据表存储后端
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Github,
    Local,
}

/// 远程元数据表配置
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub backend: BackendKind,
    pub repository: String, // "owner/name"，仅github后端使用
    pub path: String,       // 表在仓库中的路径，local后端为本地文件路径
    #[serde(deserialize_with = "crate::models::utils::deserialize_optional_string")]
    pub branch: Option<String>,
    pub token_env: String, // 保存访问令牌的环境变量名
    pub api_url: String,
    pub commit_message: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Github,
            repository: String::new(),
            path: "GT_Pneumothorax.csv".to_string(),
            branch: None,
            token_env: "GITHUB_TOKEN".to_string(),
            api_url: "https://api.github.com".to_string(),
            commit_message: "Update metadata with pneumothorax grading".to_string(),
        }
    }
}

/// 图像目录配置
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    pub root: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            root: "combined".to_string(),
        }
    }
}

/// TUI界面配置
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    pub refresh_rate_ms: u64,
    pub show_help_bar: bool,
    pub colors: ColorConfig,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            refresh_rate_ms: 250,
            show_help_bar: true,
            colors: ColorConfig::default(),
        }
    }
}

/// 颜色配置
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub border: String,
    pub focused: String,
    pub success: String,
    pub error: String,
    pub text: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            border: "cyan".to_string(),
            focused: "yellow".to_string(),
            success: "green".to_string(),
            error: "red".to_string(),
            text: "white".to_string(),
        }
    }
}

/// 键盘绑定配置
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct KeybindingsConfig {
    pub up: String,
    pub down: String,
    pub left: String,
    pub right: String,
    pub save: String,
    pub previous: String,
    pub next: String,
    pub reload: String,
    pub quit: String,
}

impl Default for KeybindingsConfig {
    fn default() -> Self {
        Self {
            up: "up".to_string(),
            down: "down".to_string(),
            left: "left".to_string(),
            right: "right".to_string(),
            save: "s".to_string(),
            previous: "p".to_string(),
            next: "n".to_string(),
            reload: "r".to_string(),
            quit: "q".to_string(),
        }
    }
}

/// 日志配置
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: String,
    pub level: String, // RUST_LOG优先
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: "pneumo_grader.log".to_string(),
            level: "info".to_string(),
        }
    }
}
