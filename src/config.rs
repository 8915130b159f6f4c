use crate::models::{BackendKind, Config};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn load_config(config_path: &str) -> Result<Config> {
    // 检查配置文件是否存在，如果不存在则创建默认配置
    if !Path::new(config_path).exists() {
        create_default_config(config_path)?;
        eprintln!("Created default config file at {}", config_path);
    }

    // 读取配置文件内容
    let config_content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path))?;

    // 解析TOML配置
    let config: Config = toml::from_str(&config_content)
        .with_context(|| format!("Failed to parse config file: {}", config_path))?;

    Ok(config)
}

/// 检查启动所需的配置项，缺失任何一项都无法启动
pub fn validate_config(config: &Config) -> Result<()> {
    if config.remote.path.trim().is_empty() {
        anyhow::bail!("remote.path is not set");
    }
    if config.images.root.trim().is_empty() {
        anyhow::bail!("images.root is not set");
    }
    if config.remote.backend == BackendKind::Github {
        let repository = config.remote.repository.trim();
        if repository.is_empty() {
            anyhow::bail!("remote.repository is not set (expected \"owner/name\")");
        }
        if repository.split('/').filter(|part| !part.is_empty()).count() != 2 {
            anyhow::bail!("remote.repository '{}' must look like \"owner/name\"", repository);
        }
        if config.remote.token_env.trim().is_empty() {
            anyhow::bail!("remote.token_env is not set");
        }
    }
    Ok(())
}

/// 从环境变量读取访问令牌
pub fn read_token(config: &Config) -> Result<String> {
    let var = &config.remote.token_env;
    let token = std::env::var(var)
        .with_context(|| format!("Environment variable {} with the repository token is not set", var))?;
    if token.trim().is_empty() {
        anyhow::bail!("Environment variable {} is empty", var);
    }
    Ok(token.trim().to_string())
}

fn create_default_config(config_path: &str) -> Result<()> {
    let default_config = r#"[remote]
# "github" reads/writes the table through the GitHub contents API,
# "local" treats `path` as a CSV file on disk
backend = "github"
repository = ""
path = "GT_Pneumothorax.csv"
branch = ""
token_env = "GITHUB_TOKEN"
api_url = "https://api.github.com"
commit_message = "Update metadata with pneumothorax grading"

[images]
root = "combined"

[tui]
refresh_rate_ms = 250
show_help_bar = true
colors = { border = "cyan", focused = "yellow", success = "green", error = "red", text = "white" }

[keybindings]
up = "up"
down = "down"
left = "left"
right = "right"
save = "s"
previous = "p"
next = "n"
reload = "r"
quit = "q"

[logging]
file = "pneumo_grader.log"
level = "info"
"#;

    fs::write(config_path, default_config)
        .with_context(|| format!("Failed to create default config file: {}", config_path))?;

    Ok(())
}
