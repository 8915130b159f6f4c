// src/main.rs
mod config;
mod cursor;
mod grading;
mod image_resolver;
mod logging;
mod models;
mod session;
mod store;
mod table_parser;
mod tui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{load_config, read_token, validate_config};
use image_resolver::{ImageResolver, check_images};
use models::{BackendKind, Config};
use session::Session;
use std::path::{Path, PathBuf};
use store::{GitHubContentsStore, LocalFileStore, MetadataStore, RemoteDocumentStore};
use tracing::{error, info};
use tui::{App, TuiApp};

/// 气胸图像评分工具
#[derive(Debug, Parser)]
#[command(name = "pneumo-grader", version, about = "Grade pneumothorax images against a shared metadata table")]
struct Cli {
    /// 配置文件路径，不存在时自动创建
    #[arg(short, long, default_value = "pneumo_grader.toml")]
    config: String,

    /// 使用本地CSV文件代替远程仓库
    #[arg(long, value_name = "CSV")]
    local: Option<PathBuf>,

    /// 覆盖配置中的图像目录
    #[arg(long, value_name = "DIR")]
    images: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 打开评分界面（默认）
    Grade,
    /// 打印评分进度
    Status,
    /// 检查数据表中的图像是否都存在
    Check,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置文件
    let mut config = load_config(&cli.config)?;
    apply_overrides(&mut config, &cli);
    validate_config(&config)?;

    let _guard = logging::init_logging(&config.logging)?;
    info!(config = %cli.config, backend = ?config.remote.backend, "configuration loaded");

    let resolver = ImageResolver::new(&config.images.root);
    let mut store = open_store(&config)?;

    match cli.command.unwrap_or(Command::Grade) {
        Command::Grade => run_grading(config, store, resolver),
        Command::Status => print_status(store),
        Command::Check => {
            let dataset = store.load().map_err(|e| {
                error!(error = %e, "failed to load metadata");
                e
            })?;
            print_check_report(&dataset, &resolver)
        }
    }
}

/// 命令行参数优先于配置文件
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(csv) = &cli.local {
        config.remote.backend = BackendKind::Local;
        config.remote.path = csv.to_string_lossy().into_owned();
    }
    if let Some(images) = &cli.images {
        config.images.root = images.to_string_lossy().into_owned();
    }
}

fn open_store(config: &Config) -> Result<MetadataStore> {
    let remote = &config.remote;
    let (backend, path): (Box<dyn RemoteDocumentStore>, String) = match remote.backend {
        BackendKind::Github => {
            let token = read_token(config)?;
            let backend = GitHubContentsStore::new(
                &remote.api_url,
                &remote.repository,
                remote.branch.clone(),
                token,
            )
            .context("Failed to create HTTP client")?;
            (Box::new(backend), remote.path.clone())
        }
        BackendKind::Local => {
            let csv = Path::new(&remote.path);
            let file_name = csv
                .file_name()
                .with_context(|| format!("remote.path '{}' is not a file path", remote.path))?
                .to_string_lossy()
                .into_owned();
            let dir = csv
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            (Box::new(LocalFileStore::new(dir)), file_name)
        }
    };
    Ok(MetadataStore::new(backend, path, remote.commit_message.clone()))
}

fn run_grading(config: Config, store: MetadataStore, resolver: ImageResolver) -> Result<()> {
    // 加载失败时不进入界面
    let session = Session::open(store, resolver).map_err(|e| {
        error!(error = %e, "failed to load metadata");
        e
    })?;

    let app = App::new(session, config.tui.show_help_bar);
    let mut tui_app = TuiApp::new(
        app,
        config.keybindings.clone(),
        &config.tui.colors,
        config.tui.refresh_rate_ms,
    )?;
    tui_app.run()
}

fn print_status(mut store: MetadataStore) -> Result<()> {
    let dataset = store.load()?;
    println!("Store: {}", store.describe());
    println!("Version: {}", store.version().unwrap_or("-"));
    println!("Labeled: {}/{}", dataset.labeled_count(), dataset.len());

    match dataset.first_unlabeled().and_then(|position| dataset.get(position)) {
        Some(record) => println!("Next to grade: {}", record.caption()),
        None => println!("All images have been labeled! No more images to process."),
    }
    Ok(())
}

fn print_check_report(dataset: &models::Dataset, resolver: &ImageResolver) -> Result<()> {
    let report = check_images(dataset, resolver)?;
    println!(
        "Checked {} records against {}",
        dataset.len(),
        resolver.root().display()
    );

    if report.missing.is_empty() {
        println!("All referenced images are present");
    } else {
        println!("Missing images ({}):", report.missing.len());
        for (index, name) in &report.missing {
            println!("  Index {}: {}", index, name);
        }
    }

    if !report.unreferenced.is_empty() {
        println!("Files not referenced by any record ({}):", report.unreferenced.len());
        for name in &report.unreferenced {
            println!("  {}", name);
        }
    }
    Ok(())
}
