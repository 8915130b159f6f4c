use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;
use anyhow::Result;
use tracing::debug;
use crate::models::Dataset;

/// 已找到的图像文件
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImage {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub dimensions: Option<(u32, u32)>, // 无法解码时为None
}

/// 图像解析结果，缺失不是错误
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(ResolvedImage),
    NotFound { path: PathBuf },
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

/// 将记录的图像文件名映射到本地图像目录
#[derive(Debug, Clone)]
pub struct ImageResolver {
    root: PathBuf,
}

impl ImageResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, image_name: &str) -> Resolution {
        let path = self.root.join(image_name);
        if escapes_root(image_name) || !path.is_file() {
            debug!(image = image_name, path = %path.display(), "image not found");
            return Resolution::NotFound { path };
        }

        let size_bytes = path.metadata().map(|m| m.len()).unwrap_or(0);
        let dimensions = image::image_dimensions(&path).ok();
        Resolution::Found(ResolvedImage {
            path,
            size_bytes,
            dimensions,
        })
    }

    /// 遍历图像目录，返回所有文件相对于根目录的名称（以/分隔，已排序）
    pub fn scan_image_root(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            anyhow::bail!("Image directory '{}' does not exist", self.root.display());
        }

        let mut names: Vec<String> = WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| relative_name(&self.root, entry.path()))
            .collect();
        names.sort();
        Ok(names)
    }
}

/// 绝对路径或包含..的名称不允许离开图像根目录
fn escapes_root(image_name: &str) -> bool {
    Path::new(image_name)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
}

fn relative_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

/// 图像完整性报告
#[derive(Debug, Default, PartialEq)]
pub struct ImageReport {
    pub missing: Vec<(u64, String)>, // (Index, Image_Name)
    pub unreferenced: Vec<String>,   // 目录中存在但没有记录引用的文件
}

pub fn check_images(dataset: &Dataset, resolver: &ImageResolver) -> Result<ImageReport> {
    let on_disk = resolver.scan_image_root()?;

    let missing = dataset
        .records
        .iter()
        .filter(|r| !resolver.resolve(&r.image_name).is_found())
        .map(|r| (r.index, r.image_name.clone()))
        .collect();

    let referenced: HashSet<String> = dataset
        .records
        .iter()
        .map(|r| r.image_name.replace('\\', "/"))
        .collect();
    let unreferenced = on_disk
        .into_iter()
        .filter(|name| !referenced.contains(name))
        .collect();

    Ok(ImageReport {
        missing,
        unreferenced,
    })
}
