// src/store.rs
// 元数据表的读写：整张表作为一个文档，带版本前置条件地覆盖写回
pub mod github;
pub mod local;
#[cfg(test)]
pub mod memory;

use thiserror::Error;
use tracing::{info, warn};
use crate::models::Dataset;
use crate::table_parser::{TableError, parse_table, write_table};

pub use github::GitHubContentsStore;
pub use local::LocalFileStore;

/// 存储层错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document '{path}' does not exist in {store}")]
    NotFound { store: String, path: String },
    #[error("failed to fetch '{path}': {reason}")]
    Fetch { path: String, reason: String },
    #[error("'{path}' is not a well-formed metadata table: {source}")]
    Parse {
        path: String,
        #[source]
        source: TableError,
    },
    #[error("'{path}' was changed by someone else since version {expected}; reload before saving again")]
    Conflict { path: String, expected: String },
    #[error("failed to write '{path}': {reason}")]
    Write { path: String, reason: String },
}

/// 远程文档内容及其版本标识
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    pub content: String,
    pub version: String,
}

/// 按路径寻址、支持带前置条件更新的文档存储
pub trait RemoteDocumentStore {
    /// 存储位置的简短描述，用于日志和错误信息
    fn describe(&self) -> String;

    fn fetch(&self, path: &str) -> Result<RemoteDocument, StoreError>;

    /// 仅当远程版本仍为`expected_version`时写入，返回新版本
    fn update(
        &self,
        path: &str,
        content: &str,
        message: &str,
        expected_version: &str,
    ) -> Result<String, StoreError>;
}

/// 元数据表存储
pub struct MetadataStore {
    backend: Box<dyn RemoteDocumentStore>,
    path: String,
    commit_message: String,
    version: Option<String>, // 最近一次加载/保存时观察到的版本
}

impl MetadataStore {
    pub fn new(
        backend: Box<dyn RemoteDocumentStore>,
        path: impl Into<String>,
        commit_message: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            path: path.into(),
            commit_message: commit_message.into(),
            version: None,
        }
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn describe(&self) -> String {
        format!("{} ({})", self.backend.describe(), self.path)
    }

    /// 拉取最新的表并解析
    pub fn load(&mut self) -> Result<Dataset, StoreError> {
        let document = self.backend.fetch(&self.path)?;
        let dataset = parse_table(&document.content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;

        info!(
            store = %self.backend.describe(),
            path = %self.path,
            version = %document.version,
            records = dataset.len(),
            "metadata loaded"
        );
        self.version = Some(document.version);
        Ok(dataset)
    }

    /// 将整张表写回，成功后更新版本标识
    pub fn save(&mut self, dataset: &Dataset) -> Result<(), StoreError> {
        let expected = self.version.clone().ok_or_else(|| StoreError::Write {
            path: self.path.clone(),
            reason: "no version observed yet, load the table first".to_string(),
        })?;
        let content = write_table(dataset).map_err(|e| StoreError::Write {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        match self
            .backend
            .update(&self.path, &content, &self.commit_message, &expected)
        {
            Ok(new_version) => {
                info!(path = %self.path, from = %expected, to = %new_version, "metadata saved");
                self.version = Some(new_version);
                Ok(())
            }
            Err(e) => {
                warn!(path = %self.path, error = %e, "metadata save failed");
                Err(e)
            }
        }
    }
}
