// 本地CSV文件作为文档存储：内容的SHA-256即版本标识
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use sha2::{Digest, Sha256};
use tracing::debug;
use crate::store::{RemoteDocument, RemoteDocumentStore, StoreError};

pub struct LocalFileStore {
    base_dir: PathBuf,
}

impl LocalFileStore {
    /// 文档路径相对于`base_dir`解析，绝对路径原样使用
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base_dir.join(path)
    }

    fn read(&self, path: &str) -> Result<RemoteDocument, StoreError> {
        let file = self.resolve(path);
        let content = fs::read_to_string(&file).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound {
                store: self.describe(),
                path: path.to_string(),
            },
            _ => StoreError::Fetch {
                path: path.to_string(),
                reason: e.to_string(),
            },
        })?;
        let version = content_version(&content);
        Ok(RemoteDocument { content, version })
    }
}

/// 内容摘要
pub fn content_version(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// 先写临时文件再改名，避免写到一半的表
fn write_atomically(target: &Path, content: &str) -> std::io::Result<()> {
    let mut tmp_name = target.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);
    fs::write(&tmp, content)?;
    fs::rename(&tmp, target)
}

impl RemoteDocumentStore for LocalFileStore {
    fn describe(&self) -> String {
        format!("local:{}", self.base_dir.display())
    }

    fn fetch(&self, path: &str) -> Result<RemoteDocument, StoreError> {
        self.read(path)
    }

    fn update(
        &self,
        path: &str,
        content: &str,
        message: &str,
        expected_version: &str,
    ) -> Result<String, StoreError> {
        let current = self.read(path).map_err(|e| StoreError::Write {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        if current.version != expected_version {
            return Err(StoreError::Conflict {
                path: path.to_string(),
                expected: expected_version.to_string(),
            });
        }

        write_atomically(&self.resolve(path), content).map_err(|e| StoreError::Write {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        debug!(path, message, "local table rewritten");
        Ok(content_version(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_fetch_and_update() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("GT.csv"), "Index\n0\n").unwrap();
        let store = LocalFileStore::new(temp_dir.path());

        let document = store.fetch("GT.csv").unwrap();
        assert_eq!(document.content, "Index\n0\n");
        assert_eq!(document.version, content_version("Index\n0\n"));

        let new_version = store
            .update("GT.csv", "Index\n1\n", "msg", &document.version)
            .unwrap();
        assert_eq!(new_version, content_version("Index\n1\n"));
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("GT.csv")).unwrap(),
            "Index\n1\n"
        );
        assert!(!temp_dir.path().join("GT.csv.tmp").exists());
    }

    #[test]
    fn test_update_with_stale_version_conflicts() {
        let temp_dir = tempdir().unwrap();
        let file = temp_dir.path().join("GT.csv");
        fs::write(&file, "Index\n0\n").unwrap();
        let store = LocalFileStore::new(temp_dir.path());
        let document = store.fetch("GT.csv").unwrap();

        // 其他进程修改了文件
        fs::write(&file, "Index\n9\n").unwrap();

        let result = store.update("GT.csv", "Index\n1\n", "msg", &document.version);
        assert!(matches!(result, Err(StoreError::Conflict { .. })));
        assert_eq!(fs::read_to_string(&file).unwrap(), "Index\n9\n");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let temp_dir = tempdir().unwrap();
        let store = LocalFileStore::new(temp_dir.path());
        assert!(matches!(
            store.fetch("missing.csv"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_content_version_is_stable() {
        assert_eq!(content_version("abc"), content_version("abc"));
        assert_ne!(content_version("abc"), content_version("abd"));
        assert_eq!(content_version("").len(), 64);
    }
}
