// 测试用的内存文档存储，克隆体共享同一份状态
use std::cell::RefCell;
use std::rc::Rc;
use crate::store::{RemoteDocument, RemoteDocumentStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    content: Option<String>,
    revision: u32,
    commit_messages: Vec<String>,
    pending_failure: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryStore {
    pub fn new(content: &str) -> Self {
        let store = Self::default();
        store.overwrite(content);
        store
    }

    /// 空存储，fetch返回NotFound
    pub fn empty() -> Self {
        Self::default()
    }

    /// 模拟另一个写入者修改了文档
    pub fn overwrite(&self, content: &str) {
        let mut inner = self.inner.borrow_mut();
        inner.content = Some(content.to_string());
        inner.revision += 1;
    }

    pub fn fail_next_write(&self, reason: &str) {
        self.inner.borrow_mut().pending_failure = Some(reason.to_string());
    }

    pub fn content(&self) -> Option<String> {
        self.inner.borrow().content.clone()
    }

    pub fn commit_messages(&self) -> Vec<String> {
        self.inner.borrow().commit_messages.clone()
    }
}

impl RemoteDocumentStore for MemoryStore {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn fetch(&self, path: &str) -> Result<RemoteDocument, StoreError> {
        let inner = self.inner.borrow();
        match &inner.content {
            Some(content) => Ok(RemoteDocument {
                content: content.clone(),
                version: format!("v{}", inner.revision),
            }),
            None => Err(StoreError::NotFound {
                store: self.describe(),
                path: path.to_string(),
            }),
        }
    }

    fn update(
        &self,
        path: &str,
        content: &str,
        message: &str,
        expected_version: &str,
    ) -> Result<String, StoreError> {
        let mut inner = self.inner.borrow_mut();
        if let Some(reason) = inner.pending_failure.take() {
            return Err(StoreError::Write {
                path: path.to_string(),
                reason,
            });
        }
        if format!("v{}", inner.revision) != expected_version {
            return Err(StoreError::Conflict {
                path: path.to_string(),
                expected: expected_version.to_string(),
            });
        }
        inner.content = Some(content.to_string());
        inner.revision += 1;
        inner.commit_messages.push(message.to_string());
        Ok(format!("v{}", inner.revision))
    }
}
