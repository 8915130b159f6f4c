// src/session.rs
// 一次评分会话的全部可变状态：数据表、游标、存储连接和状态机
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};
use crate::cursor::Cursor;
use crate::grading::{GradeError, GradeInput};
use crate::image_resolver::{ImageResolver, Resolution};
use crate::models::{Dataset, Record, SessionPhase};
use crate::store::{MetadataStore, StoreError};

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("all images have been labeled, nothing to save")]
    NothingToSave,
    #[error("image {image} not found at {}, cannot grade without viewing it", .path.display())]
    ImageNotFound { image: String, path: PathBuf },
    #[error(transparent)]
    Invalid(#[from] GradeError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Session {
    dataset: Dataset,
    cursor: Cursor,
    store: MetadataStore,
    resolver: ImageResolver,
    phase: SessionPhase,
    // ————————————————————————————————————————————————————————————————————————
    // 用户主动后退后进入回看模式：暂停跳过已评分记录，直到遇到未评分记录或保存成功
    // ————————————————————————————————————————————————————————————————————————
    revisiting: bool,
    // 内存中的修改尚未成功写入存储
    unsynced: bool,
}

impl Session {
    /// 加载数据表并创建会话，失败时不产生任何会话状态
    pub fn open(mut store: MetadataStore, resolver: ImageResolver) -> Result<Self, StoreError> {
        let dataset = store.load()?;
        let mut session = Self {
            dataset,
            cursor: Cursor::new(),
            store,
            resolver,
            phase: SessionPhase::Ready,
            revisiting: false,
            unsynced: false,
        };
        // 立即计算第一条未评分记录，可能直接进入AllLabeled
        session.current_position();
        Ok(session)
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn is_revisiting(&self) -> bool {
        self.revisiting
    }

    pub fn has_unsynced_changes(&self) -> bool {
        self.unsynced
    }

    pub fn store_description(&self) -> String {
        self.store.describe()
    }

    pub fn image_root(&self) -> PathBuf {
        self.resolver.root().to_path_buf()
    }

    /// (已评分, 总数)
    pub fn progress(&self) -> (usize, usize) {
        (self.dataset.labeled_count(), self.dataset.len())
    }

    /// 当前记录在表中的位置；全部评分完毕时返回None并进入AllLabeled
    ///
    /// 仍有未写入的修改时不进入终态，保存可以重试整表写入
    pub fn current_position(&mut self) -> Option<usize> {
        if self.phase.is_terminal() {
            return None;
        }

        if self.revisiting {
            match self.cursor.peek(&self.dataset) {
                Some(record) if record.label_flag => return Some(self.cursor.index()),
                _ => self.revisiting = false,
            }
        }

        if self.cursor.current(&self.dataset).is_some() {
            return Some(self.cursor.index());
        }

        if self.unsynced {
            return None;
        }

        info!(records = self.dataset.len(), "all images have been labeled");
        self.phase = SessionPhase::AllLabeled;
        None
    }

    pub fn current_record(&mut self) -> Option<&Record> {
        let position = self.current_position()?;
        self.dataset.get(position)
    }

    pub fn current_image(&mut self) -> Option<Resolution> {
        let position = self.current_position()?;
        let record = self.dataset.get(position)?;
        Some(self.resolver.resolve(&record.image_name))
    }

    pub fn next(&mut self) {
        if !self.phase.accepts_actions() {
            return;
        }
        self.phase = SessionPhase::Ready;
        self.cursor.advance(self.dataset.len());
        // 到达未评分记录即结束回看
        if matches!(self.cursor.peek(&self.dataset), Some(record) if !record.label_flag) {
            self.revisiting = false;
        }
    }

    pub fn previous(&mut self) {
        if !self.phase.accepts_actions() {
            return;
        }
        self.phase = SessionPhase::Ready;
        self.cursor.retreat();
        self.revisiting = true;
    }

    /// 冲突后重新拉取数据表，丢弃尚未写入的内存修改，游标从头重新计算
    pub fn reload(&mut self) -> Result<(), StoreError> {
        if !self.phase.accepts_actions() {
            return Ok(());
        }
        let dataset = self.store.load()?;
        if self.unsynced {
            warn!("discarding unsaved in-memory changes on reload");
        }
        self.dataset = dataset;
        self.cursor = Cursor::new();
        self.revisiting = false;
        self.unsynced = false;
        self.phase = SessionPhase::Ready;
        self.current_position();
        Ok(())
    }

    /// 进入Saving状态，供界面在阻塞写入前先绘制一帧
    pub fn begin_save(&mut self) {
        if self.phase.accepts_actions() {
            self.phase = SessionPhase::Saving;
        }
    }

    /// 将评分写入当前记录并整表写回
    ///
    /// 内存中的修改先于写入发生，写入失败时不回滚；`has_unsynced_changes`
    /// 保持为true，重试会再次写出同样的状态
    pub fn save_current(&mut self, input: GradeInput) -> Result<(), SaveError> {
        let result = self.try_save(input);
        match &result {
            Ok(()) => {
                self.phase = SessionPhase::Ready;
                self.current_position();
            }
            Err(SaveError::NothingToSave) => {}
            Err(e) => self.phase = SessionPhase::SaveFailed(e.to_string()),
        }
        result
    }

    fn try_save(&mut self, input: GradeInput) -> Result<(), SaveError> {
        // 先恢复到Ready，使current_position按正常流程计算
        if self.phase == SessionPhase::Saving {
            self.phase = SessionPhase::Ready;
        }
        let Some(position) = self.current_position() else {
            return self.retry_pending_write();
        };
        let image_name = self.dataset.records[position].image_name.clone();

        if let Resolution::NotFound { path } = self.resolver.resolve(&image_name) {
            return Err(SaveError::ImageNotFound { image: image_name, path });
        }

        input.apply_to(&mut self.dataset.records[position])?;
        self.unsynced = true;
        self.phase = SessionPhase::Saving;

        if let Err(e) = self.store.save(&self.dataset) {
            warn!(image = %image_name, error = %e, "changes kept in memory but not persisted");
            // 停留在这条记录上，便于重试
            self.revisiting = true;
            return Err(e.into());
        }

        info!(
            image = %image_name,
            kind = %input.pneumothorax_type,
            a = input.a,
            b = input.b,
            c = input.c,
            percentage = input.percentage(),
            "record graded"
        );
        self.unsynced = false;
        self.revisiting = false;
        Ok(())
    }

    /// 没有当前记录时，把之前写入失败的整张表再写一次
    fn retry_pending_write(&mut self) -> Result<(), SaveError> {
        if !self.unsynced {
            return Err(SaveError::NothingToSave);
        }
        self.phase = SessionPhase::Saving;
        self.store.save(&self.dataset).map_err(|e| {
            warn!(error = %e, "pending changes still not persisted");
            SaveError::from(e)
        })?;
        info!(records = self.dataset.len(), "pending changes persisted");
        self.unsynced = false;
        Ok(())
    }

    /// 所有记录都已评分，但有修改尚未写入存储
    pub fn has_pending_write(&mut self) -> bool {
        self.unsynced && self.current_position().is_none()
    }
}
