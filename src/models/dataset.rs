use crate::models::record::Record;

/// 已知列在表头中的位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub index: usize,
    pub image_name: usize,
    pub label_flag: usize,
    pub pneumothorax_type: usize,
    pub measurement_a: usize,
    pub measurement_b: usize,
    pub measurement_c: usize,
    pub pneumothorax_percentage: usize,
}

impl ColumnLayout {
    /// 所有已知列的位置
    pub fn positions(&self) -> [usize; 8] {
        [
            self.index,
            self.image_name,
            self.label_flag,
            self.pneumothorax_type,
            self.measurement_a,
            self.measurement_b,
            self.measurement_c,
            self.pneumothorax_percentage,
        ]
    }
}

/// 整张元数据表：按原顺序保存的所有记录，以及写回时使用的表头
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub layout: ColumnLayout,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Record> {
        self.records.get(position)
    }

    /// 已评分的记录数
    pub fn labeled_count(&self) -> usize {
        self.records.iter().filter(|r| r.label_flag).count()
    }

    /// 第一条未评分记录的位置
    pub fn first_unlabeled(&self) -> Option<usize> {
        self.records.iter().position(|r| !r.label_flag)
    }
}
