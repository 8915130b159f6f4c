use std::fmt;
use std::str::FromStr;

/// 气胸类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PneumothoraxType {
    #[default]
    Simple,
    Tension,
}

impl PneumothoraxType {
    pub const ALL: [PneumothoraxType; 2] = [PneumothoraxType::Simple, PneumothoraxType::Tension];

    pub fn as_str(&self) -> &'static str {
        match self {
            PneumothoraxType::Simple => "Simple",
            PneumothoraxType::Tension => "Tension",
        }
    }

    /// 在两个选项之间切换
    pub fn toggled(self) -> Self {
        match self {
            PneumothoraxType::Simple => PneumothoraxType::Tension,
            PneumothoraxType::Tension => PneumothoraxType::Simple,
        }
    }
}

impl fmt::Display for PneumothoraxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PneumothoraxType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            // 未评分的行通常为空
            "" | "simple" => Ok(PneumothoraxType::Simple),
            "tension" => Ok(PneumothoraxType::Tension),
            other => Err(format!("unknown pneumothorax type '{}'", other)),
        }
    }
}

/// 元数据表中的一行，对应一张图像
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub index: u64,          // 加载时确定的稳定标识，不可修改
    pub image_name: String,  // 图像相对文件名
    pub label_flag: bool,    // 是否已完成评分
    pub pneumothorax_type: PneumothoraxType,
    pub measurement_a: u32,
    pub measurement_b: u32,
    pub measurement_c: u32,
    // ————————————————————————————————————————————————————————————————————————
    // 派生值，仅在保存时写入；从未评分的行为None
    // ————————————————————————————————————————————————————————————————————————
    pub pneumothorax_percentage: Option<f64>,
    // ————————————————————————————————————————————————————————————————————————
    // 表中其他列的原始单元格，与Dataset.headers中的列位置一一对应
    // 已知列的位置留空，写回时由上面的字段填充
    // ————————————————————————————————————————————————————————————————————————
    pub raw_cells: Vec<String>,
}

impl Record {
    /// 创建一条未评分的记录
    #[cfg(test)]
    pub fn new(index: u64, image_name: impl Into<String>) -> Self {
        Self {
            index,
            image_name: image_name.into(),
            label_flag: false,
            pneumothorax_type: PneumothoraxType::default(),
            measurement_a: 0,
            measurement_b: 0,
            measurement_c: 0,
            pneumothorax_percentage: None,
            raw_cells: Vec::new(),
        }
    }

    /// 图像标题，格式与界面显示一致
    pub fn caption(&self) -> String {
        format!("Image index: {} | Image Name: {}", self.index, self.image_name)
    }
}
