// src/table_parser.rs
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;
use crate::models::{ColumnLayout, Dataset, PneumothoraxType, Record};

pub const COL_INDEX: &str = "Index";
pub const COL_IMAGE_NAME: &str = "Image_Name";
pub const COL_LABEL_FLAG: &str = "Label_Flag";
pub const COL_TYPE: &str = "Pneumothorax_Type";
pub const COL_A: &str = "A";
pub const COL_B: &str = "B";
pub const COL_C: &str = "C";
pub const COL_PERCENTAGE: &str = "Pneumothorax_Percentage";

/// 表格解析/序列化错误
#[derive(Debug, Error)]
pub enum TableError {
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("required column '{0}' is missing from the header")]
    MissingColumn(&'static str),
    #[error("row {row}: invalid {column} value '{value}': {reason}")]
    InvalidCell {
        row: usize,
        column: &'static str,
        value: String,
        reason: String,
    },
    #[error("row {row}: duplicate Index {index}")]
    DuplicateIndex { row: usize, index: u64 },
    #[error("row {row}: duplicate Image_Name '{name}'")]
    DuplicateImageName { row: usize, name: String },
    #[error("failed to encode table: {0}")]
    Encode(String),
}

// ————————————————————————————————————————————————————————————————————————
// 解析入口：CSV文本 -> Dataset
// ————————————————————————————————————————————————————————————————————————
pub fn parse_table(content: &str) -> Result<Dataset, TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.as_bytes());

    // 表头原样保留用于写回，只在查找时去掉空白
    let mut headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let find = |headers: &[String], name: &str| headers.iter().position(|h| h.trim() == name);
    let index = find(&headers, COL_INDEX).ok_or(TableError::MissingColumn(COL_INDEX))?;
    let image_name = find(&headers, COL_IMAGE_NAME).ok_or(TableError::MissingColumn(COL_IMAGE_NAME))?;
    let label_flag = find(&headers, COL_LABEL_FLAG).ok_or(TableError::MissingColumn(COL_LABEL_FLAG))?;

    // 缺失的评分列追加到表尾，保存时一并写出
    let original_width = headers.len();
    let mut column_or_append = |name: &str| match find(&headers, name) {
        Some(pos) => pos,
        None => {
            headers.push(name.to_string());
            headers.len() - 1
        }
    };
    let layout = ColumnLayout {
        index,
        image_name,
        label_flag,
        pneumothorax_type: column_or_append(COL_TYPE),
        measurement_a: column_or_append(COL_A),
        measurement_b: column_or_append(COL_B),
        measurement_c: column_or_append(COL_C),
        pneumothorax_percentage: column_or_append(COL_PERCENTAGE),
    };
    if headers.len() > original_width {
        debug!(added = headers.len() - original_width, "appended missing grading columns");
    }

    let mut records = Vec::new();
    let mut seen_index: HashMap<u64, usize> = HashMap::new();
    let mut seen_name: HashMap<String, usize> = HashMap::new();

    for (i, row) in reader.records().enumerate() {
        let row_num = i + 1;
        let mut cells: Vec<String> = row?.iter().map(|c| c.to_string()).collect();
        cells.resize(headers.len(), String::new());

        let record = parse_record(row_num, cells, &layout)?;

        if seen_index.insert(record.index, row_num).is_some() {
            return Err(TableError::DuplicateIndex { row: row_num, index: record.index });
        }
        if seen_name.insert(record.image_name.clone(), row_num).is_some() {
            return Err(TableError::DuplicateImageName { row: row_num, name: record.image_name });
        }
        records.push(record);
    }

    Ok(Dataset { headers, layout, records })
}

fn parse_record(row: usize, cells: Vec<String>, layout: &ColumnLayout) -> Result<Record, TableError> {
    let cell = |pos: usize| cells[pos].trim();
    let invalid = |column: &'static str, value: &str, reason: String| TableError::InvalidCell {
        row,
        column,
        value: value.to_string(),
        reason,
    };

    let index_text = cell(layout.index);
    if index_text.is_empty() {
        return Err(invalid(COL_INDEX, index_text, "missing value".to_string()));
    }
    let index = parse_integer(index_text).map_err(|e| invalid(COL_INDEX, index_text, e))?;

    let image_name = cell(layout.image_name).to_string();
    if image_name.is_empty() {
        return Err(invalid(COL_IMAGE_NAME, "", "missing value".to_string()));
    }

    let flag_text = cell(layout.label_flag);
    let label_flag = parse_flag(flag_text).map_err(|e| invalid(COL_LABEL_FLAG, flag_text, e))?;

    let type_text = cell(layout.pneumothorax_type);
    let pneumothorax_type: PneumothoraxType = type_text
        .parse()
        .map_err(|e| invalid(COL_TYPE, type_text, e))?;

    let measurement = |column: &'static str, pos: usize| -> Result<u32, TableError> {
        let text = cell(pos);
        if text.is_empty() {
            return Ok(0);
        }
        let value = parse_integer(text).map_err(|e| invalid(column, text, e))?;
        u32::try_from(value).map_err(|e| invalid(column, text, e.to_string()))
    };
    let measurement_a = measurement(COL_A, layout.measurement_a)?;
    let measurement_b = measurement(COL_B, layout.measurement_b)?;
    let measurement_c = measurement(COL_C, layout.measurement_c)?;

    let pct_text = cell(layout.pneumothorax_percentage);
    let pneumothorax_percentage = if pct_text.is_empty() {
        None
    } else {
        Some(
            pct_text
                .parse::<f64>()
                .map_err(|e| invalid(COL_PERCENTAGE, pct_text, e.to_string()))?,
        )
    };

    // 已知列由类型化字段负责写回，只保留透传列的原文
    let mut raw_cells = cells;
    for pos in layout.positions() {
        raw_cells[pos].clear();
    }

    Ok(Record {
        index,
        image_name,
        label_flag,
        pneumothorax_type,
        measurement_a,
        measurement_b,
        measurement_c,
        pneumothorax_percentage,
        raw_cells,
    })
}

/// 解析非负整数，接受表格工具写出的 "12.0" 形式
fn parse_integer(text: &str) -> Result<u64, String> {
    if let Ok(v) = text.parse::<u64>() {
        return Ok(v);
    }
    let f: f64 = text.parse().map_err(|_| "not a number".to_string())?;
    if !f.is_finite() || f < 0.0 || f.fract() != 0.0 || f > u64::MAX as f64 {
        return Err("expected a non-negative integer".to_string());
    }
    Ok(f as u64)
}

fn parse_flag(text: &str) -> Result<bool, String> {
    match text.to_lowercase().as_str() {
        "" | "0" | "0.0" | "false" => Ok(false),
        "1" | "1.0" | "true" => Ok(true),
        _ => Err("expected 0 or 1".to_string()),
    }
}

// ————————————————————————————————————————————————————————————————————————
// 序列化：Dataset -> CSV文本，非评分列原样保留
// ————————————————————————————————————————————————————————————————————————
pub fn write_table(dataset: &Dataset) -> Result<String, TableError> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(&dataset.headers)?;

    let layout = &dataset.layout;
    for record in &dataset.records {
        let mut cells = record.raw_cells.clone();
        cells.resize(dataset.headers.len(), String::new());

        cells[layout.index] = record.index.to_string();
        cells[layout.image_name] = record.image_name.clone();
        cells[layout.label_flag] = if record.label_flag { "1" } else { "0" }.to_string();
        cells[layout.pneumothorax_type] = record.pneumothorax_type.to_string();
        cells[layout.measurement_a] = record.measurement_a.to_string();
        cells[layout.measurement_b] = record.measurement_b.to_string();
        cells[layout.measurement_c] = record.measurement_c.to_string();
        cells[layout.pneumothorax_percentage] = record
            .pneumothorax_percentage
            .map(|p| p.to_string())
            .unwrap_or_default();

        writer.write_record(&cells)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TableError::Encode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| TableError::Encode(e.to_string()))
}
