// src/grading.rs
use thiserror::Error;
use crate::models::{PneumothoraxType, Record};

pub const MEASUREMENT_MIN: u32 = 0;
pub const MEASUREMENT_MAX: u32 = 100;

/// 气胸体积百分比：4.2 + 4.7 * (A + B + C)
///
/// 不做范围检查，输入边界由表单负责
pub fn compute_percentage(a: u32, b: u32, c: u32) -> f64 {
    4.2 + 4.7 * (f64::from(a) + f64::from(b) + f64::from(c))
}

#[derive(Debug, Error, PartialEq)]
pub enum GradeError {
    #[error("measurement {field} = {value} is outside [0, 100]")]
    OutOfRange { field: &'static str, value: u32 },
}

/// 表单中可聚焦的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Type,
    A,
    B,
    C,
}

impl FormField {
    pub const ALL: [FormField; 4] = [FormField::Type, FormField::A, FormField::B, FormField::C];

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Type => "Pneumothorax Type",
            FormField::A => "Value for A",
            FormField::B => "Value for B",
            FormField::C => "Value for C",
        }
    }

    fn position(&self) -> usize {
        Self::ALL.iter().position(|f| f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// 用户输入的一次评分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GradeInput {
    pub pneumothorax_type: PneumothoraxType,
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

impl GradeInput {
    /// 以记录当前的值作为表单初值
    pub fn from_record(record: &Record) -> Self {
        Self {
            pneumothorax_type: record.pneumothorax_type,
            a: record.measurement_a.min(MEASUREMENT_MAX),
            b: record.measurement_b.min(MEASUREMENT_MAX),
            c: record.measurement_c.min(MEASUREMENT_MAX),
        }
    }

    pub fn percentage(&self) -> f64 {
        compute_percentage(self.a, self.b, self.c)
    }

    pub fn validate(&self) -> Result<(), GradeError> {
        for (field, value) in [("A", self.a), ("B", self.b), ("C", self.c)] {
            if !(MEASUREMENT_MIN..=MEASUREMENT_MAX).contains(&value) {
                return Err(GradeError::OutOfRange { field, value });
            }
        }
        Ok(())
    }

    /// 写入五个字段并标记为已评分；校验失败时记录保持不变
    pub fn apply_to(&self, record: &mut Record) -> Result<(), GradeError> {
        self.validate()?;
        record.pneumothorax_type = self.pneumothorax_type;
        record.measurement_a = self.a;
        record.measurement_b = self.b;
        record.measurement_c = self.c;
        record.pneumothorax_percentage = Some(self.percentage());
        record.label_flag = true;
        Ok(())
    }

    fn value_mut(&mut self, field: FormField) -> Option<&mut u32> {
        match field {
            FormField::Type => None,
            FormField::A => Some(&mut self.a),
            FormField::B => Some(&mut self.b),
            FormField::C => Some(&mut self.c),
        }
    }

    pub fn value(&self, field: FormField) -> Option<u32> {
        match field {
            FormField::Type => None,
            FormField::A => Some(self.a),
            FormField::B => Some(self.b),
            FormField::C => Some(self.c),
        }
    }

    /// 数值+1（上限100）或切换类型
    pub fn increment(&mut self, field: FormField) {
        match self.value_mut(field) {
            Some(v) => *v = (*v + 1).min(MEASUREMENT_MAX),
            None => self.pneumothorax_type = self.pneumothorax_type.toggled(),
        }
    }

    /// 数值-1（下限0）或切换类型
    pub fn decrement(&mut self, field: FormField) {
        match self.value_mut(field) {
            Some(v) => *v = v.saturating_sub(1),
            None => self.pneumothorax_type = self.pneumothorax_type.toggled(),
        }
    }

    /// 在数值末尾追加一位数字，超过上限时截为100
    pub fn push_digit(&mut self, field: FormField, digit: u32) {
        if let Some(v) = self.value_mut(field) {
            *v = (*v * 10 + digit).min(MEASUREMENT_MAX);
        }
    }

    pub fn pop_digit(&mut self, field: FormField) {
        if let Some(v) = self.value_mut(field) {
            *v /= 10;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_percentage() {
        assert_eq!(compute_percentage(0, 0, 0), 4.2);
        assert_eq!(compute_percentage(1, 2, 3), 4.2 + 4.7 * 6.0);
        assert!((compute_percentage(1, 2, 3) - 32.4).abs() < 1e-9);
        assert!((compute_percentage(100, 100, 100) - 1414.2).abs() < 1e-9);
    }

    #[test]
    fn test_compute_percentage_accepts_out_of_range() {
        // 不检查范围
        assert!((compute_percentage(150, 0, 0) - (4.2 + 4.7 * 150.0)).abs() < 1e-9);
        assert!(compute_percentage(u32::MAX, u32::MAX, u32::MAX).is_finite());
    }

    #[test]
    fn test_apply_to_record() {
        let mut record = Record::new(3, "c.png");
        let input = GradeInput {
            pneumothorax_type: PneumothoraxType::Tension,
            a: 1,
            b: 2,
            c: 3,
        };
        input.apply_to(&mut record).unwrap();

        assert!(record.label_flag);
        assert_eq!(record.pneumothorax_type, PneumothoraxType::Tension);
        assert_eq!(
            (record.measurement_a, record.measurement_b, record.measurement_c),
            (1, 2, 3)
        );
        assert_eq!(record.pneumothorax_percentage, Some(compute_percentage(1, 2, 3)));
    }

    #[test]
    fn test_out_of_range_is_rejected_without_mutation() {
        let mut record = Record::new(3, "c.png");
        let input = GradeInput {
            b: 101,
            ..GradeInput::default()
        };
        assert_eq!(
            input.apply_to(&mut record),
            Err(GradeError::OutOfRange { field: "B", value: 101 })
        );
        assert_eq!(record, Record::new(3, "c.png"));
    }

    #[test]
    fn test_seeded_from_record() {
        let mut record = Record::new(0, "a.png");
        record.pneumothorax_type = PneumothoraxType::Tension;
        record.measurement_a = 12;
        record.measurement_c = 250;
        let input = GradeInput::from_record(&record);
        assert_eq!(input.pneumothorax_type, PneumothoraxType::Tension);
        assert_eq!((input.a, input.b, input.c), (12, 0, 100));
    }

    #[test]
    fn test_editing_stays_within_bounds() {
        let mut input = GradeInput::default();
        input.decrement(FormField::A);
        assert_eq!(input.a, 0);

        input.push_digit(FormField::A, 9);
        input.push_digit(FormField::A, 9);
        assert_eq!(input.a, 99);
        input.increment(FormField::A);
        input.increment(FormField::A);
        assert_eq!(input.a, 100);
        input.push_digit(FormField::A, 5);
        assert_eq!(input.a, 100);
        input.pop_digit(FormField::A);
        assert_eq!(input.a, 10);

        input.increment(FormField::Type);
        assert_eq!(input.pneumothorax_type, PneumothoraxType::Tension);
        input.push_digit(FormField::Type, 3);
        assert_eq!(input.value(FormField::Type), None);
    }

    #[test]
    fn test_field_focus_cycles() {
        assert_eq!(FormField::Type.next(), FormField::A);
        assert_eq!(FormField::C.next(), FormField::Type);
        assert_eq!(FormField::Type.previous(), FormField::C);
    }
}
