// src/cursor.rs
use crate::models::{Dataset, Record};

/// 当前会话中正在查看的记录位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    current_index: usize,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn at(index: usize) -> Self {
        Self { current_index: index }
    }

    pub fn index(&self) -> usize {
        self.current_index
    }

    /// 从当前位置向前跳过所有已评分的记录，返回第一条未评分的记录
    ///
    /// 跳过时会推进`current_index`；到达表尾时返回None（全部评分完毕）
    pub fn current<'a>(&mut self, dataset: &'a Dataset) -> Option<&'a Record> {
        while let Some(record) = dataset.get(self.current_index) {
            if !record.label_flag {
                return Some(record);
            }
            self.current_index += 1;
        }
        None
    }

    /// 不跳过，直接取当前位置的记录
    pub fn peek<'a>(&self, dataset: &'a Dataset) -> Option<&'a Record> {
        dataset.get(self.current_index)
    }

    pub fn advance(&mut self, len: usize) {
        let last = len.saturating_sub(1);
        self.current_index = (self.current_index + 1).min(last);
    }

    pub fn retreat(&mut self) {
        self.current_index = self.current_index.saturating_sub(1);
    }

    /// 游标已越过表尾
    #[cfg(test)]
    pub fn is_exhausted(&self, dataset: &Dataset) -> bool {
        self.current_index >= dataset.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ColumnLayout;

    fn create_dataset(flags: &[bool]) -> Dataset {
        let records = flags
            .iter()
            .enumerate()
            .map(|(i, &flag)| {
                let mut record = Record::new(i as u64, format!("img_{:03}.png", i));
                record.label_flag = flag;
                record
            })
            .collect();
        Dataset {
            headers: Vec::new(),
            layout: ColumnLayout {
                index: 0,
                image_name: 1,
                label_flag: 2,
                pneumothorax_type: 3,
                measurement_a: 4,
                measurement_b: 5,
                measurement_c: 6,
                pneumothorax_percentage: 7,
            },
            records,
        }
    }

    #[test]
    fn test_current_returns_first_unlabeled_from_any_start() {
        let patterns: [&[bool]; 5] = [
            &[false, false, false],
            &[true, false, true, false],
            &[true, true, true],
            &[false, true, true, false, true],
            &[],
        ];
        for flags in patterns {
            let dataset = create_dataset(flags);
            for start in 0..=flags.len() {
                let mut cursor = Cursor::at(start);
                let expected = (start..flags.len()).find(|&j| !flags[j]);
                let got = cursor.current(&dataset).map(|r| r.index as usize);
                assert_eq!(got, expected, "flags {:?} start {}", flags, start);
                if let Some(j) = expected {
                    assert_eq!(cursor.index(), j);
                } else {
                    assert!(cursor.is_exhausted(&dataset));
                }
            }
        }
    }

    #[test]
    fn test_all_labeled_returns_none() {
        let dataset = create_dataset(&[true, true, true]);
        let mut cursor = Cursor::new();
        assert!(cursor.current(&dataset).is_none());
        assert_eq!(cursor.index(), 3);
    }

    #[test]
    fn test_save_then_advance_scenario() {
        // 三条记录都未评分
        let mut dataset = create_dataset(&[false, false, false]);
        let mut cursor = Cursor::new();
        assert_eq!(cursor.current(&dataset).map(|r| r.index), Some(0));

        dataset.records[0].label_flag = true;
        cursor.advance(dataset.len());
        assert_eq!(cursor.current(&dataset).map(|r| r.index), Some(1));

        // 记录1已评分时直接跳到2
        let mut dataset = create_dataset(&[false, true, false]);
        let mut cursor = Cursor::new();
        assert_eq!(cursor.current(&dataset).map(|r| r.index), Some(0));
        dataset.records[0].label_flag = true;
        cursor.advance(dataset.len());
        assert_eq!(cursor.current(&dataset).map(|r| r.index), Some(2));
    }

    #[test]
    fn test_navigation_is_clamped() {
        let len = 3;
        let mut cursor = Cursor::new();
        cursor.retreat();
        assert_eq!(cursor.index(), 0);

        for _ in 0..10 {
            cursor.advance(len);
            assert!(cursor.index() < len);
        }
        assert_eq!(cursor.index(), 2);

        for _ in 0..10 {
            cursor.retreat();
        }
        assert_eq!(cursor.index(), 0);

        // 空表时保持为0
        let mut cursor = Cursor::new();
        cursor.advance(0);
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn test_retreat_can_land_on_labeled_record() {
        let dataset = create_dataset(&[true, false]);
        let mut cursor = Cursor::new();
        assert_eq!(cursor.current(&dataset).map(|r| r.index), Some(1));
        cursor.retreat();
        assert_eq!(cursor.peek(&dataset).map(|r| r.label_flag), Some(true));
    }
}
