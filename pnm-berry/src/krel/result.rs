//! 按参数集累积的 Krel 指标, 及其表格导出.

use std::fmt;
use std::io::{self, Write};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::analysis::{krel_curve_analysis, KrelResultRow};
use super::table::KrelCycleTable;
use super::TableResult;

/// 表格单元格.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Cell {
    /// 数值.
    Number(f64),
    /// 文本.
    Text(String),
    /// 缺失.
    #[default]
    Empty,
}

impl Cell {
    /// 数值单元格的值.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Number(v as f64)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Text(v.to_string())
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Cell::Text(v)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Text(s) => f.write_str(s),
            Cell::Empty => Ok(()),
        }
    }
}

/// 一条记录: 有序的 `(列名, 单元格)`.
type Record = Vec<(String, Cell)>;

/// Krel 指标累积器.
///
/// 每条记录由 `input-<参数名>` 参数列与 `result-<指标名>` 指标列组成.
/// 该结构不做内部同步, 并行时每个工作线程持有一个实例, 最后用 [`KrelResult::merge`] 合并.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KrelResult {
    records: Vec<Record>,
}

impl KrelResult {
    /// 空累积器.
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 是否没有记录?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 分析 `table` 并追加一条记录, 返回分析结果.
    pub fn add_single_result<I, K, V>(&mut self, params: I, table: &KrelCycleTable) -> KrelResultRow
    where
        I: IntoIterator<Item = (K, V)>,
        K: fmt::Display,
        V: Into<Cell>,
    {
        let row = krel_curve_analysis(table);
        let mut record: Record = params
            .into_iter()
            .map(|(k, v)| (format!("input-{k}"), v.into()))
            .collect();
        record.extend(
            row.entries()
                .into_iter()
                .map(|(k, v)| (format!("result-{k}"), Cell::Number(v))),
        );
        self.records.push(record);
        row
    }

    /// 同 [`KrelResult::add_single_result`], 但表格以列的形式给出.
    /// 列校验失败时不追加记录.
    pub fn add_table_result<I, K, V, C, N>(
        &mut self,
        params: I,
        columns: C,
    ) -> TableResult<KrelResultRow>
    where
        I: IntoIterator<Item = (K, V)>,
        K: fmt::Display,
        V: Into<Cell>,
        C: IntoIterator<Item = (N, Vec<f64>)>,
        N: AsRef<str>,
    {
        let table = KrelCycleTable::from_columns(columns)?;
        Ok(self.add_single_result(params, &table))
    }

    /// 合并另一个累积器的全部记录.
    pub fn merge(&mut self, other: KrelResult) {
        self.records.extend(other.records);
    }

    /// 导出为表格: 列为全部记录列名的并集 (按首次出现的顺序), 每条记录一行,
    /// 缺失的单元格为 [`Cell::Empty`].
    pub fn to_dataframe(&self) -> ResultFrame {
        let mut columns: Vec<String> = Vec::new();
        for (name, _) in self.records.iter().flatten() {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
        let rows = self
            .records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| {
                        record
                            .iter()
                            .find(|(name, _)| name == c)
                            .map_or(Cell::Empty, |(_, cell)| cell.clone())
                    })
                    .collect()
            })
            .collect();
        ResultFrame { columns, rows }
    }
}

/// 行式结果表.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResultFrame {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

/// CSV 字段转义.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

impl ResultFrame {
    /// 列名.
    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// 全部行.
    #[inline]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// 第 `row` 行 `column` 列的单元格.
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let c = self.columns.iter().position(|n| n == column)?;
        self.rows.get(row).map(|r| &r[c])
    }

    /// 写出为 CSV, 首行为列名.
    pub fn write_csv<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let header: Vec<String> = self.columns.iter().map(|c| csv_field(c)).collect();
        writeln!(w, "{}", header.join(","))?;
        for row in self.rows.iter() {
            let line: Vec<String> = row.iter().map(|c| csv_field(&c.to_string())).collect();
            writeln!(w, "{}", line.join(","))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::krel::table::tests::table;
    use crate::krel::KrelError;

    fn imbibition() -> KrelCycleTable {
        table(&[(2, 0.2, 1.0, 0.0, 0.8), (2, 0.7, -1.0, 0.4, 0.1)])
    }

    #[test]
    fn test_dataframe_union() {
        let mut r = KrelResult::new();
        r.add_single_result([("sample", Cell::from("A")), ("rate", Cell::from(1.5))], &imbibition());
        r.add_single_result([("rate", 2.0)], &imbibition());

        let df = r.to_dataframe();
        assert_eq!(df.columns()[0], "input-sample");
        assert_eq!(df.columns()[1], "input-rate");
        assert_eq!(df.columns()[2], "result-swi");
        assert_eq!(df.columns().len(), 2 + 13);
        assert_eq!(df.rows().len(), 2);
        assert_eq!(df.get(1, "input-sample"), Some(&Cell::Empty));
        assert_eq!(df.get(1, "input-rate"), Some(&Cell::Number(2.0)));
        assert_eq!(df.get(0, "result-swr").and_then(Cell::as_number), Some(0.7));
        assert_eq!(df.get(0, "missing"), None);
    }

    #[test]
    fn test_add_table_result() {
        let mut r = KrelResult::new();
        let err = r
            .add_table_result([("n", 1.0)], [("cycle", vec![2.0])])
            .unwrap_err();
        assert_eq!(err, KrelError::MissingColumn("Sw".into()));
        assert!(r.is_empty());

        let row = r
            .add_table_result(
                [("n", 1.0)],
                [
                    ("cycle", vec![2.0, 2.0]),
                    ("Sw", vec![0.3, 0.6]),
                    ("Krw", vec![0.0, 0.2]),
                    ("Kro", vec![0.7, 0.1]),
                ],
            )
            .unwrap();
        assert_eq!(row.swi, 0.3);
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn test_merge_and_csv() {
        let mut a = KrelResult::new();
        a.add_single_result([("name", "x,y")], &imbibition());
        let mut b = KrelResult::new();
        b.add_single_result([("name", "plain")], &imbibition());
        a.merge(b);
        assert_eq!(a.len(), 2);

        let mut out = Vec::new();
        a.to_dataframe().write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("input-name,result-swi,"));
        assert!(lines[1].starts_with("\"x,y\",0.2,"));
        assert!(lines[2].starts_with("plain,0.2,"));
    }
}
