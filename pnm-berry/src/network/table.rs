//! 表格形式的网络输出.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 列式表格. 每列一个名称和一组 `f64`.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl Table {
    /// 追加一列.
    pub fn push_column(&mut self, name: impl Into<String>, column: Vec<f64>) {
        self.names.push(name.into());
        self.columns.push(column);
    }

    /// 列名.
    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// 按列名获取一列.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// 列数.
    #[inline]
    pub fn width(&self) -> usize {
        self.names.len()
    }

    /// 行数 (以第一列为准).
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// 是否没有行?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 遍历 `(列名, 列)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }
}

/// 孔隙表, 喉道表与网络表.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NetworkTables {
    /// `pore.*` 列.
    pub pores: Table,

    /// `throat.*` 列.
    pub throats: Table,

    /// `network.*` 列, 每列只有一个值.
    pub network: Table,
}

impl NetworkTables {
    /// 按键前缀 (`pore.`, `throat.`, `network.`) 将合并的属性表拆分为三张表.
    /// 不带这些前缀的键被丢弃.
    pub fn partition<I: IntoIterator<Item = (String, Vec<f64>)>>(properties: I) -> Self {
        let mut ans = Self::default();
        for (key, column) in properties {
            let table = if key.starts_with("pore.") {
                &mut ans.pores
            } else if key.starts_with("throat.") {
                &mut ans.throats
            } else if key.starts_with("network.") {
                &mut ans.network
            } else {
                log::debug!("dropping property `{key}` without entity prefix");
                continue;
            };
            table.push_column(key, column);
        }
        ans
    }
}
