//! 多循环 Krel 表格.

use std::collections::BTreeSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{KrelError, TableResult};

/// 表格中的一行.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KrelRow {
    /// 循环编号, 1..=3.
    pub cycle: u8,
    /// 水相饱和度.
    pub sw: f64,
    /// 毛管压力.
    pub pc: Option<f64>,
    /// 水相相对渗透率.
    pub krw: f64,
    /// 油相相对渗透率.
    pub kro: f64,
    /// 电阻率指数.
    pub ri: Option<f64>,
}

/// 单个循环的各列, 保持原始行序.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CycleSeries {
    /// 饱和度.
    pub sw: Vec<f64>,
    /// 毛管压力. 任一行缺失时为 `None`.
    pub pc: Option<Vec<f64>>,
    /// 水相相对渗透率.
    pub krw: Vec<f64>,
    /// 油相相对渗透率.
    pub kro: Vec<f64>,
    /// 电阻率指数. 任一行缺失时为 `None`.
    pub ri: Option<Vec<f64>>,
}

impl CycleSeries {
    /// 行数.
    #[inline]
    pub fn len(&self) -> usize {
        self.sw.len()
    }

    /// 是否没有行?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sw.is_empty()
    }
}

/// 多循环 Krel 表格.
///
/// 同一循环内的饱和度不要求单调.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KrelCycleTable {
    rows: Vec<KrelRow>,
}

fn check_cycle(row: usize, value: f64) -> TableResult<u8> {
    if value.fract() == 0.0 && (1.0..=3.0).contains(&value) {
        Ok(value as u8)
    } else {
        Err(KrelError::InvalidCycle { row, value })
    }
}

impl KrelCycleTable {
    /// 由行构建. 循环编号必须是 1, 2 或 3.
    pub fn new(rows: Vec<KrelRow>) -> TableResult<Self> {
        for (i, r) in rows.iter().enumerate() {
            check_cycle(i, r.cycle as f64)?;
        }
        Ok(Self { rows })
    }

    /// 由列构建. 必需列: `cycle`, `Sw`, `Krw`, `Kro`; 可选列: `Pc`, `RI`.
    /// 其余列被忽略.
    ///
    /// # 返回值
    ///
    /// - 缺少必需列时, 返回 `Err(KrelError::MissingColumn)`;
    /// - 列长度不一致时, 返回 `Err(KrelError::LengthMismatch)`;
    /// - 循环编号非法时, 返回 `Err(KrelError::InvalidCycle)`.
    pub fn from_columns<I, K>(columns: I) -> TableResult<Self>
    where
        I: IntoIterator<Item = (K, Vec<f64>)>,
        K: AsRef<str>,
    {
        let (mut cycle, mut sw, mut pc, mut krw, mut kro, mut ri) =
            (None, None, None, None, None, None);
        for (k, v) in columns {
            let slot = match k.as_ref() {
                "cycle" => &mut cycle,
                "Sw" => &mut sw,
                "Pc" => &mut pc,
                "Krw" => &mut krw,
                "Kro" => &mut kro,
                "RI" => &mut ri,
                _ => continue,
            };
            *slot = Some(v);
        }

        let required = |name: &str, c: Option<Vec<f64>>| {
            c.ok_or_else(|| KrelError::MissingColumn(name.to_string()))
        };
        let cycle = required("cycle", cycle)?;
        let sw = required("Sw", sw)?;
        let krw = required("Krw", krw)?;
        let kro = required("Kro", kro)?;

        let n = cycle.len();
        let columns = [
            ("Sw", Some(&sw)),
            ("Krw", Some(&krw)),
            ("Kro", Some(&kro)),
            ("Pc", pc.as_ref()),
            ("RI", ri.as_ref()),
        ];
        for (name, c) in columns {
            if let Some(c) = c {
                if c.len() != n {
                    return Err(KrelError::LengthMismatch(name.to_string(), c.len(), n));
                }
            }
        }

        let rows = cycle
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Ok(KrelRow {
                    cycle: check_cycle(i, c)?,
                    sw: sw[i],
                    pc: pc.as_ref().map(|p| p[i]),
                    krw: krw[i],
                    kro: kro[i],
                    ri: ri.as_ref().map(|r| r[i]),
                })
            })
            .collect::<TableResult<Vec<_>>>()?;
        Ok(Self { rows })
    }

    /// 全部行.
    #[inline]
    pub fn rows(&self) -> &[KrelRow] {
        &self.rows
    }

    /// 出现过的循环编号.
    pub fn cycles(&self) -> BTreeSet<u8> {
        self.rows.iter().map(|r| r.cycle).collect()
    }

    /// 是否每一行都有电阻率指数 (且表格非空)?
    pub fn has_ri(&self) -> bool {
        !self.rows.is_empty() && self.rows.iter().all(|r| r.ri.is_some())
    }

    /// 循环 `cycle` 的各列, 保持原始行序.
    pub fn cycle(&self, cycle: u8) -> CycleSeries {
        let rows: Vec<&KrelRow> = self.rows.iter().filter(|r| r.cycle == cycle).collect();
        CycleSeries {
            sw: rows.iter().map(|r| r.sw).collect(),
            pc: rows.iter().map(|r| r.pc).collect(),
            krw: rows.iter().map(|r| r.krw).collect(),
            kro: rows.iter().map(|r| r.kro).collect(),
            ri: rows.iter().map(|r| r.ri).collect(),
        }
    }
}
