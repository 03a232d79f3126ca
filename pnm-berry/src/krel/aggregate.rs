//! 多个 Krel 实现在公共饱和度网格上的聚合.

use std::collections::{BTreeMap, BTreeSet};

use ndarray::Array1;
use ordered_float::NotNan;

use super::table::KrelCycleTable;
use crate::consts::KREL_GRID_POINTS;
use crate::fitting;

/// 被插值的量.
const QUANTITIES: [&str; 4] = ["Pc", "Krw", "Kro", "RI"];

/// 单个实现在全部循环上的插值结果, 按 `QUANTITIES` 排列. 不带 RI 的实现 RI 为 `None`.
type Realization = [Option<Vec<f64>>; 4];

/// Krel 曲线聚合.
pub struct KrelTables;

impl KrelTables {
    /// 分段线性插值, 网格点落在 `[min xs, max xs]` 之外时为 `NaN`.
    /// 参见 [`fitting::interpolate`].
    #[inline]
    pub fn interpolate(grid: &[f64], xs: &[f64], ys: &[f64]) -> Vec<f64> {
        fitting::interpolate(grid, xs, ys)
    }

    /// 逐点对多个实现取均值, 跳过 `NaN`. 没有有效值的点为 `NaN`.
    pub fn calculate_mean(columns: &[&[f64]]) -> Vec<f64> {
        let len = columns.iter().map(|c| c.len()).max().unwrap_or(0);
        (0..len)
            .map(|i| {
                let (sum, n) = columns
                    .iter()
                    .filter_map(|c| c.get(i).copied())
                    .filter(|v| !v.is_nan())
                    .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
                if n == 0 {
                    f64::NAN
                } else {
                    sum / n as f64
                }
            })
            .collect()
    }

    /// 将全部实现插值到公共网格上.
    ///
    /// 网格为 `[0, max Sw]` 上的 201 个等距点, `max Sw` 取自全部实现. 每个循环占一段,
    /// 循环取全部实现的并集并升序排列. 输出列:
    ///
    /// - `Sw`, `cycle`: 网格与循环编号;
    /// - `Pc_n`, `Krw_n`, `Kro_n`, `RI_n`: 第 `n` 个实现 (自 0 起) 的插值结果,
    ///   缺少某一循环的实现在该段为 `NaN`; `RI_n` 只在该实现带有 RI 时输出;
    /// - `Pc_middle`, `Krw_middle`, `Kro_middle`, `RI_middle`: 均值, 参见
    ///   [`KrelTables::calculate_mean`].
    ///
    /// 没有任何行时返回空表.
    pub fn get_complete_dict(tables: &[KrelCycleTable]) -> BTreeMap<String, Vec<f64>> {
        let mut ans = BTreeMap::new();
        let cycles: Vec<u8> = tables
            .iter()
            .flat_map(|t| t.cycles())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let Some(max_sw) = tables
            .iter()
            .flat_map(|t| t.rows().iter().map(|r| r.sw))
            .filter_map(|v| NotNan::new(v).ok())
            .max()
        else {
            return ans;
        };
        let grid = Array1::linspace(0.0, max_sw.into_inner(), KREL_GRID_POINTS).to_vec();

        ans.insert(
            "Sw".to_string(),
            cycles.iter().flat_map(|_| grid.iter().copied()).collect(),
        );
        ans.insert(
            "cycle".to_string(),
            cycles
                .iter()
                .flat_map(|&c| std::iter::repeat(c as f64).take(grid.len()))
                .collect(),
        );

        let realizations = interpolate_all(tables, &cycles, &grid);
        for (q, name) in QUANTITIES.iter().enumerate() {
            let mut valid: Vec<&[f64]> = Vec::with_capacity(realizations.len());
            for (n, r) in realizations.iter().enumerate() {
                if let Some(column) = &r[q] {
                    ans.insert(format!("{name}_{n}"), column.clone());
                    valid.push(column);
                }
            }
            if !valid.is_empty() {
                ans.insert(format!("{name}_middle"), Self::calculate_mean(&valid));
            }
        }
        ans
    }
}

/// 单个实现: 每个循环的行按 Sw 稳定排序后插值.
fn interpolate_one(table: &KrelCycleTable, cycles: &[u8], grid: &[f64]) -> Realization {
    let with_ri = table.has_ri();
    let mut out: Realization = std::array::from_fn(|q| {
        (q != 3 || with_ri).then(|| Vec::with_capacity(grid.len() * cycles.len()))
    });

    for &cycle in cycles {
        let mut rows: Vec<_> = table
            .rows()
            .iter()
            .filter(|r| r.cycle == cycle && !r.sw.is_nan())
            .collect();
        rows.sort_by(|a, b| a.sw.total_cmp(&b.sw));
        let xs: Vec<f64> = rows.iter().map(|r| r.sw).collect();
        let values: [Vec<f64>; 4] = [
            rows.iter().map(|r| r.pc.unwrap_or(f64::NAN)).collect(),
            rows.iter().map(|r| r.krw).collect(),
            rows.iter().map(|r| r.kro).collect(),
            rows.iter().map(|r| r.ri.unwrap_or(f64::NAN)).collect(),
        ];
        for (column, ys) in out.iter_mut().zip(values.iter()) {
            if let Some(column) = column {
                column.extend(fitting::interpolate(grid, &xs, ys));
            }
        }
    }
    out
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

        fn interpolate_all(tables: &[KrelCycleTable], cycles: &[u8], grid: &[f64]) -> Vec<Realization> {
            tables
                .par_iter()
                .map(|t| interpolate_one(t, cycles, grid))
                .collect()
        }
    } else {
        fn interpolate_all(tables: &[KrelCycleTable], cycles: &[u8], grid: &[f64]) -> Vec<Realization> {
            tables
                .iter()
                .map(|t| interpolate_one(t, cycles, grid))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::krel::table::tests::table;
    use crate::krel::KrelRow;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_calculate_mean() {
        let a = [1.0, f64::NAN, f64::NAN];
        let b = [3.0, 4.0, f64::NAN];
        let m = KrelTables::calculate_mean(&[&a[..], &b[..]]);
        assert_eq!(m[0], 2.0);
        assert_eq!(m[1], 4.0);
        assert!(m[2].is_nan());
    }

    #[test]
    fn test_complete_dict_layout() {
        let t0 = table(&[
            (1, 1.0, 0.0, 1.0, 0.0),
            (1, 0.0, 10.0, 0.0, 1.0),
            (2, 0.5, 2.0, 0.2, 0.4),
            (2, 0.1, 4.0, 0.0, 0.8),
        ]);
        let t1 = table(&[(1, 0.0, 8.0, 0.0, 1.0), (1, 0.8, 0.0, 0.6, 0.0)]);
        let d = KrelTables::get_complete_dict(&[t0, t1]);

        let n = KREL_GRID_POINTS;
        assert_eq!(d["Sw"].len(), 2 * n);
        assert_eq!(d["cycle"][0], 1.0);
        assert_eq!(d["cycle"][n], 2.0);
        assert!(f64_eq(d["Sw"][n - 1], 1.0));
        assert!(d.contains_key("Kro_1"));
        assert!(!d.contains_key("RI_0"));
        assert!(!d.contains_key("RI_middle"));

        // 实现 1 没有循环 2.
        assert!(d["Krw_1"][n..].iter().all(|v| v.is_nan()));
        // 实现 0 的循环 2 只覆盖 [0.1, 0.5].
        let sw = &d["Sw"];
        let krw0 = &d["Krw_0"];
        for i in n..2 * n {
            assert_eq!(krw0[i].is_nan(), !(0.1..=0.5).contains(&sw[i]));
        }
        // Sw = 0.25, 行已按 Sw 排序: (0.1, 0.0) -> (0.5, 0.2).
        let i = n + 50;
        assert!(f64_eq(sw[i], 0.25));
        assert!(f64_eq(krw0[i], 0.075));
        assert!(f64_eq(d["Krw_middle"][i], 0.075));

        // 循环 1, Sw = 0.5: 两个实现都有效.
        let i = 100;
        let pc_mid = d["Pc_middle"][i];
        assert!(f64_eq(pc_mid, (5.0 + 8.0 * (1.0 - 0.5 / 0.8)) / 2.0));
        // Sw = 0.9 超出实现 1 的范围.
        let i = 180;
        assert!(f64_eq(d["Kro_middle"][i], d["Kro_0"][i]));
    }

    #[test]
    fn test_complete_dict_ri() {
        let rows = vec![
            KrelRow {
                cycle: 1,
                sw: 0.0,
                pc: None,
                krw: 0.0,
                kro: 1.0,
                ri: Some(10.0),
            },
            KrelRow {
                cycle: 1,
                sw: 1.0,
                pc: None,
                krw: 1.0,
                kro: 0.0,
                ri: Some(1.0),
            },
        ];
        let t = KrelCycleTable::new(rows).unwrap();
        let d = KrelTables::get_complete_dict(&[t]);
        assert!(f64_eq(d["RI_0"][100], 5.5));
        assert!(d["Pc_0"].iter().all(|v| v.is_nan()));
        assert!(d["Pc_middle"].iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_complete_dict_empty() {
        assert!(KrelTables::get_complete_dict(&[]).is_empty());
    }
}
