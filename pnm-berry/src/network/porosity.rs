//! 亚分辨率孔隙度.

use std::collections::HashMap;

use itertools::izip;
use ndarray::{ArrayView3, Zip};

use super::PoreNetwork;
use crate::consts::{phase, POROSITY_MAP_FULL};

/// 由孔隙度图 (0-100) 为每个孔隙填充亚分辨率孔隙度.
///
/// 亚分辨率孔隙 (`phase::UNRESOLVED`) 取其区域内孔隙度图的平均值 (换算为小数),
/// 其余孔隙取 1.0. 区域在 `watershed` 中不存在时取 0, 留给
/// [`replace_zero_porosity`] 处理.
///
/// 两个体数据的形状由调用方保证一致, 否则 panic.
pub fn fill_subresolution_porosity(
    mut net: PoreNetwork,
    watershed: ArrayView3<i32>,
    porosity_map: ArrayView3<f32>,
) -> PoreNetwork {
    // 标签 -> (孔隙度之和, 体素个数)
    let mut book: HashMap<i32, (f64, usize)> = HashMap::with_capacity(net.pores.len());
    Zip::from(&watershed)
        .and(&porosity_map)
        .for_each(|&label, &p| {
            if label != 0 {
                let e = book.entry(label).or_insert((0.0, 0));
                e.0 += p as f64;
                e.1 += 1;
            }
        });

    let pores = &mut net.pores;
    pores.subresolution_porosity = izip!(&pores.region_label, &pores.phase)
        .map(|(label, &ph)| {
            if !phase::is_unresolved(ph) {
                return 1.0;
            }
            match book.get(label) {
                Some(&(sum, n)) if n > 0 => {
                    (sum / n as f64 / POROSITY_MAP_FULL).clamp(0.0, 1.0)
                }
                _ => 0.0,
            }
        })
        .collect();
    net
}

/// 将孔隙的非正 (或无意义) 亚分辨率孔隙度替换为观测到的最小正值.
///
/// 若不存在任何正值, 则全部替换为 1.0. 处理后所有值都落在 `(0, 1]` 内,
/// 下游计算不会出现除以零.
pub fn replace_zero_porosity(mut net: PoreNetwork) -> PoreNetwork {
    let values = &mut net.pores.subresolution_porosity;
    let min_positive = values
        .iter()
        .copied()
        .filter(|v| *v > 0.0)
        .map(|v| v.min(1.0))
        .min_by(|a, b| a.total_cmp(b))
        .unwrap_or(1.0);

    for v in values.iter_mut() {
        if !(*v > 0.0) {
            *v = min_positive;
        } else if *v > 1.0 {
            *v = 1.0;
        }
    }
    net
}

/// 为每个喉道计算亚分辨率孔隙度:
///
/// - 两个端点都是亚分辨率孔隙: 按两端分段长度加权平均;
/// - 只有一个端点是亚分辨率孔隙: 取该端点的值;
/// - 否则为 1.0 (完全可分辨).
pub fn blend_subresolution_porosity(mut net: PoreNetwork) -> PoreNetwork {
    let pores = &net.pores;
    let throats = &mut net.throats;
    let porosity = &pores.subresolution_porosity;

    throats.subresolution_porosity = izip!(
        &throats.conns[0],
        &throats.conns[1],
        &throats.conns_0_length,
        &throats.conns_1_length
    )
    .map(|(&a, &b, &la, &lb)| {
        match (
            phase::is_unresolved(pores.phase[a]),
            phase::is_unresolved(pores.phase[b]),
        ) {
            (true, true) => {
                let total = la + lb;
                if total > 0.0 {
                    (porosity[a] * la + porosity[b] * lb) / total
                } else {
                    (porosity[a] + porosity[b]) / 2.0
                }
            }
            (true, false) => porosity[a],
            (false, true) => porosity[b],
            (false, false) => 1.0,
        }
    })
    .collect();
    net
}
