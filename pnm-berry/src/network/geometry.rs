//! 几何属性推导.

use itertools::izip;

use super::PoreNetwork;
use crate::consts::{MID_LENGTH_RATIO, SHAPE_FACTOR_MAX, SHAPE_FACTOR_MIN};

/// 由内切圆直径和截面积计算喉道形状因子 `r^2 / (4A)`, 并截断到 `[0.01, 0.09]`.
///
/// 超出范围的值意味着退化的喉道, 这里直接截断而不是拒绝. 无法计算 (`0 / 0`)
/// 时取下限.
#[inline]
pub fn throat_shape_factor(inscribed_diameter: f64, area: f64) -> f64 {
    let r = inscribed_diameter / 2.0;
    let g = r * r / (4.0 * area);
    if g.is_nan() {
        SHAPE_FACTOR_MIN
    } else {
        g.clamp(SHAPE_FACTOR_MIN, SHAPE_FACTOR_MAX)
    }
}

/// 中段长度 `total - c0 - c1`, 不小于 `total` 的 1%.
#[inline]
pub fn floored_mid_length(total: f64, c0: f64, c1: f64) -> f64 {
    let mid = total - c0 - c1;
    let floor = MID_LENGTH_RATIO * total;
    if mid < floor {
        floor
    } else {
        mid
    }
}

/// 推导几何属性:
///
/// - `pore.radius`: 扩展直径的一半;
/// - `throat.shape_factor`: 参见 [`throat_shape_factor`];
/// - `throat.conns_{0,1}_length`: 端点孔隙扩展直径的一半;
/// - `throat.mid_length`: 参见 [`floored_mid_length`];
/// - `throat.volume`: 总长度乘以截面积;
/// - `pore.shape_factor`: 相连喉道形状因子的截面积加权平均.
///   没有喉道的孔隙为 0.
pub fn derive_geometry(mut net: PoreNetwork) -> PoreNetwork {
    let pores = &mut net.pores;
    let throats = &mut net.throats;

    pores.radius = pores.extended_diameter.iter().map(|d| d / 2.0).collect();

    throats.shape_factor = izip!(&throats.inscribed_diameter, &throats.cross_sectional_area)
        .map(|(&d, &a)| throat_shape_factor(d, a))
        .collect();

    throats.conns_0_length = throats.conns[0].iter().map(|&p| pores.radius[p]).collect();
    throats.conns_1_length = throats.conns[1].iter().map(|&p| pores.radius[p]).collect();
    throats.mid_length = izip!(
        &throats.total_length,
        &throats.conns_0_length,
        &throats.conns_1_length
    )
    .map(|(&t, &c0, &c1)| floored_mid_length(t, c0, c1))
    .collect();

    throats.volume = izip!(&throats.total_length, &throats.cross_sectional_area)
        .map(|(&l, &a)| l * a)
        .collect();

    // 两个累加器: 形状因子 * 截面积, 以及截面积.
    let mut weighted = vec![0.0; pores.len()];
    let mut area = vec![0.0; pores.len()];
    for (&c0, &c1, &g, &a) in izip!(
        &throats.conns[0],
        &throats.conns[1],
        &throats.shape_factor,
        &throats.cross_sectional_area
    ) {
        weighted[c0] += g * a;
        weighted[c1] += g * a;
        area[c0] += a;
        area[c1] += a;
    }
    pores.shape_factor = weighted
        .into_iter()
        .zip(area)
        .map(|(w, a)| if a == 0.0 { w } else { w / a })
        .collect();

    net
}
