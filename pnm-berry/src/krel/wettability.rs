//! Amott 与 USBM 润湿性指数.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::table::KrelCycleTable;
use crate::fitting::{floored_step, intersection_offset};

/// 毛管压力曲线穿过 0 的位置.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ZeroCrossing {
    /// 穿越发生在行 `index - 1` 与 `index` 之间.
    pub index: usize,

    /// 自 `sw[index - 1]` 起的饱和度偏移.
    pub offset: f64,

    /// 穿越处的饱和度, 即 `sw[index - 1] + offset`.
    pub saturation: f64,
}

/// 查找第一对符号发生变化的相邻行 (`> 0` 到 `<= 0`, 或 `< 0` 到 `>= 0`),
/// 并以线性插值求穿越点. 饱和度差值不小于 [`crate::consts::DS_FLOOR`].
pub fn find_zero_crossing(sw: &[f64], pc: &[f64]) -> Option<ZeroCrossing> {
    let index = (1..sw.len().min(pc.len())).find(|&i| {
        let (a, b) = (pc[i - 1], pc[i]);
        (a > 0.0 && b <= 0.0) || (a < 0.0 && b >= 0.0)
    })?;
    let ds = floored_step(sw[index] - sw[index - 1]);
    let slope = (pc[index] - pc[index - 1]) / ds;
    let offset = intersection_offset(pc[index - 1], -slope);
    Some(ZeroCrossing {
        index,
        offset,
        saturation: sw[index - 1] + offset,
    })
}

/// 梯形面积 `|Pc * dSw|`.
#[inline]
fn trapezoid(s0: f64, p0: f64, s1: f64, p1: f64) -> f64 {
    (0.5 * (p0 + p1) * (s1 - s0)).abs()
}

/// 以穿越点将曲线下的面积分为 `(自发部分, 强制部分)`.
pub fn split_area(sw: &[f64], pc: &[f64], crossing: &ZeroCrossing) -> (f64, f64) {
    let i = crossing.index;
    let before: f64 = (1..i)
        .map(|j| trapezoid(sw[j - 1], pc[j - 1], sw[j], pc[j]))
        .sum();
    let after: f64 = (i + 1..sw.len())
        .map(|j| trapezoid(sw[j - 1], pc[j - 1], sw[j], pc[j]))
        .sum();

    let s = crossing.saturation;
    let head = trapezoid(sw[i - 1], pc[i - 1], s, 0.0);
    let tail = trapezoid(s, 0.0, sw[i], pc[i]);
    (before + head, tail + after)
}

/// 润湿性指数.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Wettability {
    /// Amott 指数 `Iw - Io`.
    pub amott: f64,
    /// USBM 指数 `(a2 - a1) / (a1 + a2)`.
    pub usbm: f64,
}

#[inline]
fn ratio(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        0.0
    } else {
        a / b
    }
}

/// 由吸入循环 (2) 与二次排驱循环 (3) 计算润湿性指数.
///
/// - 吸入循环: `Iw = (s_spw - Sw_first) / (Sw_last - Sw_first)`, 其中 `s_spw`
///   为毛管压力穿越 0 处的饱和度;
/// - 排驱循环: `Io = (Sw_first - s_spo) / (Sw_first - Sw_last)`;
/// - `a1`, `a2` 分别为两个循环穿越点之后 (强制部分) 的面积.
///
/// 任一循环少于两行, 缺少毛管压力, 或毛管压力不穿越 0 时, 返回 `None`.
pub fn wettability_indices(table: &KrelCycleTable) -> Option<Wettability> {
    let imbibition = table.cycle(2);
    let drainage = table.cycle(3);
    if imbibition.len() < 2 || drainage.len() < 2 {
        return None;
    }
    let (Some(pc2), Some(pc3)) = (imbibition.pc.as_deref(), drainage.pc.as_deref()) else {
        log::debug!("wettability: missing capillary pressure");
        return None;
    };
    let (sw2, sw3) = (&imbibition.sw, &drainage.sw);

    let (Some(c2), Some(c3)) = (find_zero_crossing(sw2, pc2), find_zero_crossing(sw3, pc3)) else {
        log::debug!("wettability: capillary pressure never crosses zero");
        return None;
    };

    let (first2, last2) = (sw2[0], sw2[sw2.len() - 1]);
    let (first3, last3) = (sw3[0], sw3[sw3.len() - 1]);
    let iw = ratio(c2.saturation - first2, last2 - first2);
    let io = ratio(first3 - c3.saturation, first3 - last3);

    let (_, a1) = split_area(sw2, pc2, &c2);
    let (_, a2) = split_area(sw3, pc3, &c3);

    Some(Wettability {
        amott: iw - io,
        usbm: ratio(a2 - a1, a1 + a2),
    })
}
