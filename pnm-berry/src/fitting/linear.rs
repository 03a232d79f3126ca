//! 分段线性工具.

use num::Float;

use crate::consts::DS_FLOOR;

/// 相邻饱和度之差, 不小于 [`DS_FLOOR`].
#[inline]
pub fn floored_step(ds: f64) -> f64 {
    ds.max(DS_FLOOR)
}

/// 两条直线 `a(s) = a0 + s * da`, `b(s) = b0 + s * db` 的交点位置 `s`.
///
/// `gap = a0 - b0`, `slope_diff = db - da`. 两线平行 (`slope_diff == 0`) 时返回 0.
#[inline]
pub fn intersection_offset(gap: f64, slope_diff: f64) -> f64 {
    if slope_diff == 0.0 {
        0.0
    } else {
        gap / slope_diff
    }
}

/// 在 `grid` 上对 `(xs, ys)` 分段线性插值.
///
/// `xs` 必须非递减. 落在 `[xs[0], xs[last]]` 之外的点 (以及 `xs` 为空时的全部点)
/// 结果为 `NaN`, 不做外推. `xs` 有重复值时取靠右的一段.
pub fn interpolate<T: Float>(grid: &[T], xs: &[T], ys: &[T]) -> Vec<T> {
    debug_assert_eq!(xs.len(), ys.len());
    let (Some(&lo), Some(&hi)) = (xs.first(), xs.last()) else {
        return vec![T::nan(); grid.len()];
    };

    grid.iter()
        .map(|&x| {
            if !(lo..=hi).contains(&x) {
                return T::nan();
            }
            let i = xs.partition_point(|&v| v <= x);
            if i == xs.len() {
                return ys[i - 1];
            }
            // xs[i - 1] <= x < xs[i]
            let (x0, x1) = (xs[i - 1], xs[i]);
            let t = (x - x0) / (x1 - x0);
            ys[i - 1] + t * (ys[i] - ys[i - 1])
        })
        .collect()
}
