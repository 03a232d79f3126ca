//! 欧几里得距离变换与可分离高斯模糊.
//!
//! 两者都按轴逐条处理一维数据 (lane), 因此可以在 `rayon` 特性下按 lane 并行.

use ndarray::{Array3, ArrayView3, ArrayViewMut1, Axis, Zip};

use crate::Scale3d;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        /// 对 `a` 的每一条沿 `axis` 的 lane 实施 `op`. `parallel` 为真时借助 `rayon` 并行.
        fn for_each_lane<F>(a: &mut Array3<f64>, axis: usize, parallel: bool, op: F)
        where
            F: Fn(ArrayViewMut1<f64>) + Sync + Send,
        {
            let lanes = Zip::from(a.lanes_mut(Axis(axis)));
            if parallel {
                lanes.par_for_each(op);
            } else {
                lanes.for_each(op);
            }
        }
    } else {
        /// 对 `a` 的每一条沿 `axis` 的 lane 实施 `op`.
        fn for_each_lane<F>(a: &mut Array3<f64>, axis: usize, _parallel: bool, op: F)
        where
            F: Fn(ArrayViewMut1<f64>) + Sync + Send,
        {
            Zip::from(a.lanes_mut(Axis(axis))).for_each(op);
        }
    }
}

/// 一维平方距离变换 (Felzenszwalb & Huttenlocher), 采样间距为 `step`.
///
/// `f` 中的无穷大样本不参与下包络. 若全部样本均为无穷大, 输出保持无穷大.
fn squared_dt_1d(f: &[f64], step: f64, out: &mut [f64]) {
    let n = f.len();
    let mut v: Vec<usize> = Vec::with_capacity(n);
    let mut z: Vec<f64> = Vec::with_capacity(n);
    let pos = |q: usize| q as f64 * step;

    for q in 0..n {
        if !f[q].is_finite() {
            continue;
        }
        loop {
            let Some(&p) = v.last() else {
                v.push(q);
                z.push(f64::NEG_INFINITY);
                break;
            };
            let (xq, xp) = (pos(q), pos(p));
            let s = ((f[q] + xq * xq) - (f[p] + xp * xp)) / (2.0 * (xq - xp));
            // `z` 与 `v` 同步增减, 此处非空.
            if z.last().is_some_and(|&zl| s <= zl) {
                v.pop();
                z.pop();
            } else {
                v.push(q);
                z.push(s);
                break;
            }
        }
    }

    if v.is_empty() {
        out.fill(f64::INFINITY);
        return;
    }
    let mut k = 0;
    for (q, o) in out.iter_mut().enumerate() {
        let x = pos(q);
        while k + 1 < z.len() && z[k + 1] < x {
            k += 1;
        }
        *o = (x - pos(v[k])).powi(2) + f[v[k]];
    }
}

/// 前景体素到最近背景体素的欧几里得距离 (物理单位). 背景体素为 0.
///
/// 体数据之外视为背景, 因此结果总是有限值.
pub(crate) fn distance_transform(
    mask: ArrayView3<bool>,
    spacing: Scale3d,
    parallel: bool,
) -> Array3<f64> {
    let mut d = mask.mapv(|m| if m { f64::INFINITY } else { 0.0 });

    for (axis, &step) in spacing.iter().enumerate() {
        for_each_lane(&mut d, axis, parallel, |mut lane| {
            // 两端各补一个背景样本.
            let n = lane.len();
            let mut f = Vec::with_capacity(n + 2);
            f.push(0.0);
            f.extend(lane.iter().copied());
            f.push(0.0);
            let mut out = vec![0.0; n + 2];
            squared_dt_1d(&f, step, &mut out);
            for (dst, src) in lane.iter_mut().zip(&out[1..=n]) {
                *dst = *src;
            }
        });
    }
    d.mapv_inplace(f64::sqrt);
    d
}

/// 归一化的一维高斯核, 半径为 `ceil(4 sigma)`.
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (4.0 * sigma).ceil() as isize;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|x| (-((x * x) as f64) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);
    kernel
}

/// 可分离高斯模糊, 边界按复制 (replicate) 方式延拓. `sigma` 以体素为单位,
/// 不大于 0 时原样返回.
pub(crate) fn gaussian_blur(mut a: Array3<f64>, sigma: f64, parallel: bool) -> Array3<f64> {
    if !(sigma > 0.0) {
        return a;
    }
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;

    for axis in 0..3 {
        for_each_lane(&mut a, axis, parallel, |mut lane| {
            let src = lane.to_vec();
            let last = src.len() as isize - 1;
            for (i, dst) in lane.iter_mut().enumerate() {
                *dst = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, w)| {
                        let j = (i as isize + k as isize - radius).clamp(0, last);
                        w * src[j as usize]
                    })
                    .sum();
            }
        });
    }
    a
}
