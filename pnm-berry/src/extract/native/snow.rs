//! 基于距离图峰值的标记分水岭分割.

use std::collections::VecDeque;

use binary_heap_plus::BinaryHeap;
use ndarray::{Array3, ArrayView3, Zip};

use super::edt::{distance_transform, gaussian_blur};
use crate::{Idx3d, Scale3d};

/// 位于体数据 `dim` 内部的 26-邻域.
fn neighbours26((z, y, x): Idx3d, (nz, ny, nx): Idx3d) -> impl Iterator<Item = Idx3d> {
    (-1isize..=1)
        .flat_map(|dz| (-1isize..=1).flat_map(move |dy| (-1isize..=1).map(move |dx| (dz, dy, dx))))
        .filter(|&d| d != (0, 0, 0))
        .filter_map(move |(dz, dy, dx)| {
            let p = (
                z.checked_add_signed(dz)?,
                y.checked_add_signed(dy)?,
                x.checked_add_signed(dx)?,
            );
            (p.0 < nz && p.1 < ny && p.2 < nx).then_some(p)
        })
}

/// 位于体数据 `dim` 内部的 6-邻域.
pub(crate) fn neighbours6((z, y, x): Idx3d, (nz, ny, nx): Idx3d) -> impl Iterator<Item = Idx3d> {
    [
        (z.wrapping_sub(1), y, x),
        (z + 1, y, x),
        (z, y.wrapping_sub(1), x),
        (z, y + 1, x),
        (z, y, x.wrapping_sub(1)),
        (z, y, x + 1),
    ]
    .into_iter()
    .filter(move |p| p.0 < nz && p.1 < ny && p.2 < nx)
}

/// 距离图在 `mask` 内的区域极大值, 按 26-连通分量编号为 `first, first + 1, ...`.
///
/// 一个体素若不小于 `mask` 内全部 26-邻居且取值为正, 则是峰值体素;
/// 相互连通的峰值体素 (平台) 共用一个标记.
///
/// 返回标记图与使用的标记个数.
fn find_markers(dt: ArrayView3<f64>, mask: ArrayView3<bool>, first: i32) -> (Array3<i32>, i32) {
    let dim = dt.dim();
    let mut peak = Array3::from_elem(dim, false);
    Zip::indexed(&mut peak)
        .and(&dt)
        .and(&mask)
        .for_each(|pos, is_peak, &v, &m| {
            *is_peak = m
                && v > 0.0
                && neighbours26(pos, dim).all(|n| !mask[n] || dt[n] <= v);
        });

    let mut markers = Array3::zeros(dim);
    let mut count = 0;
    let mut queue = VecDeque::new();
    for (pos, &is_peak) in peak.indexed_iter() {
        if !is_peak || markers[pos] != 0 {
            continue;
        }
        let label = first + count;
        count += 1;
        markers[pos] = label;
        queue.push_back(pos);
        while let Some(p) = queue.pop_front() {
            for n in neighbours26(p, dim) {
                if peak[n] && markers[n] == 0 {
                    markers[n] = label;
                    queue.push_back(n);
                }
            }
        }
    }
    (markers, count)
}

/// 以 `markers` 为种子, 在 `mask` 内按距离值从高到低实施优先级泛洪.
///
/// `mask` 内与任何标记都不连通的体素保持为 0.
fn flood(dt: ArrayView3<f64>, mask: ArrayView3<bool>, mut markers: Array3<i32>) -> Array3<i32> {
    let dim = dt.dim();
    // 堆顶距离值最大; 相等时先入堆者优先, 使结果与遍历顺序无关.
    let mut heap: BinaryHeap<(f64, usize, Idx3d), _> =
        BinaryHeap::new_by(|a: &(f64, usize, Idx3d), b: &(f64, usize, Idx3d)| {
            a.0.total_cmp(&b.0).then_with(|| b.1.cmp(&a.1))
        });

    let mut order = 0;
    for (pos, &m) in markers.indexed_iter() {
        if m != 0 {
            heap.push((dt[pos], order, pos));
            order += 1;
        }
    }

    while let Some((_, _, pos)) = heap.pop() {
        let label = markers[pos];
        for n in neighbours6(pos, dim) {
            if mask[n] && markers[n] == 0 {
                markers[n] = label;
                heap.push((dt[n], order, n));
                order += 1;
            }
        }
    }
    markers
}

/// 对相数组逐相实施标记分水岭分割.
///
/// 每个非零相独立处理: 距离变换, 以 `sigma(phase)` 模糊, 取区域极大值作为标记,
/// 再泛洪. 不同相的标签依次偏移, 互不重叠. 固体体素标签为 0.
pub(crate) fn snow_partition<F>(
    phases: ArrayView3<u8>,
    voxel_size: Scale3d,
    sigma: F,
    parallel: bool,
) -> Array3<i32>
where
    F: Fn(u8) -> f64,
{
    let mut present = [false; 256];
    phases.iter().for_each(|&p| present[p as usize] = true);

    let mut regions = Array3::zeros(phases.dim());
    let mut offset = 0;
    for phase in (1..=u8::MAX).filter(|&p| present[p as usize]) {
        let mask = phases.mapv(|p| p == phase);
        let dt = gaussian_blur(
            distance_transform(mask.view(), voxel_size, parallel),
            sigma(phase),
            parallel,
        );
        let (markers, count) = find_markers(dt.view(), mask.view(), offset + 1);
        let labels = flood(dt.view(), mask.view(), markers);
        log::debug!("phase {phase}: {count} regions");

        Zip::from(&mut regions).and(&labels).for_each(|r, &l| {
            if l != 0 {
                *r = l;
            }
        });
        offset += count;
    }
    regions
}
