//! 从区域标签体数据构建孔隙网络.

use std::collections::{BTreeMap, HashMap};
use std::f64::consts::PI;

use ndarray::{Array2, ArrayView3, Zip};

use super::edt::distance_transform;
use crate::network::{RawColumn, RawNetwork};
use crate::Scale3d;

/// 单个区域的逐体素统计.
#[derive(Default)]
struct RegionBook {
    voxels: usize,
    position_sum: [f64; 3],
    max_distance: f64,
    phase_counts: BTreeMap<u8, usize>,
}

impl RegionBook {
    /// 出现次数最多的相, 并列时取编号最小者.
    fn majority_phase(&self) -> u8 {
        self.phase_counts
            .iter()
            .fold((1, 0), |(best, n), (&p, &c)| if c > n { (p, c) } else { (best, n) })
            .0
    }
}

/// 构建区域邻接网络.
///
/// - 每个正标签是一个孔隙: 体积为体素数乘以体素体积, 坐标为体素中心的平均值
///   (按体数据轴的顺序), 等效直径为等体积球直径, 内切直径为区域内距离图最大值的两倍,
///   扩展直径取两者较大者;
/// - 6-邻接的两个不同正标签之间是一条喉道: 截面积为公共面个数乘以面积,
///   内切直径为等面积圆直径, 长度为孔心距离.
///
/// 没有正标签时返回 `None`.
pub(crate) fn region_adjacency_network(
    regions: ArrayView3<i32>,
    phases: Option<ArrayView3<u8>>,
    voxel_size: Scale3d,
    parallel: bool,
) -> Option<RawNetwork> {
    let distance = distance_transform(regions.mapv(|l| l > 0).view(), voxel_size, parallel);

    let mut books: BTreeMap<i32, RegionBook> = BTreeMap::new();
    Zip::indexed(&regions)
        .and(&distance)
        .for_each(|(z, y, x), &label, &d| {
            if label <= 0 {
                return;
            }
            let book = books.entry(label).or_default();
            book.voxels += 1;
            for (axis, i) in [z, y, x].into_iter().enumerate() {
                book.position_sum[axis] += (i as f64 + 0.5) * voxel_size[axis];
            }
            book.max_distance = book.max_distance.max(d);
            let phase = phases.map_or(1, |p| p[(z, y, x)]);
            *book.phase_counts.entry(phase).or_default() += 1;
        });
    if books.is_empty() {
        return None;
    }

    // 公共面面积, 以 (小标签, 大标签) 为键.
    let face_area = [
        voxel_size[1] * voxel_size[2],
        voxel_size[0] * voxel_size[2],
        voxel_size[0] * voxel_size[1],
    ];
    let (nz, ny, nx) = regions.dim();
    let mut shared: BTreeMap<(i32, i32), f64> = BTreeMap::new();
    for ((z, y, x), &a) in regions.indexed_iter() {
        if a <= 0 {
            continue;
        }
        let forward = [
            (z + 1 < nz).then(|| (z + 1, y, x)),
            (y + 1 < ny).then(|| (z, y + 1, x)),
            (x + 1 < nx).then(|| (z, y, x + 1)),
        ];
        for (axis, n) in forward.into_iter().enumerate() {
            let Some(n) = n else { continue };
            let b = regions[n];
            if b > 0 && b != a {
                *shared.entry((a.min(b), a.max(b))).or_default() += face_area[axis];
            }
        }
    }

    let voxel = voxel_size.iter().product::<f64>();
    let index: HashMap<i32, usize> = books.keys().enumerate().map(|(i, &l)| (l, i)).collect();
    let pores = books.len();

    let mut coords = Array2::zeros((pores, 3));
    let mut label_col = Vec::with_capacity(pores);
    let mut volume = Vec::with_capacity(pores);
    let mut equivalent = Vec::with_capacity(pores);
    let mut inscribed = Vec::with_capacity(pores);
    let mut extended = Vec::with_capacity(pores);
    let mut phase = Vec::with_capacity(pores);
    for (i, (&label, book)) in books.iter().enumerate() {
        let n = book.voxels as f64;
        for axis in 0..3 {
            coords[(i, axis)] = book.position_sum[axis] / n;
        }
        let v = n * voxel;
        let eq = (6.0 * v / PI).cbrt();
        let ins = 2.0 * book.max_distance;
        label_col.push(label as f64);
        volume.push(v);
        equivalent.push(eq);
        inscribed.push(ins);
        extended.push(eq.max(ins));
        phase.push(book.majority_phase() as f64);
    }

    let throats = shared.len();
    let mut conns = Array2::zeros((throats, 2));
    let mut area = Vec::with_capacity(throats);
    let mut throat_inscribed = Vec::with_capacity(throats);
    let mut length = Vec::with_capacity(throats);
    for (t, (&(a, b), &s)) in shared.iter().enumerate() {
        let (ia, ib) = (index[&a], index[&b]);
        conns[(t, 0)] = ia as f64;
        conns[(t, 1)] = ib as f64;
        area.push(s);
        throat_inscribed.push(2.0 * (s / PI).sqrt());
        let d = (0..3)
            .map(|axis| (coords[(ia, axis)] - coords[(ib, axis)]).powi(2))
            .sum::<f64>()
            .sqrt();
        length.push(d);
    }
    log::debug!("region adjacency: {pores} pores, {throats} throats");

    let mut net = RawNetwork::new();
    let mut put = |k: &str, c: RawColumn| {
        net.insert(k.to_string(), c);
    };
    put("pore.region_label", label_col.into());
    put("pore.coords", coords.into());
    put("pore.volume", volume.into());
    put("pore.equivalent_diameter", equivalent.into());
    put("pore.inscribed_diameter", inscribed.into());
    put("pore.extended_diameter", extended.into());
    put("pore.phase", phase.into());
    put("throat.conns", conns.into());
    put("throat.cross_sectional_area", area.into());
    put("throat.inscribed_diameter", throat_inscribed.into());
    put("throat.direct_length", length.clone().into());
    put("throat.total_length", length.into());
    Some(net)
}
