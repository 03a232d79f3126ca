//! 样品、孔隙与喉道的体积 / 孔隙度统计.

use itertools::izip;
use ndarray::ArrayView3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::PoreNetwork;
use crate::consts::{phase, POROSITY_MAP_FULL};
use crate::Scale3d;

/// 体积统计的数据来源.
#[derive(Copy, Clone, Debug)]
pub enum VolumeSource<'a> {
    /// 体素孔隙度图, 取值 0-100.
    PorosityMap(ArrayView3<'a, f32>),

    /// 相数组. `phase::RESOLVED` 为可分辨孔隙, 其它非零值按孔隙度 1
    /// 计入亚分辨率体积, 0 为固体.
    Phases(ArrayView3<'a, u8>),
}

/// 17 个 `network.*` 标量.
///
/// 体积以 `scale` 的立方单位计, 孔隙度为相对样品体积的比例.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NetworkSummary {
    /// 样品总体积.
    pub sample_volume: f64,
    /// 可分辨孔隙体积.
    pub resolved_volume: f64,
    /// 亚分辨率孔隙体积 (已乘以体素孔隙度).
    pub subscale_volume: f64,
    /// 总孔隙体积.
    pub total_pore_volume: f64,
    /// 可分辨孔隙度.
    pub resolved_porosity: f64,
    /// 亚分辨率孔隙度.
    pub subscale_porosity: f64,
    /// 总孔隙度.
    pub total_porosity: f64,
    /// 可分辨孔隙 (网络实体) 体积.
    pub pores_resolved_volume: f64,
    /// 亚分辨率孔隙 (网络实体) 体积.
    pub pores_subscale_volume: f64,
    /// 孔隙 (网络实体) 总体积.
    pub pores_total_volume: f64,
    /// 可分辨喉道体积.
    pub throats_resolved_volume: f64,
    /// 亚分辨率喉道体积.
    pub throats_subscale_volume: f64,
    /// 喉道总体积.
    pub throats_total_volume: f64,
    /// 孔隙 (网络实体) 孔隙度.
    pub pores_porosity: f64,
    /// 喉道孔隙度.
    pub throats_porosity: f64,
    /// 网络 (孔隙 + 喉道) 总体积.
    pub network_volume: f64,
    /// 网络孔隙度.
    pub network_porosity: f64,
}

impl NetworkSummary {
    /// 以 `network.*` 为键导出.
    pub fn entries(&self) -> [(&'static str, f64); 17] {
        [
            ("network.sample_volume", self.sample_volume),
            ("network.resolved_volume", self.resolved_volume),
            ("network.subscale_volume", self.subscale_volume),
            ("network.total_pore_volume", self.total_pore_volume),
            ("network.resolved_porosity", self.resolved_porosity),
            ("network.subscale_porosity", self.subscale_porosity),
            ("network.total_porosity", self.total_porosity),
            ("network.pores_resolved_volume", self.pores_resolved_volume),
            ("network.pores_subscale_volume", self.pores_subscale_volume),
            ("network.pores_total_volume", self.pores_total_volume),
            ("network.throats_resolved_volume", self.throats_resolved_volume),
            ("network.throats_subscale_volume", self.throats_subscale_volume),
            ("network.throats_total_volume", self.throats_total_volume),
            ("network.pores_porosity", self.pores_porosity),
            ("network.throats_porosity", self.throats_porosity),
            ("network.network_volume", self.network_volume),
            ("network.network_porosity", self.network_porosity),
        ]
    }
}

/// 样品体积为 0 时比例记为 0.
#[inline]
fn ratio(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole
    } else {
        0.0
    }
}

/// 按体素统计 (可分辨孔隙体素个数, 亚分辨率孔隙度之和, 体素总数).
fn voxel_book(source: VolumeSource) -> (f64, f64, usize) {
    match source {
        VolumeSource::PorosityMap(map) => {
            let (mut resolved, mut subscale) = (0.0, 0.0);
            for &p in map.iter() {
                let p = p as f64;
                if p >= POROSITY_MAP_FULL {
                    resolved += 1.0;
                } else if p > 0.0 {
                    subscale += p / POROSITY_MAP_FULL;
                }
            }
            (resolved, subscale, map.len())
        }
        VolumeSource::Phases(phases) => {
            let (mut resolved, mut subscale) = (0.0, 0.0);
            for &p in phases.iter() {
                if phase::is_resolved(p) {
                    resolved += 1.0;
                } else if !phase::is_solid(p) {
                    subscale += 1.0;
                }
            }
            (resolved, subscale, phases.len())
        }
    }
}

/// 计算 17 个体积 / 孔隙度统计量.
///
/// 样品部分来自 `source` 的逐体素统计; 网络部分来自孔隙体积和喉道体积:
/// 可分辨孔隙计入 `pores_resolved_volume`, 亚分辨率孔隙按其孔隙度计入
/// `pores_subscale_volume`; 喉道亚分辨率孔隙度为 1 时视为可分辨喉道.
pub fn compute_volume_summary(
    net: &PoreNetwork,
    source: VolumeSource,
    scale: Scale3d,
) -> NetworkSummary {
    let voxel = scale[0] * scale[1] * scale[2];
    let (resolved_voxels, subscale_voxels, all_voxels) = voxel_book(source);

    let sample_volume = all_voxels as f64 * voxel;
    let resolved_volume = resolved_voxels * voxel;
    let subscale_volume = subscale_voxels * voxel;
    let total_pore_volume = resolved_volume + subscale_volume;

    let pores = &net.pores;
    let (mut pores_resolved_volume, mut pores_subscale_volume) = (0.0, 0.0);
    for (&ph, &v, &p) in izip!(&pores.phase, &pores.volume, &pores.subresolution_porosity) {
        if phase::is_unresolved(ph) {
            pores_subscale_volume += v * p;
        } else {
            pores_resolved_volume += v;
        }
    }
    let pores_total_volume = pores_resolved_volume + pores_subscale_volume;

    let throats = &net.throats;
    let (mut throats_resolved_volume, mut throats_subscale_volume) = (0.0, 0.0);
    for (&v, &p) in izip!(&throats.volume, &throats.subresolution_porosity) {
        if p >= 1.0 {
            throats_resolved_volume += v;
        } else {
            throats_subscale_volume += v * p;
        }
    }
    let throats_total_volume = throats_resolved_volume + throats_subscale_volume;
    let network_volume = pores_total_volume + throats_total_volume;

    NetworkSummary {
        sample_volume,
        resolved_volume,
        subscale_volume,
        total_pore_volume,
        resolved_porosity: ratio(resolved_volume, sample_volume),
        subscale_porosity: ratio(subscale_volume, sample_volume),
        total_porosity: ratio(total_pore_volume, sample_volume),
        pores_resolved_volume,
        pores_subscale_volume,
        pores_total_volume,
        throats_resolved_volume,
        throats_subscale_volume,
        throats_total_volume,
        pores_porosity: ratio(pores_total_volume, sample_volume),
        throats_porosity: ratio(throats_total_volume, sample_volume),
        network_volume,
        network_porosity: ratio(network_volume, sample_volume),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::raw::tests::line_network;
    use crate::network::{
        blend_subresolution_porosity, derive_geometry, flatten_vector_properties, RawColumn,
    };
    use ndarray::Array3;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-10
    }

    #[test]
    fn test_summary_from_porosity_map() {
        let net = derive_geometry(
            PoreNetwork::try_from_flat(flatten_vector_properties(line_network())).unwrap(),
        );
        let map = Array3::from_shape_vec((1, 2, 2), vec![100.0f32, 50.0, 0.0, 25.0]).unwrap();
        let s = compute_volume_summary(&net, VolumeSource::PorosityMap(map.view()), [2.0; 3]);

        assert!(f64_eq(s.sample_volume, 32.0));
        assert!(f64_eq(s.resolved_volume, 8.0));
        assert!(f64_eq(s.subscale_volume, 6.0));
        assert!(f64_eq(s.total_porosity, 14.0 / 32.0));
        assert!(f64_eq(s.pores_resolved_volume, 6.0));
        assert!(f64_eq(s.pores_subscale_volume, 0.0));
        // 两条喉道, 每条 2.0 * 1.0.
        assert!(f64_eq(s.throats_resolved_volume, 4.0));
        assert!(f64_eq(s.network_volume, 10.0));
        assert!(f64_eq(s.network_porosity, 10.0 / 32.0));
    }

    #[test]
    fn test_summary_from_phases() {
        let mut raw = line_network();
        raw.insert("pore.phase".into(), RawColumn::from(vec![2.0, 1.0, 1.0]));
        raw.insert(
            "pore.subresolution_porosity".into(),
            RawColumn::from(vec![0.5, 1.0, 1.0]),
        );
        let net = blend_subresolution_porosity(derive_geometry(
            PoreNetwork::try_from_flat(flatten_vector_properties(raw)).unwrap(),
        ));
        let phases = Array3::from_shape_vec((1, 1, 4), vec![0u8, 1, 2, 1]).unwrap();
        let s = compute_volume_summary(&net, VolumeSource::Phases(phases.view()), [1.0; 3]);

        assert!(f64_eq(s.sample_volume, 4.0));
        assert!(f64_eq(s.resolved_volume, 2.0));
        assert!(f64_eq(s.subscale_volume, 1.0));
        assert!(f64_eq(s.pores_subscale_volume, 1.0));
        assert!(f64_eq(s.pores_resolved_volume, 4.0));
        // 喉道 0 连接亚分辨率孔隙 0, 孔隙度 0.5.
        assert!(f64_eq(s.throats_subscale_volume, 1.0));
        assert!(f64_eq(s.throats_resolved_volume, 2.0));
        assert_eq!(s.entries().len(), 17);
    }
}
