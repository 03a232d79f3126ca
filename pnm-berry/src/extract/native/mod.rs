//! 纯 Rust 实现的提取后端.

mod edt;
mod regions;
mod snow;

use ndarray::ArrayView3;

use super::{Extraction, ExtractionBackend, SnowParams};
use crate::network::BackendError;
use crate::Scale3d;

/// 内置的 CPU 提取后端.
///
/// - [`ExtractionBackend::snow`]: 逐相距离变换, 高斯模糊, 区域极大值标记与优先级泛洪;
/// - [`ExtractionBackend::regions_to_network`]: 区域邻接网络.
#[derive(Copy, Clone, Debug, Default)]
pub struct NativeBackend;

impl ExtractionBackend for NativeBackend {
    fn snow(
        &self,
        phases: ArrayView3<u8>,
        voxel_size: Scale3d,
        params: &SnowParams,
    ) -> Result<Option<Extraction>, BackendError> {
        check_voxel_size(voxel_size)?;
        if !params.parallel {
            log::info!("force_cpu requested; native backend always runs on cpu");
        }
        let regions = snow::snow_partition(
            phases,
            voxel_size,
            |p| params.sigma.get(&p).copied().unwrap_or(0.0),
            params.parallel,
        );
        let network =
            regions::region_adjacency_network(regions.view(), Some(phases), voxel_size, params.parallel);
        Ok(network.map(|network| Extraction {
            network,
            regions: Some(regions),
        }))
    }

    fn regions_to_network(
        &self,
        regions: ArrayView3<i32>,
        phases: Option<ArrayView3<u8>>,
        voxel_size: Scale3d,
        parallel: bool,
    ) -> Result<Option<Extraction>, BackendError> {
        check_voxel_size(voxel_size)?;
        let network = regions::region_adjacency_network(regions, phases, voxel_size, parallel);
        Ok(network.map(|network| Extraction {
            network,
            regions: None,
        }))
    }
}

fn check_voxel_size(voxel_size: Scale3d) -> Result<(), BackendError> {
    if voxel_size.iter().all(|s| s.is_finite() && *s > 0.0) {
        Ok(())
    } else {
        Err(BackendError(format!("invalid voxel size {voxel_size:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_invalid_voxel_size() {
        let ws = ndarray::Array3::from_elem((2, 2, 2), 1);
        let err = NativeBackend
            .regions_to_network(ws.view(), None, [1.0, 0.0, 1.0], true)
            .unwrap_err();
        assert!(err.0.contains("voxel size"));
    }

    #[test]
    fn test_snow_all_solid() {
        let phases = ndarray::Array3::<u8>::zeros((3, 3, 3));
        let params = SnowParams {
            sigma: BTreeMap::new(),
            parallel: false,
        };
        let ex = NativeBackend.snow(phases.view(), [1.0; 3], &params).unwrap();
        assert!(ex.is_none());
    }
}
