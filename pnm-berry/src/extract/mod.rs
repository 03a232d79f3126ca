//! 孔隙网络提取的编排.
//!
//! 根据输入选择后端 (单尺度分水岭提取, 或直接从区域构建网络), 运行属性推导流程,
//! 并将结果拆分为孔隙 / 喉道 / 网络三张表.

mod native;
mod params;

use std::collections::BTreeMap;

use ndarray::{Array3, ArrayView3, Zip};

use crate::consts::phase;
use crate::network::{
    align_axes_and_origin, blend_subresolution_porosity, compute_volume_summary,
    derive_geometry, fill_subresolution_porosity, flatten_vector_properties,
    replace_zero_porosity, BackendError, ExtractError, ExtractResult, NetworkTables, PoreNetwork,
    PoreProperty, RawNetwork, VolumeSource,
};
use crate::{Idx3d, Scale3d};

pub use native::NativeBackend;
pub use params::ExtractParams;

/// 后端一次提取的输出.
#[derive(Clone, Debug)]
pub struct Extraction {
    /// 弱类型属性表.
    pub network: RawNetwork,

    /// 后端实际使用的区域标签体数据. 从区域直接构建网络时为 `None`,
    /// 此时使用调用方提供的分水岭图像.
    pub regions: Option<Array3<i32>>,
}

/// 单尺度 (分水岭) 提取的参数.
#[derive(Clone, Debug)]
pub struct SnowParams {
    /// 每个相的距离图高斯模糊 sigma.
    pub sigma: BTreeMap<u8, f64>,

    /// 是否允许后端并行.
    pub parallel: bool,
}

/// 孔隙网络提取后端.
///
/// 后端返回 `Ok(None)` 表示没有提取到任何网络 (例如没有孔隙), 这不是错误.
pub trait ExtractionBackend {
    /// 从相数组 (0 为固体) 出发, 先做分水岭分割, 再构建网络.
    fn snow(
        &self,
        phases: ArrayView3<u8>,
        voxel_size: Scale3d,
        params: &SnowParams,
    ) -> Result<Option<Extraction>, BackendError>;

    /// 从已分割的区域标签 (0 为背景) 直接构建网络.
    /// `phases` 若存在, 用于确定每个孔隙所在的相. `parallel` 为假时后端不应并行.
    fn regions_to_network(
        &self,
        regions: ArrayView3<i32>,
        phases: Option<ArrayView3<u8>>,
        voxel_size: Scale3d,
        parallel: bool,
    ) -> Result<Option<Extraction>, BackendError>;
}

/// 一次提取请求.
#[derive(Clone, Debug, Default)]
pub struct ExtractRequest {
    /// 多相分割体数据, 0 为固体.
    pub multiphase: Option<Array3<u8>>,

    /// 分水岭区域标签, 0 为背景.
    pub watershed: Option<Array3<i32>>,

    /// 体素尺寸, 按体数据轴的顺序.
    pub voxel_scale: Scale3d,

    /// 体素孔隙度图, 取值 0-100.
    pub porosity_map: Option<Array3<f32>>,

    /// 提取参数.
    pub params: ExtractParams,
}

fn check_shape<T>(name: &'static str, a: &Array3<T>, expected: Idx3d) -> ExtractResult<()> {
    if a.dim() != expected {
        return Err(ExtractError::ShapeMismatch(name, a.dim(), expected));
    }
    Ok(())
}

/// 提取并推导完整的孔隙网络.
///
/// - 未提供分水岭图像时为单尺度模式, 必须提供多相数组, 调用 [`ExtractionBackend::snow`];
/// - 提供分水岭图像时调用 [`ExtractionBackend::regions_to_network`]. 若同时提供了多相数组,
///   则先将多相数组为 0 的体素在分水岭图像和孔隙度图中清零, 保证孔隙区域不跨越固体.
///
/// # 返回值
///
/// - 后端没有提取到网络 (或网络没有孔隙) 时, 返回 `Ok(None)`, 不做任何推导;
/// - 输入缺失, 形状不一致, 后端失败, 或属性不满足约束时, 返回 `Err`.
pub fn extract_network<B: ExtractionBackend + ?Sized>(
    backend: &B,
    request: ExtractRequest,
) -> ExtractResult<Option<PoreNetwork>> {
    let ExtractRequest {
        multiphase,
        watershed,
        voxel_scale: scale,
        mut porosity_map,
        params,
    } = request;

    let (extraction, input_shape, watershed) = match watershed {
        None => {
            let phases = multiphase
                .as_ref()
                .ok_or(ExtractError::MissingInput("multiphase"))?;
            let shape = phases.dim();
            if let Some(map) = porosity_map.as_ref() {
                check_shape("porosity_map", map, shape)?;
            }
            let snow = SnowParams {
                sigma: phases
                    .iter()
                    .copied()
                    .filter(|&p| !phase::is_solid(p))
                    .collect::<std::collections::BTreeSet<u8>>()
                    .into_iter()
                    .map(|p| (p, params.blur_of(p)))
                    .collect(),
                parallel: !params.force_cpu,
            };
            log::info!("extracting single-scale network, blur: {:?}", snow.sigma);
            (backend.snow(phases.view(), scale, &snow)?, shape, None)
        }
        Some(mut ws) => {
            let shape = ws.dim();
            if let Some(map) = porosity_map.as_ref() {
                check_shape("porosity_map", map, shape)?;
            }
            if let Some(phases) = multiphase.as_ref() {
                check_shape("multiphase", phases, shape)?;
                Zip::from(&mut ws).and(phases).for_each(|w, &p| {
                    if phase::is_solid(p) {
                        *w = 0;
                    }
                });
                if let Some(map) = porosity_map.as_mut() {
                    Zip::from(map).and(phases).for_each(|m, &p| {
                        if phase::is_solid(p) {
                            *m = 0.0;
                        }
                    });
                }
            }
            log::info!("extracting network from {shape:?} regions");
            let ex = backend.regions_to_network(
                ws.view(),
                multiphase.as_ref().map(|p| p.view()),
                scale,
                !params.force_cpu,
            )?;
            (ex, shape, Some(ws))
        }
    };

    let Some(Extraction { network, regions }) = extraction else {
        log::warn!("backend returned no network");
        return Ok(None);
    };
    let Some(regions) = regions.or(watershed) else {
        return Err(ExtractError::MissingInput("watershed"));
    };

    let flat = flatten_vector_properties(network);
    let has_porosity = flat.contains_key(PoreProperty::SubresolutionPorosity.as_key());
    let net = PoreNetwork::try_from_flat(flat)?;
    if net.pores.is_empty() {
        log::warn!("backend returned a network without pores");
        return Ok(None);
    }
    log::debug!(
        "raw network: {} pores, {} throats",
        net.pores.len(),
        net.throats.len()
    );

    let net = derive_geometry(net);
    let net = align_axes_and_origin(net, regions.view(), scale, input_shape)?;
    let net = match porosity_map.as_ref() {
        Some(map) if !has_porosity => fill_subresolution_porosity(net, regions.view(), map.view()),
        _ => net,
    };
    let net = blend_subresolution_porosity(replace_zero_porosity(net));

    let binary;
    let source = match (porosity_map.as_ref(), multiphase.as_ref()) {
        (Some(map), _) => VolumeSource::PorosityMap(map.view()),
        (None, Some(phases)) => VolumeSource::Phases(phases.view()),
        (None, None) => {
            binary = regions.mapv(|l| u8::from(l != 0));
            VolumeSource::Phases(binary.view())
        }
    };
    let summary = compute_volume_summary(&net, source, scale);

    Ok(Some(net.with_summary(summary)))
}

/// 同 [`extract_network`], 但将结果拆分为三张表.
pub fn extract<B: ExtractionBackend + ?Sized>(
    backend: &B,
    request: ExtractRequest,
) -> ExtractResult<Option<NetworkTables>> {
    Ok(extract_network(backend, request)?
        .map(|net| NetworkTables::partition(net.into_properties())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// 记录调用情况的后端, 返回固定网络.
    #[derive(Default)]
    struct MockBackend {
        snow_calls: Cell<u32>,
        region_calls: Cell<u32>,
        last_parallel: Cell<Option<bool>>,
        empty: bool,
        last_regions: std::cell::RefCell<Option<Array3<i32>>>,
    }

    impl MockBackend {
        fn network(&self) -> Option<Extraction> {
            if self.empty {
                return None;
            }
            let mut raw = crate::network::raw_line_network();
            raw.insert("pore.phase".into(), vec![1.0, 1.0, 1.0].into());
            Some(Extraction {
                network: raw,
                regions: None,
            })
        }
    }

    impl ExtractionBackend for MockBackend {
        fn snow(
            &self,
            phases: ArrayView3<u8>,
            _: Scale3d,
            params: &SnowParams,
        ) -> Result<Option<Extraction>, BackendError> {
            self.snow_calls.set(self.snow_calls.get() + 1);
            assert_eq!(params.sigma.keys().copied().collect::<Vec<_>>(), vec![1]);
            Ok(self.network().map(|mut ex| {
                ex.regions = Some(phases.mapv(|p| if p == 0 { 0 } else { 1 }));
                ex
            }))
        }

        fn regions_to_network(
            &self,
            regions: ArrayView3<i32>,
            _: Option<ArrayView3<u8>>,
            _: Scale3d,
            parallel: bool,
        ) -> Result<Option<Extraction>, BackendError> {
            self.region_calls.set(self.region_calls.get() + 1);
            self.last_parallel.set(Some(parallel));
            *self.last_regions.borrow_mut() = Some(regions.to_owned());
            Ok(self.network())
        }
    }

    fn line_watershed() -> Array3<i32> {
        Array3::from_shape_vec((1, 1, 6), vec![1, 1, 2, 2, 3, 3]).unwrap()
    }

    #[test]
    fn test_dispatch_regions_with_masking() {
        let backend = MockBackend::default();
        let multiphase = Array3::from_shape_vec((1, 1, 6), vec![1u8, 1, 1, 0, 1, 1]).unwrap();
        let request = ExtractRequest {
            multiphase: Some(multiphase),
            watershed: Some(line_watershed()),
            voxel_scale: [1.0; 3],
            ..Default::default()
        };
        let net = extract_network(&backend, request).unwrap().unwrap();

        assert_eq!(backend.region_calls.get(), 1);
        assert_eq!(backend.snow_calls.get(), 0);
        let seen = backend.last_regions.borrow().clone().unwrap();
        assert_eq!(seen.iter().copied().collect::<Vec<_>>(), vec![1, 1, 2, 0, 3, 3]);
        assert!(net.summary.is_some());
        assert_eq!(backend.last_parallel.get(), Some(true));
    }

    #[test]
    fn test_force_cpu_disables_parallel_regions() {
        let backend = MockBackend::default();
        let request = ExtractRequest {
            watershed: Some(line_watershed()),
            voxel_scale: [1.0; 3],
            params: ExtractParams {
                force_cpu: true,
                ..Default::default()
            },
            ..Default::default()
        };
        extract_network(&backend, request).unwrap().unwrap();
        assert_eq!(backend.last_parallel.get(), Some(false));
    }

    #[test]
    fn test_dispatch_snow() {
        let backend = MockBackend::default();
        let request = ExtractRequest {
            multiphase: Some(Array3::from_elem((1, 1, 6), 1u8)),
            voxel_scale: [1.0; 3],
            ..Default::default()
        };
        let tables = extract(&backend, request).unwrap().unwrap();
        assert_eq!(backend.snow_calls.get(), 1);
        assert_eq!(tables.pores.len(), 3);
        assert_eq!(tables.throats.len(), 2);
        assert_eq!(tables.network.width(), 17);
    }

    #[test]
    fn test_snow_requires_multiphase() {
        let backend = MockBackend::default();
        let err = extract(&backend, ExtractRequest::default()).unwrap_err();
        assert!(matches!(err, ExtractError::MissingInput("multiphase")));
    }

    #[test]
    fn test_empty_backend_result() {
        let backend = MockBackend {
            empty: true,
            ..Default::default()
        };
        let request = ExtractRequest {
            watershed: Some(line_watershed()),
            voxel_scale: [1.0; 3],
            ..Default::default()
        };
        assert!(extract(&backend, request).unwrap().is_none());
    }

    #[test]
    fn test_shape_mismatch() {
        let backend = MockBackend::default();
        let request = ExtractRequest {
            watershed: Some(line_watershed()),
            porosity_map: Some(Array3::zeros((1, 1, 5))),
            voxel_scale: [1.0; 3],
            ..Default::default()
        };
        let err = extract(&backend, request).unwrap_err();
        assert!(matches!(err, ExtractError::ShapeMismatch("porosity_map", _, _)));
        assert_eq!(backend.region_calls.get(), 0);
    }
}
