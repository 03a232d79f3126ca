//! 提取编排的端到端测试.

use ndarray::{Array3, ArrayView3};
use pnm_berry::network::BackendError;
use pnm_berry::prelude::*;

fn f64_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// 多个测试共享同一个全局 logger, 只有第一次初始化生效.
fn init_logger() {
    let _ = simple_logger::init_with_level(log::Level::Debug);
}

fn column<'a>(t: &'a Table, name: &str) -> &'a [f64] {
    t.column(name)
        .unwrap_or_else(|| panic!("missing column {name}"))
}

/// 沿第 0 轴分为两半的分水岭: 前半为区域 1, 后半为区域 2.
fn two_halves() -> Array3<i32> {
    Array3::from_shape_fn((4, 4, 4), |(x, _, _)| if x < 2 { 1 } else { 2 })
}

#[test]
fn regions_network_end_to_end() {
    init_logger();
    let request = ExtractRequest {
        multiphase: Some(Array3::from_elem((4, 4, 4), RESOLVED)),
        watershed: Some(two_halves()),
        voxel_scale: [1.0, 2.0, 3.0],
        ..Default::default()
    };
    let t = extract(&NativeBackend, request).unwrap().unwrap();

    assert_eq!(t.pores.len(), 2);
    assert_eq!(t.throats.len(), 1);
    assert_eq!(column(&t.pores, "pore.region_label"), &[1.0, 2.0]);

    // 第 0 轴的首尾切片对应交换后的 coords_2.
    assert_eq!(column(&t.pores, "pore.xmin"), &[1.0, 0.0]);
    assert_eq!(column(&t.pores, "pore.xmax"), &[0.0, 1.0]);
    assert_eq!(column(&t.pores, "pore.coords_2"), &[0.0, 4.0]);
    // 两个区域都接触第 1 轴的两端, 远端覆盖近端.
    assert_eq!(column(&t.pores, "pore.coords_1"), &[8.0, 8.0]);

    // 公共面 4 x 4 个, 每个面积 2 x 3.
    assert_eq!(column(&t.throats, "throat.cross_sectional_area"), &[96.0]);
    // 圆形截面的形状因子为 1 / (4 pi).
    let g = column(&t.throats, "throat.shape_factor")[0];
    assert!(f64_eq(g, 1.0 / (4.0 * std::f64::consts::PI)));
    // 孔心距离从 2 变为 4, 总长度等比放大.
    assert!(f64_eq(column(&t.throats, "throat.direct_length")[0], 4.0));
    assert!(f64_eq(column(&t.throats, "throat.total_length")[0], 4.0));
    let mid = column(&t.throats, "throat.mid_length")[0];
    assert!(mid >= 0.04 - 1e-12);
    assert_eq!(column(&t.throats, "throat.subresolution_porosity"), &[1.0]);

    assert_eq!(column(&t.network, "network.sample_volume"), &[384.0]);
    assert_eq!(column(&t.network, "network.resolved_porosity"), &[1.0]);
    assert_eq!(t.network.width(), 17);
}

#[test]
fn solid_voxels_are_masked() {
    let mut phases = Array3::from_elem((4, 4, 4), RESOLVED);
    // 区域 2 的一半是固体.
    for y in 0..4 {
        for z in 0..4 {
            phases[(3, y, z)] = SOLID;
        }
    }
    let request = ExtractRequest {
        multiphase: Some(phases),
        watershed: Some(two_halves()),
        voxel_scale: [1.0, 1.0, 1.0],
        ..Default::default()
    };
    let net = extract_network(&NativeBackend, request).unwrap().unwrap();
    assert_eq!(net.pores.volume, vec![32.0, 16.0]);
    // 区域 2 不再接触第 0 轴的尾切片.
    assert_eq!(net.pores.coords[2][1], 2.5);
    let s = net.summary.unwrap();
    assert!(f64_eq(s.resolved_porosity, 0.75));
}

#[test]
fn snow_with_porosity_map() {
    init_logger();
    // 第 2 轴前半为可分辨孔隙, 后半为亚分辨率孔隙.
    let phases = Array3::from_shape_fn((4, 4, 8), |(_, _, z)| {
        if z < 4 {
            RESOLVED
        } else {
            UNRESOLVED
        }
    });
    let map = phases.mapv(|p| if p == RESOLVED { 100.0f32 } else { 40.0 });
    let request = ExtractRequest {
        multiphase: Some(phases),
        watershed: None,
        voxel_scale: [1.0, 1.0, 1.0],
        porosity_map: Some(map),
        params: ExtractParams::default(),
    };
    let net = extract_network(&NativeBackend, request).unwrap().unwrap();

    let pores = &net.pores;
    assert!(pores.len() >= 2);
    assert!(pores.phase.contains(&RESOLVED));
    assert!(pores.phase.contains(&UNRESOLVED));
    for (&ph, &p) in pores.phase.iter().zip(&pores.subresolution_porosity) {
        let expected = if ph == UNRESOLVED { 0.4 } else { 1.0 };
        assert!(f64_eq(p, expected), "phase {ph}: {p}");
    }
    assert!(net.throats.shape_factor.iter().all(|g| (0.01..=0.09).contains(g)));
    assert!(net
        .throats
        .subresolution_porosity
        .iter()
        .all(|p| f64_eq(*p, 0.4) || f64_eq(*p, 1.0)));

    let s = net.summary.unwrap();
    assert_eq!(s.sample_volume, 128.0);
    assert!(f64_eq(s.resolved_porosity, 0.5));
    assert!(f64_eq(s.subscale_porosity, 0.2));
    assert!(f64_eq(s.total_porosity, 0.7));
}

#[test]
fn all_solid_yields_none() {
    let request = ExtractRequest {
        multiphase: Some(Array3::from_elem((3, 3, 3), SOLID)),
        voxel_scale: [1.0, 1.0, 1.0],
        ..Default::default()
    };
    assert!(extract(&NativeBackend, request).unwrap().is_none());
}

#[test]
fn missing_inputs_are_rejected() {
    let request = ExtractRequest {
        voxel_scale: [1.0, 1.0, 1.0],
        ..Default::default()
    };
    assert!(matches!(
        extract(&NativeBackend, request),
        Err(ExtractError::MissingInput("multiphase"))
    ));

    let request = ExtractRequest {
        watershed: Some(two_halves()),
        porosity_map: Some(Array3::zeros((4, 4, 3))),
        voxel_scale: [1.0, 1.0, 1.0],
        ..Default::default()
    };
    assert!(matches!(
        extract(&NativeBackend, request),
        Err(ExtractError::ShapeMismatch("porosity_map", (4, 4, 3), (4, 4, 4)))
    ));
}

/// 总是失败的后端.
struct FailingBackend;

impl ExtractionBackend for FailingBackend {
    fn snow(
        &self,
        _: ArrayView3<u8>,
        _: Scale3d,
        _: &SnowParams,
    ) -> Result<Option<Extraction>, BackendError> {
        Err(BackendError("out of memory".to_string()))
    }

    fn regions_to_network(
        &self,
        _: ArrayView3<i32>,
        _: Option<ArrayView3<u8>>,
        _: Scale3d,
        _: bool,
    ) -> Result<Option<Extraction>, BackendError> {
        Ok(None)
    }
}

#[test]
fn backend_failures_propagate() {
    let request = ExtractRequest {
        multiphase: Some(Array3::from_elem((2, 2, 2), RESOLVED)),
        voxel_scale: [1.0, 1.0, 1.0],
        ..Default::default()
    };
    let err = extract(&FailingBackend, request).unwrap_err();
    assert!(matches!(err, ExtractError::Backend(_)));
    assert_eq!(
        err.to_string(),
        "Pore network extraction failed: out of memory"
    );

    let request = ExtractRequest {
        watershed: Some(two_halves()),
        voxel_scale: [1.0, 1.0, 1.0],
        ..Default::default()
    };
    assert!(extract(&FailingBackend, request).unwrap().is_none());
}

#[test]
fn invalid_voxel_size_is_a_backend_error() {
    let request = ExtractRequest {
        watershed: Some(two_halves()),
        voxel_scale: [1.0, -1.0, 1.0],
        ..Default::default()
    };
    assert!(matches!(
        extract(&NativeBackend, request),
        Err(ExtractError::Backend(_))
    ));
}

#[cfg(feature = "serde")]
#[test]
fn params_from_json() {
    let p = ExtractParams::from_json(r#"{"watershed_blur": {"1": 0.2, " 2 ": 0.0}}"#).unwrap();
    assert_eq!(p.blur_of(1), 0.2);
    assert_eq!(p.blur_of(2), 0.0);
    assert_eq!(p.blur_of(3), DEFAULT_BLUR_SIGMA);
    assert!(!p.force_cpu);

    assert!(matches!(
        ExtractParams::from_json(r#"{"watershed_blur": {"pore": 0.2}}"#),
        Err(ExtractError::InvalidParameter(_))
    ));
}
