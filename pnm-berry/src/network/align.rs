//! 坐标轴对齐与边界面修正.

use std::collections::BTreeSet;

use ndarray::{ArrayView3, Axis};

use super::{floored_mid_length, ExtractError, ExtractResult, Face, PoreNetwork};
use crate::{Idx3d, Scale3d};

/// 面 `face` 上出现的全部标签, 包括背景 0.
fn slice_labels(watershed: ArrayView3<i32>, face: Face) -> BTreeSet<i32> {
    let axis = face.volume_axis();
    let len = watershed.len_of(Axis(axis));
    if len == 0 {
        return BTreeSet::new();
    }
    let index = if face.is_max() { len - 1 } else { 0 };
    watershed
        .index_axis(Axis(axis), index)
        .iter()
        .copied()
        .collect()
}

/// 获取体数据 `watershed` 在面 `face` 上出现的全部非零标签.
pub fn face_labels(watershed: ArrayView3<i32>, face: Face) -> BTreeSet<i32> {
    let mut labels = slice_labels(watershed, face);
    labels.remove(&0);
    labels
}

/// 将网络坐标与物理坐标系对齐.
///
/// 1. 交换坐标分量 0 与 2;
/// 2. 对六个面中的每一个, 标签出现在该面上的孔隙被标记为边界孔隙,
///   其对应的坐标分量被覆盖为物理边界位置 (近端为 0, 远端为
///   `input_shape[axis] * scale[axis]`);
/// 3. 依据新坐标重新计算喉道的直线距离, 总长度按 `新距离 / 原直线距离`
///   等比缩放, 中段长度与体积随之更新.
///
/// `scale` 与 `input_shape` 均按体数据轴的顺序给出.
///
/// # 返回值
///
/// - `watershed` 形状与 `input_shape` 不一致时, 返回 `Err(ExtractError::ShapeMismatch)`;
/// - 标签为 0 的孔隙落在含背景的边界面上时, 返回 `Err(ExtractError::BoundaryInvariant)`.
pub fn align_axes_and_origin(
    mut net: PoreNetwork,
    watershed: ArrayView3<i32>,
    scale: Scale3d,
    input_shape: Idx3d,
) -> ExtractResult<PoreNetwork> {
    let shape = watershed.dim();
    if shape != input_shape {
        return Err(ExtractError::ShapeMismatch("watershed", shape, input_shape));
    }
    let extent = [
        input_shape.0 as f64 * scale[0],
        input_shape.1 as f64 * scale[1],
        input_shape.2 as f64 * scale[2],
    ];

    let pores = &mut net.pores;
    pores.coords.swap(0, 2);

    for face in Face::ALL {
        // 背景 0 也参与匹配, 标签为 0 的孔隙落在含背景的面上即违反不变量.
        let labels = slice_labels(watershed, face);
        if labels.is_empty() {
            continue;
        }
        let position = if face.is_max() {
            extent[face.volume_axis()]
        } else {
            0.0
        };
        let coord = face.coord_axis();

        for (i, label) in pores.region_label.iter().enumerate() {
            if !labels.contains(label) {
                continue;
            }
            if *label == 0 {
                return Err(ExtractError::BoundaryInvariant(face.as_key()));
            }
            pores.faces.get_mut(face)[i] = true;
            pores.coords[coord][i] = position;
        }
    }

    let throats = &mut net.throats;
    for t in 0..throats.len() {
        let distance = pores.distance(throats.conns[0][t], throats.conns[1][t]);
        let old = throats.direct_length[t];
        if old > 0.0 {
            throats.total_length[t] *= distance / old;
        }
        throats.direct_length[t] = distance;
        throats.mid_length[t] = floored_mid_length(
            throats.total_length[t],
            throats.conns_0_length[t],
            throats.conns_1_length[t],
        );
        throats.volume[t] = throats.total_length[t] * throats.cross_sectional_area[t];
    }

    Ok(net)
}
