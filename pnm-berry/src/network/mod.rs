//! 孔隙网络模型 (Pore Network Model, PNM) 及其属性推导.
//!
//! 网络以 "结构体数组" 的形式保存: 每一类实体 (孔隙 [`Pores`], 喉道 [`Throats`])
//! 的每一种属性都是一个长度等于实体个数的 `Vec`. 提取后端给出的弱类型属性表
//! ([`RawNetwork`]) 只在边界处被校验一次, 随即转换为 [`PoreNetwork`].
//!
//! 推导流程由一系列按值传递的纯函数组成, 依次为:
//!
//! 1. [`derive_geometry`]: 半径, 形状因子, 喉道分段长度与体积;
//! 2. [`align_axes_and_origin`]: 坐标轴对齐与边界面修正;
//! 3. [`fill_subresolution_porosity`] / [`replace_zero_porosity`]:
//!   孔隙的亚分辨率孔隙度;
//! 4. [`blend_subresolution_porosity`]: 喉道的亚分辨率孔隙度;
//! 5. [`compute_volume_summary`]: 体积与孔隙度统计.
//!
//! 各步骤的组合位于 [`crate::extract`].

mod align;
mod error;
mod geometry;
mod porosity;
mod raw;
mod summary;
mod table;

pub use align::{align_axes_and_origin, face_labels};
pub use error::{BackendError, ExtractError, ExtractResult};
pub use geometry::{derive_geometry, floored_mid_length, throat_shape_factor};
pub use porosity::{blend_subresolution_porosity, fill_subresolution_porosity, replace_zero_porosity};
pub use raw::{flatten_vector_properties, FlatNetwork, RawColumn, RawNetwork};
pub use summary::{compute_volume_summary, NetworkSummary, VolumeSource};
pub use table::{NetworkTables, Table};

#[cfg(test)]
pub(crate) use raw::tests::line_network as raw_line_network;

/// 孔隙属性名.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PoreProperty {
    /// 孔隙对应的分水岭区域标签.
    RegionLabel,
    /// 孔隙所在的相.
    Phase,
    /// 坐标分量 0.
    Coords0,
    /// 坐标分量 1.
    Coords1,
    /// 坐标分量 2.
    Coords2,
    /// 体积.
    Volume,
    /// 扩展直径.
    ExtendedDiameter,
    /// 等效球直径.
    EquivalentDiameter,
    /// 内切球直径.
    InscribedDiameter,
    /// 半径.
    Radius,
    /// 形状因子.
    ShapeFactor,
    /// 亚分辨率孔隙度.
    SubresolutionPorosity,
}

impl PoreProperty {
    /// 表格存储使用的完整属性名.
    pub const fn as_key(&self) -> &'static str {
        match self {
            Self::RegionLabel => "pore.region_label",
            Self::Phase => "pore.phase",
            Self::Coords0 => "pore.coords_0",
            Self::Coords1 => "pore.coords_1",
            Self::Coords2 => "pore.coords_2",
            Self::Volume => "pore.volume",
            Self::ExtendedDiameter => "pore.extended_diameter",
            Self::EquivalentDiameter => "pore.equivalent_diameter",
            Self::InscribedDiameter => "pore.inscribed_diameter",
            Self::Radius => "pore.radius",
            Self::ShapeFactor => "pore.shape_factor",
            Self::SubresolutionPorosity => "pore.subresolution_porosity",
        }
    }

    /// 第 `axis` 个坐标分量.
    pub const fn coords(axis: usize) -> Self {
        match axis {
            0 => Self::Coords0,
            1 => Self::Coords1,
            _ => Self::Coords2,
        }
    }
}

/// 喉道属性名.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ThroatProperty {
    /// 第一个端点孔隙.
    Conns0,
    /// 第二个端点孔隙.
    Conns1,
    /// 内切圆直径.
    InscribedDiameter,
    /// 截面积.
    CrossSectionalArea,
    /// 总长度 (孔心到孔心, 沿路径).
    TotalLength,
    /// 孔心直线距离.
    DirectLength,
    /// 位于第一个端点孔隙内部的分段长度.
    Conns0Length,
    /// 位于第二个端点孔隙内部的分段长度.
    Conns1Length,
    /// 中段长度.
    MidLength,
    /// 形状因子.
    ShapeFactor,
    /// 体积.
    Volume,
    /// 亚分辨率孔隙度.
    SubresolutionPorosity,
}

impl ThroatProperty {
    /// 表格存储使用的完整属性名.
    pub const fn as_key(&self) -> &'static str {
        match self {
            Self::Conns0 => "throat.conns_0",
            Self::Conns1 => "throat.conns_1",
            Self::InscribedDiameter => "throat.inscribed_diameter",
            Self::CrossSectionalArea => "throat.cross_sectional_area",
            Self::TotalLength => "throat.total_length",
            Self::DirectLength => "throat.direct_length",
            Self::Conns0Length => "throat.conns_0_length",
            Self::Conns1Length => "throat.conns_1_length",
            Self::MidLength => "throat.mid_length",
            Self::ShapeFactor => "throat.shape_factor",
            Self::Volume => "throat.volume",
            Self::SubresolutionPorosity => "throat.subresolution_porosity",
        }
    }
}

/// 体数据的六个外表面.
///
/// `X*` 是体数据第 0 轴上的首尾切片, `Y*` 是第 1 轴, `Z*` 是第 2 轴.
/// 坐标轴交换 (0 <-> 2) 之后, `X*` 面对应的坐标分量为 `coords_2`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Face {
    /// 第 0 轴首切片.
    XMin,
    /// 第 0 轴尾切片.
    XMax,
    /// 第 1 轴首切片.
    YMin,
    /// 第 1 轴尾切片.
    YMax,
    /// 第 2 轴首切片.
    ZMin,
    /// 第 2 轴尾切片.
    ZMax,
}

impl Face {
    /// 全部六个面, 按 `xmin, xmax, ymin, ymax, zmin, zmax` 排列.
    pub const ALL: [Face; 6] = [
        Face::XMin,
        Face::XMax,
        Face::YMin,
        Face::YMax,
        Face::ZMin,
        Face::ZMax,
    ];

    /// 表格存储使用的完整属性名.
    pub const fn as_key(&self) -> &'static str {
        match self {
            Face::XMin => "pore.xmin",
            Face::XMax => "pore.xmax",
            Face::YMin => "pore.ymin",
            Face::YMax => "pore.ymax",
            Face::ZMin => "pore.zmin",
            Face::ZMax => "pore.zmax",
        }
    }

    /// 该面所在的体数据轴.
    #[inline]
    pub const fn volume_axis(&self) -> usize {
        match self {
            Face::XMin | Face::XMax => 0,
            Face::YMin | Face::YMax => 1,
            Face::ZMin | Face::ZMax => 2,
        }
    }

    /// 坐标轴交换之后, 该面对应的坐标分量.
    #[inline]
    pub const fn coord_axis(&self) -> usize {
        2 - self.volume_axis()
    }

    /// 是否位于轴的远端.
    #[inline]
    pub const fn is_max(&self) -> bool {
        matches!(self, Face::XMax | Face::YMax | Face::ZMax)
    }
}

/// 六个边界面标记. 每个面一个长度等于孔隙个数的 `Vec<bool>`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Faces([Vec<bool>; 6]);

impl Faces {
    /// 全部为 `false` 的标记.
    pub fn new(len: usize) -> Self {
        Self(std::array::from_fn(|_| vec![false; len]))
    }

    /// 获取面 `face` 的标记.
    #[inline]
    pub fn get(&self, face: Face) -> &[bool] {
        &self.0[face as usize]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, face: Face) -> &mut Vec<bool> {
        &mut self.0[face as usize]
    }

    /// 孔隙 `pore` 是否接触任一边界面?
    pub fn touches_any(&self, pore: usize) -> bool {
        self.0.iter().any(|v| v.get(pore).copied().unwrap_or(false))
    }
}

/// 孔隙属性集合.
#[derive(Clone, Debug, Default)]
pub struct Pores {
    /// 分水岭区域标签, 0 为背景.
    pub region_label: Vec<i32>,
    /// 所在相, 参见 [`crate::consts::phase`].
    pub phase: Vec<u8>,
    /// 三个坐标分量.
    pub coords: [Vec<f64>; 3],
    /// 体积.
    pub volume: Vec<f64>,
    /// 扩展直径.
    pub extended_diameter: Vec<f64>,
    /// 等效球直径.
    pub equivalent_diameter: Vec<f64>,
    /// 内切球直径.
    pub inscribed_diameter: Vec<f64>,
    /// 半径.
    pub radius: Vec<f64>,
    /// 形状因子 (相连喉道的面积加权平均).
    pub shape_factor: Vec<f64>,
    /// 亚分辨率孔隙度, 取值 `(0, 1]`.
    pub subresolution_porosity: Vec<f64>,
    /// 边界面标记.
    pub faces: Faces,
    /// 后端给出、但不在已知属性表中的列.
    pub extra: Vec<(String, Vec<f64>)>,
}

impl Pores {
    /// 孔隙个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.region_label.len()
    }

    /// 是否没有孔隙?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.region_label.is_empty()
    }

    /// 孔隙 `a` 与 `b` 的欧几里得距离.
    pub fn distance(&self, a: usize, b: usize) -> f64 {
        self.coords
            .iter()
            .map(|c| (c[a] - c[b]).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// 按表格存储的列顺序导出.
    pub fn columns(&self) -> Vec<(String, Vec<f64>)> {
        let mut ans = Vec::with_capacity(24);
        let mut push = |p: PoreProperty, v: Vec<f64>| ans.push((p.as_key().to_string(), v));

        push(
            PoreProperty::RegionLabel,
            self.region_label.iter().map(|&l| l as f64).collect(),
        );
        push(
            PoreProperty::Phase,
            self.phase.iter().map(|&p| p as f64).collect(),
        );
        for (axis, c) in self.coords.iter().enumerate() {
            push(PoreProperty::coords(axis), c.clone());
        }
        push(PoreProperty::Volume, self.volume.clone());
        push(PoreProperty::ExtendedDiameter, self.extended_diameter.clone());
        push(
            PoreProperty::EquivalentDiameter,
            self.equivalent_diameter.clone(),
        );
        push(PoreProperty::InscribedDiameter, self.inscribed_diameter.clone());
        push(PoreProperty::Radius, self.radius.clone());
        push(PoreProperty::ShapeFactor, self.shape_factor.clone());
        push(
            PoreProperty::SubresolutionPorosity,
            self.subresolution_porosity.clone(),
        );

        for face in Face::ALL {
            let flags = self.faces.get(face).iter().map(|&b| b as u8 as f64);
            ans.push((face.as_key().to_string(), flags.collect()));
        }
        ans.extend(self.extra.iter().cloned());
        ans
    }
}

/// 喉道属性集合.
#[derive(Clone, Debug, Default)]
pub struct Throats {
    /// 两个端点孔隙的编号.
    pub conns: [Vec<usize>; 2],
    /// 内切圆直径.
    pub inscribed_diameter: Vec<f64>,
    /// 截面积.
    pub cross_sectional_area: Vec<f64>,
    /// 总长度.
    pub total_length: Vec<f64>,
    /// 孔心直线距离.
    pub direct_length: Vec<f64>,
    /// 端点 0 内的分段长度.
    pub conns_0_length: Vec<f64>,
    /// 端点 1 内的分段长度.
    pub conns_1_length: Vec<f64>,
    /// 中段长度, 不小于总长度的 1%.
    pub mid_length: Vec<f64>,
    /// 形状因子, 取值 `[0.01, 0.09]`.
    pub shape_factor: Vec<f64>,
    /// 体积.
    pub volume: Vec<f64>,
    /// 亚分辨率孔隙度.
    pub subresolution_porosity: Vec<f64>,
    /// 后端给出、但不在已知属性表中的列.
    pub extra: Vec<(String, Vec<f64>)>,
}

impl Throats {
    /// 喉道个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.conns[0].len()
    }

    /// 是否没有喉道?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.conns[0].is_empty()
    }

    /// 按表格存储的列顺序导出.
    pub fn columns(&self) -> Vec<(String, Vec<f64>)> {
        use ThroatProperty as T;

        let conns = |i: usize| self.conns[i].iter().map(|&c| c as f64).collect();
        let mut ans = vec![
            (T::Conns0, conns(0)),
            (T::Conns1, conns(1)),
            (T::InscribedDiameter, self.inscribed_diameter.clone()),
            (T::CrossSectionalArea, self.cross_sectional_area.clone()),
            (T::TotalLength, self.total_length.clone()),
            (T::DirectLength, self.direct_length.clone()),
            (T::Conns0Length, self.conns_0_length.clone()),
            (T::Conns1Length, self.conns_1_length.clone()),
            (T::MidLength, self.mid_length.clone()),
            (T::ShapeFactor, self.shape_factor.clone()),
            (T::Volume, self.volume.clone()),
            (T::SubresolutionPorosity, self.subresolution_porosity.clone()),
        ]
        .into_iter()
        .map(|(p, v)| (p.as_key().to_string(), v))
        .collect::<Vec<_>>();
        ans.extend(self.extra.iter().cloned());
        ans
    }
}

/// 完整的孔隙网络.
///
/// 该结构完全透明, 用户可以直接访问各实体的属性.
#[derive(Clone, Debug, Default)]
pub struct PoreNetwork {
    /// 孔隙.
    pub pores: Pores,

    /// 喉道.
    pub throats: Throats,

    /// 体积统计. 在推导流程的最后一步填充.
    pub summary: Option<NetworkSummary>,
}

impl PoreNetwork {
    /// 附加体积统计.
    #[inline]
    pub fn with_summary(self, summary: NetworkSummary) -> Self {
        Self {
            summary: Some(summary),
            ..self
        }
    }

    /// 合并全部属性, 以 `pore.*`, `throat.*`, `network.*` 为键.
    pub fn into_properties(self) -> Vec<(String, Vec<f64>)> {
        let mut ans = self.pores.columns();
        ans.extend(self.throats.columns());
        if let Some(s) = self.summary {
            ans.extend(s.entries().map(|(k, v)| (k.to_string(), vec![v])));
        }
        ans
    }
}
