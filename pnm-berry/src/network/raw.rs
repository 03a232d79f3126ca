//! 提取后端输出的弱类型属性表, 以及向 [`PoreNetwork`] 的转换.

use std::collections::BTreeMap;

use ndarray::{Array1, Array2, Axis};

use super::{
    ExtractError, ExtractResult, Face, Faces, PoreNetwork, PoreProperty, Pores, ThroatProperty,
    Throats,
};
use crate::consts::phase;

/// 后端给出的一列属性.
#[derive(Clone, Debug)]
pub enum RawColumn {
    /// 标量属性, 每个实体一个值.
    Scalar(Array1<f64>),

    /// 向量属性, 形状为 `(实体个数, 分量个数)`.
    Vector(Array2<f64>),
}

impl RawColumn {
    /// 实体个数.
    pub fn len(&self) -> usize {
        match self {
            RawColumn::Scalar(a) => a.len(),
            RawColumn::Vector(a) => a.len_of(Axis(0)),
        }
    }

    /// 是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<f64>> for RawColumn {
    fn from(v: Vec<f64>) -> Self {
        RawColumn::Scalar(Array1::from_vec(v))
    }
}

impl From<Array2<f64>> for RawColumn {
    fn from(v: Array2<f64>) -> Self {
        RawColumn::Vector(v)
    }
}

/// 提取后端给出的属性表. 键以 `pore.` 或 `throat.` 开头.
pub type RawNetwork = BTreeMap<String, RawColumn>;

/// 所有向量属性都已拆分为标量列的属性表.
pub type FlatNetwork = BTreeMap<String, Array1<f64>>;

/// 将每个向量属性 `name` 的第 `i` 个分量拆分为新列 `name_i`, 原列不再保留.
pub fn flatten_vector_properties(raw: RawNetwork) -> FlatNetwork {
    let mut flat = FlatNetwork::new();
    for (name, column) in raw {
        match column {
            RawColumn::Scalar(a) => {
                flat.insert(name, a);
            }
            RawColumn::Vector(m) => {
                for (i, c) in m.axis_iter(Axis(1)).enumerate() {
                    flat.insert(format!("{name}_{i}"), c.to_owned());
                }
            }
        }
    }
    flat
}

/// 从后端给出的 `pore.*` 面标记会被重新计算, 因此转换时将其丢弃.
fn is_face_key(key: &str) -> bool {
    Face::ALL.iter().any(|f| f.as_key() == key)
}

/// 在转换过程中逐列取出属性, 同时检查长度.
struct Taker {
    flat: FlatNetwork,
    pores: usize,
    throats: usize,
}

impl Taker {
    fn take(&mut self, key: &str) -> ExtractResult<Vec<f64>> {
        self.try_take(key)
            .ok_or_else(|| ExtractError::MissingProperty(key.to_string()))
    }

    fn try_take(&mut self, key: &str) -> Option<Vec<f64>> {
        self.flat.remove(key).map(|a| a.to_vec())
    }

    fn pore(&mut self, p: PoreProperty) -> ExtractResult<Vec<f64>> {
        self.take(p.as_key())
    }

    fn throat(&mut self, p: ThroatProperty) -> ExtractResult<Vec<f64>> {
        self.take(p.as_key())
    }

    /// 检查全部列的长度.
    fn check_lengths(&self) -> ExtractResult<()> {
        for (key, col) in self.flat.iter() {
            let expected = if key.starts_with("pore.") {
                self.pores
            } else if key.starts_with("throat.") {
                self.throats
            } else {
                continue;
            };
            if col.len() != expected {
                return Err(ExtractError::LengthMismatch(
                    key.clone(),
                    col.len(),
                    expected,
                ));
            }
        }
        Ok(())
    }

    /// 剩余的、以 `prefix` 开头的列.
    fn rest(&mut self, prefix: &str) -> Vec<(String, Vec<f64>)> {
        let keys: Vec<String> = self
            .flat
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.into_iter()
            .filter_map(|k| self.flat.remove(&k).map(|v| (k, v.to_vec())))
            .filter(|(k, _)| !is_face_key(k))
            .collect()
    }
}

/// 将浮点端点编号转换为孔隙下标.
fn to_index(v: f64, pores: usize) -> Option<usize> {
    (v.fract() == 0.0 && v >= 0.0 && v < pores as f64).then_some(v as usize)
}

impl PoreNetwork {
    /// 从拆分后的属性表构建网络.
    ///
    /// 孔隙个数取自 `pore.all` (若存在) 或 `pore.region_label`,
    /// 喉道个数取自 `throat.conns_0`. 可选属性的缺省值:
    ///
    /// - `pore.phase`: 全部为可分辨孔隙;
    /// - `pore.subresolution_porosity`: 1.0;
    /// - `pore.inscribed_diameter`: 与等效直径相同.
    ///
    /// # 返回值
    ///
    /// - 缺少必需属性时, 返回 `Err(ExtractError::MissingProperty)`;
    /// - 任意 `pore.*` / `throat.*` 列长度与实体个数不一致时,
    ///   返回 `Err(ExtractError::LengthMismatch)`;
    /// - 喉道端点越界、非整数或首尾相同时, 返回 `Err(ExtractError::InvalidConnection)`.
    pub fn try_from_flat(flat: FlatNetwork) -> ExtractResult<Self> {
        let pores = flat
            .get("pore.all")
            .or_else(|| flat.get(PoreProperty::RegionLabel.as_key()))
            .map(|a| a.len())
            .ok_or_else(|| {
                ExtractError::MissingProperty(PoreProperty::RegionLabel.as_key().to_string())
            })?;
        let throats = flat
            .get(ThroatProperty::Conns0.as_key())
            .map(|a| a.len())
            .ok_or_else(|| {
                ExtractError::MissingProperty(ThroatProperty::Conns0.as_key().to_string())
            })?;

        let mut t = Taker {
            flat,
            pores,
            throats,
        };
        t.check_lengths()?;

        let region_label = t
            .pore(PoreProperty::RegionLabel)?
            .into_iter()
            .map(|v| v.round() as i32)
            .collect();
        let coords = [
            t.pore(PoreProperty::Coords0)?,
            t.pore(PoreProperty::Coords1)?,
            t.pore(PoreProperty::Coords2)?,
        ];
        let volume = t.pore(PoreProperty::Volume)?;
        let extended_diameter = t.pore(PoreProperty::ExtendedDiameter)?;
        let equivalent_diameter = t.pore(PoreProperty::EquivalentDiameter)?;
        let inscribed_diameter = t
            .try_take(PoreProperty::InscribedDiameter.as_key())
            .unwrap_or_else(|| equivalent_diameter.clone());
        let phase = t
            .try_take(PoreProperty::Phase.as_key())
            .map(|v| v.into_iter().map(|p| p.round() as u8).collect())
            .unwrap_or_else(|| vec![phase::RESOLVED; pores]);
        let subresolution_porosity = t
            .try_take(PoreProperty::SubresolutionPorosity.as_key())
            .unwrap_or_else(|| vec![1.0; pores]);

        // 以下属性由推导流程重新计算.
        for p in [PoreProperty::Radius, PoreProperty::ShapeFactor] {
            t.try_take(p.as_key());
        }

        let raw_c0 = t.throat(ThroatProperty::Conns0)?;
        let raw_c1 = t.throat(ThroatProperty::Conns1)?;
        let mut conns = [Vec::with_capacity(throats), Vec::with_capacity(throats)];
        for (throat, (&from, &to)) in raw_c0.iter().zip(raw_c1.iter()).enumerate() {
            match (to_index(from, pores), to_index(to, pores)) {
                (Some(a), Some(b)) if a != b => {
                    conns[0].push(a);
                    conns[1].push(b);
                }
                _ => return Err(ExtractError::InvalidConnection { throat, from, to }),
            }
        }

        let inscribed = t.throat(ThroatProperty::InscribedDiameter)?;
        let area = t.throat(ThroatProperty::CrossSectionalArea)?;
        let total_length = t.throat(ThroatProperty::TotalLength)?;
        let direct_length = t.throat(ThroatProperty::DirectLength)?;
        for p in [
            ThroatProperty::Conns0Length,
            ThroatProperty::Conns1Length,
            ThroatProperty::MidLength,
            ThroatProperty::ShapeFactor,
            ThroatProperty::Volume,
            ThroatProperty::SubresolutionPorosity,
        ] {
            t.try_take(p.as_key());
        }

        let pore_extra = t.rest("pore.");
        let throat_extra = t.rest("throat.");
        for key in t.flat.keys() {
            log::debug!("dropping unscoped network property `{key}`");
        }

        Ok(Self {
            pores: Pores {
                region_label,
                phase,
                coords,
                volume,
                extended_diameter,
                equivalent_diameter,
                inscribed_diameter,
                radius: vec![0.0; pores],
                shape_factor: vec![0.0; pores],
                subresolution_porosity,
                faces: Faces::new(pores),
                extra: pore_extra,
            },
            throats: Throats {
                conns,
                inscribed_diameter: inscribed,
                cross_sectional_area: area,
                total_length,
                direct_length,
                conns_0_length: vec![0.0; throats],
                conns_1_length: vec![0.0; throats],
                mid_length: vec![0.0; throats],
                shape_factor: vec![0.0; throats],
                volume: vec![0.0; throats],
                subresolution_porosity: vec![1.0; throats],
                extra: throat_extra,
            },
            summary: None,
        })
    }
}
