//! 通用常量.

/// 多相分割体数据中的相 (phase) 编号.
pub mod phase {
    /// 固体 (骨架) 体素.
    pub const SOLID: u8 = 0;

    /// 可分辨孔隙体素. 该相中的孔隙完全由成像分辨率解析.
    pub const RESOLVED: u8 = 1;

    /// 亚分辨率 (不可分辨) 孔隙体素. 该相中的孔隙度由孔隙度图给出.
    pub const UNRESOLVED: u8 = 2;

    /// 体素是否是固体?
    #[inline]
    pub const fn is_solid(p: u8) -> bool {
        matches!(p, SOLID)
    }

    /// 体素是否是可分辨孔隙?
    #[inline]
    pub const fn is_resolved(p: u8) -> bool {
        matches!(p, RESOLVED)
    }

    /// 体素是否是亚分辨率孔隙?
    #[inline]
    pub const fn is_unresolved(p: u8) -> bool {
        matches!(p, UNRESOLVED)
    }
}

/// 喉道形状因子的物理下限.
pub const SHAPE_FACTOR_MIN: f64 = 0.01;

/// 喉道形状因子的物理上限.
pub const SHAPE_FACTOR_MAX: f64 = 0.09;

/// 喉道中段长度至少为总长度的这一比例.
pub const MID_LENGTH_RATIO: f64 = 0.01;

/// 线性插值求交点时, 相邻饱和度差值的下限.
pub const DS_FLOOR: f64 = 1e-5;

/// Krel 曲线聚合时, 公共饱和度网格的点数.
pub const KREL_GRID_POINTS: usize = 201;

/// 孔隙度图的满值 (百分比).
pub const POROSITY_MAP_FULL: f64 = 100.0;

/// 未在参数中指定时, 单尺度提取对距离图使用的高斯模糊 sigma (单位: 体素).
pub const DEFAULT_BLUR_SIGMA: f64 = 0.4;
