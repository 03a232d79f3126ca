//! 相对渗透率 (Krel) 曲线分析与多实现聚合.
//!
//! 输入是流动模拟给出的多循环表格 (每行 `cycle, Sw, Pc, Krw, Kro, RI`),
//! 循环编号: 1 为初次排驱, 2 为一次吸入, 3 为二次排驱.
//!
//! - [`krel_curve_analysis`]: 单个结果的标量指标 (束缚水 / 残余油饱和度,
//!   交叉点, Corey 指数, Amott 与 USBM 润湿性指数);
//! - [`KrelResult`]: 按参数集累积指标, 导出为 [`ResultFrame`];
//! - [`KrelTables`]: 将多个实现插值到公共饱和度网格上, 并求均值.

mod aggregate;
mod analysis;
mod result;
mod table;
mod wettability;

use thiserror::Error;

pub use aggregate::KrelTables;
pub use analysis::{corey_exponents, krel_curve_analysis, KrelResultRow};
pub use result::{Cell, KrelResult, ResultFrame};
pub use table::{CycleSeries, KrelCycleTable, KrelRow};
pub use wettability::{find_zero_crossing, split_area, wettability_indices, Wettability, ZeroCrossing};

/// Krel 表格构建错误.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KrelError {
    /// 缺少必需列.
    #[error("missing column `{0}`")]
    MissingColumn(String),

    /// 列长度与 `cycle` 列不一致.
    #[error("column `{0}` has {1} rows, expected {2}")]
    LengthMismatch(String, usize, usize),

    /// 循环编号不是 1, 2 或 3.
    #[error("row {row}: invalid cycle {value}")]
    InvalidCycle {
        /// 行号.
        row: usize,
        /// 原始值.
        value: f64,
    },
}

/// Krel 表格构建结果.
pub type TableResult<T> = Result<T, KrelError>;
