//! 运行时错误.

use thiserror::Error;

use crate::Idx3d;

/// 提取后端自身报告的错误. 内容是供人阅读的描述.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct BackendError(pub String);

/// 孔隙网络提取或属性推导的运行时错误.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// 缺少必要的输入体数据.
    #[error("missing input volume: {0}")]
    MissingInput(&'static str),

    /// 后端输出中缺少必需的属性.
    #[error("missing network property `{0}`")]
    MissingProperty(String),

    /// 同一实体 (孔隙或喉道) 的属性长度不一致.
    ///
    /// 参数依次为: 属性名, 实际长度, 期望长度.
    #[error("property `{0}` has length {1}, expected {2}")]
    LengthMismatch(String, usize, usize),

    /// 喉道连接了不存在的孔隙, 或者首尾相同.
    #[error("throat {throat} has invalid connection ({from}, {to})")]
    InvalidConnection {
        /// 喉道编号.
        throat: usize,
        /// 第一个端点 (原始数值).
        from: f64,
        /// 第二个端点 (原始数值).
        to: f64,
    },

    /// 两个体数据形状不一致.
    #[error("volume `{0}` has shape {1:?}, expected {2:?}")]
    ShapeMismatch(&'static str, Idx3d, Idx3d),

    /// 边界面上匹配到了标签为 0 (背景) 的孔隙. 理论上不可能发生.
    #[error("boundary face `{0}` matched a background pore")]
    BoundaryInvariant(&'static str),

    /// 提取参数非法.
    #[error("invalid extraction parameter: {0}")]
    InvalidParameter(String),

    /// 后端提取失败.
    #[error("Pore network extraction failed: {0}")]
    Backend(#[from] BackendError),
}

/// 提取 / 推导运行时结果.
pub type ExtractResult<T> = Result<T, ExtractError>;
