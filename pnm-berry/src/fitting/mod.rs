//! 曲线拟合与线性插值.
//!
//! - [`fit_exponent`]: 以 Levenberg-Marquardt 方法拟合模型中唯一的指数参数;
//! - [`interpolate`]: 分段线性插值, 不外推;
//! - [`intersection_offset`] / [`floored_step`]: 两条线段求交时使用的辅助函数.

mod levenberg;
mod linear;

pub use levenberg::{fit_exponent, FitError, FitOptions, FitResult};
pub use linear::{floored_step, intersection_offset, interpolate};
