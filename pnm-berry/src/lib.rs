#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 从分割体数据提取孔隙网络模型 (PNM) 并推导其几何与岩石物理属性,
//! 以及分析相对渗透率 (Krel) 曲线.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 体数据的轴顺序与存储顺序一致, 体素尺寸 ([`Scale3d`]) 也按同样的顺序给出.
//!   网络坐标在推导时被重新排列为 `x, y, z`, 参见 [`network::align_axes_and_origin`].
//! 2. 相编号约定见 [`consts::phase`]: 0 为固体, 1 为可分辨孔隙, 2 为亚分辨率孔隙.
//!
//! # 功能
//!
//! ### 孔隙网络属性推导 ✅
//!
//! 形状因子, 喉道分段长度, 边界面, 亚分辨率孔隙度, 体积统计.
//!
//! 实现位于 `pnm-berry/src/network`.
//!
//! ### 网络提取编排与内置后端 ✅
//!
//! 后端接口 [`extract::ExtractionBackend`], 以及纯 Rust 实现的分水岭后端
//! [`extract::NativeBackend`] (欧氏距离变换, 高斯模糊, 区域极大值, 优先队列淹没).
//!
//! 实现位于 `pnm-berry/src/extract`.
//!
//! ### Krel 曲线分析 ✅
//!
//! 束缚水 / 残余油饱和度, 交点, Corey 指数, Amott 与 USBM 润湿性指数,
//! 多个实现在公共网格上的聚合.
//!
//! 实现位于 `pnm-berry/src/krel`.
//!
//! ### 曲线拟合 ✅
//!
//! 线性插值与单参数 Levenberg-Marquardt 拟合.
//!
//! 实现位于 `pnm-berry/src/fitting`.
//!
//! ### 数据读取 ✅
//!
//! `.npy` / `.npz` 体数据与 Krel 表格.
//!
//! 实现位于 `pnm-berry/src/dataset`.

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 三个轴上的体素尺寸.
pub type Scale3d = [f64; 3];

pub mod consts;

pub mod dataset;

pub mod extract;

pub mod fitting;

pub mod krel;

pub mod network;

pub mod prelude;

pub use extract::{extract, extract_network, ExtractRequest, ExtractionBackend, NativeBackend};
pub use krel::{krel_curve_analysis, KrelCycleTable, KrelResult, KrelTables};
pub use network::{NetworkTables, PoreNetwork};
