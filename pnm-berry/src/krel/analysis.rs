//! 单个 Krel 结果的标量指标.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::table::{CycleSeries, KrelCycleTable};
use super::wettability::wettability_indices;
use crate::fitting::{fit_exponent, floored_step, intersection_offset, FitOptions};

/// 13 个 Krel 指标. 全部为 0 的行 ([`Default`]) 表示没有可分析的吸入循环.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KrelResultRow {
    /// 束缚水饱和度.
    pub swi: f64,
    /// 束缚水饱和度处的油相相对渗透率.
    pub kro_swi: f64,
    /// 束缚水饱和度处的毛管压力.
    pub pc_swi: f64,
    /// 交叉点饱和度.
    pub sw_cross: f64,
    /// 交叉点相对渗透率.
    pub k_cross: f64,
    /// 交叉点毛管压力.
    pub pc_cross: f64,
    /// 残余油对应的水相饱和度.
    pub swr: f64,
    /// 残余油处的水相相对渗透率.
    pub krw_swr: f64,
    /// 残余油处的毛管压力.
    pub pc_swr: f64,
    /// 水相 Corey 指数.
    pub nw: f64,
    /// 油相 Corey 指数.
    pub no: f64,
    /// Amott 润湿性指数.
    pub amott: f64,
    /// USBM 润湿性指数.
    pub usbm: f64,
}

impl KrelResultRow {
    /// 以指标名为键导出.
    pub fn entries(&self) -> [(&'static str, f64); 13] {
        [
            ("swi", self.swi),
            ("kro_swi", self.kro_swi),
            ("pc_swi", self.pc_swi),
            ("sw_cross", self.sw_cross),
            ("k_cross", self.k_cross),
            ("pc_cross", self.pc_cross),
            ("swr", self.swr),
            ("krw_swr", self.krw_swr),
            ("pc_swr", self.pc_swr),
            ("nw", self.nw),
            ("no", self.no),
            ("amott", self.amott),
            ("usbm", self.usbm),
        ]
    }
}

/// 首个饱和度上升处 `i` 的毛管压力 `Pc[i]`.
fn pc_at_first_rise(sw: &[f64], pc: &[f64]) -> Option<f64> {
    (1..sw.len()).find(|&i| sw[i] > sw[i - 1]).map(|i| pc[i])
}

/// 自末尾向前, 首个 `Sw[i] < Sw[i + 1]` 处的 `Pc[i + 1]`.
fn pc_at_last_rise(sw: &[f64], pc: &[f64]) -> Option<f64> {
    (0..sw.len().saturating_sub(1))
        .rev()
        .find(|&i| sw[i] < sw[i + 1])
        .map(|i| pc[i + 1])
}

/// `(sw_cross, k_cross, pc_cross)`.
fn crossover(c: &CycleSeries) -> Option<(f64, f64, f64)> {
    let i = (1..c.len()).find(|&i| c.kro[i] <= c.krw[i])?;
    let ds = floored_step(c.sw[i] - c.sw[i - 1]);
    let dkrw = (c.krw[i] - c.krw[i - 1]) / ds;
    let dkro = (c.kro[i] - c.kro[i - 1]) / ds;
    let s = intersection_offset(c.kro[i - 1] - c.krw[i - 1], dkrw - dkro);

    let pc_cross = c.pc.as_ref().map_or(0.0, |pc| {
        let dpc = (pc[i] - pc[i - 1]) / ds;
        pc[i - 1] + s * dpc
    });
    Some((c.sw[i - 1] + s, c.kro[i - 1] + s * dkro, pc_cross))
}

/// Corey 模型中被幂运算的底数; 负值截断为 0.
#[inline]
fn corey_base(numerator: f64, span: f64) -> f64 {
    (numerator / span).max(0.0)
}

/// 拟合失败时记为 0.
fn fit_or_zero<F: Fn(f64, f64) -> f64>(name: &str, xs: &[f64], ys: &[f64], model: F) -> f64 {
    match fit_exponent(xs, ys, model, FitOptions::default()) {
        Ok(n) if n.is_finite() => n,
        Ok(n) => {
            log::debug!("corey {name}: non-finite exponent {n}");
            0.0
        }
        Err(e) => {
            log::debug!("corey {name}: {e}");
            0.0
        }
    }
}

/// 以 Corey 模型拟合吸入循环的指数 `(nw, no)`:
///
/// - `Kro(s) = kro_max * (((1 - s) - swc) / (1 - sor - swc))^no`,
/// - `Krw(s) = krw_max * ((s - swc) / (1 - sor - swc))^nw`,
///
/// 其中 `swc = swi`, `sor = 1 - swr`, `kro_max = kro_swi`, `krw_max = krw_swr`
/// 固定不变, 只拟合指数. 归一化区间长度为 0 或拟合失败时对应指数为 0.
pub fn corey_exponents(c: &CycleSeries) -> (f64, f64) {
    let (Some(&swc), Some(&swr)) = (c.sw.first(), c.sw.last()) else {
        return (0.0, 0.0);
    };
    // 1 - sor - swc, 其中 sor = 1 - swr.
    let span = swr - swc;
    if !span.is_finite() || span == 0.0 {
        log::debug!("corey: zero normalisation span");
        return (0.0, 0.0);
    }
    let kro_max = c.kro[0];
    let krw_max = c.krw[c.len() - 1];

    let nw = fit_or_zero("nw", &c.sw, &c.krw, |s, n| {
        krw_max * corey_base(s - swc, span).powf(n)
    });
    let no = fit_or_zero("no", &c.sw, &c.kro, |s, n| {
        kro_max * corey_base((1.0 - s) - swc, span).powf(n)
    });
    (nw, no)
}

/// 分析单个 Krel 结果.
///
/// 全部指标都来自循环 2 (一次吸入), Amott / USBM 还用到循环 3.
/// 没有循环 2 时返回全 0 的行, 不视为错误.
pub fn krel_curve_analysis(table: &KrelCycleTable) -> KrelResultRow {
    let c = table.cycle(2);
    if c.is_empty() {
        log::debug!("no imbibition cycle, returning zero row");
        return KrelResultRow::default();
    }
    let last = c.len() - 1;

    let (pc_swi, pc_swr) = match c.pc.as_deref() {
        Some(pc) => (
            pc_at_first_rise(&c.sw, pc).unwrap_or(0.0),
            pc_at_last_rise(&c.sw, pc).unwrap_or(0.0),
        ),
        None => (0.0, 0.0),
    };
    let (sw_cross, k_cross, pc_cross) = crossover(&c).unwrap_or_else(|| {
        log::debug!("kro never drops below krw");
        (0.0, 0.0, 0.0)
    });
    let (nw, no) = corey_exponents(&c);
    let (amott, usbm) = match wettability_indices(table) {
        Some(w) => (w.amott, w.usbm),
        None => (0.0, 0.0),
    };

    KrelResultRow {
        swi: c.sw[0],
        kro_swi: c.kro[0],
        pc_swi,
        sw_cross,
        k_cross,
        pc_cross,
        swr: c.sw[last],
        krw_swr: c.krw[last],
        pc_swr,
        nw,
        no,
        amott,
        usbm,
    }
}
