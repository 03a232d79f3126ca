//! 单参数 Levenberg-Marquardt 最小二乘拟合.

use thiserror::Error;

/// 拟合失败的原因.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// 没有可用的样本点.
    #[error("no samples to fit")]
    TooFewSamples,

    /// 样本数量与函数值数量不一致.
    #[error("{0} abscissas but {1} ordinates")]
    LengthMismatch(usize, usize),

    /// 初值处的残差或导数不是有限值.
    #[error("model is not finite at the initial guess")]
    NonFinite,

    /// 模型对参数不敏感 (导数恒为 0).
    #[error("model does not depend on the parameter")]
    Singular,

    /// 迭代次数耗尽仍未收敛.
    #[error("did not converge after {0} iterations")]
    NotConverged(usize),
}

/// 拟合结果.
pub type FitResult<T> = Result<T, FitError>;

/// 拟合选项.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FitOptions {
    /// 参数初值.
    pub initial: f64,

    /// 最大迭代次数.
    pub max_iterations: usize,

    /// 步长的相对收敛阈值.
    pub tolerance: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            initial: 1.0,
            max_iterations: 200,
            tolerance: 1e-10,
        }
    }
}

/// 残差平方和.
fn sum_squares<F: Fn(f64, f64) -> f64>(xs: &[f64], ys: &[f64], model: &F, n: f64) -> f64 {
    xs.iter()
        .zip(ys)
        .map(|(&x, &y)| (y - model(x, n)).powi(2))
        .sum()
}

/// `(J^T J, J^T r)`, 导数以中心差分近似.
fn normal_terms<F: Fn(f64, f64) -> f64>(xs: &[f64], ys: &[f64], model: &F, n: f64) -> (f64, f64) {
    let h = 1e-6 * n.abs().max(1.0);
    xs.iter().zip(ys).fold((0.0, 0.0), |(jtj, jtr), (&x, &y)| {
        let j = (model(x, n + h) - model(x, n - h)) / (2.0 * h);
        (jtj + j * j, jtr + j * (y - model(x, n)))
    })
}

/// 拟合 `y ~ model(x, n)` 中的参数 `n`.
///
/// 采用 Marquardt 阻尼: 步长被接受时阻尼缩小 10 倍, 否则放大 10 倍.
/// 残差平方和为 0, 或步长相对于参数足够小时视为收敛.
///
/// # 返回值
///
/// 成功时返回拟合得到的 `n`. 可能的错误参见 [`FitError`].
pub fn fit_exponent<F>(xs: &[f64], ys: &[f64], model: F, options: FitOptions) -> FitResult<f64>
where
    F: Fn(f64, f64) -> f64,
{
    if xs.len() != ys.len() {
        return Err(FitError::LengthMismatch(xs.len(), ys.len()));
    }
    if xs.is_empty() {
        return Err(FitError::TooFewSamples);
    }

    let mut n = options.initial;
    let mut cost = sum_squares(xs, ys, &model, n);
    if !cost.is_finite() {
        return Err(FitError::NonFinite);
    }
    let mut lambda = 1e-3;

    for _ in 0..options.max_iterations {
        if cost == 0.0 {
            return Ok(n);
        }
        let (jtj, jtr) = normal_terms(xs, ys, &model, n);
        if !jtj.is_finite() || !jtr.is_finite() {
            return Err(FitError::NonFinite);
        }
        if jtj == 0.0 {
            return Err(FitError::Singular);
        }

        let step = jtr / (jtj * (1.0 + lambda));
        let candidate = n + step;
        let new_cost = sum_squares(xs, ys, &model, candidate);
        if new_cost < cost {
            n = candidate;
            cost = new_cost;
            lambda = (lambda / 10.0).max(1e-12);
            if step.abs() <= options.tolerance * (n.abs() + options.tolerance) {
                return Ok(n);
            }
        } else {
            lambda *= 10.0;
            if lambda > 1e12 {
                // 任何方向都无法继续下降, 当前点即为极小值.
                return Ok(n);
            }
        }
    }
    Err(FitError::NotConverged(options.max_iterations))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_power_law() {
        let xs: Vec<f64> = (1..=20).map(|i| i as f64 / 20.0).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 0.8 * x.powf(2.5)).collect();
        let n = fit_exponent(&xs, &ys, |x, n| 0.8 * x.powf(n), FitOptions::default()).unwrap();
        assert!((n - 2.5).abs() < 1e-6, "n = {n}");
    }

    #[test]
    fn test_fit_exact_initial() {
        let xs = [0.2, 0.5, 0.9];
        let ys: Vec<f64> = xs.iter().map(|&x: &f64| x).collect();
        let n = fit_exponent(&xs, &ys, |x, n| x.powf(n), FitOptions::default()).unwrap();
        assert_eq!(n, 1.0);
    }

    #[test]
    fn test_fit_errors() {
        let opt = FitOptions::default();
        assert_eq!(
            fit_exponent(&[], &[], |x, n| x * n, opt),
            Err(FitError::TooFewSamples)
        );
        assert_eq!(
            fit_exponent(&[1.0], &[], |x, n| x * n, opt),
            Err(FitError::LengthMismatch(1, 0))
        );
        assert_eq!(
            fit_exponent(&[0.5, 0.7], &[1.0, 2.0], |_, _| 3.0, opt),
            Err(FitError::Singular)
        );
        assert_eq!(
            fit_exponent(&[0.5], &[1.0], |_, _| f64::NAN, opt),
            Err(FitError::NonFinite)
        );
    }
}
