//! 提取参数.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_BLUR_SIGMA;
use crate::network::{ExtractError, ExtractResult};

/// 孔隙网络提取参数.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExtractParams {
    /// 单尺度提取时, 每个相对距离图使用的高斯模糊 sigma (单位: 体素), 以相编号为键.
    #[cfg_attr(feature = "serde", serde(default))]
    pub watershed_blur: BTreeMap<u8, f64>,

    /// 提示后端不要使用加速设备.
    #[cfg_attr(feature = "serde", serde(default))]
    pub force_cpu: bool,
}

impl ExtractParams {
    /// 相 `phase` 的模糊 sigma. 未指定时为 [`DEFAULT_BLUR_SIGMA`].
    pub fn blur_of(&self, phase: u8) -> f64 {
        self.watershed_blur
            .get(&phase)
            .copied()
            .unwrap_or(DEFAULT_BLUR_SIGMA)
    }

    /// 将以字符串为键的 sigma 表 (例如来自序列化的参数集) 转换为以相编号为键.
    ///
    /// 键无法解析为 `u8`, 或 sigma 为负数 / 非有限值时, 返回
    /// `Err(ExtractError::InvalidParameter)`.
    pub fn coerce_blur<I, K>(entries: I) -> ExtractResult<BTreeMap<u8, f64>>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        entries
            .into_iter()
            .map(|(k, sigma)| {
                let key = k.as_ref().trim();
                let phase = key.parse::<u8>().map_err(|_| {
                    ExtractError::InvalidParameter(format!("watershed_blur key `{key}`"))
                })?;
                if !sigma.is_finite() || sigma < 0.0 {
                    return Err(ExtractError::InvalidParameter(format!(
                        "watershed_blur[{phase}] = {sigma}"
                    )));
                }
                Ok((phase, sigma))
            })
            .collect()
    }
}

/// 参数集的 JSON 形式, sigma 表的键是字符串.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct JsonParams {
    #[serde(default)]
    watershed_blur: BTreeMap<String, f64>,
    #[serde(default)]
    force_cpu: bool,
}

#[cfg(feature = "serde")]
impl ExtractParams {
    /// 从 JSON 参数集解析.
    ///
    /// 例: `{"watershed_blur": {"1": 0.4, "2": 0.6}, "force_cpu": true}`.
    pub fn from_json(s: &str) -> ExtractResult<Self> {
        let raw: JsonParams =
            serde_json::from_str(s).map_err(|e| ExtractError::InvalidParameter(e.to_string()))?;
        Ok(Self {
            watershed_blur: Self::coerce_blur(raw.watershed_blur)?,
            force_cpu: raw.force_cpu,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_blur() {
        let m = ExtractParams::coerce_blur([("1", 0.4), (" 2 ", 0.8)]).unwrap();
        assert_eq!(m.get(&1), Some(&0.4));
        assert_eq!(m.get(&2), Some(&0.8));

        assert!(ExtractParams::coerce_blur([("pore", 0.4)]).is_err());
        assert!(ExtractParams::coerce_blur([("300", 0.4)]).is_err());
        assert!(ExtractParams::coerce_blur([("1", -1.0)]).is_err());
    }

    #[test]
    fn test_blur_default() {
        let p = ExtractParams::default();
        assert_eq!(p.blur_of(1), DEFAULT_BLUR_SIGMA);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json() {
        let p = ExtractParams::from_json(r#"{"watershed_blur": {"1": 0.5, "2": 1.5}}"#).unwrap();
        assert_eq!(p.blur_of(1), 0.5);
        assert_eq!(p.blur_of(2), 1.5);
        assert!(!p.force_cpu);

        let err = ExtractParams::from_json(r#"{"watershed_blur": {"x": 0.5}}"#).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidParameter(_)));
    }
}
