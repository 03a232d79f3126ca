//! 调研结果.

use std::collections::BTreeMap;
use std::io::{self, Write};

use pnm_berry::network::NetworkSummary;
use pnm_berry::KrelResult;

/// 单个体数据的提取结果.
pub enum VolumeOutcome {
    /// 提取成功.
    Network {
        pores: usize,
        throats: usize,
        summary: Option<NetworkSummary>,
    },
    /// 没有提取到网络.
    Empty,
    /// 读取或提取失败.
    Failed(String),
}

/// 将 `outcome` 的结果写进 `w` 中.
fn describe_into<W: Write>(name: &str, outcome: &VolumeOutcome, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    writeln!(w, "Volume `{name}`:")?;
    match outcome {
        VolumeOutcome::Network {
            pores,
            throats,
            summary,
        } => {
            writeln!(w, "{S4}Pores: {pores}")?;
            write!(w, "{S4}Throats: {throats}")?;
            if let Some(s) = summary {
                for (key, value) in s.entries() {
                    write!(w, "\n{S4}{key}: {value:.6}")?;
                }
            }
        }
        VolumeOutcome::Empty => write!(w, "{S4}No network extracted")?,
        VolumeOutcome::Failed(e) => write!(w, "{S4}Failed: {e}")?,
    }
    Ok(())
}

/// 非 `NaN` 值的个数与均值.
fn valid_mean(column: &[f64]) -> (usize, Option<f64>) {
    let valid: Vec<f64> = column.iter().copied().filter(|v| !v.is_nan()).collect();
    let mean = (!valid.is_empty()).then(|| valid.iter().sum::<f64>() / valid.len() as f64);
    (valid.len(), mean)
}

/// 调研最终结果.
pub struct SurveyResult {
    pub volumes: Vec<(String, VolumeOutcome)>,
    pub krel: KrelResult,
    pub aggregate: BTreeMap<String, Vec<f64>>,
}

impl SurveyResult {
    /// 打印运行结果.
    pub fn analyze(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();

        utils::sep_to(&mut out)?;
        for (name, outcome) in self.volumes.iter() {
            describe_into(name, outcome, &mut out)?;
            writeln!(out)?;
            utils::sep_to(&mut out)?;
        }

        if !self.krel.is_empty() {
            writeln!(out, "Krel results ({} records):", self.krel.len())?;
            self.krel.to_dataframe().write_csv(&mut out)?;
            utils::sep_to(&mut out)?;
        }

        for (key, column) in self.aggregate.iter() {
            if !key.ends_with("_middle") {
                continue;
            }
            match valid_mean(column) {
                (n, Some(m)) => writeln!(out, "{key}: {n} valid points, mean {m:.6}")?,
                (_, None) => writeln!(out, "{key}: no valid points")?,
            }
        }
        Ok(())
    }
}
