//! 数据集调研: 从体数据提取孔隙网络, 并分析全部 Krel 表格.
//!
//! 数据集路径取自 `$PNM_DATASET_DIR` (或 `$HOME/dataset/pnm`), 体素尺寸取自
//! `$PNM_VOXEL_SIZE`, 日志级别取自 `$PNM_LOG` (默认 `info`).

mod result;
mod runner;

use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    let level = env::var("PNM_LOG")
        .ok()
        .and_then(|s| s.parse::<log::Level>().ok())
        .unwrap_or(log::Level::Info);
    if let Err(e) = simple_logger::init_with_level(level) {
        eprintln!("cannot initialise logger: {e}");
    }

    println!("Running dataset survey...");
    let report = runner::run().and_then(|r| r.analyze());
    match report {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
