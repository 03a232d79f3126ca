//! 数据集读取.
//!
//! 体数据以 `.npy` 文件 (或多个体数据打包的 `.npz` 文件) 存储, Krel 表格以 `.npz`
//! 文件存储, 每列一个数组: `cycle`, `Sw`, `Pc`, `Krw`, `Kro`, `RI`.

use ndarray_npy::{ReadNpyError, ReadNpzError};
use thiserror::Error;

use crate::krel::KrelError;

mod generic;
mod krel_npz;
mod npz_database;
mod volume;

pub use generic::{volume_loader, FilenameBuilder, VolumeLoader};
pub use krel_npz::read_krel_npz;
pub use npz_database::VolumeArchive;
pub use volume::{read_labels_npy, read_phases_npy, read_porosity_npy};

/// 数据读取错误.
#[derive(Debug, Error)]
pub enum ReadDataError {
    /// 底层 I/O 错误.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `.npy` 解析错误.
    #[error("failed to read npy: {0}")]
    Npy(#[from] ReadNpyError),

    /// `.npz` 解析错误.
    #[error("failed to read npz: {0}")]
    Npz(#[from] ReadNpzError),

    /// Krel 表格不合法.
    #[error("invalid krel table: {0}")]
    Table(#[from] KrelError),

    /// 工作通道太多.
    #[error("too many workers, at most {0}")]
    TooManyWorkers(usize),
}
