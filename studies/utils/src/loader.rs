//! 对 `pnm-berry::dataset` 的更一层封装. 提供更直接的数据集加载器.
//!
//! 数据集目录结构:
//!
//! ```text
//! <dataset>/
//!     volumes/phases-<i>.npy      相数组
//!     volumes/porosity-<i>.npy    (可选) 孔隙度图
//!     volumes/regions-<i>.npy     (可选) 分水岭区域标签
//!     volumes.npz                 (可选) 打包的相数组
//!     krel/*.npz                  Krel 表格
//! ```

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use pnm_berry::dataset::{self, volume_loader, ReadDataError, VolumeLoader};
use pnm_berry::{KrelCycleTable, Scale3d};

const PHASES_PREFIX: &str = "phases-";

/// 获取 `$HOME/dataset/<it>` 路径.
///
/// 无法确定用户主目录时返回 `None`.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    ans.extend(it);
    Some(ans)
}

/// 获取数据集基本路径.
///
/// 1. 若环境变量 `$PNM_DATASET_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/pnm`.
pub fn dataset_dir_from_env_or_home() -> Option<PathBuf> {
    match env::var("PNM_DATASET_DIR") {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => home_dataset_dir_with(["pnm"]),
    }
}

/// 解析 `"z,y,x"` 形式的体素尺寸. 三个分量都必须是正有限数.
pub fn parse_voxel_size(s: &str) -> Option<Scale3d> {
    let v: Vec<f64> = s
        .split(',')
        .map(|c| c.trim().parse::<f64>().ok())
        .collect::<Option<_>>()?;
    let size: Scale3d = v.try_into().ok()?;
    size.iter()
        .all(|s| s.is_finite() && *s > 0.0)
        .then_some(size)
}

/// 从 `$PNM_VOXEL_SIZE` 读取体素尺寸, 未设置或无法解析时为 `[1, 1, 1]`.
pub fn voxel_size_from_env() -> Scale3d {
    const UNIT: Scale3d = [1.0, 1.0, 1.0];

    match env::var("PNM_VOXEL_SIZE") {
        Ok(s) => parse_voxel_size(&s).unwrap_or_else(|| {
            log::warn!("ignoring malformed PNM_VOXEL_SIZE `{s}`");
            UNIT
        }),
        Err(_) => UNIT,
    }
}

/// 相数组文件名.
pub fn phases_name(i: u32) -> String {
    format!("{PHASES_PREFIX}{i}.npy")
}

/// 孔隙度图文件名.
pub fn porosity_name(i: u32) -> String {
    format!("porosity-{i}.npy")
}

/// 区域标签文件名.
pub fn regions_name(i: u32) -> String {
    format!("regions-{i}.npy")
}

/// 目录下全部 `phases-<i>.npy` 的编号, 升序排列.
pub fn phases_indices<P: AsRef<Path>>(dir: P) -> io::Result<Vec<u32>> {
    let mut ans = Vec::new();
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        let index = name
            .to_str()
            .and_then(|n| n.strip_prefix(PHASES_PREFIX))
            .and_then(|n| n.strip_suffix(".npy"))
            .and_then(|n| n.parse::<u32>().ok());
        if let Some(i) = index {
            ans.push(i);
        }
    }
    ans.sort_unstable();
    Ok(ans)
}

/// 获取 `dir` 下全部相数组的加载器.
pub fn phases_loader<P: AsRef<Path>>(dir: P) -> io::Result<VolumeLoader> {
    let indices = phases_indices(dir.as_ref())?;
    Ok(volume_loader(indices, dir, phases_name))
}

/// 读取与相数组 `i` 配套的可选体数据. 文件不存在时返回 `Ok(None)`.
fn read_companion<T>(
    path: PathBuf,
    read: fn(&Path) -> Result<T, ReadDataError>,
) -> Result<Option<T>, ReadDataError> {
    if path.is_file() {
        read(&path).map(Some)
    } else {
        Ok(None)
    }
}

/// 读取与相数组 `i` 配套的孔隙度图 (若存在).
pub fn porosity_of<P: AsRef<Path>>(dir: P, i: u32) -> Result<Option<ndarray::Array3<f32>>, ReadDataError> {
    read_companion(dir.as_ref().join(porosity_name(i)), |p| dataset::read_porosity_npy(p))
}

/// 读取与相数组 `i` 配套的区域标签 (若存在).
pub fn regions_of<P: AsRef<Path>>(dir: P, i: u32) -> Result<Option<ndarray::Array3<i32>>, ReadDataError> {
    read_companion(dir.as_ref().join(regions_name(i)), |p| dataset::read_labels_npy(p))
}

/// 目录下全部 `.npz` 文件, 按文件名排列.
pub fn krel_files<P: AsRef<Path>>(dir: P) -> io::Result<Vec<PathBuf>> {
    let mut ans = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|e| e == "npz") {
            ans.push(path);
        }
    }
    ans.sort();
    Ok(ans)
}

/// 读取目录下全部 Krel 表格, 与文件名一一对应.
pub fn krel_loader<P: AsRef<Path>>(
    dir: P,
) -> io::Result<impl Iterator<Item = (String, Result<KrelCycleTable, ReadDataError>)>> {
    Ok(krel_files(dir)?.into_iter().map(|p| {
        let name = p
            .file_stem()
            .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
        (name, dataset::read_krel_npz(&p))
    }))
}
