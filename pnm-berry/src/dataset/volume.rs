//! `.npy` 体数据读取, 支持常见的存储类型.

use std::io;
use std::path::Path;

use ndarray::Array3;
use ndarray_npy::{read_npy, ReadNpyError, ReadableElement};

use super::ReadDataError;

/// 一种候选存储类型的读取函数.
type Reader<T> = fn(&Path) -> Result<Array3<T>, ReadNpyError>;

/// 以存储类型 `A` 读取, 再逐元素转换为 `T`.
fn read_cast<A, T, F>(path: &Path, f: F) -> Result<Array3<T>, ReadNpyError>
where
    A: ReadableElement + Copy,
    F: Fn(A) -> T,
{
    let a: Array3<A> = read_npy(path)?;
    Ok(a.mapv(f))
}

/// 依次尝试各个候选类型. 只有类型不符时才尝试下一个.
fn read_any<T>(path: &Path, readers: &[Reader<T>]) -> Result<Array3<T>, ReadDataError> {
    let mut mismatch = None;
    for read in readers {
        match read(path) {
            Ok(a) => return Ok(a),
            Err(e @ ReadNpyError::WrongDescriptor(_)) => mismatch = Some(e),
            Err(e) => return Err(e.into()),
        }
    }
    Err(mismatch.map_or_else(
        || ReadDataError::Io(io::ErrorKind::InvalidData.into()),
        ReadDataError::from,
    ))
}

/// 读取相数组. 支持 `u8`, `i32`, `i64`, `u16` 存储.
pub fn read_phases_npy<P: AsRef<Path>>(path: P) -> Result<Array3<u8>, ReadDataError> {
    read_any(
        path.as_ref(),
        &[
            |p| read_cast(p, |v: u8| v),
            |p| read_cast(p, |v: i32| v.clamp(0, 255) as u8),
            |p| read_cast(p, |v: i64| v.clamp(0, 255) as u8),
            |p| read_cast(p, |v: u16| v.min(255) as u8),
        ],
    )
}

/// 读取区域标签. 支持 `i32`, `i64`, `u32`, `u16`, `u8` 存储. 负值视为背景.
pub fn read_labels_npy<P: AsRef<Path>>(path: P) -> Result<Array3<i32>, ReadDataError> {
    read_any(
        path.as_ref(),
        &[
            |p| read_cast(p, |v: i32| v.max(0)),
            |p| read_cast(p, |v: i64| v.clamp(0, i32::MAX as i64) as i32),
            |p| read_cast(p, |v: u32| v.min(i32::MAX as u32) as i32),
            |p| read_cast(p, |v: u16| v as i32),
            |p| read_cast(p, |v: u8| v as i32),
        ],
    )
}

/// 读取孔隙度图 (0-100). 支持 `f32`, `f64`, `u8` 存储.
pub fn read_porosity_npy<P: AsRef<Path>>(path: P) -> Result<Array3<f32>, ReadDataError> {
    read_any(
        path.as_ref(),
        &[
            |p| read_cast(p, |v: f32| v),
            |p| read_cast(p, |v: f64| v as f32),
            |p| read_cast(p, |v: u8| v as f32),
        ],
    )
}
