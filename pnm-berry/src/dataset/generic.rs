//! 通用体数据加载器.
//!
//! 提供迭代器风格的数据集获取模式.

use std::path::{Path, PathBuf};

use ndarray::Array3;

use super::{read_phases_npy, ReadDataError};

/// 文件名构造器. 接受数据集索引数, 获得文件名.
pub type FilenameBuilder = fn(u32) -> String;

/// 从指定索引、路径、文件名构造器来创建相数组加载器.
///
/// # 注意
///
/// `data` 的所有取值 `value` 必须在 `path` 下有形如 `builder(value)` 的 `.npy`
/// 文件, 否则加载器在迭代时会返回 `Err`.
pub fn volume_loader<I: IntoIterator<Item = u32>, P: AsRef<Path>>(
    data: I,
    path: P,
    builder: FilenameBuilder,
) -> VolumeLoader {
    let mut data: Vec<u32> = data.into_iter().collect();
    data.reverse();

    VolumeLoader {
        path: path.as_ref().to_owned(),
        data_rev: data,
        builder,
    }
}

/// 相数组加载器, 并在内部自动转换文件名.
#[derive(Debug)]
pub struct VolumeLoader {
    path: PathBuf,
    data_rev: Vec<u32>,
    builder: FilenameBuilder,
}

impl Iterator for VolumeLoader {
    type Item = (u32, Result<Array3<u8>, ReadDataError>);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.data_rev.pop()?;

        self.path.push((self.builder)(idx));
        let data = read_phases_npy(self.path.as_path());
        self.path.pop();

        Some((idx, data))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.data_rev.len(), Some(self.data_rev.len()))
    }
}

impl ExactSizeIterator for VolumeLoader {
    #[inline]
    fn len(&self) -> usize {
        self.data_rev.len()
    }
}
