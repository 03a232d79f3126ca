use std::fs::{File, OpenOptions};
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use ndarray::{Array3, Ix3, OwnedRepr};
use ndarray_npy::{NpzReader, ReadNpzError};

use super::ReadDataError;

/// 最多支持的工作通道个数.
const MAX_WORKERS: usize = 64;

/// 打包了多个分割体数据 (相数组或区域标签) 的 npz 文件.
///
/// 同一个文件会被打开多次, 每个工作通道一个句柄, 多个线程可以同时读取不同的体数据.
pub struct VolumeArchive {
    entries: Vec<Mutex<NpzReader<File>>>,
    turn: AtomicUsize,
}

impl VolumeArchive {
    /// 以 `workers` 个工作通道打开路径 `p`. `workers` 最大为 64.
    pub fn new<P: AsRef<Path>>(workers: NonZeroUsize, p: P) -> Result<Self, ReadDataError> {
        let workers = workers.get();
        if workers > MAX_WORKERS {
            return Err(ReadDataError::TooManyWorkers(MAX_WORKERS));
        }
        let mut v = Vec::with_capacity(workers);
        for _ in 0..workers {
            let file = OpenOptions::new().read(true).open(p.as_ref())?;
            v.push(Mutex::new(NpzReader::new(file)?));
        }
        Ok(Self {
            entries: v,
            turn: AtomicUsize::new(0),
        })
    }

    /// 按数组名读取相数组.
    pub fn phases_by_name(&self, name: &str) -> Result<Array3<u8>, ReadNpzError> {
        self.slot().by_name::<OwnedRepr<u8>, Ix3>(name)
    }

    /// 按数组名读取区域标签.
    pub fn labels_by_name(&self, name: &str) -> Result<Array3<i32>, ReadNpzError> {
        self.slot().by_name::<OwnedRepr<i32>, Ix3>(name)
    }

    /// 按序号读取相数组.
    pub fn phases_by_index(&self, index: usize) -> Result<Array3<u8>, ReadNpzError> {
        self.slot().by_index::<OwnedRepr<u8>, Ix3>(index)
    }

    /// 全部数组名.
    pub fn names(&self) -> Result<Vec<String>, ReadNpzError> {
        self.slot().names()
    }

    /// 工作通道个数.
    #[inline]
    pub fn worker_len(&self) -> usize {
        self.entries.len()
    }

    /// 体数据个数.
    pub fn len(&self) -> usize {
        self.slot().len()
    }

    /// 是否不含任何体数据?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 轮流选取一个工作通道. 某个读取线程 panic 不影响其它线程继续使用该句柄.
    fn slot(&self) -> MutexGuard<'_, NpzReader<File>> {
        let i = self.turn.fetch_add(1, Ordering::Relaxed) % self.worker_len();
        self.entries[i].lock().unwrap_or_else(PoisonError::into_inner)
    }
}
