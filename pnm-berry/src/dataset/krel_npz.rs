//! `.npz` 格式的 Krel 表格.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use ndarray::{Array1, Ix1, OwnedRepr};
use ndarray_npy::{NpzReader, ReadNpyError, ReadNpzError};

use super::ReadDataError;
use crate::krel::KrelCycleTable;

const COLUMNS: [&str; 6] = ["cycle", "Sw", "Pc", "Krw", "Kro", "RI"];

/// 按 `f64` 读取一维数组; 整数存储的列 (如 `cycle`) 转换为 `f64`.
fn read_column<R: Read + Seek>(npz: &mut NpzReader<R>, name: &str) -> Result<Array1<f64>, ReadNpzError> {
    match npz.by_name::<OwnedRepr<f64>, Ix1>(name) {
        Err(ReadNpzError::Npy(ReadNpyError::WrongDescriptor(_))) => {}
        other => return other,
    }
    match npz.by_name::<OwnedRepr<i64>, Ix1>(name) {
        Ok(a) => Ok(a.mapv(|v| v as f64)),
        Err(ReadNpzError::Npy(ReadNpyError::WrongDescriptor(_))) => npz
            .by_name::<OwnedRepr<i32>, Ix1>(name)
            .map(|a| a.mapv(f64::from)),
        Err(e) => Err(e),
    }
}

/// 从 `.npz` 文件读取 Krel 表格. 数组名可以带或不带 `.npy` 后缀,
/// 不认识的数组被忽略.
pub fn read_krel_npz<P: AsRef<Path>>(path: P) -> Result<KrelCycleTable, ReadDataError> {
    let mut npz = NpzReader::new(File::open(path.as_ref())?)?;
    let names = npz.names()?;

    let mut columns = Vec::with_capacity(COLUMNS.len());
    for column in COLUMNS {
        let stored = names
            .iter()
            .find(|n| n.as_str() == column || n.strip_suffix(".npy") == Some(column));
        if let Some(stored) = stored {
            let values = read_column(&mut npz, stored)?;
            columns.push((column, values.to_vec()));
        }
    }
    log::debug!("{}: {} columns", path.as_ref().display(), columns.len());
    Ok(KrelCycleTable::from_columns(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use ndarray_npy::NpzWriter;

    #[test]
    fn test_read_krel_npz() {
        let path = std::env::temp_dir().join(format!("pnm-berry-{}-krel.npz", std::process::id()));
        {
            let mut w = NpzWriter::new(File::create(&path).unwrap());
            w.add_array("cycle", &array![1i64, 2, 2]).unwrap();
            w.add_array("Sw", &array![1.0, 0.2, 0.6]).unwrap();
            w.add_array("Krw", &array![1.0, 0.0, 0.3]).unwrap();
            w.add_array("Kro", &array![0.0, 0.8, 0.1]).unwrap();
            w.add_array("Pc", &array![0.0, 2.0, -1.0]).unwrap();
            w.add_array("extra", &array![1.0]).unwrap();
            w.finish().unwrap();
        }
        let t = read_krel_npz(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(t.rows().len(), 3);
        assert_eq!(t.cycle(2).pc, Some(vec![2.0, -1.0]));
        assert!(!t.has_ri());
    }

    #[test]
    fn test_missing_column() {
        let path = std::env::temp_dir().join(format!("pnm-berry-{}-bad.npz", std::process::id()));
        {
            let mut w = NpzWriter::new(File::create(&path).unwrap());
            w.add_array("Sw", &array![1.0]).unwrap();
            w.finish().unwrap();
        }
        let err = read_krel_npz(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, ReadDataError::Table(_)));
    }
}
