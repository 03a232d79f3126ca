//! 程序运行函数.

use std::io;
use std::num::NonZeroUsize;
use std::path::Path;
use std::thread;

use pnm_berry::dataset::VolumeArchive;
use pnm_berry::prelude::*;
use utils::loader;

use crate::result::{SurveyResult, VolumeOutcome};

fn outcome_of(result: ExtractResult<Option<PoreNetwork>>) -> VolumeOutcome {
    match result {
        Ok(Some(net)) => VolumeOutcome::Network {
            pores: net.pores.len(),
            throats: net.throats.len(),
            summary: net.summary,
        },
        Ok(None) => VolumeOutcome::Empty,
        Err(e) => VolumeOutcome::Failed(e.to_string()),
    }
}

/// 逐个提取 `volumes/` 下的相数组, 配套的孔隙度图与区域标签一并使用.
fn survey_volumes(dir: &Path, voxel_scale: Scale3d) -> io::Result<Vec<(String, VolumeOutcome)>> {
    let mut ans = Vec::new();
    for (i, phases) in loader::phases_loader(dir)? {
        let name = loader::phases_name(i);
        let request = phases.and_then(|phases| {
            Ok(ExtractRequest {
                multiphase: Some(phases),
                watershed: loader::regions_of(dir, i)?,
                voxel_scale,
                porosity_map: loader::porosity_of(dir, i)?,
                params: ExtractParams::default(),
            })
        });
        let outcome = match request {
            Ok(request) => outcome_of(extract_network(&NativeBackend, request)),
            Err(e) => VolumeOutcome::Failed(e.to_string()),
        };
        log::info!("{name} done");
        ans.push((name, outcome));
    }
    Ok(ans)
}

/// 一个工作线程的结果. 线程崩溃时 (`joined` 为 `None`), 该批次的每个体数据都记为失败.
fn chunk_outcomes(
    names: &[String],
    joined: Option<Vec<(String, VolumeOutcome)>>,
) -> Vec<(String, VolumeOutcome)> {
    joined.unwrap_or_else(|| {
        log::error!("archive worker panicked, {} volumes lost", names.len());
        names
            .iter()
            .map(|name| (name.clone(), VolumeOutcome::Failed("worker panicked".to_string())))
            .collect()
    })
}

/// 多个工作线程并行提取打包文件中的全部相数组.
fn survey_archive(path: &Path, voxel_scale: Scale3d) -> Result<Vec<(String, VolumeOutcome)>, ReadDataError> {
    let workers = NonZeroUsize::new(utils::cpus().min(64)).unwrap_or(NonZeroUsize::MIN);
    let archive = VolumeArchive::new(workers, path)?;
    let names = archive.names()?;
    let chunk = names.len().div_ceil(workers.get()).max(1);

    let ans: Vec<(String, VolumeOutcome)> = thread::scope(|s| {
        let archive = &archive;
        let handles: Vec<_> = names
            .chunks(chunk)
            .map(|names| {
                let handle = s.spawn(move || {
                    names
                        .iter()
                        .map(|name| {
                            let outcome = match archive.phases_by_name(name) {
                                Ok(phases) => outcome_of(extract_network(
                                    &NativeBackend,
                                    ExtractRequest {
                                        multiphase: Some(phases),
                                        voxel_scale,
                                        ..Default::default()
                                    },
                                )),
                                Err(e) => VolumeOutcome::Failed(e.to_string()),
                            };
                            (name.clone(), outcome)
                        })
                        .collect::<Vec<_>>()
                });
                (names, handle)
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|(names, h)| chunk_outcomes(names, h.join().ok()))
            .collect()
    });
    Ok(ans)
}

/// 分析 `krel/` 下的全部表格. 每个工作线程累积一个 [`KrelResult`], 最后合并.
fn survey_krel(dir: &Path) -> io::Result<(KrelResult, Vec<KrelCycleTable>)> {
    let mut tables = Vec::new();
    for (name, table) in loader::krel_loader(dir)? {
        match table {
            Ok(t) => tables.push((name, t)),
            Err(e) => log::warn!("skipping krel table `{name}`: {e}"),
        }
    }
    let chunk = tables.len().div_ceil(utils::cpus()).max(1);

    let mut result = KrelResult::new();
    thread::scope(|s| {
        let handles: Vec<_> = tables
            .chunks(chunk)
            .map(|part| {
                s.spawn(move || {
                    let mut r = KrelResult::new();
                    for (name, table) in part {
                        r.add_single_result([("file", name.as_str())], table);
                    }
                    r
                })
            })
            .collect();
        for h in handles {
            match h.join() {
                Ok(r) => result.merge(r),
                Err(_) => log::error!("krel worker panicked"),
            }
        }
    });
    Ok((result, tables.into_iter().map(|(_, t)| t).collect()))
}

/// 实际运行.
pub fn run() -> io::Result<SurveyResult> {
    let dir = loader::dataset_dir_from_env_or_home()
        .filter(|d| d.is_dir())
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "dataset directory not found"))?;
    let voxel_scale = loader::voxel_size_from_env();
    log::info!("surveying {} with voxel size {voxel_scale:?}", dir.display());

    let volumes_dir = dir.join("volumes");
    let mut volumes = if volumes_dir.is_dir() {
        survey_volumes(&volumes_dir, voxel_scale)?
    } else {
        Vec::new()
    };

    let archive = dir.join("volumes.npz");
    if archive.is_file() {
        match survey_archive(&archive, voxel_scale) {
            Ok(v) => volumes.extend(v),
            Err(e) => log::error!("cannot read {}: {e}", archive.display()),
        }
    }

    let krel_dir = dir.join("krel");
    let (krel, tables) = if krel_dir.is_dir() {
        survey_krel(&krel_dir)?
    } else {
        (KrelResult::new(), Vec::new())
    };
    let aggregate = KrelTables::get_complete_dict(&tables);

    Ok(SurveyResult {
        volumes,
        krel,
        aggregate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panicked_chunk_is_reported() {
        let names = vec!["a.npy".to_string(), "b.npy".to_string()];
        let out = chunk_outcomes(&names, None);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].0, "b.npy");
        assert!(out
            .iter()
            .all(|(_, o)| matches!(o, VolumeOutcome::Failed(e) if e == "worker panicked")));

        let done = vec![("a.npy".to_string(), VolumeOutcome::Empty)];
        let out = chunk_outcomes(&names[..1], Some(done));
        assert!(matches!(out[0].1, VolumeOutcome::Empty));
    }
}
