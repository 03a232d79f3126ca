//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx3d, Scale3d};

pub use crate::consts::phase::{RESOLVED, SOLID, UNRESOLVED};
pub use crate::consts::{DEFAULT_BLUR_SIGMA, KREL_GRID_POINTS};

pub use crate::network::{
    ExtractError, ExtractResult, NetworkSummary, NetworkTables, PoreNetwork, RawColumn,
    RawNetwork, Table,
};

pub use crate::extract::{
    extract, extract_network, ExtractParams, ExtractRequest, Extraction, ExtractionBackend,
    NativeBackend, SnowParams,
};

pub use crate::krel::{
    krel_curve_analysis, wettability_indices, Cell, KrelCycleTable, KrelError, KrelResult,
    KrelResultRow, KrelRow, KrelTables, ResultFrame, Wettability,
};

pub use crate::dataset::{
    self, read_krel_npz, read_labels_npy, read_phases_npy, read_porosity_npy, ReadDataError,
};
