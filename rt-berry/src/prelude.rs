//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d, Point2, Vec3};

pub use crate::data::{Contour, ContourSet, Grid, LayerView, LayerViewMut, ScalarField};

pub use crate::config::{ExtractSpec, InterpSpec, MarginSpec, RasterSpec};
pub use crate::consts::occupancy::{INSIDE, OUTSIDE};
pub use crate::error::{GeoResult, GeometryError};

pub use crate::extract::{extract_contours, extract_with};
pub use crate::interp::{interpolate, interpolate_slices, InterpAlgorithm};
pub use crate::morph_3d::{apply_margin, apply_margin_with};
pub use crate::raster::{rasterize, rasterize_with};

pub use crate::worker::{
    find_gaps, run_job, InterpolationGap, InterpolationJob, JobEvent, JobState, JobTicket,
    OrchestratorHandle,
};
