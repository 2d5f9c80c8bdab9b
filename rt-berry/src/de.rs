//! 反序列化校验.
//!
//! 反序列化得到的数据与构造函数得到的数据遵守同样的约束: 先读入字段,
//! 再交给对应的构造函数检查. 检查失败时反序列化失败.

use ndarray::Array3;
use serde::{Deserialize, Serialize};

use crate::config::{ExtractSpec, InterpSpec, MarginSpec, RasterSpec};
use crate::interp::InterpAlgorithm;
use crate::{Contour, ContourSet, GeometryError, Grid, ScalarField, Vec3};

#[inline]
fn invalid(what: &str) -> GeometryError {
    GeometryError::InvalidInput(format!("deserialized {what} is not valid"))
}

#[derive(Serialize, Deserialize)]
pub struct RawGrid {
    pub sizes: (usize, usize, usize),
    pub spacing_mm: Vec3,
    pub origin_mm: Vec3,
}

impl TryFrom<RawGrid> for Grid {
    type Error = GeometryError;

    fn try_from(raw: RawGrid) -> Result<Self, Self::Error> {
        Grid::new(raw.sizes, raw.spacing_mm, raw.origin_mm).ok_or_else(|| invalid("grid"))
    }
}

#[derive(Serialize, Deserialize)]
pub struct RawScalarField {
    pub grid: Grid,
    pub data: Array3<f64>,
}

impl TryFrom<RawScalarField> for ScalarField {
    type Error = GeometryError;

    fn try_from(raw: RawScalarField) -> Result<Self, Self::Error> {
        if raw.data.dim() != raw.grid.shape() {
            return Err(invalid("scalar field shape"));
        }
        ScalarField::from_raw(raw.grid, raw.data.iter().copied().collect())
            .ok_or_else(|| invalid("scalar field"))
    }
}

#[derive(Serialize, Deserialize)]
pub struct RawContour {
    pub slice_position_mm: f64,
    pub points: Vec<Vec3>,
}

impl TryFrom<RawContour> for Contour {
    type Error = GeometryError;

    fn try_from(raw: RawContour) -> Result<Self, Self::Error> {
        if !raw.slice_position_mm.is_finite() {
            return Err(invalid("slice position"));
        }
        Ok(Contour::new(raw.slice_position_mm, raw.points))
    }
}

#[derive(Serialize, Deserialize)]
pub struct RawContourSet {
    pub contours: Vec<Contour>,
}

impl From<RawContourSet> for ContourSet {
    fn from(raw: RawContourSet) -> Self {
        ContourSet::new(raw.contours)
    }
}

#[derive(Serialize, Deserialize)]
pub struct RawRasterSpec {
    pub spacing_mm: Vec3,
    pub padding_mm: f64,
}

impl TryFrom<RawRasterSpec> for RasterSpec {
    type Error = GeometryError;

    fn try_from(raw: RawRasterSpec) -> Result<Self, Self::Error> {
        RasterSpec::new(raw.spacing_mm, raw.padding_mm).ok_or_else(|| invalid("raster spec"))
    }
}

#[derive(Serialize, Deserialize)]
pub struct RawMarginSpec {
    pub margin_mm: f64,
    pub use_correction: bool,
}

impl TryFrom<RawMarginSpec> for MarginSpec {
    type Error = GeometryError;

    fn try_from(raw: RawMarginSpec) -> Result<Self, Self::Error> {
        MarginSpec::new(raw.margin_mm, raw.use_correction).ok_or_else(|| invalid("margin spec"))
    }
}

#[derive(Serialize, Deserialize)]
pub struct RawExtractSpec {
    pub tolerance_mm: Option<f64>,
    pub allow_new_slices: bool,
}

impl TryFrom<RawExtractSpec> for ExtractSpec {
    type Error = GeometryError;

    fn try_from(raw: RawExtractSpec) -> Result<Self, Self::Error> {
        ExtractSpec::new(raw.tolerance_mm, raw.allow_new_slices)
            .ok_or_else(|| invalid("extract spec"))
    }
}

#[derive(Serialize, Deserialize)]
pub struct RawInterpSpec {
    pub algorithm: InterpAlgorithm,
    pub samples: usize,
    pub smoothing_window: usize,
    pub sdf_spacing_mm: f64,
}

impl TryFrom<RawInterpSpec> for InterpSpec {
    type Error = GeometryError;

    fn try_from(raw: RawInterpSpec) -> Result<Self, Self::Error> {
        InterpSpec::new(
            raw.algorithm,
            raw.samples,
            raw.smoothing_window,
            raw.sdf_spacing_mm,
        )
        .ok_or_else(|| invalid("interpolation spec"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::occupancy::INSIDE;

    fn grid() -> Grid {
        Grid::new((4, 3, 2), (1.0, 1.0, 2.5), (0.0, 0.0, -1.0)).unwrap()
    }

    #[test]
    fn test_valid_round_trip() {
        let mut f = ScalarField::empty_mask(grid());
        f[(1, 2, 3)] = INSIDE;
        let bytes = bincode::serialize(&f).unwrap();
        let back: ScalarField = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, f);

        let spec = InterpSpec::default();
        let bytes = bincode::serialize(&spec).unwrap();
        assert_eq!(bincode::deserialize::<InterpSpec>(&bytes).unwrap(), spec);

        let set = ContourSet::new(vec![
            Contour::from_xy(3.0, [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]),
            Contour::from_xy(1.0, [(0.0, 0.0), (2.0, 0.0), (0.0, 2.0)]),
        ]);
        let bytes = bincode::serialize(&set).unwrap();
        assert_eq!(bincode::deserialize::<ContourSet>(&bytes).unwrap(), set);
    }

    #[test]
    fn test_bad_grid_rejected() {
        let zero_spacing = RawGrid {
            sizes: (4, 4, 1),
            spacing_mm: (1.0, 1.0, 0.0),
            origin_mm: (0.0, 0.0, 0.0),
        };
        let bytes = bincode::serialize(&zero_spacing).unwrap();
        assert!(bincode::deserialize::<Grid>(&bytes).is_err());

        let zero_size = RawGrid {
            sizes: (4, 0, 1),
            spacing_mm: (1.0, 1.0, 1.0),
            origin_mm: (0.0, 0.0, 0.0),
        };
        let bytes = bincode::serialize(&zero_size).unwrap();
        assert!(bincode::deserialize::<Grid>(&bytes).is_err());
    }

    #[test]
    fn test_field_shape_mismatch_rejected() {
        // 网格为 4 x 4 x 1, 数据却只有 1 x 2 x 2.
        let raw = RawScalarField {
            grid: Grid::new((4, 4, 1), (1.0, 1.0, 1.0), (0.0, 0.0, 0.0)).unwrap(),
            data: Array3::from_elem((1, 2, 2), INSIDE),
        };
        let bytes = bincode::serialize(&raw).unwrap();
        assert!(bincode::deserialize::<ScalarField>(&bytes).is_err());
    }

    #[test]
    fn test_bad_specs_rejected() {
        let raster = RawRasterSpec {
            spacing_mm: (1.0, 1.0, 0.0),
            padding_mm: 2.0,
        };
        let bytes = bincode::serialize(&raster).unwrap();
        assert!(bincode::deserialize::<RasterSpec>(&bytes).is_err());

        let margin = RawMarginSpec {
            margin_mm: f64::NAN,
            use_correction: true,
        };
        let bytes = bincode::serialize(&margin).unwrap();
        assert!(bincode::deserialize::<MarginSpec>(&bytes).is_err());

        let extract = RawExtractSpec {
            tolerance_mm: Some(-1.0),
            allow_new_slices: true,
        };
        let bytes = bincode::serialize(&extract).unwrap();
        assert!(bincode::deserialize::<ExtractSpec>(&bytes).is_err());

        let interp = RawInterpSpec {
            algorithm: InterpAlgorithm::ArcLength,
            samples: 2,
            smoothing_window: 5,
            sdf_spacing_mm: 1.0,
        };
        let bytes = bincode::serialize(&interp).unwrap();
        assert!(bincode::deserialize::<InterpSpec>(&bytes).is_err());
    }

    #[test]
    fn test_contour_z_is_restored() {
        let raw = RawContour {
            slice_position_mm: 2.0,
            points: vec![(0.0, 0.0, 9.0), (1.0, 0.0, 9.0), (0.0, 1.0, 9.0)],
        };
        let bytes = bincode::serialize(&raw).unwrap();
        let c: Contour = bincode::deserialize(&bytes).unwrap();
        assert!(c.points().iter().all(|p| p.2 == 2.0));

        let raw = RawContour {
            slice_position_mm: f64::NAN,
            points: vec![(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0)],
        };
        let bytes = bincode::serialize(&raw).unwrap();
        assert!(bincode::deserialize::<Contour>(&bytes).is_err());
    }
}
