use ndarray::{Array2, Zip};

use crate::error::{Error, Result};

/// Boolean grid co-registered with a `RasterImage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask(Array2<bool>);

impl Mask {
    pub fn from_array(values: Array2<bool>) -> Self {
        Mask(values)
    }

    pub fn filled(shape: (usize, usize), value: bool) -> Self {
        Mask(Array2::from_elem(shape, value))
    }

    pub fn all_valid(shape: (usize, usize)) -> Self {
        Self::filled(shape, true)
    }

    pub fn shape(&self) -> (usize, usize) {
        self.0.dim()
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        self.0[[row, col]]
    }

    pub fn as_array(&self) -> &Array2<bool> {
        &self.0
    }

    pub fn into_array(self) -> Array2<bool> {
        self.0
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&v| v).count()
    }

    fn check_shape(&self, other: &Mask) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::ShapeMismatch {
                band: "mask".to_string(),
                expected: self.shape(),
                actual: other.shape(),
            });
        }
        Ok(())
    }

    fn combine(&self, other: &Mask, f: impl Fn(bool, bool) -> bool + Sync) -> Result<Mask> {
        self.check_shape(other)?;
        Ok(Mask(
            Zip::from(&self.0)
                .and(&other.0)
                .par_map_collect(|&a, &b| f(a, b)),
        ))
    }

    pub fn and(&self, other: &Mask) -> Result<Mask> {
        self.combine(other, |a, b| a && b)
    }

    pub fn or(&self, other: &Mask) -> Result<Mask> {
        self.combine(other, |a, b| a || b)
    }

    /// `self AND NOT other`
    pub fn and_not(&self, other: &Mask) -> Result<Mask> {
        self.combine(other, |a, b| a && !b)
    }

    pub fn not(&self) -> Mask {
        Mask(self.0.mapv(|v| !v))
    }

    /// Every pixel set here is also set in `other`.
    pub fn is_subset_of(&self, other: &Mask) -> bool {
        self.shape() == other.shape()
            && Zip::from(&self.0)
                .and(&other.0)
                .all(|&a, &b| !a || b)
    }
}
