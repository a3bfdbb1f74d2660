use ndarray::Array2;

use super::mask::Mask;

/// Outcome of the water test for one pixel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Masked upstream or numerically degenerate; the test never ran
    NotEvaluated,
    NonLake,
    Lake,
}

/// Sparse lake band: only `Lake` pixels carry a sample, everything else is no-data.
/// The tri-state keeps "tested and rejected" apart from "never tested".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LakeMask {
    cells: Array2<Classification>,
}

impl LakeMask {
    pub fn new(cells: Array2<Classification>) -> Self {
        Self { cells }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.cells.dim()
    }

    pub fn classification(&self, row: usize, col: usize) -> Classification {
        self.cells[[row, col]]
    }

    pub fn cells(&self) -> &Array2<Classification> {
        &self.cells
    }

    /// Band sample: `Some(1)` on lake pixels, no value elsewhere.
    pub fn sample(&self, row: usize, col: usize) -> Option<u8> {
        match self.cells[[row, col]] {
            Classification::Lake => Some(1),
            Classification::NonLake | Classification::NotEvaluated => None,
        }
    }

    pub fn samples(&self) -> impl Iterator<Item = Option<u8>> + '_ {
        self.cells.iter().map(|c| match c {
            Classification::Lake => Some(1),
            _ => None,
        })
    }

    pub fn lake_pixels(&self) -> Mask {
        Mask::from_array(self.cells.mapv(|c| c == Classification::Lake))
    }

    /// Pixels the water test actually ran on.
    pub fn evaluated(&self) -> Mask {
        Mask::from_array(self.cells.mapv(|c| c != Classification::NotEvaluated))
    }

    pub fn lake_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|&&c| c == Classification::Lake)
            .count()
    }

    /// Dense byte raster with no-data filled by 0.
    pub fn to_u8(&self) -> Array2<u8> {
        self.cells
            .mapv(|c| if c == Classification::Lake { 1 } else { 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn only_lake_pixels_have_samples() {
        let m = LakeMask::new(array![
            [Classification::Lake, Classification::NonLake],
            [Classification::NotEvaluated, Classification::Lake]
        ]);
        assert_eq!(m.sample(0, 0), Some(1));
        assert_eq!(m.sample(0, 1), None);
        assert_eq!(m.sample(1, 0), None);
        assert_eq!(m.lake_count(), 2);
        assert_eq!(m.evaluated().count(), 3);
        assert_eq!(m.to_u8(), array![[1u8, 0], [0, 1]]);
        assert!(m.samples().flatten().all(|v| v == 1));
    }
}
