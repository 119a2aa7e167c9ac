//! Shear and convergence maps as typed views over a two-plane [`Grid`]

use ndarray::{Axis, Zip};

use crate::io::error::{MappingError, Result, dimension_mismatch};
use crate::math::spectral::{KaiserSquires, KsDirection};
use crate::spatial::grid::Grid;

fn require_two_planes(grid: &Grid, what: &'static str) -> Result<()> {
    let (sx, sy, sz) = grid.dim();
    if sx == 0 || sy == 0 {
        return Err(MappingError::MissingInput { what });
    }
    if sz < 2 {
        return Err(dimension_mismatch(what, (sx, sy, 2), (sx, sy, sz)));
    }
    Ok(())
}

fn convert(grid: &Grid, ks: &KaiserSquires, direction: KsDirection) -> Grid {
    Grid::new(
        ks.apply(grid.values().view(), direction),
        *grid.boundaries(),
        grid.galaxy_count(),
    )
}

/// Observed shear: plane 0 is `gamma1`, plane 1 is `gamma2`
#[derive(Debug, Clone, PartialEq)]
pub struct ShearMap {
    grid: Grid,
}

impl ShearMap {
    /// Interpret a grid as shear
    ///
    /// # Errors
    ///
    /// Returns an error if the grid is spatially empty or has fewer than two planes
    pub fn new(grid: Grid) -> Result<Self> {
        require_two_planes(&grid, "shear map")?;
        Ok(Self { grid })
    }

    /// Underlying grid
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Mutable underlying grid
    pub const fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Release the underlying grid
    pub fn into_grid(self) -> Grid {
        self.grid
    }

    /// Kaiser-Squires inversion to (`kappa_E`, `kappa_B`)
    pub fn to_convergence(&self) -> ConvergenceMap {
        let ks = KaiserSquires::new(self.grid.size_x(), self.grid.size_y());
        self.to_convergence_with(&ks)
    }

    /// Kaiser-Squires inversion reusing prepared plans
    pub fn to_convergence_with(&self, ks: &KaiserSquires) -> ConvergenceMap {
        ConvergenceMap {
            grid: convert(&self.grid, ks, KsDirection::ShearToConvergence),
        }
    }

    /// Reduced shear `g = gamma / (1 - kappa_E)` applied to both components
    ///
    /// Pixels where `kappa_E == 1` are left unscaled.
    ///
    /// # Errors
    ///
    /// Returns an error if the convergence map lies on another pixel grid
    pub fn to_reduced_shear(&self, convergence: &ConvergenceMap) -> Result<Self> {
        self.scale_by_convergence(convergence, |gamma, kappa| {
            let denominator = 1.0 - kappa;
            if denominator == 0.0 {
                gamma
            } else {
                gamma / denominator
            }
        })
    }

    /// Shear `gamma = g * (1 - kappa_E)` from a reduced shear map
    ///
    /// # Errors
    ///
    /// Returns an error if the convergence map lies on another pixel grid
    pub fn from_reduced_shear(reduced: &Self, convergence: &ConvergenceMap) -> Result<Self> {
        reduced.scale_by_convergence(convergence, |g, kappa| g * (1.0 - kappa))
    }

    fn scale_by_convergence(
        &self,
        convergence: &ConvergenceMap,
        op: impl Fn(f64, f64) -> f64,
    ) -> Result<Self> {
        let (sx, sy, sz) = self.grid.dim();
        let (cx, cy, cz) = convergence.grid.dim();
        if (sx, sy) != (cx, cy) {
            return Err(dimension_mismatch("reduced shear", (sx, sy, sz), (cx, cy, cz)));
        }
        let kappa_e = convergence.grid.values().index_axis(Axis(2), 0);
        let mut grid = self.grid.clone();
        for mut plane in grid.values_mut().axis_iter_mut(Axis(2)) {
            Zip::from(&mut plane)
                .and(&kappa_e)
                .for_each(|gamma, &kappa| *gamma = op(*gamma, kappa));
        }
        Ok(Self { grid })
    }
}

/// Projected mass: plane 0 is the E-mode signal, plane 1 the B-mode null test
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceMap {
    grid: Grid,
}

impl ConvergenceMap {
    /// Interpret a grid as convergence
    ///
    /// # Errors
    ///
    /// Returns an error if the grid is spatially empty or has fewer than two planes
    pub fn new(grid: Grid) -> Result<Self> {
        require_two_planes(&grid, "convergence map")?;
        Ok(Self { grid })
    }

    /// Underlying grid
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Mutable underlying grid
    pub const fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Release the underlying grid
    pub fn into_grid(self) -> Grid {
        self.grid
    }

    /// Kaiser-Squires forward relation to (`gamma1`, `gamma2`)
    pub fn to_shear(&self) -> ShearMap {
        let ks = KaiserSquires::new(self.grid.size_x(), self.grid.size_y());
        self.to_shear_with(&ks)
    }

    /// Forward relation reusing prepared plans
    pub fn to_shear_with(&self, ks: &KaiserSquires) -> ShearMap {
        ShearMap {
            grid: convert(&self.grid, ks, KsDirection::ConvergenceToShear),
        }
    }
}
