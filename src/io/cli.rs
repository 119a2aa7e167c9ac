//! Command-line interface for mass mapping and peak counting

use crate::algorithm::inpainting::{
    InpaintingAlgo, InpaintingConfig, InpaintingObserver, InpaintingOptions, NoopObserver,
};
use crate::algorithm::peaks::PeakCountAlgo;
use crate::io::configuration::DEFAULT_LOG_LEVEL;
use crate::io::error::{MappingError, Result, invalid_parameter};
use crate::io::fits::{Provenance, read_grid, write_grid, write_peak_catalog};
use crate::io::image::export_plane_as_png;
use crate::io::progress::ProgressObserver;
use crate::spatial::maps::{ConvergenceMap, ShearMap};
use clap::{Args, Parser, Subcommand};
use flexi_logger::{Logger, LoggerHandle};
use log::{info, warn};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "massmap")]
#[command(
    author,
    version,
    about = "Reconstruct weak-lensing convergence maps and count their peaks"
)]
/// Command-line arguments for the mass-mapping tool
pub struct Cli {
    /// Pipeline to run
    #[command(subcommand)]
    pub command: Command,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log per-iteration details
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available pipelines
#[derive(Subcommand)]
pub enum Command {
    /// Convert between shear and convergence, inpainting masked shear on request
    Map(MapArgs),
    /// Detect convergence peaks and write them as a catalog
    Peaks(PeaksArgs),
}

/// Arguments of the `map` pipeline
// Each switch toggles one independent processing step
#[allow(clippy::struct_excessive_bools)]
#[derive(Args)]
pub struct MapArgs {
    /// Input shear map (FITS)
    #[arg(long, value_name = "FITS", conflicts_with = "convergence")]
    pub shear: Option<PathBuf>,

    /// Input convergence map (FITS)
    #[arg(long, value_name = "FITS")]
    pub convergence: Option<PathBuf>,

    /// Output shear map (FITS)
    #[arg(long, value_name = "FITS")]
    pub shear_output: Option<PathBuf>,

    /// Output convergence map (FITS)
    #[arg(long, value_name = "FITS")]
    pub convergence_output: Option<PathBuf>,

    /// Gaussian smoothing of the input shear, in pixels
    #[arg(long, default_value_t = 0.0)]
    pub sigma_shear: f64,

    /// Gaussian smoothing of the convergence, in pixels
    #[arg(long, default_value_t = 0.0)]
    pub sigma_convergence: f64,

    /// Subtract the per-plane mean of the input shear
    #[arg(long)]
    pub remove_shear_offset: bool,

    /// Subtract the per-plane mean of the convergence
    #[arg(long)]
    pub remove_convergence_offset: bool,

    /// Inpainting iterations (0 disables inpainting)
    #[arg(short, long, default_value_t = 0)]
    pub iterations: usize,

    /// Equalize wavelet variance inside and outside the gaps
    #[arg(long)]
    pub sigma_bounded: bool,

    /// Force the B-mode to zero inside the gaps
    #[arg(long)]
    pub b_mode_zeros: bool,

    /// Wavelet scales for inpainting (0 chooses from the map size)
    #[arg(long, default_value_t = 0)]
    pub scales: usize,

    /// Minimum and optional maximum DCT threshold; a negative maximum is chosen automatically
    #[arg(long, num_args = 1..=2, value_names = ["MIN", "MAX"], allow_negative_numbers = true)]
    pub threshold: Vec<f64>,

    /// Inpaint with DCT tiles of this size instead of the whole map
    #[arg(long, num_args = 2, value_names = ["X", "Y"])]
    pub block_size: Vec<usize>,

    /// Pad the maps with zero borders while transforming
    #[arg(long)]
    pub add_borders: bool,

    /// Treat the input as reduced shear and iterate this many times
    #[arg(long, default_value_t = 0)]
    pub reduced_shear_iterations: usize,

    /// Write a PNG preview of the E-mode convergence
    #[arg(long, value_name = "PNG")]
    pub preview: Option<PathBuf>,

    /// Log the per-plane means of the input
    #[arg(long)]
    pub print_means: bool,

    /// Replace existing output files
    #[arg(long)]
    pub overwrite: bool,
}

impl MapArgs {
    /// Inpainting parameters fixed at construction
    ///
    /// # Errors
    ///
    /// Returns an error if more than two threshold values were given
    pub fn inpainting_config(&self) -> Result<InpaintingConfig> {
        let (min_threshold, max_threshold) = match self.threshold.as_slice() {
            [] => (0.0, None),
            [min] => (*min, None),
            [min, max] => (*min, (*max >= 0.0).then_some(*max)),
            other => {
                return Err(invalid_parameter(
                    "threshold",
                    &format!("{other:?}"),
                    &"expected a minimum and an optional maximum",
                ));
            }
        };
        Ok(InpaintingConfig {
            n_scales: self.scales,
            min_threshold,
            max_threshold,
        })
    }

    /// Per-run inpainting switches
    ///
    /// # Errors
    ///
    /// Returns an error if the block size does not have exactly two entries
    pub fn inpainting_options(&self) -> Result<InpaintingOptions> {
        let block_size = match self.block_size.as_slice() {
            [] => None,
            [x, y] => Some((*x, *y)),
            other => {
                return Err(invalid_parameter(
                    "block_size",
                    &format!("{other:?}"),
                    &"expected two sizes",
                ));
            }
        };
        Ok(InpaintingOptions {
            iterations: self.iterations,
            sigma_bounds: self.sigma_bounded,
            b_mode_zeros: self.b_mode_zeros,
            block_size,
        })
    }

    /// Metadata recorded with the output convergence
    pub fn provenance(&self) -> Provenance {
        Provenance {
            b_mode_zeros: self.b_mode_zeros,
            equal_variance_per_scale: self.sigma_bounded,
            inpainting_scales: (self.scales > 0).then_some(self.scales),
            inpainting_iterations: self.iterations,
            gaussian_sigma: self.sigma_convergence,
            reduced_shear_iterations: self.reduced_shear_iterations,
        }
    }
}

/// Arguments of the `peaks` pipeline
#[derive(Args)]
pub struct PeaksArgs {
    /// Input convergence map (FITS)
    #[arg(long, value_name = "FITS")]
    pub convergence: PathBuf,

    /// Galaxy density map on the same pixel grid (FITS)
    #[arg(long, value_name = "FITS")]
    pub density: PathBuf,

    /// Output peak catalog (FITS)
    #[arg(short, long, value_name = "FITS")]
    pub output: PathBuf,

    /// Replace an existing catalog
    #[arg(long)]
    pub overwrite: bool,
}

/// Start stderr logging at `info`, or `debug` when verbose; `RUST_LOG` overrides both
///
/// Returns `None` if a logger is already installed.
pub fn init_logging(verbose: bool) -> Option<LoggerHandle> {
    let level = if verbose { "debug" } else { DEFAULT_LOG_LEVEL };
    Logger::try_with_env_or_str(level)
        .and_then(Logger::start)
        .ok()
}

/// Runs the pipeline selected on the command line
pub struct CommandRunner {
    cli: Cli,
}

impl CommandRunner {
    /// Create a runner for parsed arguments
    pub const fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the selected pipeline
    ///
    /// # Errors
    ///
    /// Returns an error if inputs are missing or invalid, or any file cannot be read or written
    pub fn run(&self) -> Result<()> {
        let start = Instant::now();
        match &self.cli.command {
            Command::Map(args) => self.run_map(args)?,
            Command::Peaks(args) => Self::run_peaks(args)?,
        }
        info!("Finished in {:.2?}", start.elapsed());
        Ok(())
    }

    fn observer(&self) -> Box<dyn InpaintingObserver> {
        if self.cli.quiet {
            Box::new(NoopObserver)
        } else {
            Box::new(ProgressObserver::new("inpainting"))
        }
    }

    fn run_map(&self, args: &MapArgs) -> Result<()> {
        let config = args.inpainting_config()?;
        let options = args.inpainting_options()?;

        let convergence = match (&args.shear, &args.convergence) {
            (Some(path), _) => {
                info!("Reading shear map {}", path.display());
                let grid = read_grid(path)?;
                grid.boundaries().validate()?;
                self.convergence_from_shear(ShearMap::new(grid)?, args, config, &options)?
            }
            (None, Some(path)) => {
                if options.iterations > 0 {
                    return Err(invalid_parameter(
                        "iterations",
                        &options.iterations,
                        &"inpainting needs a shear input",
                    ));
                }
                info!("Reading convergence map {}", path.display());
                let grid = read_grid(path)?;
                grid.boundaries().validate()?;
                let mut convergence = ConvergenceMap::new(grid)?;
                if args.print_means {
                    info!("Input convergence means: {:?}", convergence.grid().mean_values());
                }
                convergence
                    .grid_mut()
                    .apply_gaussian_smoothing(args.sigma_convergence);
                if args.remove_convergence_offset {
                    let means = convergence.grid().mean_values();
                    convergence.grid_mut().remove_offset(&means)?;
                }
                convergence
            }
            (None, None) => {
                return Err(MappingError::MissingInput {
                    what: "shear or convergence map",
                });
            }
        };

        if let Some(path) = &args.convergence_output {
            write_grid(
                convergence.grid(),
                path,
                args.overwrite,
                Some(&args.provenance()),
            )?;
            info!("Wrote convergence map {}", path.display());
        }

        if let Some(path) = &args.shear_output {
            let mut convergence = convergence.clone();
            if args.add_borders {
                convergence.grid_mut().add_borders();
            }
            let mut shear = convergence.to_shear();
            if args.add_borders {
                shear.grid_mut().remove_borders();
            }
            write_grid(shear.grid(), path, args.overwrite, None)?;
            info!("Wrote shear map {}", path.display());
        }

        if let Some(path) = &args.preview {
            export_plane_as_png(convergence.grid(), 0, path)?;
        }
        Ok(())
    }

    fn convergence_from_shear(
        &self,
        mut shear: ShearMap,
        args: &MapArgs,
        config: InpaintingConfig,
        options: &InpaintingOptions,
    ) -> Result<ConvergenceMap> {
        if args.print_means {
            info!("Input shear means: {:?}", shear.grid().mean_values());
        }
        shear.grid_mut().apply_gaussian_smoothing(args.sigma_shear);
        if args.remove_shear_offset {
            let means = shear.grid().mean_values();
            shear.grid_mut().remove_offset(&means)?;
        }
        if args.add_borders {
            shear.grid_mut().add_borders();
        }

        let mut convergence = shear.to_convergence();
        let measured_shear = shear.clone();
        for iteration in 0..args.reduced_shear_iterations {
            shear = ShearMap::from_reduced_shear(&measured_shear, &convergence)?;
            convergence = shear.to_convergence();
            info!(
                "Reduced shear iteration {}/{}",
                iteration + 1,
                args.reduced_shear_iterations
            );
        }

        // Smoothing and offset removal act on the direct inversion, which seeds inpainting
        convergence
            .grid_mut()
            .apply_gaussian_smoothing(args.sigma_convergence);
        if args.remove_convergence_offset {
            let means = convergence.grid().mean_values();
            convergence.grid_mut().remove_offset(&means)?;
        }

        if options.iterations > 0 {
            let algo = InpaintingAlgo::new(&shear, &convergence, config)?;
            if algo.mask().is_complete() {
                warn!("Shear map has no gaps; inpainting only denoises");
            }
            let mut progress = self.observer();
            convergence = algo.perform_inpainting_with(options, progress.as_mut())?;
        }

        if args.add_borders {
            convergence.grid_mut().remove_borders();
        }
        Ok(convergence)
    }

    fn run_peaks(args: &PeaksArgs) -> Result<()> {
        let kappa_grid = read_grid(&args.convergence)?;
        kappa_grid.boundaries().validate()?;
        let convergence = ConvergenceMap::new(kappa_grid)?;
        let density = read_grid(&args.density)?;

        let algo = PeakCountAlgo::new(&convergence, &density)?;
        let peaks = algo.peaks();
        write_peak_catalog(&args.output, &peaks, args.overwrite)?;
        info!(
            "Wrote {} peaks to {}",
            peaks.len(),
            args.output.display()
        );
        Ok(())
    }
}
