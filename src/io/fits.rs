//! FITS persistence for grids and peak catalogs
//!
//! Grids are stored as a 3D double image in the primary HDU (NAXIS1 = x,
//! NAXIS2 = y, NAXIS3 = z) with the patch limits, galaxy count, optional
//! inpainting provenance and a TAN world-coordinate header.

use fitsio::FitsFile;
use fitsio::hdu::{FitsHdu, HduInfo};
use fitsio::headers::ReadsKey;
use fitsio::images::{ImageDescription, ImageType};
use fitsio::tables::{ColumnDataType, ColumnDescription};
use std::path::Path;

use crate::algorithm::peaks::PeakRecord;
use crate::io::configuration::{
    AUTO_VALUE, CREATOR, KEY_B_MODE_ZEROS, KEY_DEC_MAX, KEY_DEC_MIN, KEY_GALAXY_COUNT,
    KEY_GAUSSIAN_SIGMA, KEY_INPAINT_ITERATIONS, KEY_INPAINT_SCALES, KEY_RA_MAX, KEY_RA_MIN,
    KEY_REDUCED_SHEAR_ITERATIONS, KEY_VARIANCE_PER_SCALE, KEY_Z_MAX, KEY_Z_MIN, PEAK_COLUMNS,
    PEAK_TABLE_NAME, PEAK_UNITS, VERSION,
};
use crate::io::error::{MappingError, Result, invalid_parameter};
use crate::spatial::boundaries::Boundaries;
use crate::spatial::grid::Grid;

/// How a map was produced, recorded alongside it
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Provenance {
    /// B-mode forced to zero inside gaps
    pub b_mode_zeros: bool,
    /// Wavelet variance equalized per scale
    pub equal_variance_per_scale: bool,
    /// Inpainting wavelet scales, `None` when chosen automatically
    pub inpainting_scales: Option<usize>,
    /// Inpainting iterations
    pub inpainting_iterations: usize,
    /// Gaussian smoothing width in pixels
    pub gaussian_sigma: f64,
    /// Reduced-shear iterations
    pub reduced_shear_iterations: usize,
}

fn export_error(path: &Path) -> impl FnOnce(fitsio::errors::Error) -> MappingError + '_ {
    move |source| MappingError::MapExport {
        path: path.to_path_buf(),
        source,
    }
}

fn load_error(path: &Path) -> impl FnOnce(fitsio::errors::Error) -> MappingError + '_ {
    move |source| MappingError::MapLoad {
        path: path.to_path_buf(),
        source,
    }
}

const fn flag(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| MappingError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }
    Ok(())
}

fn refuse_existing(path: &Path, overwrite: bool) -> Result<()> {
    if !overwrite && path.exists() {
        return Err(MappingError::FileSystem {
            path: path.to_path_buf(),
            operation: "create FITS file",
            source: std::io::Error::from(std::io::ErrorKind::AlreadyExists),
        });
    }
    Ok(())
}

/// Write a grid and its metadata to a FITS image
///
/// # Errors
///
/// Returns an error if the file exists and `overwrite` is false, the grid is
/// empty, or any FITS call fails
pub fn write_grid(
    grid: &Grid,
    path: &Path,
    overwrite: bool,
    provenance: Option<&Provenance>,
) -> Result<()> {
    let (sx, sy, sz) = grid.dim();
    if sx == 0 || sy == 0 || sz == 0 {
        return Err(invalid_parameter(
            "grid",
            &format!("{sx}x{sy}x{sz}"),
            &"cannot persist an empty grid",
        ));
    }
    refuse_existing(path, overwrite)?;
    create_parent(path)?;

    let dimensions = [sz, sy, sx];
    let description = ImageDescription {
        data_type: ImageType::Double,
        dimensions: &dimensions,
    };
    let mut builder = FitsFile::create(path).with_custom_primary(&description);
    if overwrite {
        builder = builder.overwrite();
    }
    let mut fptr = builder.open().map_err(export_error(path))?;
    let hdu = fptr.primary_hdu().map_err(export_error(path))?;
    hdu.write_image(&mut fptr, &grid.to_flat())
        .map_err(export_error(path))?;

    write_metadata(&hdu, &mut fptr, grid).map_err(export_error(path))?;
    if let Some(provenance) = provenance {
        write_provenance(&hdu, &mut fptr, provenance).map_err(export_error(path))?;
    }
    write_wcs(&hdu, &mut fptr, grid).map_err(export_error(path))?;
    Ok(())
}

fn write_metadata(
    hdu: &FitsHdu,
    fptr: &mut FitsFile,
    grid: &Grid,
) -> std::result::Result<(), fitsio::errors::Error> {
    let bounds = grid.boundaries();
    hdu.write_key(fptr, KEY_GALAXY_COUNT, grid.galaxy_count() as i64)?;
    hdu.write_key(fptr, KEY_RA_MIN, bounds.ra_min())?;
    hdu.write_key(fptr, KEY_RA_MAX, bounds.ra_max())?;
    hdu.write_key(fptr, KEY_DEC_MIN, bounds.dec_min())?;
    hdu.write_key(fptr, KEY_DEC_MAX, bounds.dec_max())?;
    hdu.write_key(fptr, KEY_Z_MIN, bounds.z_min())?;
    hdu.write_key(fptr, KEY_Z_MAX, bounds.z_max())?;
    Ok(())
}

fn write_provenance(
    hdu: &FitsHdu,
    fptr: &mut FitsFile,
    provenance: &Provenance,
) -> std::result::Result<(), fitsio::errors::Error> {
    hdu.write_key(fptr, KEY_B_MODE_ZEROS, flag(provenance.b_mode_zeros))?;
    hdu.write_key(
        fptr,
        KEY_VARIANCE_PER_SCALE,
        flag(provenance.equal_variance_per_scale),
    )?;
    match provenance.inpainting_scales {
        Some(scales) => hdu.write_key(fptr, KEY_INPAINT_SCALES, scales as i64)?,
        None => hdu.write_key(fptr, KEY_INPAINT_SCALES, AUTO_VALUE)?,
    }
    hdu.write_key(
        fptr,
        KEY_INPAINT_ITERATIONS,
        provenance.inpainting_iterations as i64,
    )?;
    hdu.write_key(fptr, KEY_GAUSSIAN_SIGMA, provenance.gaussian_sigma)?;
    hdu.write_key(
        fptr,
        KEY_REDUCED_SHEAR_ITERATIONS,
        provenance.reduced_shear_iterations as i64,
    )?;
    Ok(())
}

fn write_wcs(
    hdu: &FitsHdu,
    fptr: &mut FitsFile,
    grid: &Grid,
) -> std::result::Result<(), fitsio::errors::Error> {
    let bounds = grid.boundaries();
    let (sx, sy, _) = grid.dim();
    let cd_ra = bounds.ra_range() / sx as f64;
    let cd_dec = bounds.dec_range() / sy as f64;
    let (ref_x, ref_y) = (sx / 2, sy / 2);

    hdu.write_key(fptr, "CTYPE1", "RA---TAN")?;
    hdu.write_key(fptr, "CTYPE2", "DEC--TAN")?;
    hdu.write_key(fptr, "CRPIX1", ref_x as i64)?;
    hdu.write_key(fptr, "CRPIX2", ref_y as i64)?;
    hdu.write_key(
        fptr,
        "CRVAL1",
        (ref_x as f64 + 0.5).mul_add(cd_ra, bounds.ra_min()),
    )?;
    hdu.write_key(
        fptr,
        "CRVAL2",
        (ref_y as f64 + 0.5).mul_add(cd_dec, bounds.dec_min()),
    )?;
    hdu.write_key(fptr, "CD1_1", cd_ra)?;
    hdu.write_key(fptr, "CD1_2", 0.0)?;
    hdu.write_key(fptr, "CD2_1", 0.0)?;
    hdu.write_key(fptr, "CD2_2", cd_dec)?;
    hdu.write_key(fptr, "CUNIT1", "deg")?;
    hdu.write_key(fptr, "CUNIT2", "deg")?;
    hdu.write_key(fptr, "CREATOR", CREATOR)?;
    hdu.write_key(fptr, "VERSION", VERSION)?;
    Ok(())
}

fn read_key_optional<T: ReadsKey>(hdu: &FitsHdu, fptr: &mut FitsFile, key: &str) -> Option<T> {
    hdu.read_key(fptr, key).ok()
}

/// Read a grid written by [`write_grid`] or any 2D/3D double image
///
/// Two-dimensional images load as a single plane. Missing galaxy count reads
/// as 0 and missing limits as 0.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, the primary HDU is not a
/// 2D or 3D image, or its data cannot be read
pub fn read_grid(path: &Path) -> Result<Grid> {
    let mut fptr = FitsFile::open(path).map_err(load_error(path))?;
    let hdu = fptr.primary_hdu().map_err(load_error(path))?;

    // Shape is reported slowest axis first: [z, y, x] or [y, x]
    let (sx, sy, sz) = match &hdu.info {
        HduInfo::ImageInfo { shape, .. } => match shape.as_slice() {
            [sy, sx] => (*sx, *sy, 1),
            [sz, sy, sx] => (*sx, *sy, *sz),
            other => {
                return Err(invalid_parameter(
                    "NAXIS",
                    &other.len(),
                    &"map images must have 2 or 3 axes",
                ));
            }
        },
        _ => {
            return Err(MappingError::MissingInput {
                what: "primary image HDU",
            });
        }
    };

    let data: Vec<f64> = hdu.read_image(&mut fptr).map_err(load_error(path))?;
    let key = |file: &mut FitsFile, name: &str| read_key_optional::<f64>(&hdu, file, name);
    let boundaries = Boundaries::new(
        key(&mut fptr, KEY_RA_MIN).unwrap_or(0.0),
        key(&mut fptr, KEY_RA_MAX).unwrap_or(0.0),
        key(&mut fptr, KEY_DEC_MIN).unwrap_or(0.0),
        key(&mut fptr, KEY_DEC_MAX).unwrap_or(0.0),
        key(&mut fptr, KEY_Z_MIN).unwrap_or(0.0),
        key(&mut fptr, KEY_Z_MAX).unwrap_or(0.0),
    );
    let galaxy_count = read_key_optional::<i64>(&hdu, &mut fptr, KEY_GALAXY_COUNT)
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or(0);

    Grid::from_flat(&data, sx, sy, sz, boundaries, galaxy_count)
}

/// Write peaks as a binary table with one double column per field
///
/// # Errors
///
/// Returns an error if the file exists and `overwrite` is false, or any FITS call fails
pub fn write_peak_catalog(path: &Path, peaks: &[PeakRecord], overwrite: bool) -> Result<()> {
    refuse_existing(path, overwrite)?;
    create_parent(path)?;

    let mut builder = FitsFile::create(path);
    if overwrite {
        builder = builder.overwrite();
    }
    let mut fptr = builder.open().map_err(export_error(path))?;

    let columns = PEAK_COLUMNS
        .iter()
        .map(|name| {
            ColumnDescription::new(*name)
                .with_type(ColumnDataType::Double)
                .create()
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(export_error(path))?;
    let hdu = fptr
        .create_table(PEAK_TABLE_NAME.to_string(), &columns)
        .map_err(export_error(path))?;

    for (index, unit) in PEAK_UNITS.iter().enumerate() {
        hdu.write_key(&mut fptr, &format!("TUNIT{}", index + 1), *unit)
            .map_err(export_error(path))?;
    }

    if peaks.is_empty() {
        return Ok(());
    }
    let column_values: [Vec<f64>; 5] = [
        peaks.iter().map(|p| p.ra).collect(),
        peaks.iter().map(|p| p.dec).collect(),
        peaks.iter().map(|p| p.redshift).collect(),
        peaks.iter().map(|p| p.snr).collect(),
        peaks.iter().map(|p| p.scale as f64).collect(),
    ];
    for (name, values) in PEAK_COLUMNS.iter().zip(&column_values) {
        hdu.write_col(&mut fptr, *name, values)
            .map_err(export_error(path))?;
    }
    Ok(())
}
