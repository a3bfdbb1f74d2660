//! High-level library API: detect lakes in an in-memory image, process one raster file
//! into the output directory, and batch helpers for directories of candidate images.
//! Prefer these entrypoints over the low-level core modules when integrating lakepro.
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::core::params::DetectionParams;
use crate::core::processing::pipeline::{check_preconditions, process_image_pipeline};
use crate::core::raster::{RasterImage, rgb_composite, same_crs};
use crate::core::vectorize::{
    RegionOfInterest, ResolvedMask, VectorFeatureCollection, raster_to_vector,
};
use crate::error::{Error, Result};
use crate::io::gdal::GdalImageReader;
use crate::io::reproject::{reproject_features, reproject_roi};
use crate::io::roi::read_roi;
use crate::io::writers::{
    RunSidecar, lake_metadata_items, write_geojson, write_lake_raster, write_rgb_raster,
};

/// File extensions treated as candidate images in a directory.
pub const RASTER_EXTENSIONS: [&str; 5] = ["tif", "tiff", "jp2", "vrt", "img"];

/// Result of in-memory lake detection
#[derive(Debug, Clone)]
pub struct LakeDetection {
    /// Input image after all stages, carrying the lake band
    pub image: RasterImage,
    /// Lake mask on the output grid, the source of both outputs
    pub resolved: ResolvedMask,
    /// One feature per connected lake region, in the image CRS
    pub vectors: VectorFeatureCollection,
}

impl LakeDetection {
    pub fn lake_pixels(&self) -> usize {
        self.resolved.lake_count()
    }
}

/// Run the band pipeline and vectorize the lake band within `roi`.
/// `roi` must already be in the image CRS.
pub fn detect_lakes(
    image: &RasterImage,
    roi: &RegionOfInterest,
    params: &DetectionParams,
) -> Result<LakeDetection> {
    check_preconditions(image, params)?;
    if !same_crs(image.crs(), &roi.crs) {
        return Err(Error::CrsMismatch {
            left: image.crs().to_string(),
            right: roi.crs.clone(),
        });
    }
    let processed = process_image_pipeline(image, params)?;
    let lake = processed
        .lake_band(&params.lake_band_name)
        .ok_or_else(|| Error::Processing("lake band missing after pipeline".to_string()))?;
    let (resolved, vectors) = raster_to_vector(
        lake,
        processed.geotransform(),
        processed.crs(),
        roi,
        &params.vectorize,
    )?;
    info!(
        "Detected {} lakes ({} pixels) in ROI",
        vectors.len(),
        resolved.lake_count()
    );
    Ok(LakeDetection {
        image: processed,
        resolved,
        vectors,
    })
}

/// Paths of the outputs written for one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub raster: PathBuf,
    /// Masked red/green/blue reflectance
    pub rgb: PathBuf,
    pub vectors: PathBuf,
    pub sidecar: PathBuf,
}

impl OutputPaths {
    /// `<stem>_lakes.{tif,geojson,json}` and `<stem>_rgb.tif` in `output_dir`.
    pub fn for_input(input: &Path, output_dir: &Path) -> Self {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let base = output_dir.join(format!("{}_lakes", stem));
        Self {
            raster: base.with_extension("tif"),
            rgb: output_dir.join(format!("{}_rgb.tif", stem)),
            vectors: base.with_extension("geojson"),
            sidecar: base.with_extension("json"),
        }
    }
}

/// Read `input` and `roi_path`, detect lakes, and write the lake raster, RGB composite,
/// vectors and sidecar into `output_dir` in `params.vectorize.target_crs`.
pub fn process_file_to_dir(
    input: &Path,
    roi_path: &Path,
    output_dir: &Path,
    params: &DetectionParams,
    band_names: Option<&[String]>,
) -> Result<OutputPaths> {
    params.validate()?;
    std::fs::create_dir_all(output_dir)?;
    let reader = GdalImageReader::open(input)?;
    let image = reader.read_image(band_names)?;
    let roi = reproject_roi(&read_roi(roi_path)?, image.crs())?;

    let detection = detect_lakes(&image, &roi, params)?;
    let target_crs = params.vectorize.target_crs.as_str();
    let outputs = OutputPaths::for_input(input, output_dir);

    let items = lake_metadata_items(
        params,
        &detection.resolved,
        &detection.vectors,
        image.properties(),
    );
    write_lake_raster(&outputs.raster, &detection.resolved, target_crs, &items)?;
    let rgb = rgb_composite(&detection.image, &params.bands, &roi, &detection.resolved)?;
    write_rgb_raster(&outputs.rgb, &rgb, target_crs, &items)?;
    let vectors = reproject_features(&detection.vectors, target_crs)?;
    write_geojson(&outputs.vectors, &vectors)?;
    RunSidecar::new(
        input,
        roi_path,
        params,
        &detection.resolved,
        &detection.vectors,
        image.properties(),
    )
    .write(&outputs.sidecar)?;
    Ok(outputs)
}

/// Candidate images directly inside `input_dir`, sorted by file name.
pub fn candidate_images(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(input_dir)? {
        let path = entry?.path();
        let is_raster = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| RASTER_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if path.is_file() && is_raster {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Pick the `index`-th candidate (0-based).
pub fn select_candidate(candidates: &[PathBuf], index: usize) -> Result<&Path> {
    candidates
        .get(index)
        .map(PathBuf::as_path)
        .ok_or(Error::NoSuchCandidate {
            index,
            available: candidates.len(),
        })
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub errors: usize,
    pub lakes: usize,
}

/// Process every candidate image in `input_dir` into `output_dir`.
/// If `continue_on_error` is true, errors are logged in the report and processing continues; otherwise, the first error is returned.
pub fn process_directory_to_dir(
    input_dir: &Path,
    roi_path: &Path,
    output_dir: &Path,
    params: &DetectionParams,
    band_names: Option<&[String]>,
    continue_on_error: bool,
) -> Result<BatchReport> {
    let candidates = candidate_images(input_dir)?;
    if candidates.is_empty() {
        warn!("No candidate images in {:?}", input_dir);
    }
    let mut report = BatchReport::default();
    for path in &candidates {
        match process_file_to_dir(path, roi_path, output_dir, params, band_names) {
            Ok(outputs) => {
                report.processed += 1;
                info!("Processed {:?} -> {:?}", path, outputs.vectors);
            }
            Err(e) => {
                report.errors += 1;
                error!("Failed {:?}: {}", path, e);
                if !continue_on_error {
                    return Err(e);
                }
            }
        }
    }
    Ok(report)
}
