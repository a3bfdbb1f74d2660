use gdal::{DriverManager, Metadata};
use gdal::raster::{Buffer, ColorInterpretation};
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;
use tracing::info;

use crate::core::raster::{RgbComposite, same_crs};
use crate::core::vectorize::ResolvedMask;
use crate::io::gdal::GdalError;
use crate::io::reproject::spatial_ref;

/// Write the resolved lake mask as a single-band u8 GeoTIFF in its own CRS.
pub fn write_mask_geotiff(
    output: &Path,
    mask: &ResolvedMask,
    metadata: &BTreeMap<String, String>,
) -> Result<(), GdalError> {
    let (rows, cols) = mask.shape();
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut ds = driver.create_with_band_type::<u8, _>(output, cols, rows, 1)?;
    ds.set_geo_transform(&mask.geotransform.to_gdal())?;
    ds.set_spatial_ref(&spatial_ref(&mask.crs)?)?;
    for (key, value) in metadata {
        ds.set_metadata_item(key, value, "")?;
    }

    let data: Vec<u8> = mask.to_u8().iter().copied().collect();
    let mut buf = Buffer::new((cols, rows), data);
    let mut band = ds.rasterband(1)?;
    band.set_color_interpretation(ColorInterpretation::GrayIndex)?;
    band.write((0, 0), (cols, rows), &mut buf)?;
    info!("Wrote lake mask {:?} ({}x{})", output, cols, rows);
    Ok(())
}

/// Write the lake mask in `target_crs`, warping with nearest-neighbour `gdalwarp` when the
/// mask CRS differs.
pub fn write_lake_raster(
    output: &Path,
    mask: &ResolvedMask,
    target_crs: &str,
    metadata: &BTreeMap<String, String>,
) -> Result<(), GdalError> {
    if same_crs(&mask.crs, target_crs) {
        return write_mask_geotiff(output, mask, metadata);
    }
    info!("Warping lake mask from {} to {}", mask.crs, target_crs);
    let tmp_file = native_tempfile(output)?;
    write_mask_geotiff(tmp_file.path(), mask, metadata)?;
    warp_to(tmp_file.path(), output, target_crs, "Byte")?;
    info!("Wrote lake mask {:?} in {}", output, target_crs);
    Ok(())
}

/// Write the RGB composite as a three-band f32 GeoTIFF in its own CRS.
pub fn write_rgb_geotiff(
    output: &Path,
    composite: &RgbComposite,
    metadata: &BTreeMap<String, String>,
) -> Result<(), GdalError> {
    let (rows, cols) = composite.shape();
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut ds = driver.create_with_band_type::<f32, _>(output, cols, rows, 3)?;
    ds.set_geo_transform(&composite.geotransform.to_gdal())?;
    ds.set_spatial_ref(&spatial_ref(&composite.crs)?)?;
    for (key, value) in metadata {
        ds.set_metadata_item(key, value, "")?;
    }

    let interpretations = [
        ColorInterpretation::RedBand,
        ColorInterpretation::GreenBand,
        ColorInterpretation::BlueBand,
    ];
    for (i, ((name, data), color)) in composite.bands().into_iter().zip(interpretations).enumerate() {
        let values: Vec<f32> = data.iter().copied().collect();
        let mut buf = Buffer::new((cols, rows), values);
        let mut band = ds.rasterband(i + 1)?;
        band.set_description(name)?;
        band.set_color_interpretation(color)?;
        band.write((0, 0), (cols, rows), &mut buf)?;
    }
    info!("Wrote RGB composite {:?} ({}x{})", output, cols, rows);
    Ok(())
}

/// Write the RGB composite in `target_crs`, warping like the lake mask.
pub fn write_rgb_raster(
    output: &Path,
    composite: &RgbComposite,
    target_crs: &str,
    metadata: &BTreeMap<String, String>,
) -> Result<(), GdalError> {
    if same_crs(&composite.crs, target_crs) {
        return write_rgb_geotiff(output, composite, metadata);
    }
    info!("Warping RGB composite from {} to {}", composite.crs, target_crs);
    let tmp_file = native_tempfile(output)?;
    write_rgb_geotiff(tmp_file.path(), composite, metadata)?;
    warp_to(tmp_file.path(), output, target_crs, "Float32")?;
    info!("Wrote RGB composite {:?} in {}", output, target_crs);
    Ok(())
}

fn native_tempfile(output: &Path) -> Result<tempfile::NamedTempFile, GdalError> {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("lakes");
    tempfile::Builder::new()
        .prefix(&format!("{}_", stem))
        .suffix("_native.tif")
        .tempfile()
        .map_err(|e| GdalError::Warp(format!("tempfile error: {}", e)))
}

/// Nearest-neighbour warp; cells outside the source stay 0.
fn warp_to(input: &Path, output: &Path, target_crs: &str, output_type: &str) -> Result<(), GdalError> {
    let status = Command::new("gdalwarp")
        .arg("-of")
        .arg("GTiff")
        .arg("-overwrite")
        .args(["-r", "near"])
        .args(["-ot", output_type])
        .args(["-dstnodata", "None"])
        .arg("-t_srs")
        .arg(target_crs)
        .arg(input)
        .arg(output)
        .status()
        .map_err(|e| GdalError::Warp(format!("gdalwarp exec error: {}", e)))?;
    if !status.success() {
        let _ = std::fs::remove_file(output);
        return Err(GdalError::Warp(format!("exit status {}", status)));
    }
    Ok(())
}
