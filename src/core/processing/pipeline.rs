use tracing::info;

use crate::core::params::DetectionParams;
use crate::core::processing::cloud::mask_clouds;
use crate::core::processing::scale::scale_reflectance;
use crate::core::processing::surface::mask_surfaces;
use crate::core::processing::water::add_lake_band;
use crate::core::raster::RasterImage;
use crate::error::{Error, Result};

/// Fail fast on anything that would stop a stage midway: invalid parameters, missing
/// role bands, bands off the image grid, or a lake band name already taken.
pub fn check_preconditions(image: &RasterImage, params: &DetectionParams) -> Result<()> {
    params.validate()?;
    for role in params.required_roles() {
        let band = image.role_band(&params.bands, role)?;
        if band.dim() != image.shape() {
            return Err(Error::ShapeMismatch {
                band: params.bands.name(role).to_string(),
                expected: image.shape(),
                actual: band.dim(),
            });
        }
    }
    if image.has_band(&params.lake_band_name) {
        return Err(Error::BandNameCollision {
            name: params.lake_band_name.clone(),
        });
    }
    Ok(())
}

/// Scale, cloud-mask, surface-mask and classify `image`, returning a new image carrying
/// the lake band under `params.lake_band_name`.
pub fn process_image_pipeline(image: &RasterImage, params: &DetectionParams) -> Result<RasterImage> {
    check_preconditions(image, params)?;
    let (rows, cols) = image.shape();
    info!("Band pipeline on {}x{} image ({})", cols, rows, image.crs());

    let scaled = scale_reflectance(image, params.scale_factor);
    let cloud_masked = if params.cloud.enabled {
        mask_clouds(&scaled, &params.bands, &params.cloud)?
    } else {
        scaled
    };
    let surface_masked = if params.surface.enabled {
        mask_surfaces(&cloud_masked, &params.bands, &params.surface)?
    } else {
        cloud_masked
    };
    add_lake_band(
        &surface_masked,
        &params.bands,
        &params.water,
        &params.lake_band_name,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::raster::GeoTransform;
    use ndarray::Array2;

    /// Raw DN bands with a varied mix of cloud, rock and water signatures.
    fn mixed_image() -> RasterImage {
        let shape = (6, 6);
        let f = |seed: usize| {
            Array2::from_shape_fn(shape, |(r, c)| ((r * 7 + c * 13 + seed * 31) % 23) as f64 * 250.0)
        };
        RasterImage::new(
            GeoTransform::new(0.0, 60.0, 10.0, -10.0),
            "EPSG:32633",
            vec![
                ("B2".into(), f(1)),
                ("B3".into(), f(2)),
                ("B4".into(), f(3)),
                ("B10".into(), f(4)),
                ("B11".into(), f(5)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn masking_order_does_not_matter() {
        let params = DetectionParams::default();
        let scaled = scale_reflectance(&mixed_image(), params.scale_factor);
        let a = mask_surfaces(
            &mask_clouds(&scaled, &params.bands, &params.cloud).unwrap(),
            &params.bands,
            &params.surface,
        )
        .unwrap();
        let b = mask_clouds(
            &mask_surfaces(&scaled, &params.bands, &params.surface).unwrap(),
            &params.bands,
            &params.cloud,
        )
        .unwrap();
        assert_eq!(a.valid(), b.valid());
        assert!(a.valid().is_subset_of(scaled.valid()));
    }

    #[test]
    fn lake_pixels_are_always_valid_pixels() {
        let params = DetectionParams::default();
        let out = process_image_pipeline(&mixed_image(), &params).unwrap();
        let lake = out.lake_band(&params.lake_band_name).unwrap();
        assert!(lake.lake_pixels().is_subset_of(out.valid()));
        assert!(lake.evaluated().is_subset_of(out.valid()));
    }

    #[test]
    fn missing_band_fails_before_any_stage() {
        let img = RasterImage::new(
            GeoTransform::default(),
            "EPSG:32633",
            vec![("B2".into(), Array2::zeros((2, 2)))],
        )
        .unwrap();
        let err = process_image_pipeline(&img, &DetectionParams::default()).unwrap_err();
        assert!(err.is_precondition());
    }

    #[test]
    fn disabled_cloud_stage_needs_no_cirrus() {
        let mut params = DetectionParams::default();
        params.cloud.enabled = false;
        let img = RasterImage::new(
            GeoTransform::default(),
            "EPSG:32633",
            ["B2", "B3", "B4", "B11"]
                .iter()
                .map(|n| (n.to_string(), Array2::from_elem((2, 2), 1000.0)))
                .collect(),
        )
        .unwrap();
        assert!(process_image_pipeline(&img, &params).is_ok());
    }
}
