use std::path::Path;

use tracing::info;
use tracing_subscriber::EnvFilter;

use lakepro::DetectionParams;
use lakepro::api::{
    candidate_images, process_directory_to_dir, process_file_to_dir, select_candidate,
};

use super::args::CliArgs;
use super::errors::AppError;

/// Config file (or defaults) with command-line overrides applied, validated.
fn build_params(args: &CliArgs) -> Result<DetectionParams, AppError> {
    let mut params = match &args.config {
        Some(path) => DetectionParams::from_json_file(path)?,
        None => DetectionParams::default(),
    };
    if let Some(resolution) = args.resolution {
        params.vectorize.resolution = resolution;
    }
    if let Some(crs) = &args.target_crs {
        params.vectorize.target_crs = crs.clone();
    }
    if let Some(connectivity) = args.connectivity {
        params.vectorize.connectivity = connectivity;
    }
    if let Some(mode) = args.mode {
        params.vectorize.mode = mode;
    }
    if let Some(index) = args.image_index {
        params.image_index = index;
    }
    if args.no_cloud_mask {
        params.cloud.enabled = false;
    }
    params.validate()?;
    Ok(params)
}

fn process_one(
    input: &Path,
    roi: &Path,
    output_dir: &Path,
    params: &DetectionParams,
    band_names: Option<&[String]>,
) -> Result<(), AppError> {
    info!("Processing: {:?}", input);
    let outputs = process_file_to_dir(input, roi, output_dir, params, band_names)?;
    info!("Lake raster: {:?}", outputs.raster);
    info!("RGB composite: {:?}", outputs.rgb);
    info!("Lake vectors: {:?}", outputs.vectors);
    info!("Run sidecar: {:?}", outputs.sidecar);
    Ok(())
}

/// Exactly one of `--input` and `--input-dir`; `--batch` only with `--input-dir`.
fn check_input_flags(args: &CliArgs) -> Result<(), AppError> {
    if args.input.is_some() && args.input_dir.is_some() {
        return Err(AppError::ConflictingArguments {
            first: "--input",
            second: "--input-dir",
        });
    }
    if args.batch && args.input_dir.is_none() {
        return Err(AppError::MissingArgument {
            arg: "--input-dir".to_string(),
        });
    }
    Ok(())
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.log {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    check_input_flags(&args)?;
    let roi = args.roi.clone().ok_or(AppError::MissingArgument {
        arg: "--roi".to_string(),
    })?;
    let output_dir = args.output_dir.clone().ok_or(AppError::MissingArgument {
        arg: "--output-dir".to_string(),
    })?;
    let params = build_params(&args)?;
    let band_names = args.band_names.as_deref();

    match (&args.input, &args.input_dir) {
        (_, Some(input_dir)) if args.batch => {
            info!("Starting batch processing from directory: {:?}", input_dir);
            info!("Output directory: {:?}", output_dir);
            let report =
                process_directory_to_dir(input_dir, &roi, &output_dir, &params, band_names, true)?;
            info!("Batch processing complete!");
            info!("Processed: {}", report.processed);
            info!("Errors: {}", report.errors);
            if report.errors > 0 {
                return Err(AppError::BatchFailures {
                    errors: report.errors,
                    total: report.processed + report.errors,
                }
                .into());
            }
        }
        (_, Some(input_dir)) => {
            let candidates = candidate_images(input_dir).map_err(AppError::from)?;
            let input = select_candidate(&candidates, params.image_index).map_err(AppError::from)?;
            info!(
                "Selected candidate {} of {}: {:?}",
                params.image_index,
                candidates.len(),
                input
            );
            process_one(input, &roi, &output_dir, &params, band_names)?;
        }
        (Some(input), None) => {
            process_one(input, &roi, &output_dir, &params, band_names)?;
        }
        (None, None) => {
            return Err(AppError::MissingArgument {
                arg: "--input or --input-dir".to_string(),
            }
            .into());
        }
    }

    Ok(())
}
