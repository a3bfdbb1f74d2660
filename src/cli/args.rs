use clap::Parser;
use std::path::PathBuf;

use lakepro::{Connectivity, VectorizeMode};

#[derive(Parser, Debug)]
#[command(name = "lakepro", version, about = "Lake detection from multispectral imagery")]
pub struct CliArgs {
    /// Input multiband raster (single image mode)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory of candidate images; pick one with --image-index or all with --batch
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Region of interest as GeoJSON (EPSG:4326 unless it names a crs)
    #[arg(short, long)]
    pub roi: Option<PathBuf>,

    /// Output directory for <stem>_lakes.{tif,geojson,json} and <stem>_rgb.tif
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// JSON parameter file; flags below override its fields
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output pixel size in image CRS units
    #[arg(long)]
    pub resolution: Option<f64>,

    /// CRS of the written outputs (e.g., EPSG:4326, EPSG:32633)
    #[arg(long)]
    pub target_crs: Option<String>,

    /// Pixel adjacency for grouping lake pixels
    #[arg(long, value_enum)]
    pub connectivity: Option<Connectivity>,

    /// Vectorization mode (exact or approximate)
    #[arg(long, value_enum)]
    pub mode: Option<VectorizeMode>,

    /// Band names in file order, comma separated (e.g., B2,B3,B4,B10,B11)
    #[arg(long, value_delimiter = ',')]
    pub band_names: Option<Vec<String>>,

    /// Zero-based index of the image to process among --input-dir candidates
    #[arg(long)]
    pub image_index: Option<usize>,

    /// Skip the cloud mask (no cirrus band needed)
    #[arg(long, default_value_t = false)]
    pub no_cloud_mask: bool,

    /// Enable logging (RUST_LOG overrides the default debug level)
    #[arg(long, default_value_t = false)]
    pub log: bool,

    /// Batch mode: process every candidate in --input-dir and continue past failures
    #[arg(long, default_value_t = false)]
    pub batch: bool,
}
