use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use moedas::config::{
    CountingParams, DEFAULT_CLASSES_PATH, DEFAULT_MODEL_PATH, DEFAULT_OUTPUT_PATH, RadiusBounds,
};
use moedas::detection::classifier::class_names_or_default;
use moedas::{CoinCounter, HoughCircleDetector, OnnxCoinClassifier};

#[derive(Parser)]
#[command(name = "moedas")]
#[command(about = "Count Brazilian coins in an image and sum their value")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// ONNX classifier exported by moedas-train
    #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,

    /// Class manifest written next to the model (one label per line)
    #[arg(long, default_value = DEFAULT_CLASSES_PATH)]
    classes: PathBuf,

    /// Minimum coin radius in pixels
    #[arg(long, default_value_t = 20)]
    min_radius: u32,

    /// Maximum coin radius in pixels
    #[arg(long, default_value_t = 200)]
    max_radius: u32,

    /// Where to save the annotated image
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Do not save the annotated image
    #[arg(long)]
    no_save: bool,

    /// Classifier window side as a multiple of the coin radius (0 = full image)
    #[arg(long, default_value_t = 4.0)]
    crop_factor: f32,

    /// Square input size of the classifier
    #[arg(long, default_value_t = 224)]
    input_size: u32,

    /// TTF font for annotation labels
    #[arg(long, value_name = "TTF")]
    font: Option<PathBuf>,

    /// Save each prepared coin region to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    moedas::logging::init(args.verbose);

    // An unreadable image ends this run without failing the process
    let img = match moedas::load_image(&args.image_path) {
        Ok(img) => img,
        Err(e) => {
            error!("{}", e);
            return Ok(());
        }
    };
    info!("Image loaded: {}", args.image_path.display());
    info!("Dimensions: {}x{}", img.width(), img.height());

    let class_names = class_names_or_default(&args.classes);
    let classifier = OnnxCoinClassifier::load(&args.model, class_names, args.input_size)?;

    let params = CountingParams {
        radius: RadiusBounds {
            min: args.min_radius,
            max: args.max_radius,
        },
        crop_factor: (args.crop_factor > 0.0).then_some(args.crop_factor),
    };

    let mut counter = CoinCounter::new(Box::new(HoughCircleDetector::new()), Box::new(classifier))
        .with_params(params);
    if let Some(debug_dir) = args.debug_out {
        counter = counter.with_debug(debug_dir)?;
    }

    let font = if args.no_save {
        None
    } else {
        moedas::report::load_label_font(args.font.as_deref())
    };
    let output = (!args.no_save).then_some(args.output.as_path());

    moedas::process_image(&counter, &img, output, font.as_ref())?;

    Ok(())
}
