use clap::Parser;
use std::path::PathBuf;

use moedas::config::{SplitParams, TrainingParams};
use moedas::training::{self, TrainingJob, YoloCli};

#[derive(Parser)]
#[command(name = "moedas-train")]
#[command(about = "Organize a labelled coin image folder and train the coin classifier")]
struct Cli {
    /// Folder of images named <value>_<id>.jpg (values: 5, 10, 25, 50, 100)
    #[arg(long, value_name = "DIR")]
    dataset: PathBuf,

    /// Output folder for the organized train/val dataset
    #[arg(long, default_value = "data/cls_dataset")]
    out: PathBuf,

    /// Fraction of each class held out for validation
    #[arg(long, default_value_t = 0.2)]
    val: f64,

    /// Seed for the train/val shuffle
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of epochs
    #[arg(long, default_value_t = 30)]
    epochs: u32,

    /// Image size
    #[arg(long, default_value_t = 224)]
    imgsz: u32,

    /// Batch size
    #[arg(long, default_value_t = 16)]
    batch: u32,

    /// Learning rate
    #[arg(long, default_value_t = 0.01)]
    lr: f64,

    /// Folder for training runs
    #[arg(long, default_value = "runs")]
    project: PathBuf,

    /// Run name inside the project folder
    #[arg(long, default_value = "moedas_cls")]
    name: String,

    /// Folder for the exported ONNX model and class manifest
    #[arg(long, default_value = "models")]
    export: PathBuf,

    /// Pretrained checkpoint to fine-tune
    #[arg(long, default_value = "yolov8n-cls.pt")]
    base_model: String,

    /// Ultralytics command line executable
    #[arg(long, default_value = "yolo")]
    yolo_bin: PathBuf,

    /// Only organize the dataset, do not train
    #[arg(long)]
    prepare_only: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    moedas::logging::init(args.verbose);

    let job = TrainingJob {
        dataset_dir: args.dataset,
        organized_dir: args.out,
        export_dir: args.export,
        split: SplitParams {
            val_fraction: args.val,
            seed: args.seed,
        },
        params: TrainingParams {
            epochs: args.epochs,
            image_size: args.imgsz,
            batch_size: args.batch,
            learning_rate: args.lr,
            project: args.project,
            run_name: args.name,
            base_model: args.base_model,
        },
    };

    println!("{}", "=".repeat(60));
    println!("  COIN CLASSIFIER TRAINING");
    println!("{}", "=".repeat(60));

    if args.prepare_only {
        let manifest = training::prepare(&job)?;
        println!("\nClasses: {}", manifest.class_names().join(", "));
        return Ok(());
    }

    let trainer = YoloCli::new(args.yolo_bin);
    let outcome = training::run_training(&job, &trainer)?;

    println!("\n{}", "=".repeat(60));
    println!("  TRAINING COMPLETE");
    println!("{}", "=".repeat(60));
    println!("\nGenerated files:");
    println!("  - ONNX model: {}", outcome.model_path.display());
    println!("  - Classes: {}", outcome.classes_path.display());

    Ok(())
}
