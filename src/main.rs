use anyhow::{bail, Context};
use perceptual_compress::config::{load_config, FileTaskConfig, RuntimeConfig, TaskConfig};
use perceptual_compress::image::io::{load_image, write_bytes, write_json_file};
use perceptual_compress::job::{FsObjectStore, ImageJob, JobProcessor, LogReporter};
use perceptual_compress::{AdaptiveCompressor, CompressParams, CompressionOutput, QualityModel};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage:
  perceptual-compress <config.json>
  perceptual-compress <model.safetensors> <input> <output.jpg> [report.json]";

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run() -> anyhow::Result<()> {
    init_logging();
    let args: Vec<String> = env::args().skip(1).collect();
    let config = match args.as_slice() {
        [config_path] => load_config(Path::new(config_path))?,
        [model, input, output, rest @ ..] if rest.len() <= 1 => RuntimeConfig {
            model: PathBuf::from(model),
            params: CompressParams::default(),
            task: TaskConfig::File(FileTaskConfig {
                input: PathBuf::from(input),
                output: PathBuf::from(output),
                report_json: rest.first().map(PathBuf::from),
            }),
        },
        _ => bail!("{USAGE}"),
    };

    let model = Arc::new(QualityModel::load(&config.model)?);
    let compressor = AdaptiveCompressor::new(model, config.params);

    match config.task {
        TaskConfig::File(task) => {
            let image = load_image(&task.input)?;
            let out = compressor
                .compress_with_diagnostics(image.as_view())
                .with_context(|| format!("compressing {}", task.input.display()))?;
            write_bytes(&task.output, &out.encoded.bytes)?;
            print_text_summary(&out);
            println!("Encoded image written to {}", task.output.display());
            if let Some(path) = &task.report_json {
                write_json_file(path, &out.report)?;
                println!("JSON report written to {}", path.display());
            }
        }
        TaskConfig::Job(task) => {
            let job = ImageJob::from_payload(&task.payload)?;
            let reporter = Arc::new(LogReporter);
            let mut processor = JobProcessor::new(
                compressor,
                Arc::new(FsObjectStore::new(&task.storage_root)),
                reporter.clone(),
                reporter,
            );
            if let Some(channel) = task.progress_channel {
                processor = processor.with_channel(channel);
            }
            let outcome = processor.process(&job)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }
    Ok(())
}

fn print_text_summary(out: &CompressionOutput) {
    let report = &out.report;
    println!("Compression summary");
    println!(
        "  input: {}x{}x{}",
        report.input.width, report.input.height, report.input.channels
    );
    println!(
        "  regions: {} ranked, {} selected, {} scored",
        report.ranked_regions.len(),
        report.selected_regions.len(),
        report.telemetry().regions_scored
    );
    for rq in &report.region_scores {
        let r = rq.region;
        match rq.score {
            Some(score) => println!(
                "    rows {}..{} cols {}..{}: {} patches, score {:.3}",
                r.row_start, r.row_end, r.col_start, r.col_end, rq.patches, score
            ),
            None => println!(
                "    rows {}..{} cols {}..{}: too small to score",
                r.row_start, r.row_end, r.col_start, r.col_end
            ),
        }
    }
    println!("  aggregate quality: {:.3}", report.aggregate_quality);
    println!(
        "  {} quality {} -> {} bytes",
        report.format, report.encoder_quality, report.encoded_bytes
    );
    println!("  total_ms: {:.3}", report.timings.total_ms);
}
