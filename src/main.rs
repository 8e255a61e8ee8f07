use clap::{Parser, Subcommand};
use image_variants::imaging::RustBackend;
use image_variants::pipeline::CancelToken;
use image_variants::{batch, config, logging, output};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "image-variants")]
#[command(about = "Generate tagged resized and compressed variants of images")]
#[command(long_about = "\
Generate tagged resized and compressed variants of images

Every input image runs through a fixed pipeline of stages. Each stage turns
every image it receives into zero or more images, so the output is the cross
product of all stages:

  source ──▶ resize (sm, md, lg) ──▶ compress (jpeg@75) ──▶ tag

  dawn.jpg ─┬─ original                              {original}
            ├─ 360px  ─ jpeg@75                      {resized, size=sm, compressed, ...}
            ├─ 640px  ─ jpeg@75                      {resized, size=md, compressed, ...}
            └─ 960px  ─ jpeg@75                      {resized, size=lg, compressed, ...}

Each variant is saved as <stem>-<id>.<ext> in the output directory, and
<stem>.manifest.json lists every variant with its size and tags.

Run 'image-variants gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Config file (missing file means stock defaults)
    #[arg(long, default_value = "image-variants.toml", global = true)]
    config: PathBuf,

    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline over image files and directories
    Run {
        /// Image files or directories to walk
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(long, short, default_value = "variants")]
        output: PathBuf,

        /// Abort all work after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Validate the config and print the resolved pipeline
    Check,
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            inputs,
            output: output_dir,
            timeout,
        } => {
            let config = config::load_config(&cli.config)?;
            logging::init_from_config(&config.logging, cli.verbose, cli.json_logs);
            init_thread_pool(&config.processing);

            let cancel = match timeout {
                Some(secs) => CancelToken::with_timeout(Duration::from_secs(secs)),
                None => CancelToken::new(),
            };
            let pipeline = config.build_pipeline();
            let inputs = batch::collect_inputs(&inputs)?;

            let report = batch::process_all(
                &pipeline,
                &RustBackend::new(),
                &inputs,
                &output_dir,
                config.output.encode_format(),
                &cancel,
            );
            output::print_run_report(&report);
            if !report.is_success() {
                std::process::exit(1);
            }
        }
        Command::Check => {
            let config = config::load_config(&cli.config)?;
            logging::init_from_config(&config.logging, cli.verbose, cli.json_logs);
            println!("==> Checking {}", cli.config.display());
            let pipeline = config.build_pipeline();
            output::print_check_output(&config, &pipeline);
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
