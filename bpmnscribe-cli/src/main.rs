use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

// Import from bpmnscribe-core
use bpmnscribe_core::{ConversionConfig, ConversionProcessor, UploadedFile};

// Import CLI utilities
use bpmnscribe::{save_conversion, write_file, OutputFormat};

#[derive(Parser)]
#[command(name = "bpmnscribe")]
#[command(about = "Role-annotated BPMN transcripts and Word report templates")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Print the default configuration as YAML and exit
    #[arg(long, global = true)]
    show_config: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a BPMN diagram into a role-annotated transcript
    Bpmn {
        /// Path to the .bpmn file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path
        #[arg(short, long, default_value = "resultado.txt")]
        output: PathBuf,

        /// Append the per-role statistics block
        #[arg(long)]
        stats: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Path to custom config file (YAML format)
        #[arg(short, long)]
        config: Option<String>,

        /// Log timings of every conversion step
        #[arg(long)]
        profile: bool,
    },

    /// Fill the Word report template from a .docx or .xlsx file
    Template {
        /// Path to the source .docx or .xlsx file
        #[arg(short, long)]
        input: PathBuf,

        /// Word template (default: template_path from the config)
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Output file path
        #[arg(short, long, default_value = "resultado.docx")]
        output: PathBuf,

        /// Path to custom config file (YAML format)
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.show_config {
        print!("{}", ConversionConfig::default().to_yaml()?);
        return Ok(());
    }

    println!("🦀 bpmnscribe");

    match args.command {
        Some(Command::Bpmn {
            input,
            output,
            stats,
            format,
            config,
            profile,
        }) => run_bpmn(&input, &output, stats, format, config.as_deref(), profile),
        Some(Command::Template {
            input,
            template,
            output,
            config,
        }) => run_template(&input, template, &output, config.as_deref()),
        None => {
            eprintln!("⚠️  No subcommand given. Try `bpmnscribe --help`.");
            std::process::exit(2);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&str>) -> ConversionConfig {
    match path {
        Some(config_path) => println!("📋 Loaded config from: {config_path}"),
        None => println!("📋 Using default config"),
    }
    ConversionConfig::load_with_fallback(path)
}

fn run_bpmn(
    input: &Path,
    output: &Path,
    stats: bool,
    format: OutputFormat,
    config: Option<&str>,
    profile: bool,
) -> Result<()> {
    if !input.exists() {
        eprintln!("⚠️  Input BPMN not found at: {}", input.display());
        std::process::exit(1);
    }

    let mut config = load_config(config);
    // CLI overrides
    if stats {
        config.extraction.include_statistics = true;
    }

    println!("📄 Processing: {}", input.display());
    let processor = ConversionProcessor::new(config).with_profiling(profile);

    match processor.convert_bpmn_file(input) {
        Ok(result) => {
            println!("✅ Successfully converted diagram");
            println!("📊 Transcript:");
            println!("   - Processes: {}", result.transcript.processes.len());
            println!("   - Tasks: {}", result.statistics.total_tasks());
            println!("   - Gateways: {}", result.statistics.total_gateways());
            if !result.transcript.diagnostics.is_empty() {
                println!("   - Diagnostics: {}", result.transcript.diagnostics.len());
            }

            tracing::debug!(?format, output = %output.display(), "writing conversion result");
            save_conversion(&result, output, format)?;
            println!("💾 Results saved to: {}", output.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Conversion failed: {e:#}");
            std::process::exit(1);
        }
    }
}

fn run_template(
    input: &Path,
    template: Option<PathBuf>,
    output: &Path,
    config: Option<&str>,
) -> Result<()> {
    let config = load_config(config);
    let template = match template.or_else(|| config.template.template_path.clone().map(PathBuf::from)) {
        Some(path) => path,
        None => {
            eprintln!("⚠️  No template given and none configured. Use --template.");
            std::process::exit(1);
        }
    };

    let file = UploadedFile::from_path(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    println!("📄 Processing: {}", input.display());
    println!("📝 Template: {}", template.display());

    let processor = ConversionProcessor::new(config);
    tracing::debug!(source = %file.name, bytes = file.bytes.len(), "applying template");
    match processor.apply_template(&file, &template) {
        Ok(bytes) => {
            write_file(output, &bytes)?;
            println!("✅ Template filled");
            println!("💾 Document saved to: {}", output.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Template transform failed: {e}");
            std::process::exit(1);
        }
    }
}
