use anyhow::Context;
use clap::{Parser, ValueEnum};
use datagen_core::SchemaNode;
use datagen_generator::Generator;
use std::io::{Read, Write};

#[derive(Parser)]
#[command(name = "avro-datagen")]
#[command(about = "Generate random Avro data from an annotated schema")]
#[command(long_about = None)]
struct Cli {
    /// Generate data for this inline schema JSON
    #[arg(short, long, conflicts_with = "schema_file")]
    schema: Option<String>,

    /// Read the schema from this file, or stdin if '-'
    #[arg(short = 'f', long, default_value = "-")]
    schema_file: String,

    /// Number of records to generate
    #[arg(short, long, default_value_t = 1)]
    iterations: u64,

    /// JSON output style
    #[arg(long, value_enum, default_value_t = Format::Pretty)]
    format: Format,

    /// Write data to this file, or stdout if '-'
    #[arg(short, long, default_value = "-")]
    output: String,

    /// Seed for the random source; fresh entropy when absent
    #[arg(long)]
    seed: Option<u64>,

    /// Fast-forward iterative fields by this many generations
    #[arg(long, default_value_t = 0)]
    generation: u64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    /// One prettified record per block
    Pretty,
    /// All records on one line
    Compact,
    /// One compact record per line
    Ndjson,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let schema = read_schema(&cli)?;
    let mut builder = Generator::builder()
        .schema(schema)
        .generation(cli.generation);
    if let Some(seed) = cli.seed {
        builder = builder.seed(seed);
    }
    let mut generator = builder.build()?;

    tracing::info!(
        iterations = cli.iterations,
        generation = cli.generation,
        "generating records"
    );

    let mut output = open_output(&cli.output)?;
    for index in 0..cli.iterations {
        let record = generator
            .generate()
            .with_context(|| format!("failed to generate record {index}"))?;
        let json = record.to_json();
        match cli.format {
            Format::Pretty => writeln!(output, "{}", serde_json::to_string_pretty(&json)?)?,
            Format::Compact => write!(output, "{json}")?,
            Format::Ndjson => writeln!(output, "{json}")?,
        }
    }
    if matches!(cli.format, Format::Compact) {
        writeln!(output)?;
    }
    output.flush()?;
    Ok(())
}

fn read_schema(cli: &Cli) -> anyhow::Result<SchemaNode> {
    if let Some(schema) = &cli.schema {
        return SchemaNode::parse_str(schema).context("failed to parse inline schema");
    }
    if cli.schema_file != "-" {
        return SchemaNode::parse_file(&cli.schema_file)
            .with_context(|| format!("failed to read schema file {}", cli.schema_file));
    }
    tracing::info!("reading schema from stdin");
    let mut schema = String::new();
    std::io::stdin()
        .read_to_string(&mut schema)
        .context("failed to read schema from stdin")?;
    SchemaNode::parse_str(&schema).context("failed to parse schema from stdin")
}

fn open_output(target: &str) -> anyhow::Result<Box<dyn Write>> {
    if target == "-" {
        Ok(Box::new(std::io::stdout().lock()))
    } else {
        let file = std::fs::File::create(target)
            .with_context(|| format!("failed to open output file {target}"))?;
        Ok(Box::new(std::io::BufWriter::new(file)))
    }
}
