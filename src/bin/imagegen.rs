//! CLI for imagegen - text prompt in, image file out.

use clap::{CommandFactory, Parser};
use imagegen::image::{DEFAULT_MODEL, DEFAULT_SIZE};
use imagegen::{Credential, GenerationRequest, ImageClient, Route};
use std::path::PathBuf;

const DEFAULT_OUTPUT: &str = "output.png";

/// Options whose next token is their value, never a flag of its own.
const VALUE_OPTIONS: [&str; 3] = ["--model", "--output", "--size"];

#[derive(Parser, Debug)]
#[command(name = "imagegen")]
#[command(about = "Generate an image from a text prompt via OpenRouter")]
#[command(after_help = "The API key is read from ~/.config/imagegen/credentials \
    (OPENROUTER_API_KEY=<key>, chmod 600).")]
#[command(version)]
struct Cli {
    /// The text prompt describing the image (only the first is used)
    #[arg(value_name = "PROMPT", num_args = 0..)]
    prompt: Vec<String>,

    /// Model identifier; models containing "dall-e" use the image-generation endpoint
    #[arg(long, default_value = DEFAULT_MODEL, allow_hyphen_values = true)]
    model: String,

    /// Output file path
    #[arg(long, default_value = DEFAULT_OUTPUT, allow_hyphen_values = true)]
    output: PathBuf,

    /// Image size as WIDTHxHEIGHT (image-generation models only)
    #[arg(long, default_value = DEFAULT_SIZE, allow_hyphen_values = true)]
    size: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn prompt(&self) -> Option<&str> {
        self.prompt
            .first()
            .map(String::as_str)
            .filter(|p| !p.trim().is_empty())
    }

    fn request(&self) -> anyhow::Result<GenerationRequest> {
        let Some(prompt) = self.prompt() else {
            anyhow::bail!("no prompt given\n\nUsage: imagegen \"<prompt>\" [--model <id>] [--output <path>] [--size <WxH>]");
        };
        let request = GenerationRequest::new(prompt)
            .with_model(&self.model)
            .with_size(&self.size);
        request.validate()?;
        Ok(request)
    }
}

/// Whether `--help`/`-h` appears as a flag anywhere on the command line.
///
/// Help wins over every other argument, including ones the parser would
/// reject, so this runs before parsing.
fn wants_help<S: AsRef<str>>(args: &[S]) -> bool {
    let mut tokens = args.iter().skip(1).map(AsRef::as_ref);
    while let Some(token) = tokens.next() {
        match token {
            "--" => return false,
            "--help" | "-h" => return true,
            t if VALUE_OPTIONS.contains(&t) => {
                tokens.next();
            }
            _ => {}
        }
    }
    false
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("imagegen=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if wants_help(&args) {
        Cli::command().print_help()?;
        return Ok(());
    }

    let cli = Cli::parse_from(args);
    let request = cli.request()?;

    // The environment is only written while this is the sole thread.
    let credential = Credential::load()?;
    credential.export();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(generate_image(&cli, &request))
}

async fn generate_image(cli: &Cli, request: &GenerationRequest) -> anyhow::Result<()> {
    let client = ImageClient::builder().build()?;

    if !cli.json {
        println!("Prompt: {}", request.prompt);
        println!("Model: {} ({})", request.model, request.route());
        if request.route() == Route::ImageGeneration {
            println!("Size: {}", request.size);
        }
        println!("Output: {}", cli.output.display());
    }

    let image = client.generate(request).await?;
    image.save(&cli.output)?;

    if cli.json {
        let result = serde_json::json!({
            "success": true,
            "output": cli.output.display().to_string(),
            "size_bytes": image.size(),
            "format": image.detected_format().map(|f| f.extension()),
            "model": image.metadata.model,
            "route": image.metadata.route,
            "duration_ms": image.metadata.duration_ms,
            "caption": image.caption,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Saved image: {} ({} bytes)",
            cli.output.display(),
            image.size()
        );
        if let Some(format) = image.detected_format() {
            println!("Format: {}", format);
        }
        if let Some(duration) = image.metadata.duration_ms {
            println!("Duration: {}ms", duration);
        }
        if let Some(caption) = &image.caption {
            println!("Caption: {}", caption);
        }
    }

    Ok(())
}
