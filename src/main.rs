use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use lecture_summarizer::cli::{Cli, Commands, OutputFormat};
use lecture_summarizer::{
    output, utils, Config, Error, PipelineRequest, SummaryResponse, Summarizer,
    TranscriptPipeline,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            // Input problems get a distinct exit code from environment and
            // provider failures.
            let code = match e.downcast_ref::<Error>() {
                Some(err) if err.is_client_error() => 2,
                _ => 1,
            };
            ExitCode::from(code)
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_filter = if quiet {
        "lecture_summarizer=error"
    } else if verbose {
        "lecture_summarizer=debug"
    } else {
        "lecture_summarizer=info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Summarize {
            input,
            output,
            format,
            language,
            backend,
            no_thumbnail,
        } => {
            let mut config = Config::load().await?;
            if let Some(language) = language {
                config.transcription.language = language;
            }
            if let Some(backend) = backend {
                config.transcription.backend = backend.into();
            }

            run_summarize(config, &input, output, format, no_thumbnail).await
        }

        Commands::Config { show } => {
            let config = Config::load().await?;
            if show {
                config.display();
            } else {
                config.save().await?;
                println!("Configuration saved.");
            }
            Ok(())
        }

        Commands::Deps => {
            for (tool, available) in utils::check_dependencies().await {
                let status = if available { "ok" } else { "missing" };
                println!("{:10} {}", tool, status);
            }
            Ok(())
        }
    }
}

async fn run_summarize(
    config: Config,
    input: &str,
    output_path: Option<std::path::PathBuf>,
    format: Option<OutputFormat>,
    no_thumbnail: bool,
) -> Result<()> {
    let format = format
        .or_else(|| OutputFormat::from_name(&config.app.default_output_format))
        .unwrap_or(OutputFormat::Json);

    // Local paths are uploads; everything else is treated as a URL or id
    // and validated by the pipeline.
    let path = Path::new(input);
    let (request, source_label) = if path.is_file() {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_string())
            .ok_or_else(|| Error::InvalidInput(format!("unusable filename: {}", input)))?;
        (
            PipelineRequest::Upload {
                path: path.to_path_buf(),
                filename: filename.clone(),
            },
            filename,
        )
    } else {
        (
            PipelineRequest::Url(input.to_string()),
            input.to_string(),
        )
    };

    let summarizer = Summarizer::new(config.summarizer.clone());
    let mut pipeline = TranscriptPipeline::new(config);
    if no_thumbnail {
        pipeline.disable_thumbnails();
    }

    let pipeline_output = pipeline.run(request).await?;
    tracing::info!(
        "Transcript ready via {} ({} chars)",
        pipeline_output.transcript.source.as_str(),
        pipeline_output.transcript.text.chars().count()
    );

    let summary = summarizer.summarize(&pipeline_output.transcript.text).await;

    let response = SummaryResponse::assemble(&source_label, pipeline_output, summary);
    let rendered = response.render(&format)?;

    match output_path {
        Some(path) => {
            let extension = match format {
                OutputFormat::Json => "json",
                OutputFormat::Text => "txt",
            };
            let path = utils::resolve_output_path(path, &response.title, extension);
            output::save_to_file(&rendered, &path).await?;
        }
        None => println!("{}", rendered),
    }

    Ok(())
}
