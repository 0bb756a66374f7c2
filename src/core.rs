use clap::Parser;
use std::future::pending;
use tracing::{error, info, warn};
use url::Url;

use crate::cli::{Args, Command, CreateJobArgs, ServeArgs, StreamArgs};
use crate::config::{Config, EnvVars, JobSettings, ServeSettings, StreamSettings};
use crate::errors::{ChunkpostError, Result};
use crate::job::{create_job, JobRequest};
use crate::lock::PidLock;
use crate::logging;
use crate::pipeline::{ChunkedDeliveryPipeline, PipelineOptions, ScanHandle};
use crate::server::HelloServer;
use crate::sink::HttpSink;
use crate::status::ExitStatus;

/// Main entry point for the CLI.
///
/// Parses arguments, sets up logging, and runs the selected command on a
/// single-threaded runtime.
pub fn run(args: Vec<String>) -> ExitStatus {
    let parsed = match Args::try_parse_from(&args) {
        Ok(args) => args,
        Err(e) => {
            e.print().ok();
            return if e.kind() == clap::error::ErrorKind::DisplayHelp
                || e.kind() == clap::error::ErrorKind::DisplayVersion
            {
                ExitStatus::Success
            } else {
                ExitStatus::Error
            };
        }
    };

    logging::init(parsed.log_format, parsed.verbose);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create tokio runtime");
            return ExitStatus::Error;
        }
    };

    match runtime.block_on(program(parsed)) {
        Ok(status) => status,
        Err(e) => handle_error(e),
    }
}

pub async fn program(args: Args) -> Result<ExitStatus> {
    let env = EnvVars::load(args.env_file.as_deref())?;
    let config = Config::load(&env);

    match args.command {
        Command::Stream(stream) => run_stream(stream, config.stream).await,
        Command::Serve(serve) => run_serve(serve, config.serve).await,
        Command::CreateJob(job) => run_create_job(job, config.job).await,
    }
}

/// Overlay CLI flags on the configured stream settings
pub fn resolve_stream_settings(args: &StreamArgs, configured: StreamSettings) -> StreamSettings {
    StreamSettings {
        chunk_size: args.chunk_size.unwrap_or(configured.chunk_size),
        inter_chunk_delay: args.delay.unwrap_or(configured.inter_chunk_delay),
        sink_url: args.sink_url.clone().unwrap_or(configured.sink_url),
        timeout: args.timeout.or(configured.timeout),
    }
}

async fn run_stream(args: StreamArgs, configured: StreamSettings) -> Result<ExitStatus> {
    let settings = resolve_stream_settings(&args, configured);

    let url = parse_url("sink URL", &settings.sink_url)?;
    let sink = HttpSink::new(url, settings.timeout)?;
    let pipeline = ChunkedDeliveryPipeline::new(
        sink,
        PipelineOptions {
            chunk_size: settings.chunk_size,
            inter_chunk_delay: settings.inter_chunk_delay,
        },
    )?;

    let handle = ScanHandle::open(&args.file).await?;
    let report = pipeline.scan(handle).await?;
    info!(
        reads = report.reads,
        delivered = report.delivered,
        failed = report.failed,
        "Scan complete: {}",
        report
    );

    Ok(ExitStatus::Success)
}

async fn run_serve(args: ServeArgs, configured: ServeSettings) -> Result<ExitStatus> {
    let host = args.host.unwrap_or(configured.host);
    let port = args.port.unwrap_or(configured.port);
    let pid_file = args.pid_file.unwrap_or(configured.pid_file);

    let lock = if args.takeover {
        PidLock::acquire_with_takeover(&pid_file)?
    } else {
        PidLock::acquire(&pid_file)?
    };

    let server = HelloServer::bind(&host, port).await?;
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Cannot listen for Ctrl+C; serving until killed");
                pending::<()>().await;
            }
        })
        .await?;

    lock.release()?;
    Ok(ExitStatus::Interrupted)
}

async fn run_create_job(args: CreateJobArgs, configured: JobSettings) -> Result<ExitStatus> {
    let raw_url = args.url.or(configured.create_url).ok_or_else(|| {
        ChunkpostError::Config(
            "No job creation URL; set JOB_ITEM_CREATE_URL or pass --url".to_string(),
        )
    })?;
    let url = parse_url("job creation URL", &raw_url)?;

    let request = JobRequest::new(
        args.app_id.or(configured.app_id),
        args.event.unwrap_or(configured.event),
        args.form,
    );
    create_job(&url, &request, args.after, args.timeout).await?;
    Ok(ExitStatus::Success)
}

fn parse_url(what: &str, raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| ChunkpostError::Config(format!("Invalid {} '{}': {}", what, raw, e)))
}

fn handle_error(error: ChunkpostError) -> ExitStatus {
    match std::error::Error::source(&error) {
        Some(cause) => error!(cause = %cause, "{}", error),
        None => error!("{}", error),
    }
    ExitStatus::Error
}
