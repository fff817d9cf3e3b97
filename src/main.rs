mod audio;
mod cli;
mod config;
mod media;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use audio::analysis::{analyse, AnalysisReport};
use audio::bands::Mode;
use cli::Cli;
use config::Config;
use media::ffmpeg;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    let mut cfg = config::resolve_config(cli.config.as_deref())?;

    // Merge: CLI flags win over config values
    if !cli.pretty {
        cli.pretty = cfg.output.pretty;
    }
    if let Some(ffmpeg) = cli.ffmpeg.take() {
        cfg.media.ffmpeg = ffmpeg;
    }

    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    for input in &cli.inputs {
        if !input.exists() {
            anyhow::bail!("Input file not found: {}", input.display());
        }
    }

    let mode = Mode::from_name(&cli.mode);
    if cli.mode != "ultrasound" && cli.mode != "audible" {
        log::warn!("Unknown mode '{}', using audible bands", cli.mode);
    }

    log::info!("peakscan - spectral peak extraction");
    log::info!("Mode: {:?}, chunk size: {}", mode, cfg.analysis.chunk_size);

    let pb = ProgressBar::new(cli.inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} files ({eta} remaining)")?
            .progress_chars("=>-"),
    );

    let mut reports = Vec::with_capacity(cli.inputs.len());
    for input in &cli.inputs {
        if let Some(report) = process_input(input, mode, &cli, &cfg)? {
            reports.push(report);
        }
        pb.inc(1);
    }
    pb.finish_with_message("Analysis complete");

    write_reports(&reports, cli.output.as_deref(), cli.pretty)?;

    log::info!("Done! {} of {} inputs analysed", reports.len(), cli.inputs.len());
    Ok(())
}

/// `Ok(None)` means the input was skipped because extraction failed.
fn process_input(
    input: &Path,
    mode: Mode,
    cli: &Cli,
    cfg: &Config,
) -> Result<Option<AnalysisReport>> {
    log::info!("Input: {}", input.display());

    let needs_extraction = cli.extract || ffmpeg::is_video(input, &cfg.media.video_extensions);
    let audio_path = if needs_extraction {
        match ffmpeg::extract_audio(input, &cfg.media) {
            Ok(path) => path,
            Err(err) => {
                log::warn!("Conversion failed, skipping {}: {}", input.display(), err);
                return Ok(None);
            }
        }
    } else {
        input.to_path_buf()
    };

    let decoded = audio::decode::decode_audio(&audio_path);

    // only reached when extraction created the file
    if needs_extraction && !cli.keep_wav {
        if let Err(err) = std::fs::remove_file(&audio_path) {
            log::warn!("Failed to remove {}: {}", audio_path.display(), err);
        }
    }

    let signal = decoded.with_context(|| format!("Failed to decode {}", audio_path.display()))?;
    if signal.channel_count() > 1 {
        log::debug!("Analysing channel 0 of {}", signal.channel_count());
    }

    let peaks = analyse(&signal, mode, &cfg.analysis);

    Ok(Some(AnalysisReport {
        source: input.display().to_string(),
        mode,
        sample_rate: signal.sample_rate,
        frames: signal.first_channel().len() / cfg.analysis.chunk_size,
        peaks,
    }))
}

fn write_reports(reports: &[AnalysisReport], output: Option<&Path>, pretty: bool) -> Result<()> {
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };

    if pretty {
        serde_json::to_writer_pretty(&mut writer, reports)?;
    } else {
        serde_json::to_writer(&mut writer, reports)?;
    }
    writeln!(writer)?;
    writer.flush().context("Failed to write report")?;

    if let Some(path) = output {
        log::info!("Report written to {}", path.display());
    }
    Ok(())
}
