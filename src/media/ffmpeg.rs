use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

use crate::config::MediaConfig;

/// Extraction failure. Callers skip the input rather than abort.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("failed to spawn {program}. Is ffmpeg installed? ({source})")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("refusing to overwrite existing file {0}")]
    OutputExists(PathBuf),
    #[error("{program} exited with {status}:\n{stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Sibling output path: `clip.mp4` becomes `clip.mp4.wav`.
pub fn wav_path_for(input: &Path) -> PathBuf {
    let mut name: OsString = input.as_os_str().to_owned();
    name.push(".wav");
    PathBuf::from(name)
}

pub fn is_video(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |ext| {
            extensions.iter().any(|v| v.eq_ignore_ascii_case(ext))
        })
}

fn build_args(input: &Path, output: &Path, media: &MediaConfig) -> Vec<OsString> {
    vec![
        "-hide_banner".into(),
        "-loglevel".into(), "error".into(),
        "-i".into(), input.into(),
        "-ab".into(), media.audio_bitrate.clone().into(),
        "-ac".into(), media.channels.to_string().into(),
        "-ar".into(), media.sample_rate.to_string().into(),
        "-vn".into(),
        output.into(),
    ]
}

/// Pull the audio track out of a media file into a PCM WAV next to it.
/// The returned file was created by this call; an existing sibling is never
/// touched.
pub fn extract_audio(input: &Path, media: &MediaConfig) -> Result<PathBuf, ConversionError> {
    let output_path = wav_path_for(input);
    if output_path.exists() {
        return Err(ConversionError::OutputExists(output_path));
    }
    let args = build_args(input, &output_path, media);

    log::info!(
        "Extracting audio: {} -> {} ({}Hz, {} ch)",
        input.display(),
        output_path.display(),
        media.sample_rate,
        media.channels
    );

    let output = Command::new(&media.ffmpeg)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| ConversionError::Spawn {
            program: media.ffmpeg.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(ConversionError::Failed {
            program: media.ffmpeg.clone(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output_path)
}
