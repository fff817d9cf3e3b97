use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "peakscan",
    about = "Per-frame spectral peak extraction for audible and ultrasound audio"
)]
pub struct Cli {
    /// Input media files (WAV, MP3, FLAC, OGG, or video containers)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Band table: "ultrasound", anything else selects audible
    #[arg(short, long, default_value = "audible")]
    pub mode: String,

    /// Write the JSON report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file (defaults to peakscan.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Run every input through ffmpeg audio extraction first
    #[arg(long)]
    pub extract: bool,

    /// Keep WAV files produced by extraction
    #[arg(long)]
    pub keep_wav: bool,

    /// Worker threads for frame processing (0 = one per core)
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    /// ffmpeg binary used for extraction
    #[arg(long)]
    pub ffmpeg: Option<String>,
}
