use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;
use id3ts::config::{parse_int, parse_pid};
use id3ts::{generate_segment, Config};
use log::info;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

/// Writes an MPEG-TS segment carrying one timed ID3 tag to stdout.
#[derive(Parser)]
#[clap(name = "id3ts", version)]
struct Opt {
    /// PID of an H.264 video stream to list in the PMT
    #[clap(short = 'v', long, value_parser = parse_pid)]
    video_pid: Option<u16>,

    /// PID of an AAC audio stream to list in the PMT
    #[clap(short = 'a', long, value_parser = parse_pid)]
    audio_pid: Option<u16>,

    /// Presentation timestamp of the tag, in 90kHz ticks
    #[clap(short = 'p', long, value_parser = parse_int)]
    id3_pts: Option<u64>,

    /// PID carrying the PMT
    #[clap(long, value_parser = parse_pid)]
    pmt_pid: Option<u16>,

    /// PID carrying the ID3 tag
    #[clap(long, value_parser = parse_pid)]
    id3_pid: Option<u16>,

    /// TXXX frame description
    #[clap(short = 'd', long)]
    description: Option<String>,

    /// Config file (defaults to ./id3ts.toml when present)
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// Write the segment here instead of stdout
    #[clap(short = 'o', long)]
    output: Option<PathBuf>,

    /// Value of the TXXX frame
    data: Option<String>,
}

impl Opt {
    fn apply(&self, config: &mut Config) {
        if let Some(pid) = self.pmt_pid {
            config.pmt_pid = pid;
        }
        if let Some(pid) = self.id3_pid {
            config.id3_pid = pid;
        }
        if let Some(pts) = self.id3_pts {
            config.id3_pts = pts;
        }
        if self.video_pid.is_some() {
            config.video_pid = self.video_pid;
        }
        if self.audio_pid.is_some() {
            config.audio_pid = self.audio_pid;
        }
        if let Some(description) = &self.description {
            config.description = description.clone();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the segment, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive("warn".parse()?)
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let opt = Opt::parse();
    let data = opt
        .data
        .clone()
        .ok_or_else(|| anyhow!("no data given, pass the tag value as the last argument"))?;

    let mut config = Config::load(opt.config.as_deref()).context("failed to load config")?;
    opt.apply(&mut config);

    let segment = generate_segment(config.into_options(data)).await?;
    info!("generated {} byte segment", segment.len());

    match &opt.output {
        Some(path) => tokio::fs::write(path, &segment)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&segment).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}
