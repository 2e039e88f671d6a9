//! Evaluate command implementation.
//!
//! Runs the video pipeline over a folder of authentic clips and a folder of
//! manipulated ones, then reports how well the confidences separate them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use mediaguard_core::{FrameScorer, VideoAnalyzer, DEFAULT_MAX_FRAMES};
use tracing::{info, warn};

use crate::metrics::Report;
use crate::utils::{build_classifier, read_input, video_backend};

#[derive(Debug, Args)]
pub struct EvaluateArgs {
    /// Folder of authentic `.mp4` videos
    #[arg(long, value_name = "DIR")]
    pub real: PathBuf,

    /// Folder of manipulated `.mp4` videos
    #[arg(long, value_name = "DIR")]
    pub fake: PathBuf,

    /// Maximum videos taken from each folder
    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    /// Confidence at or above which a video counts as manipulated
    #[arg(long, default_value_t = 0.5)]
    pub threshold: f64,

    /// Use the mock classifier instead of a real detector (for testing)
    #[arg(long)]
    pub mock: bool,

    /// Remote classifier endpoint
    #[arg(long, value_name = "URL")]
    pub classifier_url: Option<String>,

    /// Maximum number of frames scored per video
    #[arg(long, default_value_t = DEFAULT_MAX_FRAMES)]
    pub max_frames: usize,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// `.mp4` files in `dir`, sorted by name, at most `limit` of them.
pub fn list_videos(dir: &Path, limit: usize) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    let mut videos = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?
            .path();
        let is_mp4 = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mp4"));
        if is_mp4 && path.is_file() {
            videos.push(path);
        }
    }

    videos.sort();
    videos.truncate(limit);
    Ok(videos)
}

/// Execute the evaluate command.
pub async fn execute(args: EvaluateArgs, quiet: bool) -> Result<()> {
    let real = list_videos(&args.real, args.limit)?;
    let fake = list_videos(&args.fake, args.limit)?;
    if real.is_empty() && fake.is_empty() {
        anyhow::bail!(
            "Failed to read any .mp4 videos from {} or {}",
            args.real.display(),
            args.fake.display()
        );
    }
    info!(real = real.len(), fake = fake.len(), "Loaded evaluation set");

    let scorer = FrameScorer::new(build_classifier(args.mock, args.classifier_url, quiet)?);
    let analyzer = VideoAnalyzer::new(scorer, video_backend()?).with_max_frames(args.max_frames);

    let labelled: Vec<(PathBuf, bool)> = real
        .into_iter()
        .map(|p| (p, false))
        .chain(fake.into_iter().map(|p| (p, true)))
        .collect();
    let total = labelled.len();

    let mut labels = Vec::with_capacity(total);
    let mut scores = Vec::with_capacity(total);
    let mut skipped = 0usize;

    for (idx, (path, manipulated)) in labelled.into_iter().enumerate() {
        if !quiet && !args.json {
            eprintln!("Processing video {}/{}: {}", idx + 1, total, path.display());
        }

        let bytes = read_input(&path)?;
        match analyzer.analyze(bytes).await {
            Ok(result) => {
                labels.push(manipulated);
                scores.push(result.confidence);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping video");
                skipped += 1;
            }
        }
    }

    if scores.is_empty() {
        anyhow::bail!("None of the {} videos could be analyzed", total);
    }

    let report = Report::compute(&labels, &scores, args.threshold);

    if args.json {
        let mut json = report.to_json();
        json["skipped"] = skipped.into();
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    if !quiet {
        let auc = report
            .roc_auc
            .map(|v| format!("{:.4}", v))
            .unwrap_or_else(|| "n/a (single class)".to_string());

        println!();
        println!("{}", "Video model performance".bold());
        println!(
            "   {} {} scored, {} skipped",
            "Videos:".dimmed(),
            scores.len(),
            skipped
        );
        println!("   {} {:.2}", "Threshold:".dimmed(), report.threshold);
        println!("   {} {:.4}", "Accuracy:".dimmed(), report.accuracy);
        println!("   {} {:.4}", "Precision:".dimmed(), report.precision);
        println!("   {} {:.4}", "Recall:".dimmed(), report.recall);
        println!("   {} {:.4}", "F1 score:".dimmed(), report.f1);
        println!("   {} {}", "ROC AUC:".dimmed(), auc);
    }

    Ok(())
}
