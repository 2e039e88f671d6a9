//! Analyze command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, ValueEnum};
use colored::Colorize;
use mediaguard_core::{
    analyze_image, AnalysisResult, FrameScorer, MediaBlob, MediaKind, MediaValidator,
    ValidatedMedia, VideoAnalyzer, DEFAULT_MAX_FRAMES,
};
use tracing::{debug, info, warn};

use crate::exit_codes::Failure;
use crate::utils::{build_classifier, colored_verdict, detect_media_kind, read_input, video_backend};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Image,
    Video,
}

impl From<KindArg> for MediaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Image => MediaKind::Image,
            KindArg::Video => MediaKind::Video,
        }
    }
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Image (JPEG, PNG) or video file to analyze
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Media kind (detected from the extension when omitted)
    #[arg(short, long, value_enum)]
    pub kind: Option<KindArg>,

    /// Use the mock classifier instead of a real detector (for testing)
    #[arg(long)]
    pub mock: bool,

    /// Remote classifier endpoint
    #[arg(long, value_name = "URL")]
    pub classifier_url: Option<String>,

    /// Maximum number of video frames to score
    #[arg(long, default_value_t = DEFAULT_MAX_FRAMES)]
    pub max_frames: usize,

    /// Write the explanation heatmap (images only) to this PNG file
    #[arg(long, value_name = "OUT.png")]
    pub heatmap: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the analyze command.
pub async fn execute(args: AnalyzeArgs, quiet: bool) -> Result<()> {
    let content = read_input(&args.file)?;
    info!(path = %args.file.display(), bytes = content.len(), "Read file");

    let kind = match args.kind {
        Some(kind) => kind.into(),
        None => detect_media_kind(&args.file).ok_or_else(|| {
            Failure::usage(format!(
                "Cannot tell whether {} is an image or a video; pass --kind",
                args.file.display()
            ))
        })?,
    };
    debug!(media_type = %kind, "Detected media type");

    let validated = MediaValidator::default()
        .validate(MediaBlob::new(content, kind))
        .context("Media rejected")?;
    let hash = validated.hash();

    let scorer = FrameScorer::new(build_classifier(args.mock, args.classifier_url, quiet)?);
    let source = scorer.source_id();

    let result = match validated {
        ValidatedMedia::Image(image) => analyze_image(&scorer, image)
            .await
            .context("Image analysis failed")?,
        ValidatedMedia::Video(video) => {
            let analyzer =
                VideoAnalyzer::new(scorer, video_backend()?).with_max_frames(args.max_frames);
            analyzer
                .analyze(video.bytes)
                .await
                .context("Video analysis failed")?
        }
    };

    info!(
        hash = %hash.short(),
        verdict = ?result.verdict,
        confidence = result.confidence,
        frames = result.frames_analyzed,
        "Analysis complete"
    );

    if let Some(out) = &args.heatmap {
        write_heatmap(&result, out)?;
    }

    if args.json {
        let output = serde_json::json!({
            "file": args.file.display().to_string(),
            "hash": hash.to_hex(),
            "media_type": result.media_type,
            "verdict": result.verdict,
            "confidence": result.confidence,
            "frames_analyzed": result.frames_analyzed,
            "classifier": source.to_string(),
            "analyzed_at": Utc::now().to_rfc3339(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !quiet {
        println!();
        println!("   {} {}", "Verdict:".dimmed(), colored_verdict(result.verdict));
        println!("   {} {:.4}", "Confidence:".dimmed(), result.confidence);
        println!("   {} {}", "Media type:".dimmed(), result.media_type);
        if result.media_type == MediaKind::Video {
            println!("   {} {}", "Frames scored:".dimmed(), result.frames_analyzed);
        }
        println!("   {} {}", "Content hash:".dimmed(), hash.short());
        println!("   {} {}", "Classifier:".dimmed(), source);
        if let Some(out) = &args.heatmap {
            if result.explanation.is_some() {
                println!("   {} {}", "Heatmap:".dimmed(), out.display());
            }
        }
    }

    Ok(())
}

fn write_heatmap(result: &AnalysisResult, out: &Path) -> Result<()> {
    match &result.explanation {
        Some(png) => {
            std::fs::write(out, png)
                .with_context(|| format!("Failed to write heatmap: {}", out.display()))?;
            info!(path = %out.display(), bytes = png.len(), "Heatmap saved");
        }
        None => warn!("No heatmap available for this media"),
    }
    Ok(())
}
