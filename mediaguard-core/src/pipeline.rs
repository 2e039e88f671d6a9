//! Analysis pipelines for stills and videos.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use crate::aggregate::aggregate;
use crate::error::{MediaGuardError, Result};
use crate::jobs::{JobHandler, VideoJob};
use crate::media::MediaKind;
use crate::sampler::{self, FrameSample, ScratchFile, VideoBackend, DEFAULT_MAX_FRAMES};
use crate::scorer::FrameScorer;
use crate::validation::ValidatedImage;
use crate::verdict::{round_confidence, Verdict};

/// Outcome of analyzing one image or video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub media_type: MediaKind,
    pub verdict: Verdict,
    /// Manipulation confidence, rounded to four decimals
    pub confidence: f64,
    pub frames_analyzed: usize,
    /// PNG overlay for single images
    #[serde(skip)]
    pub explanation: Option<Vec<u8>>,
}

/// Classify a validated still image.
///
/// The decoded image is consumed and dropped before this returns.
#[instrument(level = "info", skip_all, fields(hash = %image.hash.short()))]
pub async fn analyze_image(scorer: &FrameScorer, image: ValidatedImage) -> Result<AnalysisResult> {
    let classification = scorer.explain(&image.image).await?;
    drop(image);

    let verdict = Verdict::for_image(classification.confidence);
    let confidence = round_confidence(classification.confidence);
    info!(confidence, verdict = %verdict, "Image analyzed");

    Ok(AnalysisResult {
        media_type: MediaKind::Image,
        verdict,
        confidence,
        frames_analyzed: 1,
        explanation: classification.explanation,
    })
}

/// Sample, score and aggregate a video.
pub struct VideoAnalyzer {
    scorer: FrameScorer,
    backend: Arc<dyn VideoBackend>,
    max_frames: usize,
}

impl VideoAnalyzer {
    pub fn new(scorer: FrameScorer, backend: Arc<dyn VideoBackend>) -> Self {
        Self {
            scorer,
            backend,
            max_frames: DEFAULT_MAX_FRAMES,
        }
    }

    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames.max(1);
        self
    }

    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    /// Run the full video pipeline over raw container bytes.
    ///
    /// Decoding runs on the blocking pool and hands frames over one at a time
    /// through a single-slot channel, so at most a couple of decoded frames
    /// exist at once. The scratch file is owned by the decoding task and
    /// removed when it ends, however it ends.
    pub async fn analyze(&self, bytes: Vec<u8>) -> Result<AnalysisResult> {
        let (tx, mut rx) = mpsc::channel::<FrameSample>(1);
        let backend = Arc::clone(&self.backend);
        let max_frames = self.max_frames;

        let decoder = tokio::task::spawn_blocking(move || -> Result<usize> {
            let scratch = ScratchFile::write(&bytes, ".mp4")?;
            drop(bytes);

            let source = backend.open(scratch.path())?;
            let mut sampled = 0;
            for frame in sampler::sample(source, max_frames) {
                if tx.blocking_send(frame).is_err() {
                    break;
                }
                sampled += 1;
            }
            Ok(sampled)
        });

        let mut scores = Vec::with_capacity(max_frames);
        while let Some(frame) = rx.recv().await {
            if let Some(frame_score) = self.scorer.score_or_skip(&frame).await {
                scores.push(frame_score.score);
            }
        }

        let sampled = decoder
            .await
            .map_err(|e| MediaGuardError::Decode(format!("decoder task failed: {e}")))??;

        if sampled == 0 {
            return Err(MediaGuardError::Sampling(
                "no frames could be extracted from the video".into(),
            ));
        }

        debug!(sampled, scored = scores.len(), "Frames scored");
        let aggregate = aggregate(&scores)?;

        Ok(AnalysisResult {
            media_type: MediaKind::Video,
            verdict: aggregate.verdict,
            confidence: aggregate.confidence,
            frames_analyzed: aggregate.frames,
            explanation: None,
        })
    }
}

#[async_trait]
impl JobHandler for VideoAnalyzer {
    #[instrument(level = "info", skip_all, fields(job_id = %job.id, hash = %job.hash.short()))]
    async fn run(&self, job: VideoJob) -> Result<AnalysisResult> {
        let result = self.analyze(job.bytes).await?;
        info!(
            confidence = result.confidence,
            verdict = %result.verdict,
            frames = result.frames_analyzed,
            "Video analyzed"
        );
        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::classifier::{ClassifierSource, FrameClassifier};
    use crate::sampler::testing::FakeVideo;
    use crate::sampler::VideoSource;
    use image::RgbImage;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    /// Backend that ignores the file and serves a canned video, recording
    /// the scratch path it was given.
    pub struct FakeBackend {
        pub values: Vec<u8>,
        pub broken: Vec<u64>,
        pub reported_count: Option<u64>,
        pub opened: Mutex<Vec<PathBuf>>,
    }

    impl FakeBackend {
        pub fn new(values: Vec<u8>) -> Self {
            Self {
                reported_count: Some(values.len() as u64),
                values,
                broken: Vec::new(),
                opened: Mutex::new(Vec::new()),
            }
        }
    }

    impl VideoBackend for FakeBackend {
        fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>> {
            assert!(path.exists(), "scratch file must exist while decoding");
            self.opened.lock().unwrap().push(path.to_path_buf());

            let mut video = FakeVideo::new(self.values.clone());
            video.reported_count = self.reported_count;
            video.broken = self.broken.iter().copied().collect();
            Ok(Box::new(video))
        }
    }

    /// Classifier that reads a frame's score from its first pixel (`v / 100`).
    /// Values above 100 make the classifier fail.
    pub struct PixelClassifier;

    #[async_trait]
    impl FrameClassifier for PixelClassifier {
        async fn classify(&self, image: &RgbImage) -> Result<f64> {
            let v = image.get_pixel(0, 0).0[0];
            if v > 100 {
                return Err(MediaGuardError::Oracle(format!("model rejected pixel {v}")));
            }
            Ok(v as f64 / 100.0)
        }

        fn source_id(&self) -> ClassifierSource {
            ClassifierSource::Mock
        }
    }

    pub fn analyzer(backend: Arc<FakeBackend>) -> VideoAnalyzer {
        VideoAnalyzer::new(FrameScorer::new(Arc::new(PixelClassifier)), backend)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{analyzer, FakeBackend};
    use super::*;
    use crate::classifier::MockClassifier;
    use crate::media::MediaBlob;
    use crate::validation::MediaValidator;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    #[tokio::test]
    async fn test_video_scores_aggregate_to_percentile() {
        // Five frames, sampled in full, scoring [0.1, 0.2, 0.3, 0.9, 0.95].
        let backend = Arc::new(FakeBackend::new(vec![10, 20, 30, 90, 95]));
        let result = analyzer(backend).analyze(b"fake mp4".to_vec()).await.unwrap();

        assert_eq!(result.media_type, MediaKind::Video);
        assert_eq!(result.frames_analyzed, 5);
        assert_eq!(result.confidence, 0.9);
        assert_eq!(result.verdict, Verdict::LikelyFake);
        assert!(result.explanation.is_none());
    }

    #[tokio::test]
    async fn test_long_video_is_capped() {
        let backend = Arc::new(FakeBackend::new(vec![20; 500]));
        let result = analyzer(backend)
            .with_max_frames(12)
            .analyze(vec![0; 16])
            .await
            .unwrap();
        assert_eq!(result.frames_analyzed, 12);
        assert_eq!(result.verdict, Verdict::Real);
    }

    #[tokio::test]
    async fn test_no_frames_is_sampling_error() {
        let mut backend = FakeBackend::new(vec![10; 8]);
        backend.reported_count = None;
        let err = analyzer(Arc::new(backend)).analyze(vec![1; 4]).await.unwrap_err();
        assert!(matches!(err, MediaGuardError::Sampling(_)));
    }

    #[tokio::test]
    async fn test_all_frames_failing_oracle_is_empty_scores() {
        // Every frame decodes but the classifier rejects all of them.
        let backend = Arc::new(FakeBackend::new(vec![200; 6]));
        let err = analyzer(backend).analyze(vec![1; 4]).await.unwrap_err();
        assert!(matches!(err, MediaGuardError::EmptyScores));
    }

    #[tokio::test]
    async fn test_partial_oracle_failures_are_skipped() {
        let backend = Arc::new(FakeBackend::new(vec![80, 200, 80, 200, 80]));
        let result = analyzer(backend).analyze(vec![1; 4]).await.unwrap();
        assert_eq!(result.frames_analyzed, 3);
        assert_eq!(result.confidence, 0.8);
    }

    #[tokio::test]
    async fn test_scratch_file_removed_after_analysis() {
        let backend = Arc::new(FakeBackend::new(vec![10, 20, 30]));
        analyzer(Arc::clone(&backend)).analyze(vec![1; 4]).await.unwrap();

        let opened = backend.opened.lock().unwrap().clone();
        assert_eq!(opened.len(), 1);
        assert!(!opened[0].exists());
    }

    #[tokio::test]
    async fn test_scratch_file_removed_after_failure() {
        let mut backend = FakeBackend::new(vec![10; 3]);
        backend.reported_count = Some(0);
        let backend = Arc::new(backend);
        assert!(analyzer(Arc::clone(&backend)).analyze(vec![1; 4]).await.is_err());

        let opened = backend.opened.lock().unwrap().clone();
        assert!(!opened[0].exists());
    }

    async fn analyze_fixed(confidence: f64) -> AnalysisResult {
        let img = RgbImage::from_fn(32, 32, |x, y| Rgb([(x * 8) as u8, (y * 8) as u8, 50]));
        let mut png = Cursor::new(Vec::new());
        img.write_to(&mut png, ImageFormat::Png).unwrap();

        let validated = MediaValidator::default()
            .validate_image(MediaBlob::image(png.into_inner()))
            .unwrap();
        let scorer = FrameScorer::new(Arc::new(MockClassifier::fixed(confidence)));
        analyze_image(&scorer, validated).await.unwrap()
    }

    #[tokio::test]
    async fn test_image_with_high_confidence_is_likely_fake() {
        let result = analyze_fixed(0.80).await;

        assert_eq!(result.verdict, Verdict::LikelyFake);
        assert_eq!(result.confidence, 0.8);
        assert_eq!(result.frames_analyzed, 1);
        assert!(result.explanation.is_some());
    }

    #[tokio::test]
    async fn test_image_verdict_uses_unrounded_score() {
        let fake = analyze_fixed(0.75004).await;
        assert_eq!(fake.confidence, 0.75);
        assert_eq!(fake.verdict, Verdict::LikelyFake);

        let suspicious = analyze_fixed(0.45004).await;
        assert_eq!(suspicious.confidence, 0.45);
        assert_eq!(suspicious.verdict, Verdict::Suspicious);

        assert_eq!(analyze_fixed(0.75).await.verdict, Verdict::Suspicious);
    }

    #[test]
    fn test_result_json_omits_overlay() {
        let result = AnalysisResult {
            media_type: MediaKind::Video,
            verdict: Verdict::Suspicious,
            confidence: 0.5,
            frames_analyzed: 12,
            explanation: Some(vec![1, 2, 3]),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["verdict"], "Suspicious");
        assert_eq!(json["media_type"], "video");
        assert!(json.get("explanation").is_none());
    }
}
