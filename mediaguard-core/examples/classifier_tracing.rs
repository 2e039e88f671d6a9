//! Example demonstrating remote classifier tracing instrumentation.
//!
//! Run with: CLASSIFIER_URL=http://localhost:8000/classify \
//!     cargo run -p mediaguard-core --example classifier_tracing

use image::{Rgb, RgbImage};
use mediaguard_core::{FrameClassifier, HttpClassifier, HttpClassifierConfig};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with debug level
    fmt()
        .with_env_filter(EnvFilter::new("mediaguard_core=debug,info"))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    println!("=== Classifier Tracing Demo ===\n");

    let config = match HttpClassifierConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };

    println!("Config: {:?}\n", config);

    let classifier = match HttpClassifier::with_config(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };

    let frame = RgbImage::from_fn(64, 64, |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, 128]));

    println!("\nScoring a synthetic 64x64 frame...\n");

    match classifier.explain(&frame).await {
        Ok(classification) => {
            println!("\nScored");
            println!("   Confidence: {:.4}", classification.confidence);
            println!(
                "   Heatmap:    {}",
                classification
                    .explanation
                    .map(|png| format!("{} bytes", png.len()))
                    .unwrap_or_else(|| "none".to_string())
            );
        }
        Err(e) => {
            println!("\nFailed: {}", e);
        }
    }
}
