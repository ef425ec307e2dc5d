//! End-to-end analysis with deterministic stand-in encoders.
//!
//! The image encoder maps an image to its mean RGB colour; the text encoder
//! maps each label to a fixed colour direction. Scores are then ordinary
//! cosine similarities between colours, which keeps expectations readable.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use arttag_core::config::LimitsConfig;
use arttag_core::tagging::{Category, Taxonomy, TaxonomyStore};
use arttag_core::{
    ArtTagger, ImageEmbedder, PipelineError, PipelineResult, TextEmbedder,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

struct MeanColorEmbedder;

impl ImageEmbedder for MeanColorEmbedder {
    fn embed_image(&self, image: &DynamicImage) -> PipelineResult<Vec<f32>> {
        let rgb = image.to_rgb8();
        let mut sums = [0f32; 3];
        for pixel in rgb.pixels() {
            for (sum, &value) in sums.iter_mut().zip(pixel.0.iter()) {
                *sum += value as f32;
            }
        }
        Ok(sums.to_vec())
    }
}

/// Labels mentioning a colour point at it; everything else points at grey.
struct ColorWordEncoder {
    broken_label: Option<&'static str>,
}

impl TextEmbedder for ColorWordEncoder {
    fn embed_texts(&self, texts: &[String]) -> PipelineResult<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|text| {
                if Some(text.as_str()) == self.broken_label {
                    return Err(PipelineError::Model {
                        message: format!("cannot encode {text:?}"),
                    });
                }
                Ok(if text.contains("red") {
                    vec![1.0, 0.0, 0.0]
                } else if text.contains("green") {
                    vec![0.0, 1.0, 0.0]
                } else if text.contains("blue") {
                    vec![0.0, 0.0, 1.0]
                } else {
                    vec![-1.0, -1.0, -1.0]
                })
            })
            .collect()
    }
}

fn taxonomy() -> Taxonomy {
    let labels = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
    Taxonomy::new(vec![
        Category::new("medium", labels(&["red chalk", "blue ink", "graphite"])),
        Category::new("style", labels(&["blue period", "red shift", "green wave"])),
        Category::new("aesthetic_features", labels(&["dark tones", "muted"])),
    ])
    .unwrap()
}

fn tagger(encoder: &ColorWordEncoder) -> ArtTagger {
    let store = TaxonomyStore::build(&taxonomy(), encoder);
    ArtTagger::from_parts(Arc::new(MeanColorEmbedder), store, &LimitsConfig::default())
}

fn png(color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(8, 8, Rgb(color));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn labels_of<'a>(result: &'a arttag_core::AnalysisResult, category: &str) -> Vec<&'a str> {
    result
        .get(category)
        .unwrap()
        .iter()
        .map(|l| l.label.as_str())
        .collect()
}

#[tokio::test]
async fn red_image_ranks_red_labels_first() {
    let tagger = tagger(&ColorWordEncoder { broken_label: None });
    let result = tagger
        .analyze_bytes(png([255, 0, 0]), Path::new("red.png"))
        .await
        .unwrap();

    assert_eq!(labels_of(&result, "medium"), vec!["red chalk"]);
    // Medium scores are boosted past 1.0.
    assert_eq!(result.get("medium").unwrap()[0].confidence, 1.1);
    assert_eq!(labels_of(&result, "style"), vec!["red shift"]);
    assert_eq!(result.get("style").unwrap()[0].confidence, 1.0);
    // Nothing in this category points at red, but the key is still present.
    assert!(labels_of(&result, "aesthetic_features").is_empty());
}

#[tokio::test]
async fn mixed_color_ranks_by_similarity() {
    let tagger = tagger(&ColorWordEncoder { broken_label: None });
    // Mostly blue with some green: blue ≈ 0.894, green ≈ 0.447.
    let result = tagger
        .analyze_bytes(png([0, 100, 200]), Path::new("teal.png"))
        .await
        .unwrap();

    assert_eq!(labels_of(&result, "style"), vec!["blue period", "green wave"]);
    let confidences: Vec<f64> = result
        .get("style")
        .unwrap()
        .iter()
        .map(|l| l.confidence)
        .collect();
    assert_eq!(confidences, vec![0.894, 0.447]);
}

#[tokio::test]
async fn failed_category_is_absent_but_analysis_succeeds() {
    let tagger = tagger(&ColorWordEncoder {
        broken_label: Some("muted"),
    });
    assert!(tagger.is_ready());
    assert_eq!(tagger.store().category_names(), vec!["medium", "style"]);

    let result = tagger
        .analyze_bytes(png([0, 255, 0]), Path::new("green.png"))
        .await
        .unwrap();
    assert!(!result.contains("aesthetic_features"));
    assert_eq!(labels_of(&result, "style"), vec!["green wave"]);

    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("aesthetic_features").is_none());
    assert_eq!(json["style"][0]["label"], "green wave");
}

#[tokio::test]
async fn result_keys_follow_taxonomy_order() {
    let tagger = tagger(&ColorWordEncoder { broken_label: None });
    let result = tagger
        .analyze_bytes(png([10, 10, 200]), Path::new("blue.png"))
        .await
        .unwrap();

    let json = serde_json::to_string(&result).unwrap();
    let medium = json.find("\"medium\"").unwrap();
    let style = json.find("\"style\"").unwrap();
    let aesthetic = json.find("\"aesthetic_features\"").unwrap();
    assert!(medium < style && style < aesthetic);
}

#[tokio::test]
async fn undecodable_upload_fails_whole_request() {
    let tagger = tagger(&ColorWordEncoder { broken_label: None });
    let err = tagger
        .analyze_bytes(b"GIF89a but not really".to_vec(), Path::new("fake.gif"))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Decode { .. }));
    assert!(err.to_string().contains("fake.gif"));
}

#[tokio::test]
async fn analyze_file_reports_image_properties() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("canvas.png");
    std::fs::write(&path, png([255, 0, 0])).unwrap();

    let tagger = tagger(&ColorWordEncoder { broken_label: None });
    let analysis = tagger.analyze_file(&path).await.unwrap();
    assert_eq!(analysis.format, "png");
    assert_eq!((analysis.width, analysis.height), (8, 8));
    assert_eq!(labels_of(&analysis.analysis, "medium"), vec!["red chalk"]);
}

#[test]
fn store_build_is_idempotent() {
    let encoder = ColorWordEncoder { broken_label: None };
    let a = TaxonomyStore::build(&taxonomy(), &encoder);
    let b = TaxonomyStore::build(&taxonomy(), &encoder);
    assert_eq!(a.len(), b.len());
    for (x, y) in a.categories().iter().zip(b.categories()) {
        assert_eq!(x.bank().matrix(), y.bank().matrix());
        assert_eq!(x.labels(), y.labels());
    }
}
