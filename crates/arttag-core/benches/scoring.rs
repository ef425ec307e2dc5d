//! Benchmarks for taxonomy scoring.
//!
//! Run with: cargo bench -p arttag-core

use arttag_core::tagging::{SimilarityScorer, Taxonomy, TaxonomyStore};
use arttag_core::{PipelineResult, TextEmbedder};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const DIM: usize = 512;

/// Deterministic pseudo-embeddings derived from the label bytes.
struct HashingEncoder;

impl TextEmbedder for HashingEncoder {
    fn embed_texts(&self, texts: &[String]) -> PipelineResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| pseudo_vector(t.as_bytes())).collect())
    }
}

fn pseudo_vector(seed: &[u8]) -> Vec<f32> {
    let mut state = seed
        .iter()
        .fold(0x9e37_79b9_7f4a_7c15u64, |acc, &b| {
            (acc ^ b as u64).wrapping_mul(0x0100_0000_01b3)
        });
    (0..DIM)
        .map(|_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            ((state >> 40) as f32 / (1u64 << 24) as f32) - 0.5
        })
        .collect()
}

fn benchmark_store_build(c: &mut Criterion) {
    let taxonomy = Taxonomy::art();

    c.bench_function("store_build_art_taxonomy", |b| {
        b.iter(|| TaxonomyStore::build(black_box(&taxonomy), &HashingEncoder))
    });
}

fn benchmark_score(c: &mut Criterion) {
    let store = TaxonomyStore::build(&Taxonomy::art(), &HashingEncoder);
    let scorer = SimilarityScorer::new(store);
    let image = pseudo_vector(b"a painting");

    c.bench_function("score_art_taxonomy_512d", |b| {
        b.iter(|| scorer.score(black_box(&image)))
    });
}

criterion_group!(benches, benchmark_store_build, benchmark_score);
criterion_main!(benches);
