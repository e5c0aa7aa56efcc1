//! Latency benchmarks for the CPU-only stages of the pipeline
//!
//! Covers text normalization, classical preprocessing and the classical
//! estimator (TF-IDF + random forest) on a synthetic vocabulary.
//!
//! Run with: cargo bench -p truthlens-classifiers

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use truthlens_classifiers::{
    clean_text, ClassicalEstimator, ClassicalPreprocessor, LabelEncoder, ProbabilisticModel,
    ProbabilityEstimator, TfidfVectorizer,
};

const TEST_CASES: &[(&str, &str)] = &[
    ("headline", "BREAKING: Scientists find water on Mars! http://example.com #space @nasa"),
    (
        "paragraph",
        "<p>Officials confirmed on Tuesday that the &quot;miracle cure&quot; shared by \
         @healthnews was never tested. Read more at www.example.org/story #health</p> \
         Experts warned readers to verify claims before sharing them with friends and family.",
    ),
];

const WORDS: &[&str] = &[
    "water", "mar", "scientist", "find", "break", "offici", "confirm", "cure", "test", "expert",
    "warn", "reader", "verifi", "claim", "share", "friend", "famili", "hoax", "alien", "vaccin",
];

fn build_estimator() -> ClassicalEstimator {
    let vocabulary: Vec<String> = WORDS
        .iter()
        .enumerate()
        .map(|(i, w)| format!("\"{}\": {}", w, i))
        .collect();
    let idf: Vec<String> = (0..WORDS.len()).map(|i| format!("{}", 1.0 + i as f64 / 10.0)).collect();
    let vectorizer = TfidfVectorizer::from_json(&format!(
        r#"{{"vocabulary": {{{}}}, "idf": [{}]}}"#,
        vocabulary.join(", "),
        idf.join(", ")
    ))
    .expect("valid vectorizer");

    // Depth-2 trees, one per feature pair
    let trees: Vec<String> = (0..WORDS.len() / 2)
        .map(|i| {
            format!(
                r#"{{"children_left": [1, 3, -1, -1, -1], "children_right": [2, 4, -1, -1, -1],
                    "feature": [{}, {}, -2, -2, -2], "threshold": [0.1, 0.2, -2.0, -2.0, -2.0],
                    "value": [[5, 5], [4, 6], [1, 9], [7, 3], [2, 8]]}}"#,
                2 * i,
                2 * i + 1
            )
        })
        .collect();
    let model = ProbabilisticModel::from_json(&format!(
        r#"{{"kind": "random_forest", "n_features": {},
            "classes": {{"encoding": "encoded", "classes": [0, 1]}},
            "trees": [{}]}}"#,
        WORDS.len(),
        trees.join(", ")
    ))
    .expect("valid forest");

    let encoder = LabelEncoder::new(vec!["fake".into(), "real".into()]).expect("valid encoder");
    let labels = encoder.classes().clone();
    ClassicalEstimator::new(
        ClassicalPreprocessor::default(),
        vectorizer,
        model,
        &encoder,
        &labels,
    )
    .expect("valid estimator")
}

fn benchmark_normalizer(c: &mut Criterion) {
    let mut group = c.benchmark_group("Text_Normalizer");
    group.sample_size(100);

    for (name, text) in TEST_CASES {
        group.bench_with_input(BenchmarkId::new("clean_text", name), text, |b, text| {
            b.iter(|| clean_text(black_box(text)))
        });
    }

    group.finish();
}

fn benchmark_preprocessor(c: &mut Criterion) {
    let preprocessor = ClassicalPreprocessor::default();
    let mut group = c.benchmark_group("Classical_Preprocessor");
    group.sample_size(100);

    for (name, text) in TEST_CASES {
        group.bench_with_input(BenchmarkId::new("preprocess", name), text, |b, text| {
            b.iter(|| preprocessor.preprocess(black_box(text)))
        });
    }

    group.finish();
}

fn benchmark_classical_estimator(c: &mut Criterion) {
    let estimator = build_estimator();
    let mut group = c.benchmark_group("Classical_Estimator");
    group.sample_size(100);

    for (name, text) in TEST_CASES {
        let batch = vec![clean_text(text)];
        group.bench_with_input(BenchmarkId::new("predict_proba", name), &batch, |b, batch| {
            b.iter(|| estimator.predict_proba(black_box(batch)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_normalizer,
    benchmark_preprocessor,
    benchmark_classical_estimator
);
criterion_main!(benches);
