use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ductus_hmm::{
    FeatureKind, FeatureValue, HmmModel, Observation, Schema, TrainingSequence, ValueIndex,
};

fn lcg(state: &mut u64) -> f64 {
    *state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
    (*state >> 11) as f64 / (1u64 << 53) as f64
}

fn schema() -> Schema {
    Schema::new(
        vec!["text".into(), "drawing".into()],
        vec![
            ("length".into(), FeatureKind::Discrete(4)),
            ("speed".into(), FeatureKind::Continuous),
        ],
    )
    .unwrap()
}

fn observation(state: usize, rng: &mut u64) -> Observation {
    // Class-dependent distributions so the fitted model is non-degenerate.
    let bucket = if lcg(rng) < 0.7 { state * 2 } else { state * 2 + 1 };
    let speed = state as f64 * 3.0 + lcg(rng);
    Observation::new()
        .with("length", FeatureValue::Discrete(bucket))
        .with("speed", FeatureValue::Continuous(speed))
}

fn training_data(n_seqs: usize, seq_len: usize, seed: u64) -> Vec<TrainingSequence> {
    let states = ["text", "drawing"];
    let mut rng = seed;
    (0..n_seqs)
        .map(|_| {
            let mut observations = Vec::with_capacity(seq_len);
            let mut labels = Vec::with_capacity(seq_len);
            let mut state = (lcg(&mut rng) < 0.5) as usize;
            for _ in 0..seq_len {
                if lcg(&mut rng) < 0.2 {
                    state = 1 - state;
                }
                observations.push(observation(state, &mut rng));
                labels.push(states[state].to_string());
            }
            TrainingSequence::new(observations, labels).unwrap()
        })
        .collect()
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("hmm_fit");
    let data = training_data(100, 50, 42);
    let schema = schema();
    group.bench_function("100_seqs_of_50", |b| {
        b.iter(|| HmmModel::fit(schema.clone(), black_box(&data)).unwrap())
    });
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("hmm_decode");
    let schema = schema();
    let data = training_data(50, 50, 7);
    let (model, _) = HmmModel::fit(schema.clone(), &data).unwrap();
    let index = ValueIndex::identity(&schema);

    let mut rng = 99u64;
    let obs: Vec<Observation> = (0..1_000)
        .map(|_| observation((lcg(&mut rng) < 0.5) as usize, &mut rng))
        .collect();

    group.bench_function("1000_steps", |b| {
        b.iter(|| model.decode(&index, black_box(&obs)).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_fit, bench_decode);
criterion_main!(benches);
