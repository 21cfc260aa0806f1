use criterion::{criterion_group, criterion_main, Criterion};
use rand::Rng;
use shavs::monte::MonteCarloState;
use shavs::provider::{Sha256Provider, DIGEST_SIZE};

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut rnd = rand::thread_rng();
    let mut seed = [0; DIGEST_SIZE];
    for i in seed.iter_mut() {
        *i = rnd.gen();
    }
    let provider = Sha256Provider::sha256();

    c.bench_function("monte carlo checkpoint", |b| {
        let mut state = MonteCarloState::new(seed);
        b.iter(|| state.checkpoint(&provider).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
