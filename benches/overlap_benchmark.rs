use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use greedy_olc::{
    create_overlap_graph, ExactPrefixScorer, OverlapScorer, ScorerKind, SubstitutionTolerantScorer,
};
use std::time::Duration;

/// Pairwise scoring and graph construction benchmarks.
/// End-to-end contraction lives in assembly_benchmark.rs

fn generate_synthetic_reads(
    n: usize,
    read_len: usize,
    overlap_len: usize,
    error_rate: f64,
) -> Vec<String> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(42);
    let bases = b"ACGT";
    let mut reads = Vec::with_capacity(n);

    let mut current: Vec<u8> = (0..read_len).map(|_| bases[rng.gen_range(0..4)]).collect();
    reads.push(String::from_utf8(current.clone()).unwrap());

    for _ in 1..n {
        let mut next = Vec::with_capacity(read_len);
        next.extend_from_slice(&current[read_len - overlap_len..]);
        for _ in overlap_len..read_len {
            next.push(bases[rng.gen_range(0..4)]);
        }
        current = next.clone();
        // Substitutions only touch the emitted copy, not the underlying genome.
        for base in next.iter_mut() {
            if rng.gen_bool(error_rate) {
                *base = bases[rng.gen_range(0..4)];
            }
        }
        reads.push(String::from_utf8(next).unwrap());
    }

    reads
}

fn bench_pairwise_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("pairwise_scoring");

    for read_len in [50, 150, 300].iter() {
        let reads = generate_synthetic_reads(2, *read_len, read_len / 3, 0.0);
        let (first, second) = (&reads[0], &reads[1]);

        group.bench_with_input(BenchmarkId::new("exact", read_len), read_len, |b, _| {
            b.iter(|| ExactPrefixScorer.score(black_box(first), black_box(second)));
        });
        group.bench_with_input(
            BenchmarkId::new("substitution", read_len),
            read_len,
            |b, _| {
                b.iter(|| SubstitutionTolerantScorer.score(black_box(first), black_box(second)));
            },
        );
    }

    group.finish();
}

fn bench_overlap_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlap_graph");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    for n in [50, 100, 200].iter() {
        let reads = generate_synthetic_reads(*n, 80, 30, 0.01);

        for scorer in [ScorerKind::Exact, ScorerKind::Substitution] {
            group.bench_with_input(BenchmarkId::new(scorer.as_str(), n), &reads, |b, reads| {
                b.iter(|| create_overlap_graph(black_box(reads), &scorer, 10).unwrap());
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_pairwise_scoring, bench_overlap_graph);

criterion_main!(benches);
