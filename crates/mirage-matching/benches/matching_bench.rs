use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mirage_matching::{
    strongest_match, FieldMatchers, RequestDetails, RequestMatcher, RequestResponsePair,
    ResponseDetails, Simulation,
};
use std::collections::HashMap;

fn simulation_of(count: usize) -> Simulation {
    let mut simulation = Simulation::new();
    for i in 0..count {
        simulation.add_pair(RequestResponsePair::new(
            RequestMatcher {
                method: Some(FieldMatchers::exact("GET")),
                path: Some(FieldMatchers::exact(format!("/api/v1/endpoint{i}"))),
                body: Some(FieldMatchers::regex(".*")),
                ..Default::default()
            },
            ResponseDetails {
                status: 200,
                body: format!("response {i}"),
                ..Default::default()
            },
        ));
    }
    simulation
}

fn bench_strongest_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("strongest_match");
    let state = HashMap::new();

    for size in [10, 100, 1000] {
        let simulation = simulation_of(size);
        group.throughput(Throughput::Elements(size as u64));

        let hit = RequestDetails {
            method: "GET".to_string(),
            path: format!("/api/v1/endpoint{}", size - 1),
            body: "payload".to_string(),
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::new("hit", size), &simulation, |b, simulation| {
            b.iter(|| strongest_match(black_box(&hit), false, simulation, &state));
        });

        let miss = RequestDetails {
            method: "DELETE".to_string(),
            path: "/api/v1/unknown".to_string(),
            body: "payload".to_string(),
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::new("miss", size), &simulation, |b, simulation| {
            b.iter(|| strongest_match(black_box(&miss), false, simulation, &state));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_strongest_match);
criterion_main!(benches);
