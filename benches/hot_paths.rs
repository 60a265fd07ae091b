use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use visitmap::{
    build_routes, cluster_visits, CoordinateResolver, CountryVisitRecord, MapConfig, MapData,
    MapScene, Traveler, ViewportFitter,
};

const CODES: [&str; 24] = [
    "KR", "JP", "CN", "TW", "VN", "TH", "PH", "ID", "MY", "SG", "IN", "NP", "FR", "DE", "IT",
    "ES", "GB", "PT", "US", "CA", "MX", "BR", "AU", "NZ",
];

/// `n` records cycling through the code table, each visited by a rotating
/// subset of `travelers` travelers
fn dataset(n: usize, travelers: i64) -> MapData {
    let countries = (0..n)
        .map(|i| {
            let code = CODES[i % CODES.len()];
            let visitors = (0..3)
                .map(|k| {
                    let id = (i as i64 + k * 7) % travelers;
                    Traveler::new(id, format!("traveler-{}", id))
                })
                .collect();
            CountryVisitRecord::new(code, code, (i % 30) as u64).with_travelers(visitors)
        })
        .collect();
    MapData::new(countries)
}

fn bench_stages(c: &mut Criterion) {
    let config = MapConfig::default();
    let resolver = CoordinateResolver::new(config.fallback);
    let mut group = c.benchmark_group("stages");

    for &n in &[24usize, 240, 2_400] {
        let data = dataset(n, 50);

        group.bench_function(format!("cluster_visits(n={n})"), |b| {
            b.iter(|| black_box(cluster_visits(&data.countries, &resolver, config.grid_degrees)))
        });

        group.bench_function(format!("build_routes(n={n})"), |b| {
            b.iter(|| black_box(build_routes(&data.countries, &resolver)))
        });

        group.bench_function(format!("scene_build(n={n})"), |b| {
            b.iter_batched(
                || ViewportFitter::new(config.clone()),
                |mut fitter| black_box(MapScene::build(&data, &resolver, &config, &mut fitter)),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_stages);
criterion_main!(benches);
