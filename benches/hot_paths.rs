//! Criterion benchmarks for the per-frame and per-view hot paths.
//!
//! Run with: cargo bench --bench hot_paths

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gas_map::animation::Animation;
use gas_map::data::{year_slice, Cell, CumulativeTable, LongTable, Selector, WideTable};
use gas_map::map::{rasterize, Country, MapRenderer, Viewport};

/// A grid of square "countries" covering most of the map
fn synthetic_countries() -> Vec<Country> {
    let mut countries = Vec::new();
    for row in 0..12 {
        for col in 0..24 {
            let lon = -180.0 + col as f64 * 15.0;
            let lat = -60.0 + row as f64 * 11.0;
            countries.push(Country::square(&format!("C{row}-{col}"), lon, lat, 12.0));
        }
    }
    countries
}

/// 123 years of figures for every synthetic country
fn synthetic_table(countries: &[Country]) -> LongTable {
    let names: Vec<String> = countries.iter().map(|c| c.sovereign.clone()).collect();
    let years: Vec<u16> = (1900..=2022).collect();
    let cells = years
        .iter()
        .map(|y| {
            (0..names.len())
                .map(|i| Cell::Number(((*y as usize - 1899) * (i % 17 + 1)) as f64 * 0.001))
                .collect()
        })
        .collect();
    let wide = WideTable {
        countries: names.clone(),
        years,
        cells,
    };
    let cumulative = CumulativeTable {
        rows: names.into_iter().map(|n| (n, Some(10.0))).collect(),
    };
    LongTable::build(&wide, &cumulative).expect("synthetic table")
}

// ---------------------------------------------------------------------------
// Benchmark: rasterisation and full map layers
// ---------------------------------------------------------------------------

fn bench_rasterize(c: &mut Criterion) {
    let mut group = c.benchmark_group("rasterize");
    let countries = synthetic_countries();

    // 200x60 terminal cells at braille resolution
    let viewport = Viewport::world(400, 240);
    group.bench_function("world_400x240", |b| {
        b.iter(|| black_box(rasterize(black_box(&countries), &viewport)));
    });

    let mut zoomed = viewport.clone();
    zoomed.zoom_in();
    zoomed.zoom_in();
    group.bench_function("zoomed_400x240", |b| {
        b.iter(|| black_box(rasterize(black_box(&countries), &zoomed)));
    });

    let renderer = MapRenderer::new(countries.clone());
    group.bench_function("layers_200x60", |b| {
        b.iter(|| black_box(renderer.render(200, 60, &viewport)));
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: slicing the long table
// ---------------------------------------------------------------------------

fn bench_slicing(c: &mut Criterion) {
    let mut group = c.benchmark_group("year_slice");
    let countries = synthetic_countries();
    let table = synthetic_table(&countries);

    group.bench_function("annual_1990", |b| {
        b.iter(|| black_box(year_slice(&table, black_box(Selector::Year(1990)))));
    });

    group.bench_function("cumulative", |b| {
        b.iter(|| black_box(year_slice(&table, black_box(Selector::Cumulative))));
    });

    group.bench_function("animation_build", |b| {
        b.iter(|| black_box(Animation::build(&table, &countries)));
    });

    group.finish();
}

criterion_group!(benches, bench_rasterize, bench_slicing);
criterion_main!(benches);
