//! Attribute interning and serialization benchmarks.
//!
//! Run with: cargo bench --package vtattr-core --bench intern

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vtattr_core::{rgb, AttrStorage, Attributes, Cell, ColorMode, Serializer};

fn bench_ref_inline(c: &mut Criterion) {
    let mut group = c.benchmark_group("ref_inline");
    group.throughput(Throughput::Elements(1));

    group.bench_function("flags_only", |b| {
        let mut storage = AttrStorage::default();
        let mut a = Attributes::new();
        a.set_bold(true);
        a.set_fg_mode(ColorMode::Palette256);
        a.set_fg(196);
        b.iter(|| {
            let id = storage.ref_attr(black_box(&mut a)).unwrap();
            storage.unref(id);
            id
        });
    });

    group.finish();
}

fn bench_ref_rgb(c: &mut Criterion) {
    let mut group = c.benchmark_group("ref_rgb");
    group.throughput(Throughput::Elements(1));

    // Memoized fast path: the same value over and over.
    group.bench_function("memo_hit", |b| {
        let mut storage = AttrStorage::default();
        let mut a = Attributes::new();
        a.set_fg_mode(ColorMode::Rgb);
        a.set_fg(rgb(0x12, 0x34, 0x56));
        // Keep one reference alive so the node never drops out.
        let _anchor = storage.ref_attr(&mut a).unwrap();
        b.iter(|| {
            let id = storage.ref_attr(black_box(&mut a)).unwrap();
            storage.unref(id);
            id
        });
    });

    // Tree descent with a populated pool.
    for pool_size in [16u32, 256, 4096] {
        group.bench_with_input(
            BenchmarkId::new("tree_find", pool_size),
            &pool_size,
            |b, &pool_size| {
                let mut storage = AttrStorage::default();
                let mut anchors = Vec::new();
                for i in 0..pool_size {
                    let mut a = Attributes::new();
                    a.set_fg_mode(ColorMode::Rgb);
                    a.set_fg(i * 7919);
                    anchors.push(storage.ref_attr(&mut a).unwrap());
                }
                b.iter(|| {
                    // A fresh value each round defeats the memo.
                    let mut a = Attributes::new();
                    a.set_fg_mode(ColorMode::Rgb);
                    a.set_fg((pool_size / 2) * 7919);
                    let id = storage.ref_attr(&mut a).unwrap();
                    storage.unref(id);
                    id
                });
            },
        );
    }

    group.finish();
}

fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");

    for (rows, cols) in [(24usize, 80usize), (100, 200)] {
        let name = format!("{rows}x{cols}");
        group.throughput(Throughput::Elements((rows * cols) as u64));

        group.bench_with_input(BenchmarkId::new("screen", &name), &(rows, cols), |b, &(rows, cols)| {
            let mut storage = AttrStorage::default();
            let mut lines = Vec::with_capacity(rows);
            for row in 0..rows {
                let mut cells = Vec::with_capacity(cols);
                for col in 0..cols {
                    let mut a = Attributes::new();
                    // A handful of style runs per row, like real output.
                    if col / 10 % 2 == 0 {
                        a.set_bold(true);
                        a.set_fg_mode(ColorMode::Rgb);
                        a.set_fg(rgb((row % 256) as u8, (col % 256) as u8, 0x80));
                    }
                    let id = storage.ref_attr(&mut a).unwrap();
                    cells.push(Cell::new("x", id));
                }
                lines.push(cells);
            }
            b.iter(|| {
                let mut ser = Serializer::new(&storage);
                for line in &lines {
                    ser.push_line(line);
                }
                ser.finish().len()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_ref_inline, bench_ref_rgb, bench_serialize);
criterion_main!(benches);
