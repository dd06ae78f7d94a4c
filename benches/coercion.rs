use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use fleet_intake::coerce::{Cell, coerce_date, coerce_integer};
use fleet_intake::import::ledger_from_sheet;
use fleet_intake::ledger::RecordFilter;
use fleet_intake::sheet::Sheet;

fn generate_sheet(rows: usize) -> Sheet {
    let headers = ["Sıra No", "Araç Plaka", "Bölge", "Bakım Tarihi", "Bakım KM", "Sonraki KM"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let body = (0..rows)
        .map(|i| {
            let day = (i % 28) + 1;
            let month = (i % 12) + 1;
            let date = match i % 3 {
                0 => format!("{day:02}.{month:02}.2024"),
                1 => format!("2024{month:02}{day:02}"),
                _ => format!("{day}/{month}/2024"),
            };
            let km = 10_000 + i * 7;
            vec![
                Cell::Integer(i as i64 + 1),
                Cell::from_text(&format!("34 ABC {}", i % 500)),
                Cell::from_text(if i % 2 == 0 { "Ankara" } else { "İzmir" }),
                Cell::from_text(&date),
                Cell::from_text(&format!("{}.{:03}", km / 1000, km % 1000)),
                Cell::Float((km + 10_000) as f64),
            ]
        })
        .collect();
    Sheet::new(headers, body)
}

fn bench_coercers(c: &mut Criterion) {
    let mut group = c.benchmark_group("coerce_cell");
    let dotted = Cell::from_text("07.10.2025");
    let compact = Cell::from_text("20251007");
    let slashed = Cell::from_text("7/10/2025");
    let grouped = Cell::from_text("1.250.000");

    group.bench_function("date_dotted", |b| b.iter(|| coerce_date(black_box(&dotted))));
    group.bench_function("date_compact", |b| b.iter(|| coerce_date(black_box(&compact))));
    group.bench_function("date_fallback", |b| b.iter(|| coerce_date(black_box(&slashed))));
    group.bench_function("integer_grouped", |b| {
        b.iter(|| coerce_integer(black_box(&grouped)))
    });
    group.finish();
}

fn bench_ledger(c: &mut Criterion) {
    let sheet = generate_sheet(20_000);
    let filter = RecordFilter::default();
    c.bench_function("ledger_from_sheet_20k", |b| {
        b.iter_batched(
            || (),
            |_| ledger_from_sheet(&sheet, &filter).expect("build ledger"),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_coercers, bench_ledger);
criterion_main!(benches);
