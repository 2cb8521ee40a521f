//! Benchmarks for swing detection over a sliding window

use chrono::{DateTime, Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use swing_bot::feed::PriceObservation;
use swing_bot::signal::{DetectorConfig, PriceWindow, SignalDetector};

/// One observation every 250ms, oscillating within a few dollars
fn observations(count: i64) -> Vec<PriceObservation> {
    let base: DateTime<Utc> = "2025-10-18T14:00:00Z".parse().unwrap();
    (0..count)
        .map(|i| {
            let price = dec!(104000) + Decimal::from(i % 7) - dec!(3);
            PriceObservation::new(price, base + Duration::milliseconds(i * 250))
        })
        .collect()
}

fn benchmark_window_add(c: &mut Criterion) {
    let ticks = observations(1_000);

    c.bench_function("price_window_add", |b| {
        b.iter(|| {
            let mut window = PriceWindow::with_seconds(15);
            for tick in &ticks {
                window.add(black_box(*tick));
            }
            window.len()
        })
    });
}

fn benchmark_detect_quiet(c: &mut Criterion) {
    let ticks = observations(1_000);
    let config = DetectorConfig {
        threshold_percent: dec!(0.10),
        window_seconds: 15,
    };

    c.bench_function("detector_add_detect_quiet", |b| {
        b.iter(|| {
            let mut detector = SignalDetector::new(config.clone());
            let mut signals = 0;
            for tick in &ticks {
                detector.add(black_box(*tick));
                if detector.detect().is_some() {
                    signals += 1;
                }
            }
            signals
        })
    });
}

criterion_group!(benches, benchmark_window_add, benchmark_detect_quiet);
criterion_main!(benches);
