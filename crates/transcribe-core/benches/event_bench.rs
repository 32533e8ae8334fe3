//! Criterion benchmarks for outbound event encoding.
//!
//! PDF submissions dominate the send path: every byte of the file is hex
//! encoded and then embedded in a JSON string.  These benchmarks track that
//! cost for typical scan sizes alongside the small transport events.
//!
//! Run with:
//! ```bash
//! cargo bench --package transcribe-core --bench event_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use transcribe_core::protocol::event::names;
use transcribe_core::{decode_inbound, Event, TransportState};

fn bench_transport_event(c: &mut Criterion) {
    let state = TransportState::default();
    c.bench_function("encode_play_pause", |b| {
        b.iter(|| {
            let event = Event::transport(names::PLAY_PAUSE, black_box(&state)).unwrap();
            black_box(event.to_json().unwrap())
        })
    });
}

fn bench_submit_pdf(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_submit_pdf");
    for size in [16 * 1024, 256 * 1024, 2 * 1024 * 1024] {
        let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| {
                let event = Event::submit_pdf("scan.pdf", black_box(data));
                black_box(event.to_json().unwrap())
            })
        });
    }
    group.finish();
}

fn bench_decode_inbound(c: &mut Criterion) {
    let text = format!(
        r#"{{"type":"frontend_response","command":"get_transcription","transcription":"{}"}}"#,
        "lorem ipsum ".repeat(200)
    );
    c.bench_function("decode_transcription_reply", |b| {
        b.iter(|| black_box(decode_inbound(black_box(&text)).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_transport_event,
    bench_submit_pdf,
    bench_decode_inbound
);
criterion_main!(benches);
