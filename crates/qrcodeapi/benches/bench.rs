use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use qrcodeapi::{GenerationRequest, Limits, OutputFormat, encode, generate, render_as};

const URL: &str = "https://example.com/some/reasonably/long/path?with=query&and=more";

/// Encoding alone across the three modes and a near-capacity payload.
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    let inputs = [
        ("numeric", "3141592653589793238462643383279".to_owned()),
        ("alphanumeric", "HTTPS://EXAMPLE.COM/QR".to_owned()),
        ("byte", URL.to_owned()),
        ("byte/2900", "q".repeat(2900)),
    ];
    for (name, content) in &inputs {
        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_function(*name, |b| b.iter(|| encode(black_box(content))));
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let Ok(matrix) = encode(URL) else {
        return;
    };
    for format in OutputFormat::ALL {
        group.bench_function(format.mime(), |b| {
            b.iter(|| render_as(black_box(&matrix), 512, 512, format));
        });
    }
    group.finish();
}

fn bench_generate(c: &mut Criterion) {
    let limits = Limits::default();
    let req = GenerationRequest {
        url: URL.into(),
        width: 200,
        height: 200,
        accept: "image/png".into(),
        ..Default::default()
    };
    c.bench_function("generate/png/200", |b| {
        b.iter(|| generate(black_box(&req), &limits));
    });
}

criterion_group!(benches, bench_encode, bench_render, bench_generate);
criterion_main!(benches);
