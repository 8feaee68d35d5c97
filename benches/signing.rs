//! Signing and integrity digest benchmarks.

use aliyun_mns::codec::{content_md5, message_body_md5};
use aliyun_mns::signing::{build_string_to_sign, sign};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use http::{HeaderMap, HeaderValue, Method};

fn request_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("date", HeaderValue::from_static("Tue, 01 May 2018 15:04:05 GMT"));
    headers.insert("content-type", HeaderValue::from_static("text/xml;charset=utf-8"));
    headers.insert("content-md5", HeaderValue::from_static("6Afx/PgtEy+bsBjKZzihnw=="));
    headers.insert("x-mns-version", HeaderValue::from_static("2015-06-06"));
    headers.insert("x-mns-user-request-id", HeaderValue::from_static("bench"));
    headers.insert("user-agent", HeaderValue::from_static("bench-agent"));
    headers
}

fn bench_sign(c: &mut Criterion) {
    let headers = request_headers();

    c.bench_function("string_to_sign", |b| {
        b.iter(|| {
            build_string_to_sign(
                black_box(&Method::POST),
                black_box(&headers),
                black_box("/queues/jobs/messages?waitseconds=10"),
            )
        })
    });

    c.bench_function("sign", |b| {
        b.iter(|| {
            sign(
                black_box(&Method::POST),
                black_box(&headers),
                black_box("/queues/jobs/messages?waitseconds=10"),
                black_box("bench-secret"),
            )
        })
    });
}

fn bench_digests(c: &mut Criterion) {
    let mut group = c.benchmark_group("digest");

    for size in [64usize, 4 << 10, 64 << 10] {
        let body = vec![b'm'; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("message_body_md5", size), &body, |b, body| {
            b.iter(|| message_body_md5(black_box(body)))
        });
        group.bench_with_input(BenchmarkId::new("content_md5", size), &body, |b, body| {
            b.iter(|| content_md5(black_box(body)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sign, bench_digests);
criterion_main!(benches);
