use criterion::{criterion_group, criterion_main};


criterion_group!(
    benches,
    sentence::bench_assemble_noisy_stream,
    sentence::bench_checksum,
    sentence::bench_encode,
    dweet::bench_process_item,
    dweet::bench_region_checksum
);
criterion_main!(benches);
