// SPDX-License-Identifier: Apache-2.0

use criterion::{BatchSize, Bencher, black_box, Criterion, criterion_group, criterion_main};
use chainbuf::{Buffer, DEFAULT_SEGMENT_SIZE};

fn data() -> Vec<u8> {
	(0..4 * DEFAULT_SEGMENT_SIZE + 1000).map(|i| (i * 31 % 251) as u8).collect()
}

fn filled(data: &[u8]) -> Buffer {
	let mut buf: Buffer = Buffer::default();
	let _ = buf.write_from_slice(data);
	buf
}

fn write_slice(c: &mut Criterion) {
	let data = data();
	c.bench_function("write_slice", |b| b.iter(|| filled(&data)));
}

#[inline(always)]
fn read_loop<R>(b: &mut Bencher, data: &[u8], read: impl FnMut(&mut Buffer) -> R) {
	b.iter_batched_ref(|| filled(data), read, BatchSize::SmallInput)
}

fn read_slice(c: &mut Criterion) {
	let data = data();
	let mut target = vec![0; data.len()];
	c.bench_function("read_slice", |b|
		read_loop(b, &data, |buf| buf.read_exact_into(&mut target))
	);
}

fn splice(c: &mut Criterion) {
	let data = data();
	let mut group = c.benchmark_group("splice");

	for (name, count) in [
		("whole segments", 2 * DEFAULT_SEGMENT_SIZE),
		("shared prefix", DEFAULT_SEGMENT_SIZE + 4000),
		("copied prefix", DEFAULT_SEGMENT_SIZE + 100),
	] {
		group.bench_function(name, |b| read_loop(b, &data, |buf| {
			let mut sink: Buffer = Buffer::default();
			let _ = sink.write_from(buf, count);
			sink
		}));
	}
	group.finish();
}

fn copy(c: &mut Criterion) {
	let buf = filled(&data());
	c.bench_function("copy_all", |b| b.iter(|| {
		let mut sink: Buffer = Buffer::default();
		let _ = buf.copy_all_to(&mut sink);
		black_box(sink)
	}));
}

criterion_group!(benches, write_slice, read_slice, splice, copy);
criterion_main!(benches);
