// SPDX-License-Identifier: Apache-2.0

use std::io::{Cursor, Read, Seek, SeekFrom};
use pretty_assertions::assert_eq;
use tempfile::tempfile;
use chainbuf::{Buffer, BufferErrorKind, ReaderSource, Result, WriterSink};
use chainbuf::streams::{Sink, Source, Stream};

mod common;

#[test]
fn reader_source() -> Result {
	let data = common::pattern(40000);
	let mut source = ReaderSource::from(Cursor::new(data.clone()));
	let mut buffer = Buffer::with_pool(common::small_pool(4096));
	assert_eq!(source.fill_all(&mut buffer)?, data.len());
	assert!(source.is_eos());
	assert_eq!(source.fill(&mut buffer, 10)?, None);
	assert!(buffer == data);
	Ok(())
}

#[test]
fn reader_source_partial_fill() -> Result {
	let mut source = ReaderSource::from(&b"abcdef"[..]);
	let mut buffer = Buffer::with_pool(common::small_pool(16));
	assert_eq!(source.fill(&mut buffer, 4)?, Some(4));
	assert_eq!(source.fill(&mut buffer, 0)?, Some(0));
	assert_eq!(buffer, *b"abcd");
	Ok(())
}

#[test]
fn writer_sink() -> Result {
	let data = common::pattern(10000);
	let mut buffer = Buffer::with_pool(common::small_pool(1024));
	buffer.write_from_slice(&data)?;
	let mut sink = WriterSink::from(Vec::new());
	sink.drain(&mut buffer, 6000)?;
	assert_eq!(buffer.count(), 4000);
	assert_eq!(sink.drain_all(&mut buffer)?, 4000);
	assert!(sink.into_inner() == Some(data));
	Ok(())
}

#[test]
fn writer_sink_insufficient() -> Result {
	let mut buffer = Buffer::with_pool(common::small_pool(16));
	buffer.write_from_slice(b"abc")?;
	let mut sink = WriterSink::from(Vec::new());
	let error = sink.drain(&mut buffer, 4).unwrap_err();
	assert_eq!(error.kind(), BufferErrorKind::InsufficientData);
	assert_eq!(buffer.count(), 3);
	Ok(())
}

#[test]
fn closed_streams() -> Result {
	let mut buffer = Buffer::with_pool(common::small_pool(16));
	let mut source = ReaderSource::from(&b"abc"[..]);
	source.close()?;
	assert!(source.is_closed());
	assert_eq!(source.fill(&mut buffer, 3).unwrap_err().kind(), BufferErrorKind::Closed);

	let mut sink = WriterSink::from(Vec::new());
	sink.close()?;
	sink.close()?;
	buffer.write_from_slice(b"abc")?;
	assert_eq!(sink.drain(&mut buffer, 3).unwrap_err().kind(), BufferErrorKind::Closed);
	Ok(())
}

#[test]
fn buffer_streams() -> Result {
	let pool = common::small_pool(16);
	let mut a = Buffer::with_pool(pool.clone());
	let mut b = Buffer::with_pool(pool.clone());
	a.write_from_slice(&common::pattern(50))?;
	assert_eq!(Source::fill(&mut a, &mut b, 20)?, Some(20));
	Sink::drain(&mut b, &mut a, 10)?;
	assert_eq!(a.count(), 20);
	assert_eq!(b.count(), 30);
	Ok(())
}

#[test]
fn file_round_trip() -> Result {
	let data = common::pattern(50000);
	let mut buffer = Buffer::with_pool(common::small_pool(4096));
	buffer.write_from_slice(&data)?;

	let mut sink = WriterSink::from(tempfile()?);
	assert_eq!(buffer.transfer_to(&mut sink)?, data.len());
	sink.flush()?;
	let mut file = sink.into_inner().unwrap();
	file.seek(SeekFrom::Start(0))?;

	let mut source = ReaderSource::from(file);
	assert_eq!(buffer.transfer_from(&mut source)?, data.len());
	assert!(buffer == data);

	let mut file = source.into_inner().unwrap();
	let mut rest = Vec::new();
	assert_eq!(file.read_to_end(&mut rest)?, 0);
	Ok(())
}
