// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{io, sync::Arc};

use parking_lot::Mutex;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt::MakeWriter};

/// Install a fmt subscriber honoring `RUST_LOG`, once per process.
///
/// Later calls, including from other tests in the same binary, are no-ops.
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
		.with_test_writer()
		.try_init();
}

/// Run `f` with a subscriber scoped to the current thread and return the
/// `error!` lines it emitted.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
	let buffer = Buffer::default();
	let subscriber =
		tracing_subscriber::fmt().with_writer(buffer.clone()).with_max_level(Level::ERROR).with_ansi(false).finish();

	let result = tracing::subscriber::with_default(subscriber, f);
	let logs = String::from_utf8_lossy(&buffer.0.lock()).into_owned();
	(result, logs)
}

#[derive(Clone, Default)]
struct Buffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for Buffer {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.lock().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

impl<'a> MakeWriter<'a> for Buffer {
	type Writer = Buffer;

	fn make_writer(&'a self) -> Self::Writer {
		self.clone()
	}
}
