//! Mock serial port implementation for testing
//!
//! This module provides an in-memory byte source that can stand in for the
//! meter's serial port, so the decoder and the session can be exercised
//! without hardware.

use crate::teleinfo::frame::encode_group;
use crate::teleinfo::parity::with_even_parity;
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};
use tokio::io::{AsyncRead, ReadBuf};

#[derive(Default)]
struct MockState {
    rx: VecDeque<u8>,
    next_error: Option<io::Error>,
    /// When false, an empty queue waits for data instead of reporting EOF.
    closed: bool,
    waker: Option<Waker>,
}

/// Mock serial port feeding queued bytes to a reader
#[derive(Clone)]
pub struct MockSerialPort {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockSerialPort {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSerialPort {
    /// A port that reports end of stream once its queue is drained.
    pub fn new() -> Self {
        let port = Self::open_ended();
        port.lock().closed = true;
        port
    }

    /// A port that waits for more data when its queue is empty, like a real line.
    pub fn open_ended() -> Self {
        MockSerialPort {
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue raw bytes to be read from the port
    pub fn queue_rx_data(&self, data: &[u8]) {
        let mut state = self.lock();
        state.rx.extend(data);
        if let Some(waker) = state.waker.take() {
            waker.wake();
        }
    }

    /// Queue a well-formed information group.
    pub fn queue_group(&self, label: &str, value: &str) {
        self.queue_rx_data(&encode_group(label, value));
    }

    /// Queue a group whose checksum character is wrong.
    pub fn queue_corrupted_group(&self, label: &str, value: &str) {
        let mut line = encode_group(label, value);
        let at = line.len() - 2;
        line[at] = with_even_parity((line[at] & 0x7F) ^ 0x01);
        self.queue_rx_data(&line);
    }

    /// Set an error to be returned on the next read
    pub fn set_next_error(&self, error: io::Error) {
        let mut state = self.lock();
        state.next_error = Some(error);
        if let Some(waker) = state.waker.take() {
            waker.wake();
        }
    }

    /// Marks the end of the stream; readers see EOF once the queue is drained.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        if let Some(waker) = state.waker.take() {
            waker.wake();
        }
    }

    pub fn pending_bytes(&self) -> usize {
        self.lock().rx.len()
    }
}

impl AsyncRead for MockSerialPort {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let mut state = self.lock();

        if let Some(error) = state.next_error.take() {
            return Poll::Ready(Err(error));
        }

        let available = state.rx.len().min(buf.remaining());
        if available > 0 {
            let data: Vec<u8> = state.rx.drain(..available).collect();
            buf.put_slice(&data);
            return Poll::Ready(Ok(()));
        }

        if state.closed {
            return Poll::Ready(Ok(()));
        }
        state.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}
