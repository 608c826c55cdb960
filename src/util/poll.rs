use std::{
    future::Future,
    pin::pin,
    task::{Context, Poll},
    thread,
    time::Duration,
};

use futures::task::noop_waker_ref;

/// Back-off between polls of a pending SDK call.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Blocks the calling thread on `future`, re-polling with a no-op waker.
///
/// The SDK's I/O is still serviced by the tokio runtime the binary starts, so
/// this only works from inside that runtime's context.
pub fn poll_until_ready<F: Future>(future: F) -> F::Output {
    let mut future = pin!(future);
    let mut cx = Context::from_waker(noop_waker_ref());

    loop {
        if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
            break output;
        }
        thread::sleep(POLL_INTERVAL);
    }
}
