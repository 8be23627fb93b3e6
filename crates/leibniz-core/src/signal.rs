//! Signal/slot system.
//!
//! Signals are emitted when something happens; connected slots (closures) run
//! in response. This is the only channel through which a background worker
//! talks to the UI thread in this workspace: the worker emits, and a queued
//! connection carries the call into the UI thread's [`EventLoop`](crate::EventLoop).
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The signal type
//! - [`ConnectionId`] - Identifies a connection for [`Signal::disconnect`]
//! - [`ConnectionType`] - How a slot is invoked (Direct, Queued, ...)
//! - [`ConnectionGuard`] - Disconnects when dropped
//!
//! # Connection Types
//!
//! - **Direct**: Slot is called immediately in the emitting thread
//! - **Queued**: Slot execution is posted to the receiver's event loop
//! - **Auto**: Direct if emitted on the receiver's thread, Queued otherwise (default)
//! - **BlockingQueued**: Like Queued, but the emitter waits until the slot ran
//!
//! # Receivers
//!
//! A connection's receiver is the event loop that was current on the
//! connecting thread (see [`LoopProxy::current`]), or an explicit loop given
//! to [`Signal::connect_to`]. Queued calls for a connection without a live
//! receiver loop run immediately on the emitting thread, with a warning.
//!
//! # Ordering
//!
//! Queued calls emitted from one thread reach the receiver in emission order,
//! and none are dropped while the receiver loop exists.
//!
//! # Example
//!
//! ```
//! use leibniz_core::Signal;
//!
//! let text_changed = Signal::<String>::new();
//!
//! let conn_id = text_changed.connect(|text| {
//!     println!("Text changed to: {}", text);
//! });
//!
//! text_changed.emit("Hello, World!".to_string());
//! text_changed.disconnect(conn_id);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::ThreadId;

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::error::SignalError;
use crate::event_loop::LoopProxy;
use crate::invocation::{CompletionWaiter, QueuedInvocation, completion_pair};
use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// The ID remains valid until the connection is disconnected or the
    /// signal is dropped.
    pub struct ConnectionId;
}

/// Specifies how a connected slot should be invoked when the signal is emitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionType {
    /// Invoke the slot immediately in the emitting thread.
    Direct,

    /// Post the slot invocation to the receiver's event loop.
    ///
    /// The slot runs when that loop next processes events, even if the
    /// emitting thread is the receiver thread.
    Queued,

    /// Direct when emitted on the receiver thread, Queued otherwise.
    #[default]
    Auto,

    /// Like Queued, but block the emitting thread until the slot completes.
    ///
    /// When emitted on the receiver thread itself this degrades to a direct
    /// call, since waiting there could never finish.
    BlockingQueued,
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// Internal storage for a single connection.
struct Connection<Args> {
    slot: Slot<Args>,
    connection_type: ConnectionType,
    /// The loop that receives queued calls, if one existed at connect time.
    receiver: Option<LoopProxy>,
    /// The thread the slot belongs to.
    receiver_thread: ThreadId,
}

impl<Args> Clone for Connection<Args> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
            connection_type: self.connection_type,
            receiver: self.receiver.clone(),
            receiver_thread: self.receiver_thread,
        }
    }
}

/// A type-safe signal that can have multiple connected slots.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for signals
///   with no arguments, or a tuple like `(f64, String)` for several.
///
/// # Thread Safety
///
/// `Signal<Args>` is `Send + Sync`. Slots are invoked with the connection
/// table unlocked, so a slot may emit, connect, or disconnect on the same
/// signal.
pub struct Signal<Args> {
    connections: Mutex<SlotMap<ConnectionId, Connection<Args>>>,
    blocked: AtomicBool,
}

impl<Args: Clone + Send + 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: Clone + Send + 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect a slot with [`ConnectionType::Auto`].
    ///
    /// The receiver is the calling thread (and its current loop, if any).
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connect_with_type(slot, ConnectionType::Auto)
    }

    /// Connect a slot with a specific connection type.
    ///
    /// # Example
    ///
    /// ```
    /// use leibniz_core::{ConnectionType, Signal};
    ///
    /// let signal = Signal::<i32>::new();
    /// signal.connect_with_type(|n| println!("{}", n), ConnectionType::Direct);
    /// signal.emit(42);
    /// ```
    pub fn connect_with_type<F>(&self, slot: F, connection_type: ConnectionType) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let connection = Connection {
            slot: Arc::new(slot),
            connection_type,
            receiver: LoopProxy::current(),
            receiver_thread: std::thread::current().id(),
        };
        self.connections.lock().insert(connection)
    }

    /// Connect a slot that belongs to the given loop's thread.
    ///
    /// Emissions from other threads are queued into `receiver`; emissions on
    /// the receiver thread call the slot directly.
    pub fn connect_to<F>(&self, receiver: &LoopProxy, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let connection = Connection {
            slot: Arc::new(slot),
            connection_type: ConnectionType::Auto,
            receiver: Some(receiver.clone()),
            receiver_thread: receiver.thread_id(),
        };
        self.connections.lock().insert(connection)
    }

    /// Disconnect a specific slot. Returns `true` if it was connected.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnect a specific slot, reporting unknown IDs as an error.
    pub fn try_disconnect(&self, id: ConnectionId) -> Result<(), SignalError> {
        if self.disconnect(id) {
            Ok(())
        } else {
            Err(SignalError::InvalidConnection)
        }
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Block or unblock emission. While blocked, `emit()` does nothing.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking all connected slots according to their
    /// connection type. `args` is cloned for each queued delivery.
    #[tracing::instrument(skip_all, target = "leibniz_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return;
        }

        let current_thread = std::thread::current().id();
        let connections = self.snapshot();
        tracing::trace!(target: targets::SIGNAL, connection_count = connections.len(), "emitting signal");

        let mut blocking_waiters = Vec::new();

        for conn in connections {
            let local = conn.receiver_thread == current_thread;
            match conn.connection_type {
                ConnectionType::Direct => (conn.slot)(&args),
                ConnectionType::Auto if local => (conn.slot)(&args),
                ConnectionType::Auto | ConnectionType::Queued => {
                    queue_invocation(conn.receiver.as_ref(), conn.slot, args.clone());
                }
                ConnectionType::BlockingQueued if local => {
                    tracing::trace!(target: targets::SIGNAL, "blocking connection on receiver thread, calling directly");
                    (conn.slot)(&args);
                }
                ConnectionType::BlockingQueued => {
                    if let Some(waiter) =
                        queue_invocation_blocking(conn.receiver.as_ref(), conn.slot, args.clone())
                    {
                        blocking_waiters.push(waiter);
                    }
                }
            }
        }

        for waiter in blocking_waiters {
            waiter.wait();
        }
    }

    /// Queue every slot through its receiver loop, regardless of type.
    ///
    /// Returns the number of slots queued, or 0 if the signal is blocked.
    pub fn emit_queued(&self, args: Args) -> usize {
        if self.is_blocked() {
            return 0;
        }

        let connections = self.snapshot();
        let count = connections.len();
        for conn in connections {
            queue_invocation(conn.receiver.as_ref(), conn.slot, args.clone());
        }
        count
    }

    /// Connect a slot that is disconnected when the returned guard is dropped.
    pub fn connect_scoped<F>(&self, slot: F) -> ConnectionGuard<'_, Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(slot);
        ConnectionGuard { signal: self, id }
    }

    fn snapshot(&self) -> Vec<Connection<Args>> {
        self.connections.lock().values().cloned().collect()
    }
}

/// Post one slot call to `receiver`, or run it here if there is no live loop.
fn queue_invocation<Args: Send + 'static>(receiver: Option<&LoopProxy>, slot: Slot<Args>, args: Args) {
    let invocation = QueuedInvocation::new(move || slot(&args));
    deliver(receiver, invocation);
}

fn queue_invocation_blocking<Args: Send + 'static>(
    receiver: Option<&LoopProxy>,
    slot: Slot<Args>,
    args: Args,
) -> Option<CompletionWaiter> {
    let (handle, waiter) = completion_pair();
    let invocation = QueuedInvocation::with_completion(move || slot(&args), handle);
    if deliver(receiver, invocation) {
        Some(waiter)
    } else {
        None
    }
}

/// Returns `true` if the invocation was posted, `false` if it ran inline.
fn deliver(receiver: Option<&LoopProxy>, invocation: QueuedInvocation) -> bool {
    let Some(receiver) = receiver else {
        tracing::warn!(
            target: targets::SIGNAL,
            "No event loop available for queued signal, executing immediately"
        );
        invocation.execute();
        return false;
    };

    match receiver.post_invocation(invocation) {
        Ok(()) => true,
        Err(invocation) => {
            tracing::warn!(
                target: targets::SIGNAL,
                receiver = %receiver.name(),
                "receiver loop has exited, executing queued signal immediately"
            );
            invocation.execute();
            false
        }
    }
}

static_assertions::assert_impl_all!(Signal<String>: Send, Sync);

/// A connection that is disconnected when dropped.
///
/// Created by [`Signal::connect_scoped`]; borrows the signal, so it cannot
/// outlive it.
///
/// # Example
///
/// ```
/// use leibniz_core::Signal;
/// use std::sync::atomic::{AtomicI32, Ordering};
/// use std::sync::Arc;
///
/// let signal = Signal::<i32>::new();
/// let counter = Arc::new(AtomicI32::new(0));
/// {
///     let counter_clone = counter.clone();
///     let _guard = signal.connect_scoped(move |&n| {
///         counter_clone.fetch_add(n, Ordering::SeqCst);
///     });
///     signal.emit(42);
/// }
/// signal.emit(43);
/// assert_eq!(counter.load(Ordering::SeqCst), 42);
/// ```
pub struct ConnectionGuard<'a, Args: Clone + Send + 'static> {
    signal: &'a Signal<Args>,
    id: ConnectionId,
}

impl<Args: Clone + Send + 'static> ConnectionGuard<'_, Args> {
    /// The guarded connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl<Args: Clone + Send + 'static> Drop for ConnectionGuard<'_, Args> {
    fn drop(&mut self) {
        self.signal.disconnect(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventLoop;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn test_signal_connect_emit() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        signal.connect(move |&value| {
            received_clone.lock().push(value);
        });

        signal.emit(42);
        signal.emit(100);

        assert_eq!(*received.lock(), vec![42, 100]);
    }

    #[test]
    fn test_signal_disconnect() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        let conn_id = signal.connect(move |&value| {
            received_clone.lock().push(value);
        });

        signal.emit(1);
        assert!(signal.disconnect(conn_id));
        signal.emit(2);

        assert_eq!(*received.lock(), vec![1]);
        assert_eq!(
            signal.try_disconnect(conn_id),
            Err(SignalError::InvalidConnection)
        );
    }

    #[test]
    fn test_signal_blocked() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        signal.connect(move |&value| {
            received_clone.lock().push(value);
        });

        signal.emit(1);
        signal.set_blocked(true);
        signal.emit(2);
        assert_eq!(signal.emit_queued(2), 0);
        signal.set_blocked(false);
        signal.emit(3);

        assert_eq!(*received.lock(), vec![1, 3]);
    }

    #[test]
    fn test_disconnect_all() {
        let signal = Signal::<()>::new();
        for _ in 0..5 {
            signal.connect(|_| {});
        }

        assert_eq!(signal.connection_count(), 5);
        signal.disconnect_all();
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn test_connection_guard() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        {
            let received_clone = received.clone();
            let _guard = signal.connect_scoped(move |&value| {
                received_clone.lock().push(value);
            });
            signal.emit(1);
        }

        signal.emit(2);
        assert_eq!(*received.lock(), vec![1]);
    }

    #[test]
    fn test_signal_with_tuple_args() {
        let signal = Signal::<(f64, String)>::new();
        let received = Arc::new(Mutex::new(None));

        let received_clone = received.clone();
        signal.connect(move |args| {
            *received_clone.lock() = Some(args.clone());
        });

        signal.emit((20.0, "i=1 pi=2.666".to_string()));
        assert_eq!(*received.lock(), Some((20.0, "i=1 pi=2.666".to_string())));
    }

    #[test]
    fn test_slot_may_emit_same_signal() {
        let signal = Arc::new(Signal::<u32>::new());
        let received = Arc::new(Mutex::new(Vec::new()));

        let weak = Arc::downgrade(&signal);
        let received_clone = received.clone();
        signal.connect(move |&n| {
            received_clone.lock().push(n);
            if n > 0 {
                if let Some(signal) = weak.upgrade() {
                    signal.emit(n - 1);
                }
            }
        });

        signal.emit(3);
        assert_eq!(*received.lock(), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_cross_thread_direct_emit() {
        let signal = Arc::new(Signal::<i32>::new());
        let slot_thread = Arc::new(Mutex::new(None));

        let slot_thread_clone = slot_thread.clone();
        signal.connect_with_type(
            move |_| {
                *slot_thread_clone.lock() = Some(std::thread::current().id());
            },
            ConnectionType::Direct,
        );

        let signal_clone = signal.clone();
        let emitter = std::thread::spawn(move || {
            signal_clone.emit(100);
            std::thread::current().id()
        })
        .join()
        .unwrap();

        assert_eq!(*slot_thread.lock(), Some(emitter));
    }

    #[test]
    fn test_queued_without_loop_runs_immediately() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        signal.connect_with_type(
            move |&value| received_clone.lock().push(value),
            ConnectionType::Queued,
        );

        signal.emit(42);
        assert_eq!(*received.lock(), vec![42]);
    }

    #[test]
    fn test_queued_waits_for_loop() {
        let event_loop = EventLoop::new();
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        signal.connect_with_type(
            move |&value| received_clone.lock().push(value),
            ConnectionType::Queued,
        );

        signal.emit(1);
        assert!(received.lock().is_empty());

        event_loop.process_pending();
        assert_eq!(*received.lock(), vec![1]);
    }

    #[test]
    fn test_auto_cross_thread_delivers_on_receiver_in_order() {
        let event_loop = EventLoop::new();
        let signal = Arc::new(Signal::<usize>::new());
        let received = Arc::new(Mutex::new(Vec::new()));
        let ui_thread = std::thread::current().id();

        let received_clone = received.clone();
        signal.connect(move |&value| {
            assert_eq!(std::thread::current().id(), ui_thread);
            received_clone.lock().push(value);
        });

        let signal_clone = signal.clone();
        std::thread::spawn(move || {
            for i in 0..100 {
                signal_clone.emit(i);
            }
        })
        .join()
        .unwrap();

        assert!(received.lock().is_empty());
        event_loop.process_pending();
        assert_eq!(*received.lock(), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_connect_to_worker_loop() {
        let (proxy_tx, proxy_rx) = crossbeam_channel::bounded(1);
        let worker = std::thread::spawn(move || {
            let event_loop = EventLoop::new();
            proxy_tx.send(event_loop.proxy()).unwrap();
            event_loop.run()
        });
        let worker_proxy: LoopProxy = proxy_rx.recv().unwrap();

        let signal = Signal::<u32>::new();
        let ran_on = Arc::new(Mutex::new(None));
        let ran_on_clone = ran_on.clone();
        signal.connect_to(&worker_proxy, move |_| {
            *ran_on_clone.lock() = Some(std::thread::current().id());
        });

        signal.emit(5);
        worker_proxy.quit().unwrap();
        assert_eq!(worker.join().unwrap(), 0);

        assert_eq!(*ran_on.lock(), Some(worker_proxy.thread_id()));
    }

    #[test]
    fn test_blocking_queued_waits_for_slot() {
        let (proxy_tx, proxy_rx) = crossbeam_channel::bounded(1);
        let worker = std::thread::spawn(move || {
            let event_loop = EventLoop::new();
            proxy_tx.send(event_loop.proxy()).unwrap();
            event_loop.run()
        });
        let worker_proxy: LoopProxy = proxy_rx.recv().unwrap();

        let signal = Signal::<()>::new();
        let counter = Arc::new(AtomicUsize::new(0));

        // Connect from the worker thread so it owns the slot.
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let counter_clone = counter.clone();
        let signal = Arc::new(signal);
        let signal_clone = signal.clone();
        worker_proxy
            .post_task(move || {
                signal_clone.connect_with_type(
                    move |_| {
                        std::thread::sleep(Duration::from_millis(20));
                        counter_clone.fetch_add(1, Ordering::SeqCst);
                    },
                    ConnectionType::BlockingQueued,
                );
                done_tx.send(()).unwrap();
            })
            .unwrap();
        done_rx.recv().unwrap();

        signal.emit(());
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        worker_proxy.quit().unwrap();
        worker.join().unwrap();
    }

    #[test]
    fn test_blocking_queued_same_thread_does_not_deadlock() {
        let _event_loop = EventLoop::new();
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        signal.connect_with_type(
            move |&value| received_clone.lock().push(value),
            ConnectionType::BlockingQueued,
        );

        signal.emit(42);
        assert_eq!(*received.lock(), vec![42]);
    }

    #[test]
    fn test_receiver_loop_gone_runs_immediately() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));
        {
            let _event_loop = EventLoop::new();
            let received_clone = received.clone();
            signal.connect_with_type(
                move |&value| received_clone.lock().push(value),
                ConnectionType::Queued,
            );
        }

        signal.emit(7);
        assert_eq!(*received.lock(), vec![7]);
    }

    #[test]
    fn test_emit_queued_defers_direct_slots() {
        let event_loop = EventLoop::new();
        let signal = Signal::<i32>::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = count.clone();
        signal.connect_with_type(
            move |_| {
                count_clone.fetch_add(1, Ordering::SeqCst);
            },
            ConnectionType::Direct,
        );

        assert_eq!(signal.emit_queued(1), 1);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        event_loop.process_pending();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_signal_stress() {
        let signal = Arc::new(Signal::<usize>::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = counter.clone();
        signal.connect_with_type(
            move |_| {
                counter_clone.fetch_add(1, Ordering::SeqCst);
            },
            ConnectionType::Direct,
        );

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let signal_clone = signal.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        signal_clone.emit(i);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.load(Ordering::SeqCst), 1000);
    }
}
