//! Headless platform backend
//!
//! An in-process windowing backend with no display. Its event wait blocks
//! on a channel, so the window manager runs exactly as it would against a
//! real windowing system. A [`HeadlessController`] drives it from other
//! threads: it posts synthetic events, injects failures and delays, and
//! records every native operation together with the thread that ran it.

use super::{NativeId, NativeWindowDesc, Platform, PlatformError, PlatformEvent, PlatformFactory, Waker};
use crate::window::WindowStyle;
use crossbeam::channel::{unbounded, Receiver, Sender};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

/// A native operation performed by the headless backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeOp {
    /// Window class registered
    ClassRegistered(String),
    /// Window class unregistered
    ClassUnregistered(String),
    /// Native window created
    Created {
        /// Window id
        id: NativeId,
        /// Initial title
        title: String,
        /// Initial width
        width: u32,
        /// Initial height
        height: u32,
        /// Initial style
        style: WindowStyle,
    },
    /// Native window destroyed
    Destroyed(NativeId),
    /// Window shown or hidden
    VisibilityChanged {
        /// Window id
        id: NativeId,
        /// New visibility
        visible: bool,
    },
    /// Title changed
    Retitled {
        /// Window id
        id: NativeId,
        /// New title
        title: String,
    },
    /// Size changed by the application
    Resized {
        /// Window id
        id: NativeId,
        /// New width
        width: u32,
        /// New height
        height: u32,
    },
    /// Style delta applied
    StyleApplied {
        /// Window id
        id: NativeId,
        /// Full style after the change
        style: WindowStyle,
        /// Bits that flipped
        changed: WindowStyle,
    },
}

#[derive(Debug, Default)]
struct Record {
    ops: Vec<NativeOp>,
    threads: HashSet<ThreadId>,
    live: HashSet<NativeId>,
}

#[derive(Debug)]
struct HeadlessShared {
    sender: Sender<PlatformEvent>,
    receiver: Receiver<PlatformEvent>,
    record: Mutex<Record>,
    recorded: Condvar,
    fail_init: AtomicBool,
    fail_class: AtomicBool,
    fail_next_create: AtomicBool,
    create_delay_ms: AtomicU64,
    creating: AtomicUsize,
    max_creating: AtomicUsize,
}

impl HeadlessShared {
    fn record(&self) -> MutexGuard<'_, Record> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, op: NativeOp) {
        let mut record = self.record();
        record.threads.insert(thread::current().id());
        match &op {
            NativeOp::Created { id, .. } => {
                record.live.insert(*id);
            }
            NativeOp::Destroyed(id) => {
                record.live.remove(id);
            }
            _ => {}
        }
        record.ops.push(op);
        self.recorded.notify_all();
    }
}

/// Remote control for headless platforms
#[derive(Debug, Clone)]
pub struct HeadlessController {
    shared: Arc<HeadlessShared>,
}

impl HeadlessController {
    /// Create a controller with an empty event queue
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            shared: Arc::new(HeadlessShared {
                sender,
                receiver,
                record: Mutex::new(Record::default()),
                recorded: Condvar::new(),
                fail_init: AtomicBool::new(false),
                fail_class: AtomicBool::new(false),
                fail_next_create: AtomicBool::new(false),
                create_delay_ms: AtomicU64::new(0),
                creating: AtomicUsize::new(0),
                max_creating: AtomicUsize::new(0),
            }),
        }
    }

    /// Factory that builds platforms driven by this controller
    pub fn factory(&self) -> HeadlessPlatformFactory {
        HeadlessPlatformFactory {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Queue an event for the platform's event wait
    pub fn post(&self, event: PlatformEvent) {
        // The shared state owns a receiver, so the channel never disconnects
        let _ = self.shared.sender.send(event);
    }

    /// Ask for a repaint of `id`
    pub fn request_paint(&self, id: NativeId) {
        self.post(PlatformEvent::Paint(id));
    }

    /// Simulate the user clicking the close button of `id`
    pub fn request_close(&self, id: NativeId) {
        self.post(PlatformEvent::CloseRequested(id));
    }

    /// Simulate the user resizing `id`
    pub fn user_resize(&self, id: NativeId, width: u32, height: u32) {
        self.post(PlatformEvent::Resized { id, width, height });
    }

    /// Make the next platform creation fail
    pub fn fail_initialization(&self, fail: bool) {
        self.shared.fail_init.store(fail, Ordering::SeqCst);
    }

    /// Make window class registration fail
    pub fn fail_class_registration(&self, fail: bool) {
        self.shared.fail_class.store(fail, Ordering::SeqCst);
    }

    /// Make the next native window creation fail
    pub fn fail_next_create(&self) {
        self.shared.fail_next_create.store(true, Ordering::SeqCst);
    }

    /// Sleep this long inside every native window creation
    pub fn set_create_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.shared.create_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Every native operation so far, in order
    pub fn ops(&self) -> Vec<NativeOp> {
        self.shared.record().ops.clone()
    }

    /// Number of native windows created so far
    pub fn created_count(&self) -> usize {
        self.shared
            .record()
            .ops
            .iter()
            .filter(|op| matches!(op, NativeOp::Created { .. }))
            .count()
    }

    /// Native windows currently alive
    pub fn live_windows(&self) -> Vec<NativeId> {
        let mut live: Vec<_> = self.shared.record().live.iter().copied().collect();
        live.sort();
        live
    }

    /// Number of distinct threads that performed native operations
    pub fn native_thread_count(&self) -> usize {
        self.shared.record().threads.len()
    }

    /// Highest number of window creations ever running at once
    pub fn max_concurrent_creates(&self) -> usize {
        self.shared.max_creating.load(Ordering::SeqCst)
    }

    /// Block until `predicate` holds for the recorded operations
    ///
    /// Returns `false` if `timeout` elapses first.
    pub fn wait_for<F>(&self, timeout: Duration, mut predicate: F) -> bool
    where
        F: FnMut(&[NativeOp]) -> bool,
    {
        let deadline = Instant::now() + timeout;
        let mut record = self.shared.record();
        loop {
            if predicate(&record.ops) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .shared
                .recorded
                .wait_timeout(record, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            record = guard;
        }
    }
}

impl Default for HeadlessController {
    fn default() -> Self {
        Self::new()
    }
}

/// Factory for headless platforms
#[derive(Debug, Clone)]
pub struct HeadlessPlatformFactory {
    shared: Arc<HeadlessShared>,
}

impl PlatformFactory for HeadlessPlatformFactory {
    fn create(&self) -> Result<Box<dyn Platform>, PlatformError> {
        if self.shared.fail_init.load(Ordering::SeqCst) {
            return Err(PlatformError::InitializationFailed(
                "headless initialization disabled".to_string(),
            ));
        }
        Ok(Box::new(HeadlessPlatform {
            shared: Arc::clone(&self.shared),
            windows: HashMap::new(),
            classes: HashSet::new(),
        }))
    }
}

struct HeadlessWaker {
    sender: Sender<PlatformEvent>,
}

impl Waker for HeadlessWaker {
    fn wake(&self) {
        let _ = self.sender.send(PlatformEvent::Wake);
    }
}

/// Headless platform instance; lives on the manager thread
struct HeadlessPlatform {
    shared: Arc<HeadlessShared>,
    windows: HashMap<NativeId, NativeWindowDesc>,
    classes: HashSet<String>,
}

impl HeadlessPlatform {
    fn window_mut(&mut self, id: NativeId) -> Option<&mut NativeWindowDesc> {
        let window = self.windows.get_mut(&id);
        if window.is_none() {
            log::warn!("headless: unknown native window {:?}", id);
        }
        window
    }
}

impl Platform for HeadlessPlatform {
    fn register_window_class(&mut self, name: &str) -> Result<(), PlatformError> {
        if self.shared.fail_class.load(Ordering::SeqCst) {
            return Err(PlatformError::ClassRegistrationFailed(name.to_string()));
        }
        self.classes.insert(name.to_string());
        self.shared.push(NativeOp::ClassRegistered(name.to_string()));
        Ok(())
    }

    fn unregister_window_class(&mut self, name: &str) {
        if self.classes.remove(name) {
            self.shared.push(NativeOp::ClassUnregistered(name.to_string()));
        }
    }

    fn create_window(&mut self, id: NativeId, desc: &NativeWindowDesc) -> Result<(), PlatformError> {
        if !self.classes.contains(&desc.class) {
            return Err(PlatformError::CreationFailed(format!(
                "window class '{}' is not registered",
                desc.class
            )));
        }
        if self.shared.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(PlatformError::CreationFailed("injected failure".to_string()));
        }

        let creating = self.shared.creating.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.max_creating.fetch_max(creating, Ordering::SeqCst);
        let delay = self.shared.create_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            thread::sleep(Duration::from_millis(delay));
        }
        self.shared.creating.fetch_sub(1, Ordering::SeqCst);

        self.windows.insert(id, desc.clone());
        self.shared.push(NativeOp::Created {
            id,
            title: desc.title.clone(),
            width: desc.width,
            height: desc.height,
            style: desc.style,
        });
        Ok(())
    }

    fn destroy_window(&mut self, id: NativeId) {
        if self.windows.remove(&id).is_some() {
            self.shared.push(NativeOp::Destroyed(id));
        }
    }

    fn set_visible(&mut self, id: NativeId, visible: bool) {
        if self.window_mut(id).is_some() {
            self.shared.push(NativeOp::VisibilityChanged { id, visible });
        }
    }

    fn set_title(&mut self, id: NativeId, title: &str) {
        if let Some(window) = self.window_mut(id) {
            title.clone_into(&mut window.title);
            self.shared.push(NativeOp::Retitled { id, title: title.to_string() });
        }
    }

    fn set_size(&mut self, id: NativeId, width: u32, height: u32) {
        if let Some(window) = self.window_mut(id) {
            window.width = width;
            window.height = height;
            self.shared.push(NativeOp::Resized { id, width, height });
        }
    }

    fn apply_style(&mut self, id: NativeId, style: WindowStyle, changed: WindowStyle) {
        if let Some(window) = self.window_mut(id) {
            window.style = style;
            self.shared.push(NativeOp::StyleApplied { id, style, changed });
        }
    }

    fn wait_events(&mut self, events: &mut Vec<PlatformEvent>) {
        match self.shared.receiver.recv() {
            Ok(event) => events.push(event),
            Err(_) => return,
        }
        events.extend(self.shared.receiver.try_iter());
    }

    fn waker(&self) -> Arc<dyn Waker> {
        Arc::new(HeadlessWaker {
            sender: self.shared.sender.clone(),
        })
    }
}
