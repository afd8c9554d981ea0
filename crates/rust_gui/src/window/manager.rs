//! Window manager thread
//!
//! Every native window handle is created, changed and destroyed on one
//! background thread owned by a [`WindowManager`]. Callers on any thread
//! hand a window over through a one-slot channel and block on a one-shot
//! reply until the native handle exists or creation failed.
//!
//! The thread starts with the first load and stops when the last loaded
//! window is unloaded, or when the last manager handle is dropped.

use super::window::WindowShared;
use super::WindowError;
use crate::config::ManagerConfig;
use crate::foundation::sync::Semaphore;
use crate::platform::{NativeId, NativeWindowDesc, Platform, PlatformError, PlatformEvent, PlatformFactory, Waker};
use crate::window::WindowStyle;
use crossbeam::channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

/// A window waiting in the handoff slot
struct LoadRequest {
    id: NativeId,
    desc: NativeWindowDesc,
    shared: Arc<WindowShared>,
    reply: Sender<Result<(), PlatformError>>,
}

/// Native changes to an already loaded window
#[derive(Debug)]
pub(crate) enum Command {
    SetVisible { id: NativeId, visible: bool },
    SetTitle { id: NativeId, title: String },
    SetSize { id: NativeId, width: u32, height: u32 },
    ApplyStyle { id: NativeId, style: WindowStyle, changed: WindowStyle },
    Destroy { id: NativeId, ack: Sender<()> },
}

type StartupSlot = Arc<Mutex<Option<Result<Arc<dyn Waker>, PlatformError>>>>;

struct ManagerThread {
    handle: JoinHandle<()>,
    handoff: Sender<LoadRequest>,
    commands: Sender<Command>,
    waker: Arc<dyn Waker>,
    stop: Arc<AtomicBool>,
}

#[derive(Default)]
struct ManagerState {
    loaded: HashMap<NativeId, Arc<WindowShared>>,
    thread: Option<ManagerThread>,
}

struct ManagerInner {
    factory: Arc<dyn PlatformFactory>,
    config: ManagerConfig,
    load_lock: Mutex<()>,
    state: Mutex<ManagerState>,
    next_id: AtomicU64,
}

/// Owner of the thread that runs every native window operation
///
/// Cheap to clone; clones share the same thread. Pass one to each
/// [`Window`](super::Window) that should live on that thread.
#[derive(Clone)]
pub struct WindowManager {
    inner: Arc<ManagerInner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl WindowManager {
    /// Create a manager; no thread runs until the first window loads
    pub fn new(factory: Arc<dyn PlatformFactory>, config: ManagerConfig) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                factory,
                config,
                load_lock: Mutex::new(()),
                state: Mutex::new(ManagerState::default()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Thread settings this manager was created with
    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    /// Whether the manager thread is running
    ///
    /// A thread that died from a panic counts as not running.
    pub fn is_running(&self) -> bool {
        lock(&self.inner.state)
            .thread
            .as_ref()
            .is_some_and(|thread| !thread.handle.is_finished())
    }

    /// Number of windows with a live native handle
    pub fn loaded_count(&self) -> usize {
        lock(&self.inner.state).loaded.len()
    }

    /// Create the native window for `shared` on the manager thread
    ///
    /// Blocks until the handle exists. Loads from several threads are
    /// serialized; only one request ever sits in the handoff slot.
    pub(crate) fn load_window(
        &self,
        shared: Arc<WindowShared>,
        desc: NativeWindowDesc,
    ) -> Result<NativeId, WindowError> {
        let _load = lock(&self.inner.load_lock);
        let id = NativeId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (reply, response) = bounded(1);

        {
            let mut state = lock(&self.inner.state);
            self.ensure_running(&mut state)?;
            let thread = state.thread.as_ref().ok_or(WindowError::ManagerUnavailable)?;

            let request = LoadRequest {
                id,
                desc,
                shared: Arc::clone(&shared),
                reply,
            };
            match thread.handoff.try_send(request) {
                Ok(()) => thread.waker.wake(),
                Err(TrySendError::Full(_)) => {
                    log::error!("Window handoff slot already occupied");
                    return Err(WindowError::HandoffOccupied);
                }
                Err(TrySendError::Disconnected(_)) => {
                    Self::discard_dead_thread(&mut state);
                    return Err(WindowError::ManagerUnavailable);
                }
            }
        }

        let result = response.recv();

        let mut state = lock(&self.inner.state);
        let Ok(result) = result else {
            // The reply sender is only dropped unanswered when the thread died
            Self::discard_dead_thread(&mut state);
            return Err(WindowError::ManagerUnavailable);
        };
        if let Some(thread) = &state.thread {
            if !thread.handoff.is_empty() {
                log::error!("Window handoff slot not consumed after reply");
                return Err(WindowError::HandoffNotConsumed);
            }
        }

        match result.map_err(WindowError::from) {
            Ok(()) => {
                state.loaded.insert(id, shared);
                log::debug!("Window {:?} loaded ({} live)", id, state.loaded.len());
                Ok(id)
            }
            Err(e) => {
                log::error!("Window load failed: {}", e);
                if state.loaded.is_empty() {
                    Self::stop_thread(&mut state);
                }
                Err(e)
            }
        }
    }

    /// Destroy the native window `id` and stop the thread if it was the last
    ///
    /// Returns `false` when `id` is not loaded.
    pub(crate) fn unload_window(&self, id: NativeId) -> bool {
        let _load = lock(&self.inner.load_lock);
        let mut state = lock(&self.inner.state);

        if state.loaded.remove(&id).is_none() {
            return false;
        }

        let mut died = false;
        if let Some(thread) = &state.thread {
            let (ack, done) = bounded(1);
            if thread.commands.send(Command::Destroy { id, ack }).is_ok() {
                thread.waker.wake();
                // The ack is only dropped unsent when the thread died
                died = done.recv().is_err();
            } else {
                died = true;
            }
        }
        if died {
            Self::discard_dead_thread(&mut state);
        }

        log::debug!("Window {:?} unloaded ({} live)", id, state.loaded.len());
        if state.loaded.is_empty() {
            Self::stop_thread(&mut state);
        }
        true
    }

    /// Queue a native change for a loaded window
    pub(crate) fn send_command(&self, command: Command) -> Result<(), WindowError> {
        let mut state = lock(&self.inner.state);
        let thread = state.thread.as_ref().ok_or(WindowError::ManagerUnavailable)?;
        if thread.commands.send(command).is_err() {
            Self::discard_dead_thread(&mut state);
            return Err(WindowError::ManagerUnavailable);
        }
        thread.waker.wake();
        Ok(())
    }

    fn ensure_running(&self, state: &mut ManagerState) -> Result<(), WindowError> {
        if state.thread.as_ref().is_some_and(|thread| thread.handle.is_finished()) {
            Self::discard_dead_thread(state);
        }
        if state.thread.is_some() {
            return Ok(());
        }

        let (handoff, handoff_rx) = bounded(1);
        let (commands, commands_rx) = unbounded();
        let stop = Arc::new(AtomicBool::new(false));
        let ready = Arc::new(Semaphore::new(0));
        let startup: StartupSlot = Arc::new(Mutex::new(None));

        let worker = ManagerWorker {
            factory: Arc::clone(&self.inner.factory),
            class: self.inner.config.window_class.clone(),
            handoff: handoff_rx,
            commands: commands_rx,
            stop: Arc::clone(&stop),
        };
        let thread_ready = Arc::clone(&ready);
        let thread_startup = Arc::clone(&startup);

        let handle = thread::Builder::new()
            .name(self.inner.config.thread_name.clone())
            .spawn(move || worker.run(&thread_ready, &thread_startup))
            .map_err(|e| WindowError::ThreadSpawn(e.to_string()))?;

        // Signalled on every start-up exit, panics included
        ready.wait();
        let started = lock(&startup).take();
        match started {
            Some(Ok(waker)) => {
                log::info!("Window manager thread '{}' started", self.inner.config.thread_name);
                state.thread = Some(ManagerThread {
                    handle,
                    handoff,
                    commands,
                    waker,
                    stop,
                });
                Ok(())
            }
            Some(Err(e)) => {
                log::error!("Window manager thread failed to start: {}", e);
                let _ = handle.join();
                Err(WindowError::Platform(e))
            }
            None => {
                log::error!("Window manager thread died during start-up");
                let _ = handle.join();
                Err(WindowError::ManagerUnavailable)
            }
        }
    }

    /// Join a thread that exited on its own and forget its windows
    ///
    /// Its native handles went down with it, so nothing stays loaded.
    fn discard_dead_thread(state: &mut ManagerState) {
        log::error!(
            "Window manager thread exited unexpectedly; dropping {} loaded window(s)",
            state.loaded.len()
        );
        state.loaded.clear();
        Self::stop_thread(state);
    }

    fn stop_thread(state: &mut ManagerState) {
        let Some(thread) = state.thread.take() else {
            return;
        };

        thread.stop.store(true, Ordering::SeqCst);
        thread.waker.wake();
        if thread.handle.join().is_err() {
            log::error!("Window manager thread panicked");
        } else {
            log::info!("Window manager thread stopped");
        }
    }
}

impl fmt::Debug for WindowManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.inner.state);
        f.debug_struct("WindowManager")
            .field("thread_name", &self.inner.config.thread_name)
            .field("running", &state.thread.as_ref().is_some_and(|t| !t.handle.is_finished()))
            .field("loaded", &state.loaded.len())
            .finish()
    }
}

impl Drop for ManagerInner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        WindowManager::stop_thread(state);
    }
}

/// Everything the manager thread owns
struct ManagerWorker {
    factory: Arc<dyn PlatformFactory>,
    class: String,
    handoff: Receiver<LoadRequest>,
    commands: Receiver<Command>,
    stop: Arc<AtomicBool>,
}

impl ManagerWorker {
    fn run(self, ready: &Semaphore, startup: &StartupSlot) {
        let platform = {
            let _ready = ready.signal_on_drop();
            let started = self.factory.create().and_then(|mut platform| {
                platform.register_window_class(&self.class)?;
                Ok(platform)
            });
            match started {
                Ok(platform) => {
                    *lock(startup) = Some(Ok(platform.waker()));
                    Some(platform)
                }
                Err(e) => {
                    *lock(startup) = Some(Err(e));
                    None
                }
            }
        };
        let Some(mut platform) = platform else {
            return;
        };

        let mut windows: HashMap<NativeId, Arc<WindowShared>> = HashMap::new();
        let mut events = Vec::new();

        loop {
            if self.stop.load(Ordering::SeqCst) {
                break;
            }

            while let Ok(request) = self.handoff.try_recv() {
                Self::load(platform.as_mut(), &mut windows, request);
            }
            while let Ok(command) = self.commands.try_recv() {
                Self::execute(platform.as_mut(), &mut windows, command);
            }

            if self.stop.load(Ordering::SeqCst) {
                break;
            }

            platform.wait_events(&mut events);
            for event in events.drain(..) {
                Self::dispatch(&windows, event);
            }
        }

        // Acknowledge destroys that raced with the stop
        while let Ok(command) = self.commands.try_recv() {
            Self::execute(platform.as_mut(), &mut windows, command);
        }
        for id in windows.keys() {
            platform.destroy_window(*id);
        }
        platform.unregister_window_class(&self.class);
    }

    fn load(platform: &mut dyn Platform, windows: &mut HashMap<NativeId, Arc<WindowShared>>, request: LoadRequest) {
        let LoadRequest { id, desc, shared, reply } = request;
        let result = platform.create_window(id, &desc);
        if result.is_ok() {
            windows.insert(id, shared);
        }
        // The caller blocks on this reply until it arrives
        let _ = reply.send(result);
    }

    fn execute(platform: &mut dyn Platform, windows: &mut HashMap<NativeId, Arc<WindowShared>>, command: Command) {
        match command {
            Command::SetVisible { id, visible } => platform.set_visible(id, visible),
            Command::SetTitle { id, title } => platform.set_title(id, &title),
            Command::SetSize { id, width, height } => platform.set_size(id, width, height),
            Command::ApplyStyle { id, style, changed } => platform.apply_style(id, style, changed),
            Command::Destroy { id, ack } => {
                if windows.remove(&id).is_some() {
                    platform.destroy_window(id);
                }
                let _ = ack.send(());
            }
        }
    }

    fn dispatch(windows: &HashMap<NativeId, Arc<WindowShared>>, event: PlatformEvent) {
        match event {
            PlatformEvent::Wake => {}
            PlatformEvent::Paint(id) => {
                if let Some(shared) = windows.get(&id) {
                    shared.paint();
                }
            }
            PlatformEvent::Resized { id, width, height } => {
                if let Some(shared) = windows.get(&id) {
                    shared.resized(width, height);
                }
            }
            PlatformEvent::CloseRequested(id) => {
                if let Some(shared) = windows.get(&id) {
                    log::debug!("Close requested for window {:?}", id);
                    shared.request_close();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WindowSettings;
    use crate::platform::{HeadlessController, HeadlessPlatformFactory, NativeOp};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Factory whose platform panics while starting up
    struct PanickingFactory;

    impl PlatformFactory for PanickingFactory {
        fn create(&self) -> Result<Box<dyn Platform>, PlatformError> {
            panic!("platform start-up panicked");
        }
    }

    /// Headless platform that panics on one numbered window creation
    struct CrashingFactory {
        inner: HeadlessPlatformFactory,
        creates: Arc<AtomicUsize>,
        crash_on: usize,
    }

    impl PlatformFactory for CrashingFactory {
        fn create(&self) -> Result<Box<dyn Platform>, PlatformError> {
            Ok(Box::new(CrashingPlatform {
                inner: self.inner.create()?,
                creates: Arc::clone(&self.creates),
                crash_on: self.crash_on,
            }))
        }
    }

    struct CrashingPlatform {
        inner: Box<dyn Platform>,
        creates: Arc<AtomicUsize>,
        crash_on: usize,
    }

    impl Platform for CrashingPlatform {
        fn register_window_class(&mut self, name: &str) -> Result<(), PlatformError> {
            self.inner.register_window_class(name)
        }
        fn unregister_window_class(&mut self, name: &str) {
            self.inner.unregister_window_class(name);
        }
        fn create_window(&mut self, id: NativeId, desc: &NativeWindowDesc) -> Result<(), PlatformError> {
            if self.creates.fetch_add(1, Ordering::SeqCst) + 1 == self.crash_on {
                panic!("native window creation panicked");
            }
            self.inner.create_window(id, desc)
        }
        fn destroy_window(&mut self, id: NativeId) {
            self.inner.destroy_window(id);
        }
        fn set_visible(&mut self, id: NativeId, visible: bool) {
            self.inner.set_visible(id, visible);
        }
        fn set_title(&mut self, id: NativeId, title: &str) {
            self.inner.set_title(id, title);
        }
        fn set_size(&mut self, id: NativeId, width: u32, height: u32) {
            self.inner.set_size(id, width, height);
        }
        fn apply_style(&mut self, id: NativeId, style: WindowStyle, changed: WindowStyle) {
            self.inner.apply_style(id, style, changed);
        }
        fn wait_events(&mut self, events: &mut Vec<PlatformEvent>) {
            self.inner.wait_events(events);
        }
        fn waker(&self) -> Arc<dyn Waker> {
            self.inner.waker()
        }
    }

    fn manager(controller: &HeadlessController) -> WindowManager {
        WindowManager::new(Arc::new(controller.factory()), ManagerConfig::default())
    }

    fn desc(title: &str) -> NativeWindowDesc {
        NativeWindowDesc {
            class: ManagerConfig::default().window_class,
            title: title.to_string(),
            width: 64,
            height: 32,
            style: WindowStyle::DEFAULT,
        }
    }

    fn shared(title: &str) -> Arc<WindowShared> {
        Arc::new(WindowShared::new(&WindowSettings::new(64, 32, title)))
    }

    #[test]
    fn test_thread_starts_on_first_load_and_stops_on_last_unload() {
        let controller = HeadlessController::new();
        let manager = manager(&controller);
        assert!(!manager.is_running());

        let a = manager.load_window(shared("a"), desc("a")).unwrap();
        let b = manager.load_window(shared("b"), desc("b")).unwrap();
        assert!(manager.is_running());
        assert_eq!(manager.loaded_count(), 2);

        assert!(manager.unload_window(a));
        assert!(manager.is_running());
        assert!(!manager.unload_window(a));

        assert!(manager.unload_window(b));
        assert!(!manager.is_running());
        assert!(controller.live_windows().is_empty());

        let ops = controller.ops();
        assert_eq!(ops.first(), Some(&NativeOp::ClassRegistered(ManagerConfig::default().window_class)));
        assert_eq!(ops.last(), Some(&NativeOp::ClassUnregistered(ManagerConfig::default().window_class)));
    }

    #[test]
    fn test_native_ops_run_on_one_thread() {
        let controller = HeadlessController::new();
        let manager = manager(&controller);

        let id = manager.load_window(shared("a"), desc("a")).unwrap();
        manager
            .send_command(Command::SetTitle { id, title: "renamed".to_string() })
            .unwrap();
        assert!(controller.wait_for(Duration::from_secs(5), |ops| ops
            .iter()
            .any(|op| matches!(op, NativeOp::Retitled { .. }))));
        manager.unload_window(id);

        assert_eq!(controller.native_thread_count(), 1);
    }

    #[test]
    fn test_creation_failure_reaches_the_caller() {
        let controller = HeadlessController::new();
        let manager = manager(&controller);

        controller.fail_next_create();
        let result = manager.load_window(shared("a"), desc("a"));
        assert!(matches!(result, Err(WindowError::Platform(PlatformError::CreationFailed(_)))));
        assert!(!manager.is_running());
        assert_eq!(manager.loaded_count(), 0);

        assert!(manager.load_window(shared("b"), desc("b")).is_ok());
    }

    #[test]
    fn test_startup_failure_reaches_the_caller() {
        let controller = HeadlessController::new();
        let manager = manager(&controller);

        controller.fail_initialization(true);
        let result = manager.load_window(shared("a"), desc("a"));
        assert!(matches!(result, Err(WindowError::Platform(PlatformError::InitializationFailed(_)))));
        assert!(!manager.is_running());

        controller.fail_initialization(false);
        controller.fail_class_registration(true);
        let result = manager.load_window(shared("a"), desc("a"));
        assert!(matches!(result, Err(WindowError::Platform(PlatformError::ClassRegistrationFailed(_)))));
        assert!(!manager.is_running());
    }

    #[test]
    fn test_concurrent_loads_are_serialized() {
        let controller = HeadlessController::new();
        controller.set_create_delay(Duration::from_millis(20));
        let manager = manager(&controller);

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let manager = manager.clone();
                thread::spawn(move || {
                    let title = format!("window {}", i);
                    manager.load_window(shared(&title), desc(&title))
                })
            })
            .collect();

        let ids: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap().unwrap())
            .collect();

        assert_eq!(controller.created_count(), 4);
        assert_eq!(controller.max_concurrent_creates(), 1);
        assert_eq!(controller.live_windows().len(), 4);

        for id in ids {
            manager.unload_window(id);
        }
        assert!(!manager.is_running());
    }

    #[test]
    fn test_dropping_the_manager_stops_the_thread() {
        let controller = HeadlessController::new();
        let manager = manager(&controller);
        manager.load_window(shared("a"), desc("a")).unwrap();
        drop(manager);

        assert!(controller.live_windows().is_empty());
        assert!(matches!(controller.ops().last(), Some(NativeOp::ClassUnregistered(_))));
    }

    #[test]
    fn test_startup_panic_returns_instead_of_hanging() {
        let manager = WindowManager::new(Arc::new(PanickingFactory), ManagerConfig::default());

        let (tx, rx) = bounded(2);
        let loader = manager.clone();
        thread::spawn(move || {
            for title in ["a", "b"] {
                let _ = tx.send(loader.load_window(shared(title), desc(title)));
            }
        });

        for _ in 0..2 {
            let result = rx.recv_timeout(Duration::from_secs(5)).expect("load blocked after panic");
            assert!(matches!(result, Err(WindowError::ManagerUnavailable)));
        }
        assert!(!manager.is_running());
    }

    #[test]
    fn test_thread_restarts_after_dying_mid_run() {
        let controller = HeadlessController::new();
        let factory = CrashingFactory {
            inner: controller.factory(),
            creates: Arc::new(AtomicUsize::new(0)),
            crash_on: 2,
        };
        let manager = WindowManager::new(Arc::new(factory), ManagerConfig::default());

        let first = manager.load_window(shared("a"), desc("a")).unwrap();
        assert!(manager.is_running());

        let result = manager.load_window(shared("b"), desc("b"));
        assert!(matches!(result, Err(WindowError::ManagerUnavailable)));
        assert!(!manager.is_running());
        assert_eq!(manager.loaded_count(), 0);
        assert!(!manager.unload_window(first));
        assert!(matches!(
            manager.send_command(Command::SetVisible { id: first, visible: true }),
            Err(WindowError::ManagerUnavailable)
        ));

        let third = manager.load_window(shared("c"), desc("c")).unwrap();
        assert!(manager.is_running());
        assert_eq!(manager.loaded_count(), 1);
        assert!(manager.unload_window(third));
        assert!(!manager.is_running());
    }
}
