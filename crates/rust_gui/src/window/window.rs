//! Portable window
//!
//! A [`Window`] keeps its attributes, its control tree and its renderer in
//! state shared with the manager thread. Queries never touch the platform,
//! so they are valid in every phase; changes to a loaded window are
//! forwarded to the manager thread as native commands.

use super::manager::{Command, WindowManager};
use super::{WindowError, WindowStyle};
use crate::config::WindowSettings;
use crate::controls::ControlTree;
use crate::foundation::math::Rect;
use crate::platform::{NativeId, NativeWindowDesc};
use crate::render::{paint_window, Renderer, Skin};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lifecycle of a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPhase {
    /// No native handle yet
    Unloaded,
    /// Handed to the manager thread; the loading caller is blocked
    Loading,
    /// Native handle exists
    Loaded,
    /// Native teardown in progress
    Destroying,
    /// Terminal
    Destroyed,
}

struct WindowState {
    width: u32,
    height: u32,
    title: String,
    style: WindowStyle,
    visible: bool,
    tree: ControlTree,
    renderer: Option<Box<dyn Renderer>>,
    skin: Option<Arc<dyn Skin>>,
    frames_painted: u64,
    close_requested: bool,
}

/// Window data reachable from both the owner and the manager thread
pub(crate) struct WindowShared {
    state: Mutex<WindowState>,
}

impl WindowShared {
    pub(crate) fn new(settings: &WindowSettings) -> Self {
        Self {
            state: Mutex::new(WindowState {
                width: settings.width,
                height: settings.height,
                title: settings.title.clone(),
                style: settings.style,
                visible: false,
                tree: ControlTree::new(),
                renderer: None,
                skin: None,
                frames_painted: 0,
                close_requested: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Paint the control tree; manager thread only
    pub(crate) fn paint(&self) {
        let mut state = self.lock();
        let state = &mut *state;

        let (Some(renderer), Some(skin)) = (state.renderer.as_mut(), state.skin.as_ref()) else {
            log::trace!("Paint skipped: no renderer attached");
            return;
        };

        if !renderer.is_loaded() {
            if let Err(e) = renderer.load() {
                log::error!("Renderer load failed for '{}': {}", state.title, e);
                return;
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let viewport = Rect::from_size(state.width as f32, state.height as f32);
        paint_window(&state.tree, viewport, &mut **renderer, &**skin);
        state.frames_painted += 1;
    }

    /// Record a size change made by the user
    pub(crate) fn resized(&self, width: u32, height: u32) {
        let mut state = self.lock();
        state.width = width;
        state.height = height;
    }

    pub(crate) fn request_close(&self) {
        self.lock().close_requested = true;
    }
}

/// A top-level window
///
/// ```no_run
/// use rust_gui::prelude::*;
/// use std::sync::Arc;
///
/// let controller = HeadlessController::new();
/// let manager = WindowManager::new(Arc::new(controller.factory()), ManagerConfig::default());
/// let mut window = Window::new(manager, WindowSettings::new(320, 200, "Hello"));
/// window.show()?;
/// window.remove_style(WindowStyle::CLOSE)?;
/// # Ok::<(), WindowError>(())
/// ```
pub struct Window {
    manager: WindowManager,
    shared: Arc<WindowShared>,
    native_id: Option<NativeId>,
    phase: WindowPhase,
}

impl Window {
    /// Create an unloaded window; no native resources are acquired yet
    pub fn new(manager: WindowManager, settings: WindowSettings) -> Self {
        Self {
            manager,
            shared: Arc::new(WindowShared::new(&settings)),
            native_id: None,
            phase: WindowPhase::Unloaded,
        }
    }

    /// Create the native window on the manager thread
    ///
    /// Blocks until the handle exists. Loading an already loaded window
    /// does nothing. On failure the window stays unloaded.
    pub fn load(&mut self) -> Result<(), WindowError> {
        match self.phase {
            WindowPhase::Loaded => return Ok(()),
            WindowPhase::Destroying | WindowPhase::Destroyed => return Err(WindowError::Destroyed),
            WindowPhase::Unloaded | WindowPhase::Loading => {}
        }

        let desc = {
            let state = self.shared.lock();
            NativeWindowDesc {
                class: self.manager.config().window_class.clone(),
                title: state.title.clone(),
                width: state.width,
                height: state.height,
                style: state.style,
            }
        };

        self.phase = WindowPhase::Loading;
        match self.manager.load_window(Arc::clone(&self.shared), desc) {
            Ok(id) => {
                self.native_id = Some(id);
                self.phase = WindowPhase::Loaded;
                log::debug!("Window '{}' loaded as {:?}", self.title(), id);
                Ok(())
            }
            Err(e) => {
                self.phase = WindowPhase::Unloaded;
                Err(e)
            }
        }
    }

    /// Load if needed and make the window visible
    pub fn show(&mut self) -> Result<(), WindowError> {
        self.load()?;
        self.shared.lock().visible = true;
        self.send(|id| Command::SetVisible { id, visible: true })
    }

    /// Hide the window; an unloaded window is already hidden
    pub fn hide(&mut self) -> Result<(), WindowError> {
        self.ensure_alive()?;
        self.shared.lock().visible = false;
        self.send(|id| Command::SetVisible { id, visible: false })
    }

    /// Destroy the native window and end the window's life
    ///
    /// Returns once the native handle is gone. Closing twice does nothing.
    pub fn close(&mut self) {
        match self.phase {
            WindowPhase::Destroying | WindowPhase::Destroyed => return,
            WindowPhase::Loaded | WindowPhase::Loading => {
                self.phase = WindowPhase::Destroying;
                if let Some(id) = self.native_id.take() {
                    self.manager.unload_window(id);
                }
            }
            WindowPhase::Unloaded => {}
        }

        self.shared.lock().renderer = None;
        self.phase = WindowPhase::Destroyed;
    }

    /// Client area size
    pub fn size(&self) -> (u32, u32) {
        let state = self.shared.lock();
        (state.width, state.height)
    }

    /// Change the client area size
    pub fn set_size(&mut self, width: u32, height: u32) -> Result<(), WindowError> {
        self.ensure_alive()?;
        {
            let mut state = self.shared.lock();
            state.width = width;
            state.height = height;
        }
        self.send(|id| Command::SetSize { id, width, height })
    }

    /// Title bar text
    pub fn title(&self) -> String {
        self.shared.lock().title.clone()
    }

    /// Change the title bar text
    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), WindowError> {
        self.ensure_alive()?;
        let title = title.into();
        self.shared.lock().title.clone_from(&title);
        self.send(|id| Command::SetTitle { id, title })
    }

    /// Effective style
    pub fn style(&self) -> WindowStyle {
        self.shared.lock().style
    }

    /// Replace the style and return the bits that changed
    ///
    /// Only the changed bits are applied natively; an unchanged style
    /// sends nothing.
    pub fn set_style(&mut self, style: WindowStyle) -> Result<WindowStyle, WindowError> {
        self.ensure_alive()?;
        let changed = {
            let mut state = self.shared.lock();
            let changed = state.style.changed(style);
            state.style = style;
            changed
        };

        if !changed.is_empty() {
            self.send(|id| Command::ApplyStyle { id, style, changed })?;
        }
        Ok(changed)
    }

    /// Turn on `bits` and return the bits that changed
    pub fn add_style(&mut self, bits: WindowStyle) -> Result<WindowStyle, WindowError> {
        let style = self.style() | bits;
        self.set_style(style)
    }

    /// Turn off `bits` and return the bits that changed
    pub fn remove_style(&mut self, bits: WindowStyle) -> Result<WindowStyle, WindowError> {
        let style = self.style() - bits;
        self.set_style(style)
    }

    /// Current lifecycle phase
    pub const fn phase(&self) -> WindowPhase {
        self.phase
    }

    /// Native id while loaded
    pub const fn native_id(&self) -> Option<NativeId> {
        self.native_id
    }

    /// Whether `show` was the last visibility change
    pub fn is_visible(&self) -> bool {
        self.shared.lock().visible
    }

    /// Whether the user asked to close the window
    pub fn close_requested(&self) -> bool {
        self.shared.lock().close_requested
    }

    /// Number of frames painted so far
    pub fn frames_painted(&self) -> u64 {
        self.shared.lock().frames_painted
    }

    /// Run `f` with the window's control tree
    ///
    /// The manager thread cannot paint while `f` runs.
    pub fn with_controls<R>(&self, f: impl FnOnce(&mut ControlTree) -> R) -> R {
        let mut state = self.shared.lock();
        f(&mut state.tree)
    }

    /// Give the window a renderer and skin to paint with
    ///
    /// The renderer is loaded on the manager thread at the first paint.
    pub fn attach_renderer(&mut self, renderer: Box<dyn Renderer>, skin: Arc<dyn Skin>) {
        let mut state = self.shared.lock();
        state.renderer = Some(renderer);
        state.skin = Some(skin);
    }

    /// Take the window's renderer back; painting stops
    pub fn detach_renderer(&mut self) -> Option<Box<dyn Renderer>> {
        let mut state = self.shared.lock();
        state.skin = None;
        state.renderer.take()
    }

    /// Whether a renderer is attached
    pub fn has_renderer(&self) -> bool {
        self.shared.lock().renderer.is_some()
    }

    fn ensure_alive(&self) -> Result<(), WindowError> {
        match self.phase {
            WindowPhase::Destroying | WindowPhase::Destroyed => Err(WindowError::Destroyed),
            _ => Ok(()),
        }
    }

    /// Forward a native change when loaded; otherwise the stored state is enough
    fn send(&self, command: impl FnOnce(NativeId) -> Command) -> Result<(), WindowError> {
        match (self.phase, self.native_id) {
            (WindowPhase::Loaded, Some(id)) => self.manager.send_command(command(id)),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("title", &self.title())
            .field("phase", &self.phase)
            .field("native_id", &self.native_id)
            .finish_non_exhaustive()
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ManagerConfig;
    use crate::controls::{Control, Index};
    use crate::platform::{HeadlessController, NativeOp};
    use crate::render::{CommandRenderer, FlatSkin};
    use std::thread;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn manager(controller: &HeadlessController) -> WindowManager {
        WindowManager::new(Arc::new(controller.factory()), ManagerConfig::default())
    }

    #[test]
    fn test_queries_before_load_return_constructor_values() {
        let controller = HeadlessController::new();
        let window = Window::new(manager(&controller), WindowSettings::new(640, 480, "Before"));

        assert_eq!(window.phase(), WindowPhase::Unloaded);
        assert_eq!(window.size(), (640, 480));
        assert_eq!(window.title(), "Before");
        assert_eq!(window.style(), WindowStyle::DEFAULT);
        assert_eq!(window.native_id(), None);
        assert_eq!(window.frames_painted(), 0);
        assert!(controller.ops().is_empty());
    }

    #[test]
    fn test_changes_before_load_are_used_at_creation() {
        let controller = HeadlessController::new();
        let mut window = Window::new(manager(&controller), WindowSettings::new(640, 480, "Before"));
        window.set_title("After").unwrap();
        window.set_size(100, 50).unwrap();
        window.remove_style(WindowStyle::RESIZE).unwrap();
        assert!(controller.ops().is_empty());

        window.load().unwrap();
        let id = window.native_id().unwrap();
        assert!(controller.ops().contains(&NativeOp::Created {
            id,
            title: "After".to_string(),
            width: 100,
            height: 50,
            style: WindowStyle::DEFAULT - WindowStyle::RESIZE,
        }));
    }

    #[test]
    fn test_add_style_twice_is_idempotent() {
        let controller = HeadlessController::new();
        let settings = WindowSettings::new(10, 10, "Style").with_style(WindowStyle::TITLE_BAR);
        let mut window = Window::new(manager(&controller), settings);

        assert_eq!(window.add_style(WindowStyle::CLOSE).unwrap(), WindowStyle::CLOSE);
        let once = window.style();
        assert!(window.add_style(WindowStyle::CLOSE).unwrap().is_empty());
        assert_eq!(window.style(), once);
    }

    #[test]
    fn test_remove_close_sends_only_that_bit() {
        let controller = HeadlessController::new();
        let mut window = Window::new(manager(&controller), WindowSettings::new(200, 100, "Styled"));
        window.load().unwrap();
        let id = window.native_id().unwrap();

        let changed = window.remove_style(WindowStyle::CLOSE).unwrap();
        assert_eq!(changed, WindowStyle::CLOSE);
        assert_eq!(window.style(), WindowStyle::DEFAULT & !WindowStyle::CLOSE);

        let expected = NativeOp::StyleApplied {
            id,
            style: WindowStyle::DEFAULT - WindowStyle::CLOSE,
            changed: WindowStyle::CLOSE,
        };
        assert!(controller.wait_for(TIMEOUT, |ops| ops.contains(&expected)));

        // No-op change sends nothing
        assert!(window.remove_style(WindowStyle::CLOSE).unwrap().is_empty());
        window.close();
        let style_ops = controller
            .ops()
            .iter()
            .filter(|op| matches!(op, NativeOp::StyleApplied { .. }))
            .count();
        assert_eq!(style_ops, 1);
    }

    #[test]
    fn test_two_threads_load_concurrently() {
        let controller = HeadlessController::new();
        controller.set_create_delay(Duration::from_millis(25));
        let manager = manager(&controller);

        let handles: Vec<_> = ["left", "right"]
            .into_iter()
            .map(|title| {
                let manager = manager.clone();
                thread::spawn(move || {
                    let mut window = Window::new(manager, WindowSettings::new(100, 100, title));
                    window.load().map(|()| window)
                })
            })
            .collect();

        let windows: Vec<Window> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap().unwrap())
            .collect();

        assert!(windows.iter().all(|window| window.phase() == WindowPhase::Loaded));
        assert_eq!(controller.created_count(), 2);
        assert_eq!(controller.max_concurrent_creates(), 1);
        assert_eq!(manager.loaded_count(), 2);

        drop(windows);
        assert!(!manager.is_running());
        assert!(controller.live_windows().is_empty());
    }

    #[test]
    fn test_failed_load_leaves_window_unloaded() {
        let controller = HeadlessController::new();
        let mut window = Window::new(manager(&controller), WindowSettings::default());

        controller.fail_next_create();
        assert!(window.load().is_err());
        assert_eq!(window.phase(), WindowPhase::Unloaded);

        window.show().unwrap();
        assert_eq!(window.phase(), WindowPhase::Loaded);
        assert!(window.is_visible());
    }

    #[test]
    fn test_paint_event_paints_the_tree() {
        let controller = HeadlessController::new();
        let mut window = Window::new(manager(&controller), WindowSettings::new(300, 200, "Paint"));
        window.with_controls(|tree| {
            let root = tree.root();
            tree.insert_button(root, "OK", Index::LAST).unwrap();
            tree.insert(root, Control::text("hello"), Index::LAST).unwrap();
        });
        window.attach_renderer(Box::new(CommandRenderer::new()), Arc::new(FlatSkin::default()));
        window.show().unwrap();
        let id = window.native_id().unwrap();

        controller.request_paint(id);
        controller.request_paint(id);
        let deadline = std::time::Instant::now() + TIMEOUT;
        while window.frames_painted() < 2 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(window.frames_painted(), 2);
    }

    #[test]
    fn test_user_resize_and_close_request() {
        let controller = HeadlessController::new();
        let mut window = Window::new(manager(&controller), WindowSettings::new(300, 200, "Events"));
        window.load().unwrap();
        let id = window.native_id().unwrap();

        controller.user_resize(id, 400, 250);
        controller.request_close(id);
        let deadline = std::time::Instant::now() + TIMEOUT;
        while !window.close_requested() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(window.close_requested());
        assert_eq!(window.size(), (400, 250));
    }

    #[test]
    fn test_close_destroys_native_window() {
        let controller = HeadlessController::new();
        let manager = manager(&controller);
        let mut window = Window::new(manager.clone(), WindowSettings::default());
        window.show().unwrap();
        let id = window.native_id().unwrap();

        window.close();
        assert_eq!(window.phase(), WindowPhase::Destroyed);
        assert!(controller.ops().contains(&NativeOp::Destroyed(id)));
        assert!(!manager.is_running());

        assert_eq!(window.load(), Err(WindowError::Destroyed));
        assert_eq!(window.set_title("late"), Err(WindowError::Destroyed));
        window.close();
    }
}
