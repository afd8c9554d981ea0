//! Toolkit context
//!
//! A [`Context`] owns a master renderer, a skin and the windows attached to
//! it. Each attached window paints with its own renderer allocated from the
//! master. Renderer and skin default to [`CommandRenderer`] and a
//! [`FlatSkin`] built from the configuration, created on first use.

use crate::config::{ToolkitConfig, WindowSettings};
use crate::platform::{HeadlessController, PlatformFactory};
use crate::render::{CommandRenderer, FlatSkin, Renderer, Skin};
use crate::window::{Window, WindowError, WindowManager};
use slotmap::SlotMap;
use std::sync::Arc;
use thiserror::Error;

slotmap::new_key_type! {
    /// Handle to a window attached to a context
    pub struct WindowId;
}

/// Context errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// The id does not name an attached window
    #[error("Unknown window {0:?}")]
    UnknownWindow(WindowId),

    /// The window failed to load
    #[error("Window error: {0}")]
    Window(#[from] WindowError),
}

/// Owner of windows, their renderers and the skin they share
pub struct Context {
    config: ToolkitConfig,
    manager: WindowManager,
    renderer: Option<Box<dyn Renderer>>,
    skin: Option<Arc<dyn Skin>>,
    windows: SlotMap<WindowId, Window>,
}

impl Context {
    /// Context with default configuration on the given platform
    pub fn new(factory: Arc<dyn PlatformFactory>) -> Self {
        Self::with_config(factory, ToolkitConfig::default())
    }

    /// Context with explicit configuration
    pub fn with_config(factory: Arc<dyn PlatformFactory>, config: ToolkitConfig) -> Self {
        let manager = WindowManager::new(factory, config.manager.clone());
        Self {
            config,
            manager,
            renderer: None,
            skin: None,
            windows: SlotMap::with_key(),
        }
    }

    /// Context on a fresh headless platform, with its controller
    pub fn headless(config: ToolkitConfig) -> (Self, HeadlessController) {
        let controller = HeadlessController::new();
        let context = Self::with_config(Arc::new(controller.factory()), config);
        (context, controller)
    }

    /// Configuration the context was created with
    pub const fn config(&self) -> &ToolkitConfig {
        &self.config
    }

    /// Manager that owns the native handles of this context's windows
    pub const fn manager(&self) -> &WindowManager {
        &self.manager
    }

    /// Replace the master renderer, returning the previous one
    ///
    /// Windows already attached keep the renderer they were given.
    pub fn add_renderer(&mut self, renderer: Box<dyn Renderer>) -> Option<Box<dyn Renderer>> {
        self.renderer.replace(renderer)
    }

    /// Take the master renderer; the default is recreated when next needed
    pub fn remove_renderer(&mut self) -> Option<Box<dyn Renderer>> {
        self.renderer.take()
    }

    /// Replace the skin, returning the previous one
    pub fn add_skin(&mut self, skin: Arc<dyn Skin>) -> Option<Arc<dyn Skin>> {
        self.skin.replace(skin)
    }

    /// Take the skin; the default is recreated when next needed
    pub fn remove_skin(&mut self) -> Option<Arc<dyn Skin>> {
        self.skin.take()
    }

    /// Master renderer, creating the default on first use
    pub fn renderer(&mut self) -> &dyn Renderer {
        &**self
            .renderer
            .get_or_insert_with(|| Box::new(CommandRenderer::new()) as Box<dyn Renderer>)
    }

    /// Skin, creating the default on first use
    pub fn skin(&mut self) -> Arc<dyn Skin> {
        let config = &self.config.skin;
        Arc::clone(
            self.skin
                .get_or_insert_with(|| Arc::new(FlatSkin::from_config(config)) as Arc<dyn Skin>),
        )
    }

    /// Attach `window`, give it a renderer of its own and load it
    ///
    /// On failure the window is dropped and the error returned.
    pub fn add_window(&mut self, mut window: Window) -> Result<WindowId, ContextError> {
        let renderer = self.renderer().allocate_new();
        let skin = self.skin();
        window.attach_renderer(renderer, skin);

        if let Err(e) = window.load() {
            log::error!("Failed to add window '{}': {}", window.title(), e);
            window.detach_renderer();
            return Err(e.into());
        }

        let id = self.windows.insert(window);
        log::info!("Window {:?} added to context ({} total)", id, self.windows.len());
        Ok(id)
    }

    /// Build a window from the configured defaults and attach it
    pub fn create_window(&mut self) -> Result<WindowId, ContextError> {
        let settings = self.config.window.clone();
        self.create_window_with(settings)
    }

    /// Build a window from `settings` and attach it
    pub fn create_window_with(&mut self, settings: WindowSettings) -> Result<WindowId, ContextError> {
        let window = Window::new(self.manager.clone(), settings);
        self.add_window(window)
    }

    /// Detach a window and release its renderer
    ///
    /// The window is handed back still loaded; dropping it closes it.
    pub fn remove_window(&mut self, id: WindowId) -> Option<Window> {
        let mut window = self.windows.remove(id)?;
        window.detach_renderer();
        log::info!("Window {:?} removed from context", id);
        Some(window)
    }

    /// Attached window
    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(id)
    }

    /// Attached window, mutably
    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.get_mut(id)
    }

    /// Attached window or [`ContextError::UnknownWindow`]
    pub fn try_window_mut(&mut self, id: WindowId) -> Result<&mut Window, ContextError> {
        self.windows.get_mut(id).ok_or(ContextError::UnknownWindow(id))
    }

    /// Number of attached windows
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Ids of all attached windows
    pub fn window_ids(&self) -> Vec<WindowId> {
        self.windows.keys().collect()
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        for (_, mut window) in self.windows.drain() {
            window.close();
        }
        log::debug!("Context dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::NativeOp;
    use crate::render::{Bitmap, RenderError, RenderInterface, TextureHandle};
    use crate::foundation::math::Rect;
    use crate::window::WindowPhase;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts allocations and loads across all its clones
    struct CountingRenderer {
        allocated: Arc<AtomicUsize>,
        inner: CommandRenderer,
    }

    impl Renderer for CountingRenderer {
        fn allocate_new(&self) -> Box<dyn Renderer> {
            self.allocated.fetch_add(1, Ordering::SeqCst);
            Box::new(Self {
                allocated: Arc::clone(&self.allocated),
                inner: CommandRenderer::new(),
            })
        }

        fn load(&mut self) -> Result<(), RenderError> {
            self.inner.load()
        }

        fn is_loaded(&self) -> bool {
            self.inner.is_loaded()
        }

        fn begin_frame(&mut self, viewport: Rect) {
            self.inner.begin_frame(viewport);
        }

        fn end_frame(&mut self) {
            self.inner.end_frame();
        }

        fn interface(&mut self) -> &mut dyn RenderInterface {
            self.inner.interface()
        }

        fn create_texture(&mut self, bitmap: &Bitmap) -> Result<TextureHandle, RenderError> {
            self.inner.create_texture(bitmap)
        }
    }

    #[test]
    fn test_each_window_gets_its_own_renderer() {
        let (mut context, _controller) = Context::headless(ToolkitConfig::default());
        let allocated = Arc::new(AtomicUsize::new(0));
        context.add_renderer(Box::new(CountingRenderer {
            allocated: Arc::clone(&allocated),
            inner: CommandRenderer::new(),
        }));

        let a = context.create_window().unwrap();
        let b = context.create_window().unwrap();

        assert_eq!(allocated.load(Ordering::SeqCst), 2);
        assert_eq!(context.window_count(), 2);
        assert!(context.window(a).unwrap().has_renderer());
        assert_eq!(context.window(b).unwrap().phase(), WindowPhase::Loaded);
    }

    #[test]
    fn test_create_window_uses_configured_defaults() {
        let mut config = ToolkitConfig::default();
        config.window = WindowSettings::new(320, 240, "Configured");
        let (mut context, controller) = Context::headless(config);

        let id = context.create_window().unwrap();
        let window = context.window(id).unwrap();
        assert_eq!(window.size(), (320, 240));
        assert_eq!(window.title(), "Configured");
        assert_eq!(controller.created_count(), 1);
    }

    #[test]
    fn test_remove_window_detaches_without_destroying() {
        let (mut context, controller) = Context::headless(ToolkitConfig::default());
        let id = context.create_window().unwrap();

        let window = context.remove_window(id).unwrap();
        assert_eq!(context.window_count(), 0);
        assert!(!window.has_renderer());
        assert_eq!(window.phase(), WindowPhase::Loaded);
        assert_eq!(controller.live_windows().len(), 1);
        assert!(context.remove_window(id).is_none());
        assert_eq!(context.try_window_mut(id).err(), Some(ContextError::UnknownWindow(id)));

        drop(window);
        assert!(controller.live_windows().is_empty());
    }

    #[test]
    fn test_failed_window_is_not_attached() {
        let (mut context, controller) = Context::headless(ToolkitConfig::default());
        controller.fail_next_create();

        let result = context.create_window();
        assert!(matches!(result, Err(ContextError::Window(WindowError::Platform(_)))));
        assert_eq!(context.window_count(), 0);
        assert!(!context.manager().is_running());
    }

    #[test]
    fn test_skin_defaults_from_config_and_can_be_replaced() {
        let mut config = ToolkitConfig::default();
        config.skin.padding = 9.0;
        let (mut context, _controller) = Context::headless(config);

        assert!((context.skin().metrics().padding - 9.0).abs() < f32::EPSILON);
        let previous = context.add_skin(Arc::new(FlatSkin::default()));
        assert!(previous.is_some());
        assert!(context.remove_skin().is_some());
        assert!(context.remove_renderer().is_none());
    }

    #[test]
    fn test_drop_closes_every_window() {
        let (mut context, controller) = Context::headless(ToolkitConfig::default());
        context.create_window().unwrap();
        context.create_window().unwrap();
        assert_eq!(controller.live_windows().len(), 2);

        drop(context);
        assert!(controller.live_windows().is_empty());
        let destroyed = controller
            .ops()
            .iter()
            .filter(|op| matches!(op, NativeOp::Destroyed(_)))
            .count();
        assert_eq!(destroyed, 2);
    }
}
