//! GLFW platform backend
//!
//! GLFW has no window classes, so class registration only records the
//! name for validation. Its safe API has no cross-thread way to post an
//! empty event, so the waker does nothing and `wait_events` returns after
//! at most one poll interval.

use super::{NativeId, NativeWindowDesc, Platform, PlatformError, PlatformEvent, PlatformFactory, Waker};
use crate::window::WindowStyle;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Creates [`GlfwPlatform`]s on the manager thread
#[derive(Debug, Clone)]
pub struct GlfwPlatformFactory {
    poll_interval: Duration,
}

impl GlfwPlatformFactory {
    /// Factory whose platforms wait at most `poll_interval` per event wait
    pub const fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }
}

impl PlatformFactory for GlfwPlatformFactory {
    fn create(&self) -> Result<Box<dyn Platform>, PlatformError> {
        let glfw = glfw::init(glfw::log_errors)
            .map_err(|e| PlatformError::InitializationFailed(format!("{:?}", e)))?;

        log::info!("GLFW platform initialized");
        Ok(Box::new(GlfwPlatform {
            glfw,
            windows: HashMap::new(),
            classes: HashSet::new(),
            poll_interval: self.poll_interval,
        }))
    }
}

struct NativeWindow {
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

/// GLFW-backed platform; must stay on the thread that created it
pub struct GlfwPlatform {
    glfw: glfw::Glfw,
    windows: HashMap<NativeId, NativeWindow>,
    classes: HashSet<String>,
    poll_interval: Duration,
}

struct NoopWaker;

impl Waker for NoopWaker {
    fn wake(&self) {}
}

impl GlfwPlatform {
    fn window_mut(&mut self, id: NativeId) -> Option<&mut glfw::PWindow> {
        let window = self.windows.get_mut(&id).map(|native| &mut native.window);
        if window.is_none() {
            log::warn!("GLFW: unknown native window {:?}", id);
        }
        window
    }
}

fn to_glfw_size(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl Platform for GlfwPlatform {
    fn register_window_class(&mut self, name: &str) -> Result<(), PlatformError> {
        self.classes.insert(name.to_string());
        Ok(())
    }

    fn unregister_window_class(&mut self, name: &str) {
        self.classes.remove(name);
    }

    fn create_window(&mut self, id: NativeId, desc: &NativeWindowDesc) -> Result<(), PlatformError> {
        if !self.classes.contains(&desc.class) {
            return Err(PlatformError::CreationFailed(format!(
                "window class '{}' is not registered",
                desc.class
            )));
        }

        self.glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        self.glfw.window_hint(glfw::WindowHint::Visible(false));
        self.glfw.window_hint(glfw::WindowHint::Decorated(desc.style.is_decorated()));
        self.glfw
            .window_hint(glfw::WindowHint::Resizable(desc.style.contains(WindowStyle::RESIZE)));

        let (mut window, events) = self
            .glfw
            .create_window(desc.width, desc.height, &desc.title, glfw::WindowMode::Windowed)
            .ok_or_else(|| PlatformError::CreationFailed(desc.title.clone()))?;

        window.set_refresh_polling(true);
        window.set_size_polling(true);
        window.set_close_polling(true);

        self.windows.insert(id, NativeWindow { window, events });
        log::debug!("GLFW window {:?} created ({}x{})", id, desc.width, desc.height);
        Ok(())
    }

    fn destroy_window(&mut self, id: NativeId) {
        // PWindow closes the native window on drop
        if self.windows.remove(&id).is_some() {
            log::debug!("GLFW window {:?} destroyed", id);
        }
    }

    fn set_visible(&mut self, id: NativeId, visible: bool) {
        if let Some(window) = self.window_mut(id) {
            if visible {
                window.show();
            } else {
                window.hide();
            }
        }
    }

    fn set_title(&mut self, id: NativeId, title: &str) {
        if let Some(window) = self.window_mut(id) {
            window.set_title(title);
        }
    }

    fn set_size(&mut self, id: NativeId, width: u32, height: u32) {
        if let Some(window) = self.window_mut(id) {
            window.set_size(to_glfw_size(width), to_glfw_size(height));
        }
    }

    fn apply_style(&mut self, id: NativeId, style: WindowStyle, changed: WindowStyle) {
        let Some(window) = self.window_mut(id) else {
            return;
        };

        if changed.intersects(WindowStyle::TITLE_BAR | WindowStyle::BORDER) {
            window.set_decorated(style.is_decorated());
        }
        if changed.contains(WindowStyle::RESIZE) {
            window.set_resizable(style.contains(WindowStyle::RESIZE));
        }

        let unsupported = changed
            - (WindowStyle::TITLE_BAR | WindowStyle::BORDER | WindowStyle::RESIZE);
        if !unsupported.is_empty() {
            log::debug!("GLFW cannot change {:?} on window {:?}", unsupported, id);
        }
    }

    fn wait_events(&mut self, events: &mut Vec<PlatformEvent>) {
        self.glfw.wait_events_timeout(self.poll_interval.as_secs_f64());

        for (&id, native) in &mut self.windows {
            for (_, event) in glfw::flush_messages(&native.events) {
                match event {
                    glfw::WindowEvent::Refresh => events.push(PlatformEvent::Paint(id)),
                    glfw::WindowEvent::Size(width, height) => events.push(PlatformEvent::Resized {
                        id,
                        width: u32::try_from(width).unwrap_or(0),
                        height: u32::try_from(height).unwrap_or(0),
                    }),
                    glfw::WindowEvent::Close => {
                        // Closing is the application's decision
                        native.window.set_should_close(false);
                        events.push(PlatformEvent::CloseRequested(id));
                    }
                    _ => {}
                }
            }
        }

        if events.is_empty() {
            events.push(PlatformEvent::Wake);
        }
    }

    fn waker(&self) -> Arc<dyn Waker> {
        Arc::new(NoopWaker)
    }
}
