//! Control gallery
//!
//! Builds one window with every control kind, walks a button through the
//! collapsing Empty/Single/Grid states and toggles window styles. Runs
//! headless by default; build with `--features native` for real windows.
//!
//! Usage: `gallery [config.toml|config.ron]`

use rust_gui::foundation::logging;
use rust_gui::prelude::*;
use std::time::Duration;

fn build_gallery(tree: &mut ControlTree) -> Result<ControlId, ControlError> {
    let root = tree.root();
    let column = tree.insert(root, Control::vertical_grid(), Index::LAST)?;

    tree.insert(column, Control::text("Rust GUI gallery"), Index::LAST)?;
    tree.insert_button(column, "Single label", Index::LAST)?;

    let stacked = tree.insert_button(column, "First line", Index::LAST)?;
    tree.insert(stacked, Control::text("Second line"), Index::LAST)?;

    let custom = tree.insert(
        column,
        Control::custom("swatch").with_size(ControlSize::new(Extent::Max, Extent::Fixed(48.0))),
        Index::LAST,
    )?;
    tree.set_state(custom, SkinState::Hovered);

    let disabled = tree.insert_button(column, "Disabled", Index::LAST)?;
    tree.set_state(disabled, SkinState::Disabled);

    Ok(stacked)
}

fn describe(tree: &ControlTree, button: ControlId) {
    log::info!(
        "Button {:?}: {:?} with {} children",
        button,
        tree.collapse_state(button),
        tree.child_count(button)
    );
}

#[cfg(not(feature = "native"))]
fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    while !done() {
        if std::time::Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    true
}

fn open_gallery(context: &mut Context) -> Result<(WindowId, ControlId), Box<dyn std::error::Error>> {
    let id = context.create_window()?;
    let window = context.try_window_mut(id)?;

    let stacked = window.with_controls(build_gallery)?;
    window.with_controls(|tree| describe(tree, stacked));
    window.show()?;

    let changed = window.remove_style(WindowStyle::MAXIMIZE)?;
    log::info!("Style now {:?} (changed {:?})", window.style(), changed);
    Ok((id, stacked))
}

#[cfg(not(feature = "native"))]
fn run(config: ToolkitConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (mut context, controller) = Context::headless(config);
    let (id, stacked) = open_gallery(&mut context)?;
    let window = context.try_window_mut(id)?;
    let native = window.native_id().ok_or("window has no native handle")?;

    controller.request_paint(native);
    if !wait_until(Duration::from_secs(2), || window.frames_painted() > 0) {
        log::warn!("No frame painted within two seconds");
    }

    // Collapse the stacked button back to a single label
    window.with_controls(|tree| {
        if let Some(second) = tree.child_at(stacked, Index::LAST) {
            tree.remove(stacked, second);
        }
        describe(tree, stacked);
    });

    controller.request_close(native);
    if wait_until(Duration::from_secs(2), || window.close_requested()) {
        log::info!("Close requested by the platform");
    }

    drop(context);
    log::info!("Native operations performed: {}", controller.ops().len());
    Ok(())
}

#[cfg(feature = "native")]
fn run(config: ToolkitConfig) -> Result<(), Box<dyn std::error::Error>> {
    use rust_gui::platform::glfw::GlfwPlatformFactory;
    use std::sync::Arc;

    let poll = Duration::from_millis(config.manager.event_poll_interval_ms);
    let mut context = Context::with_config(Arc::new(GlfwPlatformFactory::new(poll)), config);
    let (id, _) = open_gallery(&mut context)?;
    let window = context.try_window_mut(id)?;

    log::info!("Close the window to exit");
    while !window.close_requested() {
        std::thread::sleep(poll);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_filter("info");
    log::info!("Starting control gallery");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading configuration from {}", path);
            ToolkitConfig::load_from_file(&path)?
        }
        None => ToolkitConfig::default(),
    };

    let result = run(config);
    match &result {
        Ok(()) => log::info!("Gallery finished"),
        Err(e) => log::error!("Gallery failed: {}", e),
    }
    result
}
