//! Thin binary wiring the engine to a live TTY: one container that echoes
//! keystrokes, quit on Escape or Ctrl+C.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use container_stage::container::DrawCommand;
use container_stage::events::RoutedEvent;
use container_stage::input::{ChannelByteSource, InputDecoder, StdinReader};
use container_stage::renderer::{terminal_size, ResizeWatcher};
use container_stage::style::StyleAttributes;
use container_stage::{EngineConfig, HidCode, RenderCoordinator};

fn main() -> container_stage::Result<()> {
    env_logger::init();

    let (width, height) = terminal_size().unwrap_or((80, 24));
    let config = EngineConfig::default();
    let coordinator = Arc::new(RenderCoordinator::new(config));
    coordinator.initialize_terminal()?;

    let container = coordinator.create_container("demo", "/demo", "main", width, height);
    container.request_show();

    let shutdown = Arc::new(AtomicBool::new(false));

    let (tx, rx) = mpsc::channel();
    let _stdin_reader = StdinReader::spawn(tx)?;

    let container_for_input = container.clone();
    let shutdown_for_input = shutdown.clone();
    std::thread::Builder::new()
        .name("container-stage-input".to_string())
        .spawn(move || {
            let mut source = ChannelByteSource::new(rx);
            let mut decoder = InputDecoder::new();
            let shutdown_cb = shutdown_for_input.clone();
            decoder.on_shutdown(move || shutdown_cb.store(true, Ordering::SeqCst));

            decoder.run(&mut source, |event| match event {
                RoutedEvent::KeyDown(HidCode::Escape, _) => {
                    shutdown_for_input.store(true, Ordering::SeqCst);
                }
                RoutedEvent::KeyChar(codepoint, _) => {
                    if let Some(ch) = char::from_u32(codepoint) {
                        container_for_input.execute(DrawCommand::Print {
                            text: ch.to_string(),
                            style: StyleAttributes::NORMAL,
                            newline: false,
                        });
                    }
                }
                _ => {}
            });
        })
        .expect("failed to spawn input thread");

    let coordinator_for_resize = coordinator.clone();
    let mut resize_watcher = ResizeWatcher::spawn(
        config.resize_poll_interval,
        config.signal_test_window,
        config.resize_debounce,
        move |w, h| coordinator_for_resize.on_resize(w, h),
    );

    coordinator.run();

    while !shutdown.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(50));
    }

    resize_watcher.stop();
    coordinator.stop();
    coordinator.shutdown_terminal()?;
    Ok(())
}
