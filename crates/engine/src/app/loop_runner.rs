use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{error, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::config::Settings;

use super::input::{KeyStates, KeyTransition};
use super::metrics::MetricsAccumulator;
use super::{EngineContext, Game, GameError, Key, Renderer};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub settings: Settings,
    pub asset_root: PathBuf,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("failed to load game: {0}")]
    GameLoad(#[source] GameError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, mut game: Box<dyn Game>) -> Result<(), AppError> {
    let LoopConfig {
        settings,
        asset_root,
    } = config;
    let display_size = settings.display_size();
    let window_size = settings.window_size();
    let window_title = settings.window_title.clone();
    let max_frame_delta =
        normalize_non_zero_duration(settings.max_frame_delta(), Duration::from_millis(250));
    let metrics_log_interval =
        normalize_non_zero_duration(settings.metrics_log_interval(), Duration::from_secs(1));
    let effective_render_cap = settings.render_fps_cap();
    let render_frame_target = target_frame_duration(effective_render_cap);

    let mut ctx = EngineContext::new(settings, asset_root);
    game.load(&mut ctx).map_err(AppError::GameLoad)?;
    info!(
        layers = ctx.display().layer_count(),
        timers = ctx.scheduler().len(),
        "game_loaded"
    );

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(window_title)
            .with_inner_size(LogicalSize::new(
                window_size.width as f64,
                window_size.height as f64,
            ))
            .with_resizable(false)
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer =
        Renderer::new(Arc::clone(&window), display_size).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    info!(
        display_width = display_size.width,
        display_height = display_size.height,
        window_width = window_size.width,
        window_height = window_size.height,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        "loop_config"
    );

    let mut keys = KeyStates::default();
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut shut_down = false;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    match keys.handle(event.physical_key, event.state) {
                        Some(KeyTransition::Pressed(key)) => {
                            game.key_down(key, &mut ctx);
                            if key == Key::Quit {
                                ctx.request_quit();
                            }
                        }
                        Some(KeyTransition::Released(key)) => game.key_up(key, &mut ctx),
                        None => {}
                    }
                    if ctx.quit_requested() {
                        info!(reason = "quit_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;
                    let frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);
                    if frame_dt < raw_frame_dt {
                        warn!(
                            raw_frame_dt_ms = raw_frame_dt.as_millis() as u64,
                            clamped_ms = frame_dt.as_millis() as u64,
                            "frame_delta_clamped"
                        );
                    }

                    let fires = ctx.step_frame(game.as_mut(), frame_dt);

                    // Single sleep point for render pacing.
                    let elapsed_since_last_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep =
                        compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    if let Err(error) = renderer.present(ctx.frame()) {
                        error!(error = %error, "renderer_present_failed");
                        window_target.exit();
                    }
                    last_present_instant = Instant::now();
                    metrics_accumulator.record_frame(raw_frame_dt, fires);

                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                        info!(
                            fps = snapshot.fps,
                            fires_per_second = snapshot.fires_per_second,
                            frame_time_ms = snapshot.frame_time_ms,
                            timers = ctx.scheduler().len(),
                            layers = ctx.display().layer_count(),
                            "loop_metrics"
                        );
                    }

                    if ctx.quit_requested() {
                        info!(reason = "game_request", "shutdown_requested");
                        window_target.exit();
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                if !shut_down {
                    shut_down = true;
                    game.shutdown(&mut ctx);
                    ctx.scheduler().clear();
                    info!("shutdown");
                }
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        let raw_frame_dt = Duration::from_millis(600);
        assert_eq!(
            clamp_frame_delta(raw_frame_dt, max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn clamp_frame_delta_keeps_normal_frame() {
        let raw_frame_dt = Duration::from_millis(16);
        assert_eq!(
            clamp_frame_delta(raw_frame_dt, Duration::from_millis(250)),
            raw_frame_dt
        );
    }

    #[test]
    fn zero_durations_fall_back() {
        assert_eq!(
            normalize_non_zero_duration(Duration::ZERO, Duration::from_secs(1)),
            Duration::from_secs(1)
        );
        assert_eq!(
            normalize_non_zero_duration(Duration::from_millis(5), Duration::from_secs(1)),
            Duration::from_millis(5)
        );
    }

    #[test]
    fn cap_sleep_fills_remaining_frame_budget() {
        let target = target_frame_duration(Some(50));
        assert_eq!(target, Some(Duration::from_millis(20)));
        assert_eq!(
            compute_cap_sleep(Duration::from_millis(5), target),
            Duration::from_millis(15)
        );
        assert_eq!(
            compute_cap_sleep(Duration::from_millis(25), target),
            Duration::ZERO
        );
        assert_eq!(
            compute_cap_sleep(Duration::from_millis(5), None),
            Duration::ZERO
        );
    }

    #[test]
    fn render_cap_formats_off_when_disabled() {
        assert_eq!(format_render_cap(None), "off");
        assert_eq!(format_render_cap(Some(60)), "60");
    }

    #[test]
    fn game_load_failure_keeps_its_source() {
        let error = AppError::GameLoad("no farm data".into());
        assert_eq!(error.to_string(), "failed to load game: no farm data");
        assert!(std::error::Error::source(&error).is_some());
    }
}
