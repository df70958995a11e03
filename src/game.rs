//! Tools for creating a window and starting a managed game loop.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowBuilder},
};

use crate::graphics::{Frame, Renderer, RendererInitError};

// time snapping technique from Tyler Glaiel's blog post
// https://medium.com/@tglaiel/how-to-make-your-game-run-at-60fps-24c61210fe75
const NANOS_120FPS: u128 = 1_000_000_000 / 120;
const NANOS_60FPS: u128 = 1_000_000_000 / 60;
const NANOS_30FPS: u128 = 1_000_000_000 / 30;
const NANOS_20FPS: u128 = 1_000_000_000 / 20;
const NANOS_15FPS: u128 = 1_000_000_000 / 15;
const SNAP_THRESHOLD: u128 = 200_000;

const MAX_ACC_VALUE: u128 = 1_000_000_000 / 8;

fn should_snap(dt: u128, target: u128) -> bool {
    if dt < target {
        target - dt < SNAP_THRESHOLD
    } else {
        dt - target < SNAP_THRESHOLD
    }
}

/// Fixed-rate tick timing with an accumulator.
#[derive(Clone, Copy, Debug)]
struct FrameClock {
    nanos_per_frame: u128,
    acc: u128,
}

impl FrameClock {
    fn new(fps: u32) -> Self {
        Self {
            nanos_per_frame: 1_000_000_000 / u128::from(fps.max(1)),
            acc: 0,
        }
    }

    /// Given the time since the last frame started,
    /// return how many ticks to run now, or `None` if it's too early for a frame.
    fn ticks(&mut self, elapsed_nanos: u128) -> Option<u32> {
        // if vsynced, pretend frame timing is exact (see blog post mentioned above)
        let mut dt_nanos = elapsed_nanos;
        for target in [
            NANOS_120FPS,
            NANOS_60FPS,
            NANOS_30FPS,
            NANOS_20FPS,
            NANOS_15FPS,
        ] {
            if should_snap(dt_nanos, target) {
                dt_nanos = target;
                self.acc = 0;
                break;
            }
        }

        // if we're going too fast just wait, otherwise run as many ticks
        // as have been passed since last update and draw once
        if dt_nanos < self.nanos_per_frame - self.acc {
            return None;
        }

        // limit acc to prevent spiral of death
        self.acc = (self.acc + dt_nanos).min(MAX_ACC_VALUE);
        let mut ticks = 0;
        while self.acc >= self.nanos_per_frame {
            self.acc -= self.nanos_per_frame;
            ticks += 1;
        }
        Some(ticks)
    }

    /// How long the current frame should last, corrected by the drift in the accumulator.
    fn target_frame_nanos(&self) -> u128 {
        self.nanos_per_frame - self.acc
    }
}

fn is_quit_press(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed && is_quit_key(event.physical_key)
}

/// Escape or Q, matched by physical key position.
fn is_quit_key(key: PhysicalKey) -> bool {
    matches!(key, PhysicalKey::Code(KeyCode::Escape | KeyCode::KeyQ))
}

/// An error that stopped the game from starting or running.
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    #[error("Failed to create event loop")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("Failed to create window")]
    Window(#[from] winit::error::OsError),
    #[error("Failed to initialize renderer")]
    Renderer(#[from] RendererInitError),
    #[error("Ran out of GPU memory")]
    OutOfMemory,
}

/// A Game manages the global resources a game needs like a window and a graphics renderer
/// and handles timing of the game loop.
pub struct Game {
    window: Arc<Window>,
    renderer: Renderer,
    fps: u32,
    events: EventLoop<()>,
}

impl Game {
    /// Create the window and renderer.
    ///
    /// This does not immediately start the game, since the state
    /// may need the renderer to initialize some resources first.
    pub fn init(fps: u32, window_b: WindowBuilder) -> Result<Self, GameError> {
        let events = EventLoop::new()?;
        let window = Arc::new(window_b.build(&events)?);
        let renderer = futures::executor::block_on(Renderer::init(window.clone()))?;
        Ok(Game {
            window,
            renderer,
            fps,
            events,
        })
    }

    #[inline]
    pub fn window(&self) -> &Window {
        &self.window
    }

    #[inline]
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Begin the game loop.
    /// Returns when the window is closed or Escape or Q is pressed.
    pub fn run<State: GameState>(self, mut state: State) -> Result<(), GameError> {
        let Game {
            window,
            mut renderer,
            fps,
            events,
        } = self;

        let mut clock = FrameClock::new(fps);
        let mut frame_start_t = Instant::now();
        let mut quit_requested = false;
        let mut fatal: Option<GameError> = None;

        events.run(|event, elwt| match event {
            Event::AboutToWait => {
                if quit_requested {
                    elwt.exit();
                    return;
                }

                let Some(ticks) = clock.ticks(frame_start_t.elapsed().as_nanos()) else {
                    let next_frame_t =
                        frame_start_t + Duration::from_nanos(clock.target_frame_nanos() as u64);
                    elwt.set_control_flow(ControlFlow::WaitUntil(next_frame_t));
                    return;
                };
                frame_start_t = Instant::now();

                for _ in 0..ticks {
                    state.tick();
                }

                match renderer.begin_frame() {
                    Ok(mut frame) => {
                        state.draw(&mut frame, &window);
                        renderer.present_frame(frame);
                    }
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        log::warn!("surface lost or outdated, reconfiguring");
                        renderer.reconfigure();
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("out of GPU memory");
                        fatal = Some(GameError::OutOfMemory);
                        elwt.exit();
                        return;
                    }
                    Err(err) => log::warn!("skipping frame: {}", err),
                }

                let nanos_this_frame = frame_start_t.elapsed().as_nanos();
                let target_frame_duration = clock.target_frame_nanos();
                // sleep till next frame if we have time to kill
                if nanos_this_frame < target_frame_duration {
                    let next_frame_t =
                        frame_start_t + Duration::from_nanos(target_frame_duration as u64);
                    elwt.set_control_flow(ControlFlow::WaitUntil(next_frame_t));
                } else {
                    elwt.set_control_flow(ControlFlow::Poll);
                }
            }
            Event::WindowEvent { event, .. } => {
                state.window_event(&window, &event);
                match event {
                    WindowEvent::CloseRequested => quit_requested = true,
                    WindowEvent::KeyboardInput { event, .. } if is_quit_press(&event) => {
                        quit_requested = true
                    }
                    WindowEvent::Resized(new_size) => {
                        log::debug!("window resized to {}x{}", new_size.width, new_size.height);
                        renderer.resize_swap_chain(new_size);
                        state.resized(new_size);
                    }
                    WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                        renderer.set_scale_factor(scale_factor);
                    }
                    _ => (),
                }
            }
            _ => (),
        })?;

        match fatal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// The state of a game.
pub trait GameState {
    /// Advance the game forward by one fixed timestep.
    fn tick(&mut self);
    /// Render the game into a frame.
    fn draw(&mut self, frame: &mut Frame, window: &Window);
    /// React to the window changing size.
    fn resized(&mut self, _size: PhysicalSize<u32>) {}
    /// Observe a raw window event, e.g. to feed it to a UI library.
    fn window_event(&mut self, _window: &Window, _event: &WindowEvent) {}
}

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapping_is_symmetric() {
        assert!(should_snap(NANOS_60FPS + 100_000, NANOS_60FPS));
        assert!(should_snap(NANOS_60FPS - 100_000, NANOS_60FPS));
        assert!(!should_snap(NANOS_60FPS + 300_000, NANOS_60FPS));
    }

    #[test]
    fn too_early_frames_run_nothing() {
        let mut clock = FrameClock::new(80);
        assert_eq!(clock.ticks(1_000_000), None);
    }

    #[test]
    fn one_tick_per_frame_at_target_rate() {
        let mut clock = FrameClock::new(80);
        let npf = clock.nanos_per_frame;
        for _ in 0..10 {
            assert_eq!(clock.ticks(npf), Some(1));
        }
        assert_eq!(clock.acc, 0);
    }

    #[test]
    fn vsync_snaps_and_resets_drift() {
        let mut clock = FrameClock::new(60);
        assert_eq!(clock.ticks(NANOS_60FPS + 150_000), Some(1));
        assert_eq!(clock.acc, 0);
        assert_eq!(clock.target_frame_nanos(), NANOS_60FPS);
    }

    #[test]
    fn long_frames_catch_up_but_not_forever() {
        let mut clock = FrameClock::new(80);
        let npf = clock.nanos_per_frame;
        assert_eq!(clock.ticks(3 * npf + 1_000_000), Some(3));
        // a multi-second hitch is capped at an eighth of a second of ticks
        assert_eq!(clock.ticks(5_000_000_000), Some((MAX_ACC_VALUE / npf) as u32));
        assert!(clock.acc < npf);
    }

    #[test]
    fn escape_and_q_quit() {
        use winit::keyboard::NativeKeyCode;

        assert!(is_quit_key(PhysicalKey::Code(KeyCode::Escape)));
        assert!(is_quit_key(PhysicalKey::Code(KeyCode::KeyQ)));
        for key in [KeyCode::KeyW, KeyCode::Space, KeyCode::Enter, KeyCode::F4] {
            assert!(!is_quit_key(PhysicalKey::Code(key)));
        }
        assert!(!is_quit_key(PhysicalKey::Unidentified(
            NativeKeyCode::Unidentified
        )));
    }
}
