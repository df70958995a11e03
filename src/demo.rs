//! The windowed program: a [`Simulation`] drawn every frame,
//! with the strike/struck counter on top.

use winit::{dpi::PhysicalSize, event::WindowEvent, window::Window};

use crate::{
    game::{Game, GameState},
    graphics::{Frame, Overlay, ShapeRenderer},
    sim::Simulation,
};

pub struct Demo {
    sim: Simulation,
    shapes: ShapeRenderer,
    overlay: Option<Overlay>,
}

impl Demo {
    pub fn new(sim: Simulation, game: &Game) -> Self {
        let shapes = ShapeRenderer::new(game.renderer());
        let config = sim.config();
        let overlay = config.show_counter.then(|| {
            Overlay::new(
                game.window(),
                game.renderer(),
                config.text_color,
                config.font_size,
            )
        });
        Self {
            sim,
            shapes,
            overlay,
        }
    }
}

impl GameState for Demo {
    fn tick(&mut self) {
        self.sim.tick();
    }

    fn draw(&mut self, frame: &mut Frame, window: &Window) {
        self.shapes.draw(self.sim.shapes(), frame);
        if let Some(overlay) = &mut self.overlay {
            overlay.draw(&self.sim.counter_text(), window, frame);
        }
    }

    fn resized(&mut self, size: PhysicalSize<u32>) {
        if size.width > 0 && size.height > 0 {
            self.sim.resize(size.width as f32, size.height as f32);
        }
    }

    fn window_event(&mut self, window: &Window, event: &WindowEvent) {
        if let Some(overlay) = &mut self.overlay {
            overlay.on_window_event(window, event);
        }
    }
}
