//! Text drawn on top of the shapes, laid out and rendered with egui.

use winit::{event::WindowEvent, window::Window};

use crate::{
    color::Rgb,
    graphics::{Frame, Renderer},
};

/// Where the top-left corner of the text goes, in points.
const TEXT_POS: egui::Pos2 = egui::pos2(10.0, 10.0);

pub struct Overlay {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    text_color: egui::Color32,
    font_size: f32,
}

impl Overlay {
    pub fn new(window: &Window, renderer: &Renderer, text_color: Rgb, font_size: f32) -> Self {
        let device = Renderer::device();
        let ctx = egui::Context::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(renderer.window_scale_factor() as f32),
            Some(device.limits().max_texture_dimension_2d as usize),
        );
        let renderer = egui_wgpu::Renderer::new(device, renderer.swapchain_format(), None, 1);
        Self {
            ctx,
            state,
            renderer,
            text_color: text_color.into(),
            font_size,
        }
    }

    /// Let egui track window state such as the scale factor.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) {
        // the game loop redraws every frame, so egui's repaint hint is not needed
        let _response = self.state.on_window_event(window, event);
    }

    /// Draw a line of text over whatever is already in the frame.
    pub fn draw(&mut self, text: &str, window: &Window, frame: &mut Frame) {
        let raw_input = self.state.take_egui_input(window);
        let (color, size) = (self.text_color, self.font_size);
        let output = self.ctx.run(raw_input, |ctx| {
            egui::Area::new(egui::Id::new("overlay text"))
                .fixed_pos(TEXT_POS)
                .show(ctx, |ui| {
                    ui.label(egui::RichText::new(text).color(color).size(size));
                });
        });
        self.state
            .handle_platform_output(window, output.platform_output);

        let paint_jobs = self.ctx.tessellate(output.shapes, output.pixels_per_point);
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [frame.target_size.0, frame.target_size.1],
            pixels_per_point: output.pixels_per_point,
        };

        let device = Renderer::device();
        let queue = Renderer::queue();
        for (id, delta) in &output.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }
        let uploads =
            self.renderer
                .update_buffers(device, queue, &mut frame.encoder, &paint_jobs, &screen);
        frame.extra_commands.extend(uploads);

        {
            let mut pass = frame.pass("overlay", wgpu::LoadOp::Load);
            self.renderer.render(&mut pass, &paint_jobs, &screen);
        }

        for id in &output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}
