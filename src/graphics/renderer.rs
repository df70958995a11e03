use std::sync::{Arc, OnceLock};

use winit::window::Window;

// there is only ever one wgpu context,
// and since the device and queue are frequently needed to create resources,
// we store those globally here
// so that they don't have to be ferried around constantly

static DEVICE: OnceLock<wgpu::Device> = OnceLock::new();
static QUEUE: OnceLock<wgpu::Queue> = OnceLock::new();

/// A Renderer manages the surface of the window and the frames drawn to it.
pub struct Renderer {
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    window_scale_factor: f64,
}

/// An error that occurred during renderer initialization.
#[derive(thiserror::Error, Debug)]
pub enum RendererInitError {
    #[error("Failed to create surface")]
    CreateSurfaceError(#[from] wgpu::CreateSurfaceError),
    #[error("Adapter request failed")]
    RequestAdapterError,
    #[error("Device request failed")]
    RequestDeviceError(#[from] wgpu::RequestDeviceError),
    #[error("Surface has no formats supported by the adapter")]
    IncompatibleSurface,
    #[error("Another Renderer already existed")]
    AlreadyInitialized,
}

/// A frame being drawn.
///
/// Obtained from [`Renderer::begin_frame`] and handed back to
/// [`Renderer::present_frame`] once everything has been recorded.
pub struct Frame {
    surface: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
    /// Size of the frame in pixels.
    pub target_size: (u32, u32),
    /// Command buffers submitted before the main encoder,
    /// e.g. buffer uploads recorded by egui.
    pub extra_commands: Vec<wgpu::CommandBuffer>,
}

impl Frame {
    /// Begin a render pass drawing into the window.
    pub fn pass(&mut self, label: &str, load: wgpu::LoadOp<wgpu::Color>) -> wgpu::RenderPass<'_> {
        self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        })
    }
}

impl Renderer {
    /// Create a Renderer.
    /// The [`Game`][crate::game::Game] API does this automatically.
    pub(crate) async fn init(window: Arc<Window>) -> Result<Self, RendererInitError> {
        let window_size = window.inner_size();
        let window_scale_factor = window.scale_factor();

        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            })
            .await
            .ok_or(RendererInitError::RequestAdapterError)?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await?;

        let capabilities = surface.get_capabilities(&adapter);
        // shape colors are converted to linear, so prefer a format that converts them back
        let format = capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| capabilities.formats.first().copied())
            .ok_or(RendererInitError::IncompatibleSurface)?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: window_size.width.max(1),
            height: window_size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode: capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &surface_config);

        DEVICE
            .set(device)
            .map_err(|_| RendererInitError::AlreadyInitialized)?;
        QUEUE
            .set(queue)
            .map_err(|_| RendererInitError::AlreadyInitialized)?;

        Ok(Renderer {
            surface,
            surface_config,
            window_scale_factor,
        })
    }

    /// Get a reference to the the global device instance.
    /// # Panics
    /// This function panics if the renderer hasn't been initialized yet,
    /// i.e. if [`Game::init`][crate::Game::init] hasn't been called yet.
    #[inline]
    pub fn device<'a>() -> &'a wgpu::Device {
        DEVICE.get().expect("Renderer has not been initialized yet")
    }

    /// Get a reference to the the global queue instance.
    /// # Panics
    /// This function panics if the renderer hasn't been initialized yet,
    /// i.e. if [`Game::init`][crate::Game::init] hasn't been called yet.
    #[inline]
    pub fn queue<'a>() -> &'a wgpu::Queue {
        QUEUE.get().expect("Renderer has not been initialized yet")
    }

    /// Change the size of the frames drawn to the window.
    /// This is called automatically by the gameloop when the window size changes.
    pub(crate) fn resize_swap_chain(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        // a minimized window reports zero size, which can't be configured
        if new_size.width == 0 || new_size.height == 0 || new_size == self.window_size() {
            return;
        }
        self.surface_config.width = new_size.width;
        self.surface_config.height = new_size.height;
        self.reconfigure();
    }

    /// Apply the current surface configuration again, e.g. after the surface was lost.
    pub(crate) fn reconfigure(&mut self) {
        self.surface.configure(Self::device(), &self.surface_config);
    }

    pub(crate) fn set_scale_factor(&mut self, scale_factor: f64) {
        self.window_scale_factor = scale_factor;
    }

    #[inline]
    pub fn swapchain_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    /// Get the size of the window this Renderer draws to in pixels.
    #[inline]
    pub fn window_size(&self) -> winit::dpi::PhysicalSize<u32> {
        winit::dpi::PhysicalSize::new(self.surface_config.width, self.surface_config.height)
    }

    /// Get the scale factor of the window this Renderer draws to.
    #[inline]
    pub fn window_scale_factor(&self) -> f64 {
        self.window_scale_factor
    }

    /// Start drawing a frame.
    pub fn begin_frame(&mut self) -> Result<Frame, wgpu::SurfaceError> {
        let surface = self.surface.get_current_texture()?;
        let view = surface
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = Self::device().create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame"),
        });
        Ok(Frame {
            surface,
            view,
            encoder,
            target_size: (self.surface_config.width, self.surface_config.height),
            extra_commands: Vec::new(),
        })
    }

    /// Submit everything recorded into the frame and display it.
    /// Called automatically at the end of the frame by [`Game`][crate::Game].
    pub(crate) fn present_frame(&mut self, frame: Frame) {
        let Frame {
            surface,
            view,
            encoder,
            extra_commands,
            ..
        } = frame;
        Self::queue().submit(extra_commands.into_iter().chain(Some(encoder.finish())));
        drop(view);
        surface.present();
    }
}
