pub mod renderer;
pub use renderer::{Frame, Renderer, RendererInitError};

pub mod util;

mod shape;
pub use shape::{outline_verts, ShapeRenderer, Vertex, CIRCLE_SEGMENTS};

mod overlay;
pub use overlay::Overlay;
