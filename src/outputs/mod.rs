pub mod phrases;
pub mod renderer;
pub mod text;
pub mod voice;

pub use renderer::{RenderOutcome, ResponseRenderer};
pub use text::Screen;
