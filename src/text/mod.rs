pub mod atlas;
pub mod batch;
pub mod layout;
pub mod metrics;
pub mod placement;
pub mod renderer;

pub use atlas::FontAtlas;
pub use batch::{GlyphBatcher, GlyphVertex};
pub use metrics::{AtlasId, MetricsProvider};
pub use renderer::TextRenderer;
