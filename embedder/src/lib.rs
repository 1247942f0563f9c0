pub mod caption;
pub mod embed;
pub mod loader;
pub mod options;
pub mod substitute;

pub use caption::normalize_captions;
pub use embed::{Embedder, template_target};
pub use loader::TemplateLoader;
pub use options::EmbedOptions;
pub use substitute::substitute_fields;
