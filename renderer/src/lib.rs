pub mod descriptor;
pub mod html;
pub mod pipeline;
pub mod render;

pub use descriptor::{Descriptor, Widget};
pub use pipeline::{Report, process_block, process_document, process_documents};
pub use render::render;
