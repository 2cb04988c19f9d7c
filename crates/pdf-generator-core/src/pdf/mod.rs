mod assembler;
mod page;

pub use assembler::DocumentAssembler;
pub use page::PageImage;
