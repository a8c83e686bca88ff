//! Repository traits for metadata operations.

pub mod textures;

pub use textures::TextureRepo;
