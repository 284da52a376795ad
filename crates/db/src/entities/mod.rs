//! `SeaORM` entity definitions for the Notara schema.

pub mod enterprises;
pub mod groups;
pub mod periods;
pub mod release_images;
pub mod releases;
pub mod users;
