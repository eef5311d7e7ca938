//! Database query operations organized by entity

pub mod stories;

// Re-export commonly used query functions
pub use stories::{
    clear_image_paths, delete_stories, delete_story, get_story, insert_story, list_stories,
    update_story,
};
