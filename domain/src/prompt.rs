pub use entity::prompts::Model;
pub use entity_api::prompt::find_active;
