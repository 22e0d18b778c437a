pub use entity::usage_tracking::Model;
pub use entity_api::usage::record;
