pub use entity::behaviors::Model;
pub use entity_api::behavior::{
    create, find_active_by_ids, find_active_for_account, find_by_id, find_for_account, update,
};
