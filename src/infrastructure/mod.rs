pub mod logging;
pub mod preference_store;
