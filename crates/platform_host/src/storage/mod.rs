//! Persistence contracts: the selected-app table and namespace-scoped preferences.

pub mod prefs;
pub mod selected_apps;
