// PageMark services
// Services provide supporting behaviour: settings, lifecycle hooks, the
// auto-save debounce and scrollbar indicator geometry.

pub mod auto_save_scheduler;
pub mod lifecycle;
pub mod scrollbar_mapping;
pub mod settings_engine;
