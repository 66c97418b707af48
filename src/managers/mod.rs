// PageMark state managers
// Managers own marker state: the per-page repository and agent, the
// store-wide library, the popup surface and keyboard shortcuts.

pub mod control_surface;
pub mod marker_library;
pub mod marker_repository;
pub mod page_agent;
pub mod shortcut_manager;
