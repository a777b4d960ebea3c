pub mod intro_overlay;
pub mod status_panel;

pub use intro_overlay::IntroOverlay;
pub use status_panel::StatusPanel;
