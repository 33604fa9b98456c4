//! UI module - handles all TUI rendering
//!
//! Structure:
//! - `draw/` - panel drawing functions
//! - `theme.rs` - Color themes and presets
//! - `layout.rs` - Subject grid layout
//! - `subject_card.rs` - Subject card widget

mod draw;
pub mod layout;
pub mod subject_card;
pub mod theme;

pub use draw::draw;
pub use theme::Theme;
