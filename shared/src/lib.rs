pub mod colors;
pub mod config;
pub mod coords;
pub mod events;
pub mod grid;
pub mod legend;
pub mod ownership;
pub mod render;
pub mod tables;

pub use colors::{SwatchFormat, contrasting_text_color, darken, lighten, swatch_format};
pub use config::{CampaignConfig, MapDefinition};
pub use coords::{Coordinate, GridDimensions, normalize_territory};
pub use events::MapEvent;
pub use grid::{BorderStyle, BorderTier, CellBorder, CellDescriptor, RenderGrid, build_render_grid};
pub use legend::{LegendEntry, RosterSummary, build_legend};
pub use ownership::{ResolvedOwnership, resolve_ownership};
pub use render::{CellView, MapRender, render_all, render_map};
pub use tables::*;
