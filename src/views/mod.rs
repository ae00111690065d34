// Presentation adapters over the same node set: a paginated table and a laid
// out graph. Both are pure projections; mutations go through the services.

pub mod graph;
pub mod interaction;
pub mod layout;
pub mod table;

pub use graph::{edges_for, Affordance, GraphEdge, GraphNode, GraphView};
pub use interaction::{CreateDraft, GraphCommand, GraphInteraction, InteractionError};
pub use layout::{layout_forest, Layout, Position};
pub use table::{PageRequest, PaginationState, Selection, TableFilter, TableRow, TableView};
