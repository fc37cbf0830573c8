//! Query engine: filter compilation, ordering, projection, write coercion and
//! result shaping.

pub mod coerce;
pub mod filter;
pub mod order;
pub mod projection;
pub mod selection;
pub mod shape;

pub use coerce::{coerce_fields, coerce_fields_at};
pub use filter::{
    CompositeFilter, CompositeOperator, FieldFilter, FieldOperator, FilterExpr, compile,
    parse_filter,
};
pub use order::{Direction, DirectionSeparator, OrderBy, parse_order_by};
pub use projection::{DOCUMENT_ID_FIELD, DOCUMENT_PATH_FIELD, project, resolve_field};
pub use selection::Selection;
pub use shape::{ShapeOptions, Shaped, shape};
