// Result shapes and the materializers that build them from a fetch loop.
//
// - row: the name -> encoded value mapping returned by `query_rows`
// - materialize: sinks turning decoded native values into rows or a JSON document

pub mod materialize;
pub mod row;

pub use materialize::{JsonDocument, Materializer, RowCollector};
pub use row::Row;
