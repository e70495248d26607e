/// Data layer: table types, loading, and row selection.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  rows of CellValue, x/y feature selection
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  explicit indices / metadata predicates → row indices
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
