pub mod dataset;
pub mod model;
pub mod scale;
pub mod table;
pub mod types;

pub use dataset::{Dataset, Histogram};
pub use model::{
    AnalysisKind, DimensionDescription, EntityKind, EntityResults, FittedModel, Measure,
};
pub use scale::LinearScale;
pub use table::{CategoricalTable, ResultTable};
pub use types::{AxisPair, Viewport};
