/// Шаги предобработки данных

pub mod balancing;
pub mod cleaning;
pub mod encoding;
pub mod features;
pub mod selection;
pub mod skewness;

pub use balancing::{balance_classes, Smote};
pub use cleaning::drop_id_and_duplicates;
pub use encoding::{encode_columns, Label, LabelEncoder};
pub use features::{FeatureEngineer, FeatureMatrix, Targets};
pub use selection::{align_columns, FeatureSelector};
pub use skewness::{skewness, SkewCorrector};
