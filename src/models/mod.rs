/// ML модели

pub mod forest;

pub use forest::RandomForest;
