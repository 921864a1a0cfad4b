pub mod knn;
pub mod speaker;
pub mod store;
