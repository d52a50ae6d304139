pub mod fetched;
pub mod row;

pub use fetched::{Fetched, FetchedAll, MapKey, Pairs, Projection};
pub use row::Row;
