// Library root for the data core: mock dataset, schema normalization,
// percentile ranking and the derived views built on top of them.

pub mod gamelog;
pub mod leaderboard;
pub mod model;
pub mod normalize;
pub mod percentile;
pub mod season;
pub mod similarity;
pub mod store;

pub use model::Source;
pub use season::Season;
pub use store::MockStore;
