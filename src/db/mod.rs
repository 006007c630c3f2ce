pub mod catalog;
pub mod memory;
pub mod orders;
pub mod postgres;
pub mod redis;

pub use catalog::{Catalog, PgCatalog};
pub use memory::{MemoryCatalog, MemoryOrderHistory};
pub use orders::{OrderHistory, PgOrderHistory};
pub use postgres::create_pool;
pub use self::redis::create_redis_client;
pub use self::redis::RedisStore;
