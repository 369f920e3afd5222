pub mod docstore;
pub mod identity;

pub use docstore::PgDocumentStore;
pub use identity::JwtIdentityAdapter;
