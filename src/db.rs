//! Salsa database definition.

/// Database trait for the catalog queries.
#[salsa::db]
pub trait LinguistDatabase: salsa::Database {}

#[salsa::db]
#[derive(Default, Clone)]
pub struct LinguistDatabaseImpl {
    storage: salsa::Storage<Self>,
}

#[salsa::db]
impl salsa::Database for LinguistDatabaseImpl {}

#[salsa::db]
impl LinguistDatabase for LinguistDatabaseImpl {}
