//! Owner-scoped query construction
//!
//! Every statement that reads or writes projects and tickets starts here. The
//! builders returned by [`OwnerScope`] already end in `WHERE owner_id = $n`;
//! callers append their own predicates with `AND`.

use crate::models::patch::{Changes, FieldValue};
use sqlx::{Postgres, QueryBuilder};

/// Tables whose rows belong to a single user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owned {
    Projects,
    Tickets,
}

impl Owned {
    pub fn table(self) -> &'static str {
        match self {
            Owned::Projects => "projects",
            Owned::Tickets => "tickets",
        }
    }
}

/// The rows an authenticated user may see
///
/// Only obtainable from [`crate::auth::AuthContext::scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerScope {
    owner_id: i64,
}

impl OwnerScope {
    pub(crate) fn new(owner_id: i64) -> Self {
        Self { owner_id }
    }

    pub fn owner_id(&self) -> i64 {
        self.owner_id
    }

    pub fn select(&self, owned: Owned) -> QueryBuilder<'static, Postgres> {
        let mut query = QueryBuilder::new(format!(
            "SELECT * FROM {} WHERE owner_id = ",
            owned.table()
        ));
        query.push_bind(self.owner_id);
        query
    }

    pub fn count(&self, owned: Owned) -> QueryBuilder<'static, Postgres> {
        let mut query = QueryBuilder::new(format!(
            "SELECT COUNT(*) FROM {} WHERE owner_id = ",
            owned.table()
        ));
        query.push_bind(self.owner_id);
        query
    }

    /// `UPDATE .. SET <changes>, updated_at = NOW() WHERE owner_id = ..`
    pub fn update(&self, owned: Owned, changes: Changes) -> QueryBuilder<'static, Postgres> {
        let mut query = QueryBuilder::new(format!("UPDATE {} SET ", owned.table()));

        for (column, value) in changes.into_fields() {
            query.push(column).push(" = ");
            match value {
                FieldValue::Text(v) => query.push_bind(v),
                FieldValue::BigInt(v) => query.push_bind(v),
            };
            query.push(", ");
        }

        query.push("updated_at = NOW() WHERE owner_id = ");
        query.push_bind(self.owner_id);
        query
    }

    pub fn delete(&self, owned: Owned) -> QueryBuilder<'static, Postgres> {
        let mut query = QueryBuilder::new(format!(
            "DELETE FROM {} WHERE owner_id = ",
            owned.table()
        ));
        query.push_bind(self.owner_id);
        query
    }
}
