//! Pluggable migration hook, §9 open question: the "tree-fix-2"
//! one-shot testnet migration is not part of the steady-state core, but
//! implementers should leave a hook for operator-supplied one-shot
//! fixes. The daemon ships zero migrations by default.

use async_trait::async_trait;
use sqlx::SqlitePool;

#[async_trait]
pub trait Migration: Send + Sync {
    /// Stable name, logged before and after running.
    fn name(&self) -> &str;

    async fn run(&self, pool: &SqlitePool) -> Result<(), sqlx::Error>;
}

pub async fn run_all(pool: &SqlitePool, migrations: &[Box<dyn Migration>]) -> Result<(), sqlx::Error> {
    for migration in migrations {
        log::info!("running migration {}", migration.name());
        migration.run(pool).await?;
        log::info!("migration {} complete", migration.name());
    }
    Ok(())
}
