use sqlx::PgConnection;

/// Something that can lend out a live database connection for the duration of a borrow
pub trait ConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection;
}

/// Provides access to the systems outside this service (currently just the database).
/// Handed explicitly to every driven port so nothing holds a process-wide session.
pub trait ExternalConnectivity {
    type DbHandle<'cxn_borrow>: ConnectionHandle
    where
        Self: 'cxn_borrow;

    /// Acquires a database connection. The connection goes back to wherever it came from
    /// when the handle is dropped.
    async fn database_cxn(&mut self) -> Result<Self::DbHandle<'_>, anyhow::Error>;
}

/// ExternalConnectivity which can start a database transaction
pub trait Transactable {
    type Handle: TransactionHandle;

    async fn start_transaction(&self) -> Result<Self::Handle, anyhow::Error>;
}

/// ExternalConnectivity whose database work happens inside a transaction. Dropping
/// the handle without calling [TransactionHandle::commit] rolls the work back.
pub trait TransactionHandle: ExternalConnectivity {
    async fn commit(self) -> Result<(), anyhow::Error>;
}

/// Shorthand for connectivity which can also open transactions
pub trait TransactableExternalConnectivity: ExternalConnectivity + Transactable {}

impl<T: ExternalConnectivity + Transactable> TransactableExternalConnectivity for T {}
