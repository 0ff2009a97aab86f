//! Operation to create a user.

use std::sync::Arc;

use async_trait::async_trait;
use quill_core::{Document, Namespace, Result, Value};

use super::helpers::{check_write_result, execute_command, protocol_path, ProtocolPath};
use super::WriteOperation;
use crate::binding::{Binding, SelectionCriteria};
use crate::connection::{Connection, WriteConcern};
use crate::credential::Credential;
use crate::runtime::Runtime;

/// Creates a user in the credential's source database.
///
/// On servers speaking the unified command protocol this issues a
/// `createUser` command; on older servers it falls back to an acknowledged
/// insert into the `system.users` collection. Both paths report success with
/// no payload and converge failures into the same error shape, so callers
/// cannot tell which path ran except by error content.
#[derive(Debug, Clone)]
pub struct CreateUserOperation {
    credential: Credential,
    read_only: bool,
}

impl CreateUserOperation {
    /// Constructs the operation for the given credential.
    pub fn new(credential: Credential, read_only: bool) -> Self {
        Self {
            credential,
            read_only,
        }
    }

    /// The credential of the user being created.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// True if the user is restricted to reads.
    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// Executes the operation, suspending the calling task at the exchange.
    ///
    /// The acquired connection is released exactly once on every exit path;
    /// if acquisition itself fails, the error propagates with nothing held.
    pub async fn execute(&self, binding: &dyn Binding) -> Result<()> {
        let mut connection = binding.acquire(SelectionCriteria::Writable).await?;
        self.execute_on(connection.connection_mut()).await
        // connection guard drops here, releasing on success and failure alike
    }

    /// Continuation form: spawns the exchange and invokes `callback` exactly
    /// once with the terminal outcome. The connection is released before the
    /// callback observes the result.
    pub fn execute_async<R, C>(&self, binding: Arc<dyn Binding>, runtime: &R, callback: C)
    where
        R: Runtime,
        C: FnOnce(Result<()>) + Send + 'static,
    {
        let operation = self.clone();
        runtime.spawn(async move {
            let result = operation.execute(binding.as_ref()).await;
            callback(result);
        });
    }

    async fn execute_on(&self, connection: &mut dyn Connection) -> Result<()> {
        match protocol_path(connection.description()) {
            ProtocolPath::Command => {
                tracing::debug!(user = self.credential.username(), "creating user via command");
                execute_command(
                    connection,
                    self.credential.source(),
                    &self.command_document(),
                )
                .await?;
                Ok(())
            }
            ProtocolPath::LegacyWrite => {
                tracing::debug!(
                    user = self.credential.username(),
                    "creating user via system collection insert"
                );
                let namespace = self.namespace()?;
                let address = connection.address();
                let result = connection
                    .insert(
                        &namespace,
                        true,
                        WriteConcern::Acknowledged,
                        vec![self.insert_document()],
                    )
                    .await?;
                check_write_result(&result, address)
            }
        }
    }

    fn command_document(&self) -> Document {
        Document::new()
            .with("createUser", self.credential.username())
            .with("pwd", self.credential.password())
            .with("roles", vec![Value::from(self.role_name())])
    }

    fn insert_document(&self) -> Document {
        Document::new()
            .with("user", self.credential.username())
            .with("pwd", self.credential.password())
            .with("readOnly", self.read_only)
    }

    fn namespace(&self) -> Result<Namespace> {
        Namespace::new(self.credential.source(), "system.users")
    }

    fn role_name(&self) -> &'static str {
        if self.read_only {
            "read"
        } else {
            "readWrite"
        }
    }
}

#[async_trait]
impl WriteOperation for CreateUserOperation {
    async fn execute(&self, binding: &dyn Binding) -> Result<()> {
        CreateUserOperation::execute(self, binding).await
    }
}
