use crate::connection::Uri;
use crate::error::ConsoleResult;
use crate::options::{FrameOptions, IndexOptions};
use crate::schema::Schema;

/// Operations the console needs from an index server.
///
/// `create_*` must fail when the object already exists, `ensure_*` must
/// succeed either way.
#[allow(async_fn_in_trait)]
pub trait Executor {
    async fn schema(&self) -> ConsoleResult<Schema>;

    async fn create_index(&self, index: &str, options: &IndexOptions) -> ConsoleResult<()>;

    async fn ensure_index(&self, index: &str, options: &IndexOptions) -> ConsoleResult<()>;

    async fn delete_index(&self, index: &str) -> ConsoleResult<()>;

    async fn create_frame(&self, index: &str, frame: &str, options: &FrameOptions) -> ConsoleResult<()>;

    async fn ensure_frame(&self, index: &str, frame: &str, options: &FrameOptions) -> ConsoleResult<()>;

    async fn delete_frame(&self, index: &str, frame: &str) -> ConsoleResult<()>;

    /// Runs `query` against `index` and returns the raw response body.
    async fn query(&self, index: &str, query: &str) -> ConsoleResult<String>;
}

/// Builds an [`Executor`] bound to a server address.
pub trait Connector {
    type Client: Executor;

    fn connect(&self, uri: &Uri) -> ConsoleResult<Self::Client>;
}
