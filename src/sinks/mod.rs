mod text;

use crate::error::Result;
use crate::footer::Footer;
use crate::schema::Schema;
use crate::value::Value;

pub use text::TextSink;

/// Provides file-level information to sinks during initialisation.
pub struct SinkContext<'a> {
    pub schema: &'a Schema,
    pub footer: &'a Footer,
}

impl<'a> SinkContext<'a> {
    #[must_use]
    pub const fn new(footer: &'a Footer) -> Self {
        Self {
            schema: footer.schema(),
            footer,
        }
    }
}

/// Trait implemented by consumers of decoded rows.
pub trait RowSink {
    /// Called before any rows are written to allow the sink to initialise internal state.
    fn begin(&mut self, context: SinkContext<'_>) -> Result<()>;

    /// Invoked for every decoded row, in file order.
    fn write_row(&mut self, row: &[Value<'_>]) -> Result<()>;

    /// Called once all rows have been forwarded to the sink.
    fn finish(&mut self) -> Result<()>;
}
