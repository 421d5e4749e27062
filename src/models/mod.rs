pub(crate) mod de;

mod catalog;
mod categories;
mod templates;

pub use catalog::*;
pub use categories::*;
pub use templates::*;
