pub mod cursor;
pub mod external_id;
pub mod page;
pub mod sort;
pub mod time_range;

pub use cursor::Cursor;
pub use external_id::ExternalId;
pub use page::{Page, PageRequest};
pub use sort::SortOrder;
pub use time_range::DateRange;
