pub mod denylist;
pub mod extractor;
pub mod model;
pub mod scan;

pub use denylist::{DEFAULT_DENYLIST, Denylist};
pub use extractor::LinkExtractor;
pub use model::{ContentSource, ExtractedLink};
pub use scan::scan_urls;
