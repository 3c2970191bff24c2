pub mod comments;

pub use comments::{AdminCommentFilter, CommentError, CommentService, RepublishFilter};
