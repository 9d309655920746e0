mod feed;
mod post;

pub use feed::{Feed, SentPost};
pub use post::Post;
