use crate::models::Post;

/// Render a post as the Telegram-HTML message sent to the channel. Pure and
/// infallible: missing fields come through as empty strings.
pub fn format_post(post: &Post, feed_name: &str) -> String {
    let title = escape_html(&post.title);
    let link = escape_attr(&post.link);
    let description = escape_html(&post.description);

    format!(
        "{title}\n\n<a href=\"{link}\">🔗 Link</a>\n\n{description}\n\n<i>Feed: {feed_name}</i>\n"
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Quote escaping for text embedded in an href attribute.
fn escape_attr(text: &str) -> String {
    text.replace('"', "&quot;")
}
