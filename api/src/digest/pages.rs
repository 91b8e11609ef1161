//! Small standalone HTML pages for people arriving from an email link

use super::renderer::escape_html;

fn page(title: &str, body: &str) -> String {
    let mut buf = String::new();
    buf.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">");
    buf.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">");
    buf.push_str(&format!("<title>{}</title></head>\n", escape_html(title)));
    buf.push_str("<body style=\"font-family: Arial, sans-serif; max-width: 480px; margin: 60px auto; color: #222;\">\n");
    buf.push_str(&format!("<h1 style=\"font-size: 22px;\">{}</h1>\n", escape_html(title)));
    buf.push_str(body);
    buf.push_str("</body></html>\n");
    buf
}

/// Confirmation shown after following an unsubscribe link
pub fn unsubscribe_page(email: &str, already_unsubscribed: bool) -> String {
    let message = if already_unsubscribed {
        format!(
            "<p>{} was already unsubscribed. You will not receive further digests.</p>\n",
            escape_html(email)
        )
    } else {
        format!(
            "<p>{} will no longer receive this digest.</p>\n",
            escape_html(email)
        )
    };
    page("You have been unsubscribed", &message)
}

pub fn error_page(title: &str, message: &str) -> String {
    page(title, &format!("<p>{}</p>\n", escape_html(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsubscribe_page_mentions_address() {
        let html = unsubscribe_page("buyer@example.com", false);
        assert!(html.contains("buyer@example.com will no longer receive"));
        assert!(unsubscribe_page("buyer@example.com", true).contains("already unsubscribed"));
    }

    #[test]
    fn error_page_escapes_message() {
        let html = error_page("Bad request", "token <x> invalid");
        assert!(html.contains("token &lt;x&gt; invalid"));
        assert!(html.contains("<title>Bad request</title>"));
    }
}
