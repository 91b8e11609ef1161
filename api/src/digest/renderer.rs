//! Digest renderer
//!
//! Renders a digest into an email subject, an HTML body and a plain-text
//! body. All text coming from the database goes through `escape_html`
//! before it lands in the HTML body.

use serde::Serialize;

use crate::app::Digest;
use crate::domain::entities::{DigestFrequency, InventoryLine, TopProduct};

/// A digest ready to hand to the email provider
#[derive(Debug, Clone, Serialize)]
pub struct RenderedDigest {
    pub subject: String,
    pub html: String,
    pub text: String,
}

pub fn render_digest(digest: &Digest) -> RenderedDigest {
    RenderedDigest {
        subject: render_subject(digest),
        html: render_html(digest),
        text: render_text(digest),
    }
}

fn scope_name(digest: &Digest) -> String {
    match &digest.retailer_name {
        Some(retailer) => format!("{} / {}", digest.tenant_name, retailer),
        None => digest.tenant_name.clone(),
    }
}

fn period_label(digest: &Digest) -> String {
    if digest.frequency == DigestFrequency::Daily {
        digest.period.to.format("%Y-%m-%d").to_string()
    } else {
        format!(
            "{} to {}",
            digest.period.from.format("%Y-%m-%d"),
            digest.period.to.format("%Y-%m-%d")
        )
    }
}

/// The period the change percentages are measured against
fn comparison_label(digest: &Digest) -> String {
    if digest.frequency == DigestFrequency::Daily {
        digest.period.prev_to.format("%Y-%m-%d").to_string()
    } else {
        format!(
            "{} to {}",
            digest.period.prev_from.format("%Y-%m-%d"),
            digest.period.prev_to.format("%Y-%m-%d")
        )
    }
}

fn render_subject(digest: &Digest) -> String {
    format!(
        "{} sell-out digest: {} ({})",
        digest.frequency.label(),
        scope_name(digest),
        period_label(digest)
    )
}

fn render_html(digest: &Digest) -> String {
    let summary = &digest.summary;
    let mut buf = String::new();

    buf.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"></head>\n");
    buf.push_str("<body style=\"font-family: Arial, sans-serif; color: #222; max-width: 640px;\">\n");
    buf.push_str(&format!(
        "<h1 style=\"font-size: 20px;\">{}</h1>\n",
        escape_html(&scope_name(digest))
    ));
    buf.push_str(&format!(
        "<p style=\"color: #666;\">{} digest for {}</p>\n",
        digest.frequency.label(),
        escape_html(&period_label(digest))
    ));

    // Headline numbers
    buf.push_str("<table cellpadding=\"6\" style=\"border-collapse: collapse;\">\n");
    buf.push_str(&format!(
        "<tr><td>Units sold</td><td><strong>{}</strong></td><td>{}</td></tr>\n",
        format_units(summary.units),
        change_cell(summary.units_change_pct())
    ));
    buf.push_str(&format!(
        "<tr><td>Revenue</td><td><strong>{}</strong></td><td>{}</td></tr>\n",
        format_money(summary.revenue),
        change_cell(summary.revenue_change_pct())
    ));
    buf.push_str(&format!(
        "<tr><td>Selling stores</td><td>{}</td><td></td></tr>\n",
        summary.store_count
    ));
    buf.push_str(&format!(
        "<tr><td>Selling products</td><td>{}</td><td></td></tr>\n",
        summary.product_count
    ));
    buf.push_str("</table>\n");
    buf.push_str(&format!(
        "<p style=\"font-size: 12px; color: #999;\">Changes compared with {}</p>\n",
        escape_html(&comparison_label(digest))
    ));

    // Top products
    buf.push_str("<h2 style=\"font-size: 16px;\">Top products</h2>\n");
    if digest.top_products.is_empty() {
        buf.push_str("<p>No sales in this period.</p>\n");
    } else {
        buf.push_str("<ol>\n");
        for product in &digest.top_products {
            buf.push_str(&render_product_html(product));
        }
        buf.push_str("</ol>\n");
    }

    // Out of stock
    buf.push_str("<h2 style=\"font-size: 16px;\">Out of stock</h2>\n");
    if digest.out_of_stock_total == 0 {
        buf.push_str("<p>No out-of-stock positions.</p>\n");
    } else {
        buf.push_str("<ul>\n");
        for line in &digest.out_of_stock {
            buf.push_str(&render_oos_html(line));
        }
        buf.push_str("</ul>\n");
        let hidden = digest.out_of_stock_total.saturating_sub(digest.out_of_stock.len());
        if hidden > 0 {
            buf.push_str(&format!(
                "<p style=\"color: #666;\">and {} more out-of-stock positions.</p>\n",
                hidden
            ));
        }
    }

    if digest.replenishment_count > 0 {
        buf.push_str(&format!(
            "<p>{} replenishment suggestions are waiting in the portal.</p>\n",
            digest.replenishment_count
        ));
    }

    buf.push_str(&format!(
        "<p><a href=\"{}\">Open the dashboard</a></p>\n",
        escape_html(&digest.dashboard_url)
    ));
    buf.push_str("<hr>\n");
    buf.push_str(&format!(
        "<p style=\"font-size: 12px; color: #999;\">You receive this email because {} is subscribed to the {} digest. <a href=\"{}\">Unsubscribe</a></p>\n",
        escape_html(&digest.email),
        digest.frequency,
        escape_html(&digest.unsubscribe_url)
    ));
    buf.push_str("</body></html>\n");

    buf
}

fn render_product_html(product: &TopProduct) -> String {
    format!(
        "<li>{} <span style=\"color: #999;\">({})</span>: {} units, {}</li>\n",
        escape_html(&product.product_name),
        escape_html(&product.ean),
        format_units(product.units),
        format_money(product.revenue)
    )
}

fn render_oos_html(line: &InventoryLine) -> String {
    format!(
        "<li>{} at {}</li>\n",
        escape_html(&line.product_name),
        escape_html(&line.store_name)
    )
}

fn change_cell(change: Option<f64>) -> String {
    match change {
        Some(pct) if pct < 0.0 => format!("<span style=\"color: #c0392b;\">{}</span>", format_change(change)),
        Some(_) => format!("<span style=\"color: #27ae60;\">{}</span>", format_change(change)),
        None => "<span style=\"color: #999;\">n/a</span>".to_string(),
    }
}

fn render_text(digest: &Digest) -> String {
    let summary = &digest.summary;
    let mut buf = String::new();

    buf.push_str(&format!("{}\n", scope_name(digest)));
    buf.push_str(&format!(
        "{} digest for {}\n\n",
        digest.frequency.label(),
        period_label(digest)
    ));

    buf.push_str(&format!(
        "Units sold:       {} ({})\n",
        format_units(summary.units),
        format_change(summary.units_change_pct())
    ));
    buf.push_str(&format!(
        "Revenue:          {} ({})\n",
        format_money(summary.revenue),
        format_change(summary.revenue_change_pct())
    ));
    buf.push_str(&format!("Selling stores:   {}\n", summary.store_count));
    buf.push_str(&format!("Selling products: {}\n", summary.product_count));
    buf.push_str(&format!(
        "Changes compared with {}\n\n",
        comparison_label(digest)
    ));

    buf.push_str("Top products\n");
    if digest.top_products.is_empty() {
        buf.push_str("  No sales in this period.\n");
    }
    for (i, product) in digest.top_products.iter().enumerate() {
        buf.push_str(&format!(
            "  {}. {} ({}): {} units, {}\n",
            i + 1,
            product.product_name,
            product.ean,
            format_units(product.units),
            format_money(product.revenue)
        ));
    }
    buf.push('\n');

    buf.push_str("Out of stock\n");
    if digest.out_of_stock_total == 0 {
        buf.push_str("  No out-of-stock positions.\n");
    }
    for line in &digest.out_of_stock {
        buf.push_str(&format!("  - {} at {}\n", line.product_name, line.store_name));
    }
    let hidden = digest.out_of_stock_total.saturating_sub(digest.out_of_stock.len());
    if hidden > 0 {
        buf.push_str(&format!("  and {} more\n", hidden));
    }
    buf.push('\n');

    if digest.replenishment_count > 0 {
        buf.push_str(&format!(
            "{} replenishment suggestions are waiting in the portal.\n\n",
            digest.replenishment_count
        ));
    }

    buf.push_str(&format!("Dashboard: {}\n", digest.dashboard_url));
    buf.push_str(&format!("Unsubscribe: {}\n", digest.unsubscribe_url));

    buf
}

/// Escape text for safe inclusion in HTML element content and attributes
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// 1234567 -> "1,234,567"
fn format_units(units: i64) -> String {
    let digits = units.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if units < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

fn format_money(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let whole = format_units(cents / 100);
    let sign = if cents < 0 && cents / 100 == 0 { "-" } else { "" };
    format!("{}{}.{:02}", sign, whole, (cents % 100).abs())
}

fn format_change(change: Option<f64>) -> String {
    match change {
        Some(pct) => format!("{:+.1}%", pct),
        None => "n/a".to_string(),
    }
}
