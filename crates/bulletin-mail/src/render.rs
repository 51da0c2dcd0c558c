//! HTML rendering of announcement notifications.

use std::{fmt::Write as _, sync::LazyLock};

use bulletin_core::{
  announcement::Announcement,
  directory::Employee,
  dispatch::{RenderContext, RenderedNotification, Renderer},
};
use quick_xml::escape::escape;
use regex::Regex;

const DATE_FORMAT: &str = "%B %d, %Y";

const PARAGRAPH_STYLE: &str = "margin: 10px 0; color: #374151; line-height: 1.6;";

const HIGH_PRIORITY_BADGE: &str = "<span style=\"background-color: #ef4444; color: white; \
  padding: 4px 8px; border-radius: 4px; font-size: 12px; font-weight: bold;\">HIGH PRIORITY</span>";

const FEATURED_BADGE: &str = "<span style=\"background-color: #3b82f6; color: white; \
  padding: 4px 8px; border-radius: 4px; font-size: 12px; font-weight: bold;\">FEATURED</span>";

// ─── Content cleaning ────────────────────────────────────────────────────────

fn regex(pattern: &str) -> Regex {
  Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| regex(r"(?is)<script\b.*?</script\s*>"));
static IFRAME_BLOCK: LazyLock<Regex> = LazyLock::new(|| regex(r"(?is)<iframe\b.*?</iframe\s*>"));
static EVENT_HANDLER: LazyLock<Regex> =
  LazyLock::new(|| regex(r#"(?i)\s*\bon\w+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#));
static STRAY_TAG: LazyLock<Regex> = LazyLock::new(|| regex(r"(?i)</?(script|iframe)\b[^>]*>"));
static JAVASCRIPT_URL: LazyLock<Regex> = LazyLock::new(|| regex(r"(?i)javascript:"));
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| regex(r"<[A-Za-z/!][^>]*>"));

static P_OPEN: LazyLock<Regex> = LazyLock::new(|| regex(r"(?i)<p(\s[^>]*)?>"));
static BR: LazyLock<Regex> = LazyLock::new(|| regex(r"(?i)<br\s*/?>"));
static STRONG: LazyLock<Regex> = LazyLock::new(|| regex(r"(?i)<strong>"));
static BOLD: LazyLock<Regex> = LazyLock::new(|| regex(r"(?i)<b>"));
static EM: LazyLock<Regex> = LazyLock::new(|| regex(r"(?i)<em>"));
static ITALIC: LazyLock<Regex> = LazyLock::new(|| regex(r"(?i)<i>"));

/// Make announcement text safe to embed in a notification.
///
/// Script and iframe blocks, inline event handlers and `javascript:` URLs
/// are stripped. Markup that survives gets inline styles; plain text is
/// escaped, line breaks become `<br>` and the whole is wrapped in a
/// paragraph.
pub fn clean_content(content: &str) -> String {
  if content.trim().is_empty() {
    return String::new();
  }

  let content = strip_active_content(content);

  if ANY_TAG.is_match(&content) {
    let styled_p = format!("<p style=\"{PARAGRAPH_STYLE}\">");
    let content = P_OPEN.replace_all(&content, styled_p.as_str());
    let content = BR.replace_all(&content, "<br style=\"line-height: 1.6;\">");
    let content = STRONG.replace_all(&content, "<strong style=\"font-weight: bold;\">");
    let content = BOLD.replace_all(&content, "<b style=\"font-weight: bold;\">");
    let content = EM.replace_all(&content, "<em style=\"font-style: italic;\">");
    let content = ITALIC.replace_all(&content, "<i style=\"font-style: italic;\">");
    return content.into_owned();
  }

  let escaped = escape(content.as_str());
  let with_breaks = escaped.replace("\r\n", "\n").replace('\n', "<br>\n");
  format!("<p style=\"{PARAGRAPH_STYLE}\">{with_breaks}</p>")
}

/// Remove active content until a pass changes nothing, so that removals
/// cannot splice a new match together (`<scr<script></script>ipt>`).
/// Unpaired script and iframe tags go only once no block is left.
fn strip_active_content(content: &str) -> String {
  let patterns = [&*SCRIPT_BLOCK, &*IFRAME_BLOCK, &*EVENT_HANDLER, &*JAVASCRIPT_URL];
  let mut current = content.to_owned();
  loop {
    let next = patterns
      .iter()
      .fold(current.clone(), |acc, re| re.replace_all(&acc, "").into_owned());
    let next = if next == current {
      STRAY_TAG.replace_all(&next, "").into_owned()
    } else {
      next
    };
    if next == current {
      return next;
    }
    current = next;
  }
}

// ─── Renderer ────────────────────────────────────────────────────────────────

/// Subject line: a red marker for high-priority announcements, a megaphone
/// otherwise.
pub fn subject_line(announcement: &Announcement) -> String {
  if announcement.is_high_priority {
    format!("🔴 High Priority: {}", announcement.title)
  } else {
    format!("📢 {}", announcement.title)
  }
}

/// The production [`Renderer`]: a self-contained HTML document with inline
/// styles, suitable for mail clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
  fn render(
    &self,
    announcement: &Announcement,
    recipient: &Employee,
    context: &RenderContext,
  ) -> RenderedNotification {
    RenderedNotification {
      subject:   subject_line(announcement),
      html_body: html_body(announcement, recipient, context),
    }
  }
}

fn badges(announcement: &Announcement) -> Option<String> {
  let badges: Vec<&str> = [
    announcement.is_high_priority.then_some(HIGH_PRIORITY_BADGE),
    announcement.is_featured.then_some(FEATURED_BADGE),
  ]
  .into_iter()
  .flatten()
  .collect();
  (!badges.is_empty()).then(|| badges.join(" "))
}

fn html_body(
  announcement: &Announcement,
  recipient: &Employee,
  context: &RenderContext,
) -> String {
  let mut html = String::with_capacity(4096);

  // Writing into a String cannot fail.
  let _ = write!(
    html,
    r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
  <div style="background-color: #f8f9fa; padding: 20px; border-radius: 8px; margin-bottom: 20px;">
    <h1 style="color: #1f2937; margin-top: 0;">{title}</h1>
"#,
    title = escape(announcement.title.as_str()),
  );

  if let Some(badges) = badges(announcement) {
    let _ = writeln!(html, r#"    <div style="margin-bottom: 15px;">{badges}</div>"#);
  }

  let _ = write!(
    html,
    r#"    <p style="color: #6b7280; margin: 10px 0;">
      <strong>Category:</strong> {category}<br>
      <strong>Start Date:</strong> {start}<br>
"#,
    category = escape(announcement.category.as_str()),
    start = announcement.start_date.format(DATE_FORMAT),
  );
  if let Some(end) = announcement.end_date {
    let _ = writeln!(html, "      <strong>End Date:</strong> {}<br>", end.format(DATE_FORMAT));
  }
  html.push_str("    </p>\n  </div>\n");

  if let Some(description) = announcement.description.as_deref().filter(|d| !d.trim().is_empty()) {
    let _ = write!(
      html,
      r#"  <div style="background-color: #ffffff; padding: 15px; border-left: 4px solid #3b82f6; margin-bottom: 20px;">
    <div style="margin: 0; font-style: italic; color: #4b5563;">{}</div>
  </div>
"#,
      clean_content(description),
    );
  }

  let _ = write!(
    html,
    r#"  <p>Dear {name},</p>
  <div style="background-color: #ffffff; padding: 20px; border: 1px solid #e5e7eb; border-radius: 8px; margin-bottom: 20px;">
    <div style="color: #374151;">
      {content}
    </div>
  </div>
  <div style="text-align: center; margin-top: 30px;">
    <a href="{url}" style="display: inline-block; background-color: #3b82f6; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px; font-weight: bold;">View Full Announcement</a>
  </div>
  <div style="margin-top: 30px; padding-top: 20px; border-top: 1px solid #e5e7eb; text-align: center; color: #6b7280; font-size: 12px;">
    <p>This is an automated notification from {app}</p>
    <p>You are receiving this because you are an employee in the organization.</p>
  </div>
</body>
</html>
"#,
    name = escape(recipient.name.as_str()),
    content = clean_content(&announcement.content),
    url = escape(context.announcement_url.as_str()),
    app = escape(context.app_name.as_str()),
  );

  html
}
