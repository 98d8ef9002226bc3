//! Open Graph tags for shared links
//!
//! Crawlers don't run the SPA, so blog and privacy URLs get their
//! `index.html` rewritten with preview metadata before it is served.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::db::repos::{BlogOwner, BlogPost, PostWithAuthor};

pub const SITE_NAME: &str = "Prosaurus Breakroom";

const DESCRIPTION_LIMIT: usize = 200;
const DESCRIPTION_KEEP: usize = 197;

/// Shell served when the built frontend is missing
pub const FALLBACK_SHELL: &str = r#"<!DOCTYPE html>
<html lang="">
  <head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Prosaurus Breakroom</title>
  </head>
  <body>
    <div id="app"></div>
    <script>window.location.href = window.location.href;</script>
  </body>
</html>"#;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<title>[^<]*</title>").expect("valid regex"));
static IMG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img[^>]+src=["']([^"']+)["']"#).expect("valid regex"));

/// Preview metadata for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OgTags {
    pub title: String,
    pub description: String,
    pub url: String,
    pub image: Option<String>,
    pub site_name: String,
    pub author: Option<String>,
}

/// Tags plus the document `<title>` to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OgPage {
    pub tags: OgTags,
    pub page_title: String,
}

impl OgTags {
    pub fn render(&self) -> String {
        let card = if self.image.is_some() {
            "summary_large_image"
        } else {
            "summary"
        };

        let mut out = String::new();
        push_meta(&mut out, "property", "og:title", &self.title);
        push_meta(&mut out, "property", "og:description", &self.description);
        push_meta(&mut out, "property", "og:url", &self.url);
        push_meta(&mut out, "property", "og:type", "article");
        push_meta(&mut out, "property", "og:site_name", &self.site_name);
        push_meta(&mut out, "name", "twitter:card", card);
        push_meta(&mut out, "name", "twitter:title", &self.title);
        push_meta(&mut out, "name", "twitter:description", &self.description);
        push_meta(&mut out, "name", "description", &self.description);
        if let Some(author) = &self.author {
            push_meta(&mut out, "name", "author", author);
        }
        if let Some(image) = &self.image {
            push_meta(&mut out, "property", "og:image", image);
            push_meta(&mut out, "name", "twitter:image", image);
        }
        out
    }
}

fn push_meta(out: &mut String, attr: &str, key: &str, content: &str) {
    out.push_str(&format!(
        "\n    <meta {attr}=\"{key}\" content=\"{}\" />",
        escape_html(content)
    ));
}

impl OgPage {
    /// Insert the tags before `</head>` and replace the `<title>`.
    pub fn inject(&self, html: &str) -> String {
        let with_tags = html.replacen("</head>", &format!("{}\n  </head>", self.tags.render()), 1);
        let title = format!("<title>{}</title>", escape_html(&self.page_title));
        TITLE_RE
            .replacen(&with_tags, 1, regex::NoExpand(&title))
            .into_owned()
    }
}

/// The built `index.html`, or the fallback shell when it can't be read.
pub async fn index_html(dist_dir: &Path) -> String {
    match tokio::fs::read_to_string(dist_dir.join("index.html")).await {
        Ok(html) => html,
        Err(e) => {
            tracing::debug!(error = %e, dir = %dist_dir.display(), "index.html unavailable, using shell");
            FALLBACK_SHELL.to_string()
        }
    }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Plain text of an HTML fragment with whitespace collapsed.
pub fn strip_html(html: &str) -> String {
    let text = TAG_RE.replace_all(html, "");
    let text = text.replace("&nbsp;", " ");
    SPACE_RE.replace_all(&text, " ").trim().to_string()
}

/// Plain-text preview of post content, at most 200 characters.
pub fn summarize(content: &str) -> String {
    let text = strip_html(content);
    if text.chars().count() > DESCRIPTION_LIMIT {
        let mut short: String = text.chars().take(DESCRIPTION_KEEP).collect();
        short.push_str("...");
        short
    } else {
        text
    }
}

/// First `<img src>` in the content; root-relative paths become absolute.
pub fn first_image(content: &str, base_url: &str) -> Option<String> {
    let src = IMG_RE.captures(content)?.get(1)?.as_str();
    if src.starts_with('/') {
        Some(format!("{base_url}{src}"))
    } else {
        Some(src.to_string())
    }
}

/// "First Last", or the handle when neither name is set.
pub fn author_name(first: Option<&str>, last: Option<&str>, handle: &str) -> String {
    let name = [first, last]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if name.is_empty() {
        handle.to_string()
    } else {
        name
    }
}

pub fn blog_landing(base_url: &str, blog: &BlogOwner) -> OgPage {
    let author = author_name(blog.first_name.as_deref(), blog.last_name.as_deref(), &blog.handle);
    OgPage {
        tags: OgTags {
            title: blog.blog_name.clone(),
            description: format!("{} by {} on {}", blog.blog_name, author, SITE_NAME),
            url: format!("{base_url}/b/{}", blog.blog_url),
            image: blog
                .photo_path
                .as_deref()
                .filter(|p| !p.is_empty())
                .map(|p| format!("{base_url}/api/uploads/{p}")),
            site_name: SITE_NAME.to_string(),
            author: Some(author),
        },
        page_title: format!("{} - {}", blog.blog_name, SITE_NAME),
    }
}

pub fn blog_post(base_url: &str, blog: &BlogOwner, post: &BlogPost) -> OgPage {
    let content = post.content.as_deref().unwrap_or_default();
    let description = Some(summarize(content))
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| format!("A post on {}", blog.blog_name));

    OgPage {
        tags: OgTags {
            title: post.title.clone(),
            description,
            url: format!("{base_url}/b/{}/{}", blog.blog_url, post.id),
            image: first_image(content, base_url),
            site_name: SITE_NAME.to_string(),
            author: Some(author_name(
                blog.first_name.as_deref(),
                blog.last_name.as_deref(),
                &blog.handle,
            )),
        },
        page_title: format!("{} - {}", post.title, SITE_NAME),
    }
}

pub fn post_view(base_url: &str, post: &PostWithAuthor) -> OgPage {
    let content = post.content.as_deref().unwrap_or_default();
    let description = Some(summarize(content))
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| format!("A post on {SITE_NAME}"));

    OgPage {
        tags: OgTags {
            title: post.title.clone(),
            description,
            url: format!("{base_url}/blog/view/{}", post.id),
            image: first_image(content, base_url),
            site_name: SITE_NAME.to_string(),
            author: Some(author_name(
                post.first_name.as_deref(),
                post.last_name.as_deref(),
                &post.handle,
            )),
        },
        page_title: format!("{} - {}", post.title, SITE_NAME),
    }
}

pub fn privacy(base_url: &str) -> OgPage {
    OgPage {
        tags: OgTags {
            title: "Privacy Policy".to_string(),
            description: "Privacy Policy for the Prosaurus iOS app, provided by Cherry Blossom Development LLC."
                .to_string(),
            url: format!("{base_url}/privacy"),
            image: None,
            site_name: "Prosaurus".to_string(),
            author: None,
        },
        page_title: "Privacy Policy - Prosaurus".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.prosaurus.com";

    fn blog() -> BlogOwner {
        BlogOwner {
            blog_url: "night-notes".into(),
            blog_name: "Night Notes".into(),
            user_id: 4,
            handle: "owl".into(),
            first_name: Some("Ada".into()),
            last_name: None,
            photo_path: Some("profiles/profile_4.jpg".into()),
        }
    }

    #[test]
    fn strips_tags_and_entities() {
        assert_eq!(
            strip_html("<p>Hello&nbsp;<b>there</b></p>\n\n<p>  world </p>"),
            "Hello there world"
        );
    }

    #[test]
    fn summarize_truncates_long_text() {
        let long = "a".repeat(250);
        let summary = summarize(&long);
        assert_eq!(summary.chars().count(), 200);
        assert!(summary.ends_with("..."));

        let exact = "b".repeat(200);
        assert_eq!(summarize(&exact), exact);
    }

    #[test]
    fn first_image_made_absolute() {
        let html = r#"<p>x</p><IMG class="hero" src='/api/uploads/blog/a.png'><img src="https://cdn/b.png">"#;
        assert_eq!(
            first_image(html, BASE).as_deref(),
            Some("https://www.prosaurus.com/api/uploads/blog/a.png")
        );
        assert_eq!(
            first_image(r#"<img src="https://cdn/b.png">"#, BASE).as_deref(),
            Some("https://cdn/b.png")
        );
        assert_eq!(first_image("<p>no images</p>", BASE), None);
    }

    #[test]
    fn author_falls_back_to_handle() {
        assert_eq!(author_name(Some("Ada"), Some("Lovelace"), "ada"), "Ada Lovelace");
        assert_eq!(author_name(None, Some("Lovelace"), "ada"), "Lovelace");
        assert_eq!(author_name(None, None, "ada"), "ada");
        assert_eq!(author_name(Some(""), None, "ada"), "ada");
    }

    #[test]
    fn landing_page_tags() {
        let page = blog_landing(BASE, &blog());
        assert_eq!(page.tags.description, "Night Notes by Ada on Prosaurus Breakroom");
        assert_eq!(page.tags.url, "https://www.prosaurus.com/b/night-notes");
        assert_eq!(
            page.tags.image.as_deref(),
            Some("https://www.prosaurus.com/api/uploads/profiles/profile_4.jpg")
        );
        assert_eq!(page.page_title, "Night Notes - Prosaurus Breakroom");
    }

    #[test]
    fn post_without_text_gets_default_description() {
        let post = BlogPost {
            id: 9,
            title: "Untitled".into(),
            content: Some("<p> </p>".into()),
        };
        let page = blog_post(BASE, &blog(), &post);
        assert_eq!(page.tags.description, "A post on Night Notes");
        assert_eq!(page.tags.url, "https://www.prosaurus.com/b/night-notes/9");
        assert_eq!(page.tags.image, None);
    }

    #[test]
    fn inject_escapes_and_rewrites_title() {
        let page = OgPage {
            tags: OgTags {
                title: r#"Fish & "Chips""#.into(),
                description: "<b>desc</b>".into(),
                url: "u".into(),
                image: None,
                site_name: SITE_NAME.into(),
                author: None,
            },
            page_title: "Fish & Chips - Prosaurus Breakroom".into(),
        };
        let html = page.inject(FALLBACK_SHELL);

        assert!(html.contains(r#"<meta property="og:title" content="Fish &amp; &quot;Chips&quot;" />"#));
        assert!(html.contains(r#"<meta name="description" content="&lt;b&gt;desc&lt;/b&gt;" />"#));
        assert!(html.contains(r#"<meta name="twitter:card" content="summary" />"#));
        assert!(!html.contains("og:image"));
        assert!(!html.contains(r#"name="author""#));
        assert!(html.contains("<title>Fish &amp; Chips - Prosaurus Breakroom</title>"));
        assert_eq!(html.matches("<title>").count(), 1);

        let head_end = html.find("</head>").unwrap();
        assert!(html.find("og:title").unwrap() < head_end);
    }

    #[test]
    fn image_switches_card_type() {
        let mut tags = privacy(BASE).tags;
        tags.image = Some("https://x/y.png".into());
        let rendered = tags.render();
        assert!(rendered.contains(r#"content="summary_large_image""#));
        assert!(rendered.contains(r#"<meta name="twitter:image" content="https://x/y.png" />"#));
    }
}
