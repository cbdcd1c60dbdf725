//! Static file serving under a URL prefix.
//!
//! # Design Decisions
//! - Request paths arrive percent-decoded (see `request::decoded_path`)
//! - Content type guessed from the extension; `text/*` gets `charset=utf-8`
//! - Unknown extensions are served as `application/octet-stream`
//! - `.` and `..` segments are refused rather than normalized
//! - A directory request serves its `index.html`, or a listing without one

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use mime_guess::mime;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::config::FilesConfig;

const OCTET_STREAM: &str = "application/octet-stream";
const INDEX_FILE: &str = "index.html";
const TEXT_HTML: &str = "text/html; charset=utf-8";

/// Characters escaped in one segment of a listing link.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Content-Type header value for a file path.
pub fn content_type_for(path: &Path) -> String {
    match mime_guess::from_path(path).first() {
        Some(m) if m.type_() == mime::TEXT => format!("{}; charset=utf-8", m.essence_str()),
        Some(m) => m.essence_str().to_string(),
        None => OCTET_STREAM.to_string(),
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// A directory exposed under a URL prefix.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    mount: String,
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(mount: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        let mount: String = mount.into();
        Self {
            mount: mount.trim_end_matches('/').to_string(),
            root: root.into(),
        }
    }

    /// `None` when file serving is disabled.
    pub fn from_config(config: &FilesConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(config.mount.clone(), config.root.clone()))
    }

    /// Segments of `request_path` below the mount.
    ///
    /// Returns `None` for paths outside the mount or with dot segments.
    fn segments<'a>(&self, request_path: &'a str) -> Option<Vec<&'a str>> {
        let rest = request_path.strip_prefix(&self.mount)?;
        if !rest.is_empty() && !rest.starts_with('/') {
            return None;
        }

        let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
        let unsafe_segment = segments
            .iter()
            .any(|s| *s == "." || *s == ".." || s.contains('\\') || s.contains('\0'));
        (!unsafe_segment).then_some(segments)
    }

    /// Map a decoded request path to a file below the root.
    pub fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let mut resolved = self.root.clone();
        resolved.extend(self.segments(request_path)?);
        Some(resolved)
    }

    /// Serve the file for `request_path`, or `None` if there is none.
    pub async fn serve(&self, request_path: &str) -> Option<Response> {
        let segments = self.segments(request_path)?;
        let mut path = self.root.clone();
        path.extend(&segments);

        if tokio::fs::metadata(&path).await.ok()?.is_dir() {
            let index = path.join(INDEX_FILE);
            if !tokio::fs::try_exists(&index).await.unwrap_or(false) {
                return Some(self.listing(&path, &segments).await);
            }
            path = index;
        }

        match tokio::fs::read(&path).await {
            Ok(contents) => {
                tracing::debug!(file = ?path, bytes = contents.len(), "Serving file");
                let content_type = content_type_for(&path);
                Some(
                    (
                        StatusCode::OK,
                        [(header::CONTENT_TYPE, content_type)],
                        contents,
                    )
                        .into_response(),
                )
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(file = ?path, error = %e, "Failed to read file");
                Some((StatusCode::INTERNAL_SERVER_ERROR, "Failed to read file").into_response())
            }
        }
    }

    /// HTML index of `dir`, linking each entry under the mount.
    async fn listing(&self, dir: &Path, segments: &[&str]) -> Response {
        let mut entries = Vec::new();
        match tokio::fs::read_dir(dir).await {
            Ok(mut read_dir) => {
                while let Ok(Some(entry)) = read_dir.next_entry().await {
                    let is_dir = entry
                        .file_type()
                        .await
                        .map(|t| t.is_dir())
                        .unwrap_or(false);
                    entries.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
                }
            }
            Err(e) => {
                tracing::warn!(dir = ?dir, error = %e, "Failed to list directory");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to list directory")
                    .into_response();
            }
        }
        entries.sort();

        let mut base = self.mount.clone();
        for segment in segments {
            base.push('/');
            base.extend(utf8_percent_encode(segment, SEGMENT));
        }
        let title = if segments.is_empty() {
            escape_html(&format!("{}/", self.mount))
        } else {
            escape_html(&format!("{}/{}/", self.mount, segments.join("/")))
        };

        let mut html = format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
             <title>Directory listing for {title}</title>\n</head>\n<body>\n\
             <h1>Directory listing for {title}</h1>\n<hr>\n<ul>\n"
        );
        for (name, is_dir) in &entries {
            let suffix = if *is_dir { "/" } else { "" };
            html.push_str(&format!(
                "<li><a href=\"{}/{}{}\">{}{}</a></li>\n",
                base,
                utf8_percent_encode(name, SEGMENT),
                suffix,
                escape_html(name),
                suffix,
            ));
        }
        html.push_str("</ul>\n<hr>\n</body>\n</html>\n");

        tracing::debug!(dir = ?dir, entries = entries.len(), "Serving directory listing");
        (StatusCode::OK, [(header::CONTENT_TYPE, TEXT_HTML)], html).into_response()
    }
}
