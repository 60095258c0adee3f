use std::collections::BTreeMap;

use url::Url;

use crate::error::HttpError;

const BASE_URL_VAR: &str = "base_url";

pub(crate) fn resolve_url(template: &str, base_url: &Url) -> Result<Url, HttpError> {
    let base = base_url.as_str().trim_end_matches('/');
    let mut vars = BTreeMap::new();
    vars.insert(BASE_URL_VAR.to_owned(), base.to_owned());
    let rendered = render_template(template, &vars);

    let url = match Url::parse(&rendered) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => join_relative(base, &rendered)?,
        Err(err) => {
            return Err(HttpError::InvalidUrl {
                url: rendered,
                source: err,
            });
        }
    };

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(HttpError::UnsupportedScheme {
            scheme: other.to_owned(),
        }),
    }
}

/// Appends `relative` below the base path; a bare query string attaches to
/// the base URL itself.
fn join_relative(base: &str, relative: &str) -> Result<Url, HttpError> {
    let (root, suffix) = if relative.starts_with('?') {
        (base.to_owned(), relative)
    } else {
        (format!("{}/", base), relative.trim_start_matches('/'))
    };
    let root_url = Url::parse(&root).map_err(|err| HttpError::InvalidUrl {
        url: root.clone(),
        source: err,
    })?;
    root_url
        .join(suffix)
        .map_err(|err| HttpError::JoinUrlFailed {
            url: relative.to_owned(),
            source: err,
        })
}

pub(crate) fn render_template(input: &str, vars: &BTreeMap<String, String>) -> String {
    let mut rest = input;
    let mut output = String::with_capacity(input.len());

    loop {
        let Some(start) = rest.find("{{") else {
            output.push_str(rest);
            break;
        };
        let (before, after_start) = rest.split_at(start);
        output.push_str(before);
        let Some(after) = after_start.strip_prefix("{{") else {
            output.push_str(after_start);
            break;
        };
        let Some(end) = after.find("}}") else {
            output.push_str("{{");
            output.push_str(after);
            break;
        };
        let (key_part, after_end) = after.split_at(end);
        let key = key_part.trim();
        if let Some(value) = vars.get(key) {
            output.push_str(value);
        } else {
            output.push_str("{{");
            output.push_str(key);
            output.push_str("}}");
        }
        rest = match after_end.strip_prefix("}}") {
            Some(remaining) => remaining,
            None => {
                output.push_str(after_end);
                break;
            }
        };
    }

    output
}
