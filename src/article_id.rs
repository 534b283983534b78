use article_analyst_contract::{ARTICLE_ID_PREFIX, DEFAULT_ARTICLE_ID};
use url::Url;

// Pages are usually addressed relative to the demo root; any base works for query parsing.
const RELATIVE_BASE: &str = "http://localhost/";

/// Resolves the article identifier from the `id` query parameter of `page_url`.
///
/// `?id=3` resolves to `article_3`, `?id=article_3` is kept as is. A missing, empty or
/// malformed value falls back to [`DEFAULT_ARTICLE_ID`].
pub fn resolve_article_id(page_url: &str) -> String {
    let param = parse_page_url(page_url).and_then(|url| {
        url.query_pairs()
            .find(|(key, _)| key == "id")
            .map(|(_, value)| value.into_owned())
    });
    article_id_from_param(param.as_deref())
}

pub fn article_id_from_param(param: Option<&str>) -> String {
    let Some(raw) = param.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return DEFAULT_ARTICLE_ID.to_string();
    };
    let article_id = if raw.starts_with(ARTICLE_ID_PREFIX) {
        raw.to_string()
    } else {
        format!("{ARTICLE_ID_PREFIX}{raw}")
    };
    let suffix = &article_id[ARTICLE_ID_PREFIX.len()..];
    let well_formed = !suffix.is_empty()
        && suffix
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
    if well_formed {
        article_id
    } else {
        DEFAULT_ARTICLE_ID.to_string()
    }
}

fn parse_page_url(page_url: &str) -> Option<Url> {
    let base = Url::parse(RELATIVE_BASE).ok()?;
    Url::options().base_url(Some(&base)).parse(page_url).ok()
}
