use crate::domain::post::extract_shortcode;
use crate::time::parse_instant;
use chrono::{DateTime, FixedOffset};
use reqwest::Url;
use scraper::{Html, Selector};

// Every anchor is resolved first; post links are recognised on the absolute URL.
const LINK_SELECTOR: &str = "a[href]";
const TIME_SELECTOR: &str = "time[datetime]";
const LOGIN_WALL_MARKERS: [&str; 3] = ["Log in", "Entrar", "Iniciar sessão"];

pub fn is_login_wall(final_url: &str, body: &str) -> bool {
    final_url.contains("accounts/login") || LOGIN_WALL_MARKERS.iter().any(|m| body.contains(m))
}

/// Post links in document order, resolved against `page_url` and de-duplicated.
pub fn collect_post_links(body: &str, page_url: &str) -> Vec<String> {
    let base = match Url::parse(page_url) {
        Ok(base) => base,
        Err(e) => {
            tracing::warn!(%page_url, error = %e, "cannot resolve links against page url");
            return Vec::new();
        }
    };
    let Ok(selector) = Selector::parse(LINK_SELECTOR) else {
        return Vec::new();
    };
    let doc = Html::parse_document(body);

    let mut out: Vec<String> = Vec::new();
    for href in doc.select(&selector).filter_map(|a| a.value().attr("href")) {
        let Ok(url) = base.join(href.trim()) else {
            continue;
        };
        let url = String::from(url);
        if extract_shortcode(&url).is_none() || out.contains(&url) {
            continue;
        }
        out.push(url);
    }
    out
}

/// Publication time from the first `<time datetime>` element of a post page.
pub fn find_post_timestamp(body: &str) -> Option<DateTime<FixedOffset>> {
    let selector = Selector::parse(TIME_SELECTOR).ok()?;
    let doc = Html::parse_document(body);
    doc.select(&selector)
        .filter_map(|el| el.value().attr("datetime"))
        .find_map(parse_instant)
}

/// Picks the newest dated post, or the first link when nothing carries a date.
pub fn pick_latest(
    dated: &[(String, Option<DateTime<FixedOffset>>)],
    links: &[String],
) -> (Option<String>, Option<DateTime<FixedOffset>>) {
    // max_by_key keeps the last maximum; iterate in reverse so ties favour grid order.
    let latest = dated
        .iter()
        .rev()
        .filter_map(|(code, at)| at.map(|at| (code, at)))
        .max_by_key(|(_, at)| *at);

    match latest {
        Some((code, at)) => (Some(code.clone()), Some(at)),
        None => (links.first().and_then(|u| extract_shortcode(u)), None),
    }
}
